//! Assistant replies derived from a detection result.

use serde_json::{Map, Value};

/// Decides whether a detection warrants an assistant chat reply.
///
/// Returned fields are sent as a `jemboo_chat_response`.
pub trait ReplyInterpreter: Send + Sync {
    /// Reply fields for `detection`, or `None` to stay quiet.
    fn interpret(&self, detection: &Value) -> Option<Map<String, Value>>;
}

/// Never replies.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentInterpreter;

impl ReplyInterpreter for SilentInterpreter {
    fn interpret(&self, _detection: &Value) -> Option<Map<String, Value>> {
        None
    }
}
