//! Errors raised while handling a client message.

use jemboo_clients::RemoteCallError;
use jemboo_core::ProtocolError;
use thiserror::Error;

/// Outcome of a failed message.
///
/// Only [`SessionError::Remote`] ends the connection; the other variants
/// reject a single message.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The client sent something the protocol rejects.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A backend call failed mid-turn.
    #[error(transparent)]
    Remote(#[from] RemoteCallError),

    /// Well-formed input the session does not act on (e.g. blank text).
    #[error("unsupported input: {0}")]
    UnsupportedInput(&'static str),
}

impl SessionError {
    /// Whether the connection must be closed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Label for metrics.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Protocol(_) => "protocol",
            Self::Remote(_) => "remote",
            Self::UnsupportedInput(_) => "unsupported_input",
        }
    }
}
