//! Protocol-level errors for client messages.
//!
//! A [`ProtocolError`] means the client sent something the session cannot act
//! on. It never tears the connection down: the message is rejected, no state
//! is touched, and the client receives an `error` message carrying
//! [`ProtocolError::code`].

use thiserror::Error;

/// A rejected inbound message.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame was not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// Frame had no string `type` field.
    #[error("message has no type")]
    MissingType,

    /// Frame carried a `type` the protocol does not know.
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// Known type, but the payload did not match its shape.
    #[error("malformed {message_type} payload: {source}")]
    MalformedPayload {
        /// Tag of the offending message.
        message_type: String,
        /// Decode failure.
        #[source]
        source: serde_json::Error,
    },

    /// `next_page` arrived before any suggestion batch was requested.
    #[error("no suggestion batch to page through")]
    NoSuggestionBatch,

    /// The session has no context yet.
    #[error("context not established")]
    ContextNotEstablished,
}

impl ProtocolError {
    /// Machine-readable code sent to the client.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) => "INVALID_JSON",
            Self::MissingType => "MISSING_TYPE",
            Self::UnknownType(_) => "UNKNOWN_TYPE",
            Self::MalformedPayload { .. } => "INVALID_PAYLOAD",
            Self::NoSuggestionBatch => "NO_SUGGESTION_BATCH",
            Self::ContextNotEstablished => "NO_CONTEXT",
        }
    }
}
