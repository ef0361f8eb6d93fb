//! Client wire protocol.
//!
//! Both directions are JSON objects tagged by a `type` field. Inbound frames
//! go through [`InboundMessage::parse`], which distinguishes a missing tag, an
//! unknown tag, and a bad payload for a known tag. Outbound messages only
//! serialize.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::errors::ProtocolError;
use crate::ids::{ContextId, ProductId, SuggestId};
use crate::product::SuggestionItem;

// ─────────────────────────────────────────────────────────────────────────────
// Inbound
// ─────────────────────────────────────────────────────────────────────────────

/// A message sent by the client.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Opening message from the landing page.
    #[serde(rename = "home_page_message")]
    HomePage {
        /// User text.
        message_text: String,
    },
    /// A new chat message.
    NewMessage {
        /// User text.
        message_text: String,
    },
    /// Request another page of the current suggestion batch.
    NextPage {
        /// Offset to fetch from, as handed out in a previous `next_offset`.
        offset: u64,
    },
    /// The user opened a product.
    ViewProductDetails {
        /// Product viewed.
        product_id: ProductId,
        /// Kind of feedback (e.g. `click`).
        feedback_type: String,
        /// Optional client metadata, forwarded verbatim.
        #[serde(default)]
        meta_data: Option<Value>,
    },
}

impl InboundMessage {
    /// Every tag the protocol accepts.
    pub const TYPES: [&'static str; 4] = [
        "home_page_message",
        "new_message",
        "next_page",
        "view_product_details",
    ];

    /// Decode a text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text).map_err(ProtocolError::InvalidJson)?;
        Self::from_value(value)
    }

    /// Decode an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let message_type = match value.get("type") {
            Some(Value::String(t)) => t.clone(),
            _ => return Err(ProtocolError::MissingType),
        };
        if !Self::TYPES.contains(&message_type.as_str()) {
            return Err(ProtocolError::UnknownType(message_type));
        }
        serde_json::from_value(value).map_err(|source| ProtocolError::MalformedPayload {
            message_type,
            source,
        })
    }

    /// Wire tag of this message.
    #[must_use]
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::HomePage { .. } => "home_page_message",
            Self::NewMessage { .. } => "new_message",
            Self::NextPage { .. } => "next_page",
            Self::ViewProductDetails { .. } => "view_product_details",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outbound
// ─────────────────────────────────────────────────────────────────────────────

/// Which part of the UI should show a busy indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThinkingMode {
    /// The chat transcript.
    Conversation,
    /// The suggestion grid.
    Suggestions,
}

/// Author of a conversation message. Serialized as an integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Written by the assistant.
    Assistant = 0,
    /// Written by the user.
    User = 1,
}

impl Direction {
    /// Wire value.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl Serialize for Direction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

/// A message sent to the client.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// The session is ready.
    ConnectionOpened {
        /// Context backing the session.
        context_id: ContextId,
    },
    /// Work has started on a turn.
    StartThinking {
        /// Which indicator to show.
        thinking_mode: ThinkingMode,
        /// Optional extra data for the indicator.
        #[serde(skip_serializing_if = "Option::is_none")]
        meta_data: Option<Value>,
    },
    /// An assistant reply.
    #[serde(rename = "jemboo_chat_response")]
    ChatResponse {
        /// Always [`Direction::Assistant`].
        direction: Direction,
        /// Reply fields, forwarded verbatim.
        #[serde(flatten)]
        reply: Map<String, Value>,
    },
    /// A page of suggestions.
    SuggestionItems {
        /// Batch the page belongs to.
        suggest_id: SuggestId,
        /// Offset this page starts at.
        offset: u64,
        /// Offset of the next page, `null` when there is none.
        next_offset: Option<u64>,
        /// Composed items.
        items: Vec<SuggestionItem>,
    },
    /// A client message was rejected.
    Error {
        /// Machine-readable code.
        code: String,
        /// Human-readable reason.
        message: String,
    },
}

impl OutboundMessage {
    /// Wrap interpreter output as an assistant reply.
    ///
    /// `type` and `direction` keys in `reply` are discarded; the envelope owns them.
    #[must_use]
    pub fn chat_response(mut reply: Map<String, Value>) -> Self {
        let _ = reply.remove("type");
        let _ = reply.remove("direction");
        Self::ChatResponse {
            direction: Direction::Assistant,
            reply,
        }
    }

    /// Start-thinking notice without metadata.
    #[must_use]
    pub fn start_thinking(thinking_mode: ThinkingMode) -> Self {
        Self::StartThinking {
            thinking_mode,
            meta_data: None,
        }
    }

    /// Error notice for a rejected message.
    #[must_use]
    pub fn from_protocol_error(err: &ProtocolError) -> Self {
        Self::Error {
            code: err.code().to_owned(),
            message: err.to_string(),
        }
    }

    /// Wire tag of this message.
    #[must_use]
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::ConnectionOpened { .. } => "connection_opened",
            Self::StartThinking { .. } => "start_thinking",
            Self::ChatResponse { .. } => "jemboo_chat_response",
            Self::SuggestionItems { .. } => "suggestion_items",
            Self::Error { .. } => "error",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
