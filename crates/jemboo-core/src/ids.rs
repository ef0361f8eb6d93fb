//! Branded ID newtypes for type safety.
//!
//! Every identifier that crosses a service boundary is a distinct newtype
//! around `String`, so a context revision can never be passed where a
//! suggestion batch id is expected. Backend-issued ids are opaque: they are
//! stored and echoed back verbatim.
//!
//! Only [`ConnectionId`] is minted locally (UUID v7, time-ordered).

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! branded_id {
    (@impls $name:ident) => {
        impl $name {
            /// Create from an existing string value.
            #[must_use]
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        branded_id!(@impls $name);
    };
    (@object_id $(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        branded_id!(@impls $name);

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                ObjectId::deserialize(deserializer).map(|raw| Self(raw.into_string()))
            }
        }
    };
}

/// Wire form of a document id: a plain string or `MongoDB` extended JSON.
#[derive(Deserialize)]
#[serde(untagged)]
enum ObjectId {
    Plain(String),
    Extended {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

impl ObjectId {
    fn into_string(self) -> String {
        match self {
            Self::Plain(s) | Self::Extended { oid: s } => s,
        }
    }
}

branded_id! {
    /// Unique identifier for a client WebSocket connection.
    ConnectionId
}

branded_id! {
    /// Identifier of a conversation context document.
    ContextId
}

branded_id! {
    /// Opaque revision token of a context document. Changes on every mutation.
    Revision
}

branded_id! {
    /// Identifier of a suggestion batch.
    SuggestId
}

branded_id! {
    /// Location handle returned by the detection service for a submitted query.
    DetectionLocation
}

branded_id! {
    @object_id
    /// Catalog product identifier. Accepts `{"$oid": "..."}` on input.
    ProductId
}

impl ConnectionId {
    /// Mint a new connection id (UUID v7, time-ordered).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_is_uuid_v7() {
        let id = ConnectionId::generate();
        let parsed = Uuid::parse_str(id.as_str()).expect("should be valid UUID");
        assert_eq!(parsed.get_version(), Some(uuid::Version::SortRand));
    }

    #[test]
    fn connection_ids_are_unique() {
        assert_ne!(ConnectionId::generate(), ConnectionId::generate());
    }

    #[test]
    fn from_str_ref() {
        let id = ContextId::from("ctx-123");
        assert_eq!(id.as_str(), "ctx-123");
    }

    #[test]
    fn deref_and_display() {
        let rev = Revision::from("3-abc");
        let s: &str = &rev;
        assert_eq!(s, "3-abc");
        assert_eq!(format!("{rev}"), "3-abc");
    }

    #[test]
    fn serde_transparent() {
        let id = SuggestId::from("sug-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"sug-1\"");
        let back: SuggestId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn product_id_accepts_plain_string() {
        let id: ProductId = serde_json::from_str("\"p-42\"").unwrap();
        assert_eq!(id.as_str(), "p-42");
    }

    #[test]
    fn product_id_accepts_extended_json_oid() {
        let id: ProductId =
            serde_json::from_str(r#"{"$oid": "5a1b2c3d4e5f60718293a4b5"}"#).unwrap();
        assert_eq!(id.as_str(), "5a1b2c3d4e5f60718293a4b5");
    }

    #[test]
    fn product_id_serializes_as_plain_string() {
        let id: ProductId = serde_json::from_str(r#"{"$oid": "abc"}"#).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }

    #[test]
    fn product_id_rejects_numbers() {
        assert!(serde_json::from_str::<ProductId>("42").is_err());
    }

    #[test]
    fn into_inner() {
        let id = DetectionLocation::from("/detect/9");
        assert_eq!(id.into_inner(), "/detect/9");
    }
}
