//! Per-connection session state.

use jemboo_clients::ContextDocument;
use jemboo_core::{ConnectionId, ContextId, Identity, Revision, SuggestId};
use serde::Deserialize;

use crate::config::ServerConfig;

/// The context a session is bound to.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextHandle {
    /// Context document id.
    pub id: ContextId,
    /// Latest revision this session knows of.
    pub revision: Option<Revision>,
    /// Last document read, valid only while its revision matches `revision`.
    pub snapshot: Option<ContextDocument>,
}

impl ContextHandle {
    /// Handle with no cached snapshot.
    pub fn new(id: ContextId, revision: Option<Revision>) -> Self {
        Self {
            id,
            revision,
            snapshot: None,
        }
    }

    /// Whether the cached snapshot can be served as-is.
    pub fn snapshot_is_current(&self) -> bool {
        match (&self.snapshot, &self.revision) {
            (Some(doc), Some(rev)) => doc.revision == *rev,
            _ => false,
        }
    }
}

/// State owned by one connection's task.
#[derive(Clone, Debug)]
pub struct Session {
    /// Connection this session belongs to.
    pub connection_id: ConnectionId,
    /// Identity forwarded to every backend.
    pub identity: Identity,
    /// Bound context. `None` until the session is opened.
    pub context: Option<ContextHandle>,
    /// Active suggestion batch.
    pub suggest_id: Option<SuggestId>,
    /// Suggestions per page.
    pub page_size: u32,
}

impl Session {
    /// A fresh session with no context.
    pub fn new(connection_id: ConnectionId, identity: Identity, page_size: u32) -> Self {
        Self {
            connection_id,
            identity,
            context: None,
            suggest_id: None,
            page_size,
        }
    }

    /// Bound context id, if any.
    pub fn context_id(&self) -> Option<&ContextId> {
        self.context.as_ref().map(|c| &c.id)
    }

    /// Current revision, if known.
    pub fn revision(&self) -> Option<&Revision> {
        self.context.as_ref().and_then(|c| c.revision.as_ref())
    }

    /// Record a new revision after a successful mutation.
    pub fn set_revision(&mut self, revision: Revision) {
        if let Some(ctx) = self.context.as_mut() {
            ctx.revision = Some(revision);
        }
    }
}

/// Query string accepted on the WebSocket upgrade.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConnectParams {
    /// Embedding application.
    pub application_id: String,
    /// Client-side session.
    pub session_id: String,
    /// Locale; the configured default when absent.
    #[serde(default)]
    pub locale: Option<String>,
    /// Authenticated user; empty means anonymous.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Resume this context instead of creating one.
    #[serde(default)]
    pub context_id: Option<String>,
    /// Known revision of the resumed context.
    #[serde(default)]
    pub context_rev: Option<String>,
    /// Suggestions per page.
    #[serde(default)]
    pub page_size: Option<u32>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ConnectParams {
    /// Build the session for a new connection.
    pub fn into_session(self, connection_id: ConnectionId, config: &ServerConfig) -> Session {
        let identity = Identity {
            user_id: non_empty(self.user_id),
            application_id: self.application_id,
            session_id: self.session_id,
            locale: non_empty(self.locale).unwrap_or_else(|| config.default_locale.clone()),
        };
        let page_size = self
            .page_size
            .filter(|n| *n > 0)
            .unwrap_or(config.default_page_size);

        let mut session = Session::new(connection_id, identity, page_size);
        session.context = non_empty(self.context_id).map(|id| {
            ContextHandle::new(
                ContextId::from(id),
                non_empty(self.context_rev).map(Revision::from),
            )
        });
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn params() -> ConnectParams {
        ConnectParams {
            application_id: "app".into(),
            session_id: "sess".into(),
            ..ConnectParams::default()
        }
    }

    fn doc(rev: &str) -> ContextDocument {
        ContextDocument {
            id: ContextId::from("ctx1"),
            revision: Revision::from(rev),
            messages: vec![],
            fields: Map::new(),
        }
    }

    #[test]
    fn defaults_from_config() {
        let session = params().into_session(ConnectionId::from("c1"), &ServerConfig::default());
        assert_eq!(session.identity.locale, "en");
        assert_eq!(session.page_size, 20);
        assert!(session.identity.user_id.is_none());
        assert!(session.context.is_none());
        assert!(session.suggest_id.is_none());
    }

    #[test]
    fn empty_user_id_is_anonymous() {
        let session = ConnectParams {
            user_id: Some(String::new()),
            locale: Some("de".into()),
            page_size: Some(5),
            ..params()
        }
        .into_session(ConnectionId::from("c1"), &ServerConfig::default());
        assert!(session.identity.user_id.is_none());
        assert_eq!(session.identity.locale, "de");
        assert_eq!(session.page_size, 5);
    }

    #[test]
    fn zero_page_size_falls_back() {
        let session = ConnectParams {
            page_size: Some(0),
            ..params()
        }
        .into_session(ConnectionId::from("c1"), &ServerConfig::default());
        assert_eq!(session.page_size, 20);
    }

    #[test]
    fn resume_context_from_query() {
        let session = ConnectParams {
            context_id: Some("ctx9".into()),
            context_rev: Some("rev3".into()),
            ..params()
        }
        .into_session(ConnectionId::from("c1"), &ServerConfig::default());
        assert_eq!(session.context_id().map(ContextId::as_str), Some("ctx9"));
        assert_eq!(session.revision().map(Revision::as_str), Some("rev3"));
    }

    #[test]
    fn query_string_deserializes() {
        let parsed: ConnectParams =
            serde_json::from_value(serde_json::json!({"application_id": "a", "session_id": "s"}))
                .unwrap();
        assert_eq!(parsed.application_id, "a");
        assert!(parsed.context_id.is_none());
    }

    #[test]
    fn set_revision_without_context_is_ignored() {
        let mut session = Session::new(
            ConnectionId::from("c1"),
            params()
                .into_session(ConnectionId::from("c1"), &ServerConfig::default())
                .identity,
            10,
        );
        session.set_revision(Revision::from("r"));
        assert!(session.revision().is_none());
    }

    #[test]
    fn snapshot_currency() {
        let mut handle = ContextHandle::new(ContextId::from("ctx1"), Some(Revision::from("r1")));
        assert!(!handle.snapshot_is_current());

        handle.snapshot = Some(doc("r1"));
        assert!(handle.snapshot_is_current());

        handle.revision = Some(Revision::from("r2"));
        assert!(!handle.snapshot_is_current());

        handle.revision = None;
        assert!(!handle.snapshot_is_current());
    }
}
