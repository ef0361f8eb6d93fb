//! Protocol state machine: routes each inbound message to its handler.
//!
//! Handlers run to completion one at a time per connection, so a session is
//! only ever touched by its own task. Session state is updated only after the
//! backend call that produced it succeeds.

use std::sync::Arc;

use jemboo_clients::{
    Catalog, ContextClient, ContextDocument, DetectionClient, FeedbackRequest, RemoteCallError,
    SuggestionClient,
};
use jemboo_core::{
    ConnectionId, ContextId, InboundMessage, OutboundMessage, ProductId, ProtocolError,
    SuggestId, ThinkingMode,
};
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::composer::ResponseComposer;
use super::errors::SessionError;
use super::interpreter::{ReplyInterpreter, SilentInterpreter};
use super::state::{ContextHandle, Session};
use crate::websocket::connection::ClientConnection;
use crate::websocket::registry::ConnectionRegistry;

/// Remote collaborators of a session.
#[derive(Clone)]
pub struct Backends {
    /// Conversation context store.
    pub context: Arc<dyn ContextClient>,
    /// Free-text detection.
    pub detection: Arc<dyn DetectionClient>,
    /// Suggestion batches.
    pub suggestion: Arc<dyn SuggestionClient>,
}

/// Shared, stateless handler for every session.
pub struct MessageDispatcher {
    backends: Backends,
    composer: ResponseComposer,
    interpreter: Arc<dyn ReplyInterpreter>,
    registry: Arc<ConnectionRegistry>,
}

impl MessageDispatcher {
    /// Create a dispatcher that never sends assistant replies.
    pub fn new(
        backends: Backends,
        catalog: Arc<dyn Catalog>,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            backends,
            composer: ResponseComposer::new(catalog),
            interpreter: Arc::new(SilentInterpreter),
            registry,
        }
    }

    /// Replace the reply interpreter.
    #[must_use]
    pub fn with_interpreter(mut self, interpreter: Arc<dyn ReplyInterpreter>) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Connection registry shared with the server.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Bind the session to a context, register the connection and greet it.
    ///
    /// A session that already names a context (resume) is never re-created.
    #[instrument(skip_all, fields(connection_id = %session.connection_id))]
    pub async fn open(
        &self,
        session: &mut Session,
        connection: Arc<ClientConnection>,
    ) -> Result<ContextId, RemoteCallError> {
        let context_id = if let Some(id) = session.context_id() {
            debug!(context_id = %id, "resuming context");
            id.clone()
        } else {
            let (id, revision) = self.backends.context.create(&session.identity).await?;
            info!(context_id = %id, "context created");
            session.context = Some(ContextHandle::new(id.clone(), Some(revision)));
            id
        };

        self.registry.add(Arc::clone(&connection)).await;
        let _ = connection.send_message(&OutboundMessage::ConnectionOpened {
            context_id: context_id.clone(),
        });
        Ok(context_id)
    }

    /// Unregister a connection. Closing twice is a no-op.
    pub async fn close(&self, connection_id: &ConnectionId) -> bool {
        self.registry.remove(connection_id).await
    }

    /// Handle one inbound message.
    #[instrument(skip_all, fields(
        connection_id = %session.connection_id,
        message_type = message.message_type(),
    ))]
    pub async fn dispatch(
        &self,
        session: &mut Session,
        connection: &ClientConnection,
        message: InboundMessage,
    ) -> Result<(), SessionError> {
        match message {
            InboundMessage::HomePage { message_text } | InboundMessage::NewMessage { message_text } => {
                self.message_turn(session, connection, &message_text).await
            }
            InboundMessage::NextPage { offset } => self.next_page(session, connection, offset).await,
            InboundMessage::ViewProductDetails {
                product_id,
                feedback_type,
                meta_data,
            } => {
                self.record_feedback(session, product_id, feedback_type, meta_data)
                    .await
            }
        }
    }

    async fn message_turn(
        &self,
        session: &mut Session,
        connection: &ClientConnection,
        text: &str,
    ) -> Result<(), SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::UnsupportedInput("empty message text"));
        }
        let context_id = session
            .context_id()
            .cloned()
            .ok_or(ProtocolError::ContextNotEstablished)?;

        let _ = connection.send_message(&OutboundMessage::start_thinking(ThinkingMode::Conversation));
        let _ = connection.send_message(&OutboundMessage::start_thinking(ThinkingMode::Suggestions));

        let location = self
            .backends
            .detection
            .submit(&session.identity, text)
            .await?;
        let detection = self.backends.detection.fetch(&location).await?;

        if let Some(reply) = self.interpreter.interpret(&detection) {
            let _ = connection.send_message(&OutboundMessage::chat_response(reply));
        }

        let revision = self
            .backends
            .context
            .append_user_message(&context_id, &detection, text)
            .await?;
        session.set_revision(revision);

        let snapshot = self.get_context(session).await?;
        let suggest_id = self
            .backends
            .suggestion
            .request(&session.identity, &snapshot)
            .await?;
        debug!(context_id = %context_id, suggest_id = %suggest_id, "suggestion batch requested");
        session.suggest_id = Some(suggest_id.clone());

        self.send_page(session, connection, &suggest_id, 0).await
    }

    async fn next_page(
        &self,
        session: &Session,
        connection: &ClientConnection,
        offset: u64,
    ) -> Result<(), SessionError> {
        let suggest_id = session
            .suggest_id
            .clone()
            .ok_or(ProtocolError::NoSuggestionBatch)?;
        self.send_page(session, connection, &suggest_id, offset).await
    }

    async fn send_page(
        &self,
        session: &Session,
        connection: &ClientConnection,
        suggest_id: &SuggestId,
        offset: u64,
    ) -> Result<(), SessionError> {
        let page = self
            .backends
            .suggestion
            .fetch_items(&session.identity, suggest_id, session.page_size, offset)
            .await?;
        let items = self.composer.compose(page.items);
        debug!(suggest_id = %suggest_id, offset, count = items.len(), "sending suggestion page");

        let _ = connection.send_message(&OutboundMessage::SuggestionItems {
            suggest_id: suggest_id.clone(),
            offset,
            next_offset: page.next_offset,
            items,
        });
        Ok(())
    }

    async fn record_feedback(
        &self,
        session: &mut Session,
        product_id: ProductId,
        feedback_type: String,
        meta_data: Option<Value>,
    ) -> Result<(), SessionError> {
        let context_id = session
            .context_id()
            .cloned()
            .ok_or(ProtocolError::ContextNotEstablished)?;
        let feedback = FeedbackRequest {
            product_id,
            feedback_type,
            meta_data,
        };
        let revision = self
            .backends
            .context
            .append_feedback(&context_id, &session.identity, &feedback)
            .await?;
        session.set_revision(revision);
        Ok(())
    }

    /// Context snapshot at the session's current revision.
    ///
    /// Served from cache while the cached revision matches; otherwise read
    /// from the store (with the known revision as a hint) and cached.
    pub async fn get_context(&self, session: &mut Session) -> Result<ContextDocument, SessionError> {
        let handle = session
            .context
            .as_mut()
            .ok_or(ProtocolError::ContextNotEstablished)?;
        if handle.snapshot_is_current() {
            if let Some(doc) = &handle.snapshot {
                return Ok(doc.clone());
            }
        }

        let doc = self
            .backends
            .context
            .read(&handle.id, handle.revision.as_ref())
            .await?;
        handle.revision = Some(doc.revision.clone());
        handle.snapshot = Some(doc.clone());
        Ok(doc)
    }
}
