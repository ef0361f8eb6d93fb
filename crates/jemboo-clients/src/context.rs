//! Conversation context store client.
//!
//! The store keeps one document per conversation. Every mutation (creation,
//! message append, feedback append) yields a new opaque revision, returned in
//! the `_rev` response header.

use async_trait::async_trait;
use jemboo_core::{ContextId, Direction, Identity, ProductId, Revision};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::errors::{RemoteCallError, Service};
use crate::http::{Call, join};

const ID_HEADER: &str = "_id";
const REV_HEADER: &str = "_rev";

/// Snapshot of a context document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextDocument {
    /// Document id.
    #[serde(rename = "_id")]
    pub id: ContextId,
    /// Revision this snapshot was read at.
    #[serde(rename = "_rev")]
    pub revision: Revision,
    /// Conversation history, oldest first.
    #[serde(default)]
    pub messages: Vec<Value>,
    /// Every other document field, preserved verbatim.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A product-view feedback event.
#[derive(Clone, Debug, PartialEq)]
pub struct FeedbackRequest {
    /// Product viewed.
    pub product_id: ProductId,
    /// Feedback kind.
    pub feedback_type: String,
    /// Client metadata, forwarded verbatim.
    pub meta_data: Option<Value>,
}

/// Access to the context store.
#[async_trait]
pub trait ContextClient: Send + Sync {
    /// Create a fresh context for `identity`.
    async fn create(&self, identity: &Identity) -> Result<(ContextId, Revision), RemoteCallError>;

    /// Read a context document. `revision` is sent as a hint when known.
    async fn read(
        &self,
        id: &ContextId,
        revision: Option<&Revision>,
    ) -> Result<ContextDocument, RemoteCallError>;

    /// Append a message to the conversation history.
    async fn append_message(
        &self,
        id: &ContextId,
        direction: Direction,
        text: &str,
        detection: Option<&Value>,
    ) -> Result<Revision, RemoteCallError>;

    /// Append a user message together with its detection result.
    async fn append_user_message(
        &self,
        id: &ContextId,
        detection: &Value,
        text: &str,
    ) -> Result<Revision, RemoteCallError> {
        self.append_message(id, Direction::User, text, Some(detection))
            .await
    }

    /// Record product feedback.
    async fn append_feedback(
        &self,
        id: &ContextId,
        identity: &Identity,
        feedback: &FeedbackRequest,
    ) -> Result<Revision, RemoteCallError>;
}

/// [`ContextClient`] over HTTP.
pub struct HttpContextClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpContextClient {
    /// Client for the context collection at `base_url`.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ContextClient for HttpContextClient {
    async fn create(&self, identity: &Identity) -> Result<(ContextId, Revision), RemoteCallError> {
        let call = Call::new(Service::Context, "create");
        let request = self
            .client
            .post(&self.base_url)
            .query(&identity.query_pairs())
            .json(&json!({}));
        let response = call.send(request).await?;
        let id = ContextId::from(call.header(&response, ID_HEADER)?);
        let revision = Revision::from(call.header(&response, REV_HEADER)?);
        debug!(context_id = %id, revision = %revision, "context created");
        Ok((id, revision))
    }

    async fn read(
        &self,
        id: &ContextId,
        revision: Option<&Revision>,
    ) -> Result<ContextDocument, RemoteCallError> {
        let call = Call::new(Service::Context, "read");
        let mut request = self.client.get(join(&self.base_url, id));
        if let Some(rev) = revision {
            request = request.query(&[("_rev", rev.as_str())]);
        }
        let response = call.send(request).await?;
        call.json(response).await
    }

    async fn append_message(
        &self,
        id: &ContextId,
        direction: Direction,
        text: &str,
        detection: Option<&Value>,
    ) -> Result<Revision, RemoteCallError> {
        let call = Call::new(Service::Context, "append_message");
        let mut body = json!({ "direction": direction, "text": text });
        if let Some(detection) = detection {
            body["detection"] = detection.clone();
        }
        let request = self
            .client
            .post(join(&self.base_url, &format!("{id}/messages/")))
            .json(&body);
        let response = call.send(request).await?;
        Ok(Revision::from(call.header(&response, REV_HEADER)?))
    }

    async fn append_feedback(
        &self,
        id: &ContextId,
        identity: &Identity,
        feedback: &FeedbackRequest,
    ) -> Result<Revision, RemoteCallError> {
        let call = Call::new(Service::Context, "append_feedback");
        let mut query = identity.query_pairs_without_locale();
        query.push(("product_id", feedback.product_id.as_str()));
        query.push(("type", feedback.feedback_type.as_str()));

        let body = match &feedback.meta_data {
            Some(meta) => json!({ "meta_data": meta }),
            None => json!({}),
        };
        let request = self
            .client
            .post(join(&self.base_url, &format!("{id}/feedback/")))
            .query(&query)
            .json(&body);
        let response = call.send(request).await?;
        Ok(Revision::from(call.header(&response, REV_HEADER)?))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
