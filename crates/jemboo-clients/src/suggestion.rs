//! Suggestion service client.
//!
//! A suggestion batch is requested for a context snapshot and then read page
//! by page. The `next_offset` response header points at the following page;
//! its absence means the batch is exhausted.

use async_trait::async_trait;
use jemboo_core::{Identity, RawSuggestion, SuggestId};
use serde::Deserialize;
use serde_json::json;

use crate::context::ContextDocument;
use crate::errors::{RemoteCallError, RemoteErrorKind, Service};
use crate::http::{Call, join};

const ID_HEADER: &str = "_id";
const NEXT_OFFSET_HEADER: &str = "next_offset";

/// One page of raw suggestion entries.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SuggestionPage {
    /// Entries in rank order.
    pub items: Vec<RawSuggestion>,
    /// Offset of the next page, if any.
    pub next_offset: Option<u64>,
}

#[derive(Deserialize)]
struct ItemsBody {
    #[serde(default)]
    items: Vec<RawSuggestion>,
}

/// Access to the suggestion service.
#[async_trait]
pub trait SuggestionClient: Send + Sync {
    /// Request a new batch for the given context snapshot.
    async fn request(
        &self,
        identity: &Identity,
        context: &ContextDocument,
    ) -> Result<SuggestId, RemoteCallError>;

    /// Fetch `page_size` entries of batch `id` starting at `offset`.
    async fn fetch_items(
        &self,
        identity: &Identity,
        id: &SuggestId,
        page_size: u32,
        offset: u64,
    ) -> Result<SuggestionPage, RemoteCallError>;
}

/// [`SuggestionClient`] over HTTP.
pub struct HttpSuggestionClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSuggestionClient {
    /// Client for the suggestion service at `base_url`.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SuggestionClient for HttpSuggestionClient {
    async fn request(
        &self,
        identity: &Identity,
        context: &ContextDocument,
    ) -> Result<SuggestId, RemoteCallError> {
        let call = Call::new(Service::Suggestion, "request");
        let request = self
            .client
            .post(&self.base_url)
            .query(&identity.query_pairs())
            .json(&json!({ "context": context }));
        let response = call.send(request).await?;
        Ok(SuggestId::from(call.header(&response, ID_HEADER)?))
    }

    async fn fetch_items(
        &self,
        identity: &Identity,
        id: &SuggestId,
        page_size: u32,
        offset: u64,
    ) -> Result<SuggestionPage, RemoteCallError> {
        let call = Call::new(Service::Suggestion, "fetch_items");
        let page_size = page_size.to_string();
        let offset = offset.to_string();
        let mut query = identity.query_pairs();
        query.push(("page_size", page_size.as_str()));
        query.push(("offset", offset.as_str()));

        let request = self
            .client
            .get(join(&self.base_url, &format!("{id}/items")))
            .query(&query);
        let response = call.send(request).await?;

        let next_offset = call
            .optional_header(&response, NEXT_OFFSET_HEADER)?
            .map(|v| {
                v.parse::<u64>()
                    .map_err(|_| call.error(RemoteErrorKind::InvalidHeader(NEXT_OFFSET_HEADER)))
            })
            .transpose()?;
        let body: ItemsBody = call.json(response).await?;

        Ok(SuggestionPage {
            items: body.items,
            next_offset,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use jemboo_core::{ContextId, Revision};
    use serde_json::Map;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn identity() -> Identity {
        Identity {
            user_id: Some("u-1".into()),
            application_id: "app".into(),
            session_id: "sess".into(),
            locale: "en".into(),
        }
    }

    fn client(server: &MockServer) -> HttpSuggestionClient {
        HttpSuggestionClient::new(reqwest::Client::new(), format!("{}/suggest", server.uri()))
    }

    fn snapshot() -> ContextDocument {
        ContextDocument {
            id: ContextId::from("ctx1"),
            revision: Revision::from("rev2"),
            messages: vec![json!({"direction": 1, "text": "shoes"})],
            fields: Map::new(),
        }
    }

    #[tokio::test]
    async fn request_posts_context_and_reads_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/suggest"))
            .and(query_param("user_id", "u-1"))
            .and(query_param("locale", "en"))
            .and(body_json(json!({
                "context": {
                    "_id": "ctx1",
                    "_rev": "rev2",
                    "messages": [{"direction": 1, "text": "shoes"}]
                }
            })))
            .respond_with(ResponseTemplate::new(201).insert_header("_id", "sug-1"))
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server)
            .request(&identity(), &snapshot())
            .await
            .unwrap();
        assert_eq!(id.as_str(), "sug-1");
    }

    #[tokio::test]
    async fn fetch_items_with_next_offset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/suggest/sug-1/items"))
            .and(query_param("page_size", "2"))
            .and(query_param("offset", "0"))
            .and(query_param("session_id", "sess"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("next_offset", "2")
                    .set_body_json(json!({"items": [
                        {"_id": {"$oid": "p1"}, "score": 0.9, "reasons": [], "index": 0},
                        {"_id": "p2", "score": 0.8, "reasons": [], "index": 1}
                    ]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let page = client(&server)
            .fetch_items(&identity(), &SuggestId::from("sug-1"), 2, 0)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id.as_str(), "p1");
        assert_eq!(page.next_offset, Some(2));
    }

    #[tokio::test]
    async fn fetch_items_last_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/suggest/sug-1/items"))
            .and(query_param("offset", "40"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(1)
            .mount(&server)
            .await;

        let page = client(&server)
            .fetch_items(&identity(), &SuggestId::from("sug-1"), 20, 40)
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next_offset, None);
    }

    #[tokio::test]
    async fn fetch_items_bad_next_offset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("next_offset", "soon")
                    .set_body_json(json!({"items": []})),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_items(&identity(), &SuggestId::from("sug-1"), 20, 0)
            .await
            .unwrap_err();
        assert_matches!(err.kind, RemoteErrorKind::InvalidHeader("next_offset"));
    }

    #[tokio::test]
    async fn request_failure_is_suggestion_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client(&server)
            .request(&identity(), &snapshot())
            .await
            .unwrap_err();
        assert_eq!(err.service, Service::Suggestion);
        assert_eq!(err.operation, "request");
        assert_matches!(err.kind, RemoteErrorKind::Status { status: 500, ref body } if body == "boom");
    }
}
