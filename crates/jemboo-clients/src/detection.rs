//! Detection service client.
//!
//! Detection is asynchronous: submitting a query returns a `Location` handle,
//! and the result document is fetched from that location.

use async_trait::async_trait;
use jemboo_core::{DetectionLocation, Identity};
use serde_json::{Value, json};

use crate::errors::{RemoteCallError, Service};
use crate::http::Call;

const LOCATION_HEADER: &str = "location";

/// Access to the detection service.
#[async_trait]
pub trait DetectionClient: Send + Sync {
    /// Submit free text; returns where the result will be available.
    async fn submit(
        &self,
        identity: &Identity,
        text: &str,
    ) -> Result<DetectionLocation, RemoteCallError>;

    /// Fetch the detection document at `location`.
    async fn fetch(&self, location: &DetectionLocation) -> Result<Value, RemoteCallError>;
}

/// [`DetectionClient`] over HTTP.
pub struct HttpDetectionClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDetectionClient {
    /// Client for the detection service at `base_url`.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Absolute locations are used as-is; relative ones are appended to the base URL.
    fn resolve(&self, location: &DetectionLocation) -> String {
        if location.starts_with("http://") || location.starts_with("https://") {
            location.to_string()
        } else {
            format!("{}{}", self.base_url, location)
        }
    }
}

#[async_trait]
impl DetectionClient for HttpDetectionClient {
    async fn submit(
        &self,
        identity: &Identity,
        text: &str,
    ) -> Result<DetectionLocation, RemoteCallError> {
        let call = Call::new(Service::Detection, "submit");
        let mut query = identity.query_pairs();
        query.push(("q", text));
        let request = self
            .client
            .post(&self.base_url)
            .query(&query)
            .json(&json!({}));
        let response = call.send(request).await?;
        let location = call.header(&response, LOCATION_HEADER)?;
        Ok(DetectionLocation::from(location))
    }

    async fn fetch(&self, location: &DetectionLocation) -> Result<Value, RemoteCallError> {
        let call = Call::new(Service::Detection, "fetch");
        let response = call.send(self.client.get(self.resolve(location))).await?;
        call.json(response).await
    }
}
