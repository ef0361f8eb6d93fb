//! Shared `reqwest` plumbing for the service clients.

use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::errors::{RemoteCallError, RemoteErrorKind, Service};

const USER_AGENT: &str = concat!("jemboo-gateway/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by all service clients.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Join a base URL and a path suffix without doubling the slash.
pub(crate) fn join(base: &str, suffix: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        suffix.trim_start_matches('/')
    )
}

/// One outgoing call, labelled for errors and metrics.
#[derive(Clone, Copy)]
pub(crate) struct Call {
    service: Service,
    operation: &'static str,
}

impl Call {
    pub(crate) fn new(service: Service, operation: &'static str) -> Self {
        Self { service, operation }
    }

    pub(crate) fn error(self, kind: impl Into<RemoteErrorKind>) -> RemoteCallError {
        RemoteCallError::new(self.service, self.operation, kind)
    }

    /// Send the request and require a 2xx status.
    pub(crate) async fn send(self, request: RequestBuilder) -> Result<Response, RemoteCallError> {
        let started = Instant::now();
        let result = request.send().await;
        counter!(
            "backend_requests_total",
            "service" => self.service.as_str(),
            "operation" => self.operation
        )
        .increment(1);
        histogram!("backend_request_duration_seconds", "service" => self.service.as_str())
            .record(started.elapsed().as_secs_f64());

        let response = result.map_err(|e| self.error(e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(self.error(RemoteErrorKind::status(status.as_u16(), &body)))
    }

    /// Required response header as text.
    pub(crate) fn header(
        self,
        response: &Response,
        name: &'static str,
    ) -> Result<String, RemoteCallError> {
        self.optional_header(response, name)?
            .ok_or_else(|| self.error(RemoteErrorKind::MissingHeader(name)))
    }

    /// Optional response header as text. Empty values count as absent.
    pub(crate) fn optional_header(
        self,
        response: &Response,
        name: &'static str,
    ) -> Result<Option<String>, RemoteCallError> {
        let Some(value) = response.headers().get(name) else {
            return Ok(None);
        };
        let text = value
            .to_str()
            .map_err(|_| self.error(RemoteErrorKind::InvalidHeader(name)))?
            .trim();
        Ok((!text.is_empty()).then(|| text.to_owned()))
    }

    /// Decode the body as JSON.
    pub(crate) async fn json<T: DeserializeOwned>(
        self,
        response: Response,
    ) -> Result<T, RemoteCallError> {
        let bytes = response.bytes().await.map_err(|e| self.error(e))?;
        serde_json::from_slice(&bytes).map_err(|e| self.error(e))
    }
}
