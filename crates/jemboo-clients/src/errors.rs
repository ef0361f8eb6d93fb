//! Error types for remote calls and catalog loading.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Longest error body kept on a [`RemoteErrorKind::Status`].
const MAX_ERROR_BODY: usize = 256;

/// Remote service a call was made to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Service {
    /// Conversation context store.
    Context,
    /// Detection service.
    Detection,
    /// Suggestion service.
    Suggestion,
}

impl Service {
    /// Label used in logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Detection => "detection",
            Self::Suggestion => "suggestion",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed call to a remote service.
#[derive(Debug, Error)]
#[error("{service} {operation} failed: {kind}")]
pub struct RemoteCallError {
    /// Service called.
    pub service: Service,
    /// Operation name (e.g. `create`, `fetch_items`).
    pub operation: &'static str,
    /// What went wrong.
    #[source]
    pub kind: RemoteErrorKind,
}

/// Failure classes for a remote call.
#[derive(Debug, Error)]
pub enum RemoteErrorKind {
    /// Transport failure or timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// A required response header was absent.
    #[error("missing response header {0}")]
    MissingHeader(&'static str),

    /// A response header could not be interpreted.
    #[error("invalid response header {0}")]
    InvalidHeader(&'static str),

    /// Response body was not the expected JSON.
    #[error("undecodable response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RemoteCallError {
    /// Build an error for `service`/`operation`.
    pub fn new(
        service: Service,
        operation: &'static str,
        kind: impl Into<RemoteErrorKind>,
    ) -> Self {
        Self {
            service,
            operation,
            kind: kind.into(),
        }
    }

    /// HTTP status, when the service answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            RemoteErrorKind::Status { status, .. } => Some(*status),
            RemoteErrorKind::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Short label for metrics.
    #[must_use]
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            RemoteErrorKind::Http(_) => "http",
            RemoteErrorKind::Status { .. } => "status",
            RemoteErrorKind::MissingHeader(_) => "missing_header",
            RemoteErrorKind::InvalidHeader(_) => "invalid_header",
            RemoteErrorKind::Decode(_) => "decode",
        }
    }
}

impl RemoteErrorKind {
    /// Status error with a bounded body.
    #[must_use]
    pub fn status(status: u16, body: &str) -> Self {
        let body = match body.char_indices().nth(MAX_ERROR_BODY) {
            Some((cut, _)) => format!("{}...", &body[..cut]),
            None => body.to_owned(),
        };
        Self::Status { status, body }
    }
}

/// Failure loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// File could not be read.
    #[error("failed to read catalog {}: {source}", .path.display())]
    Io {
        /// Catalog path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// File was not a JSON array of products.
    #[error("failed to parse catalog {}: {source}", .path.display())]
    Json {
        /// Catalog path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_service_and_operation() {
        let err = RemoteCallError::new(
            Service::Suggestion,
            "fetch_items",
            RemoteErrorKind::MissingHeader("_id"),
        );
        assert_eq!(
            err.to_string(),
            "suggestion fetch_items failed: missing response header _id"
        );
        assert_eq!(err.kind_label(), "missing_header");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn status_is_exposed() {
        let err = RemoteCallError::new(
            Service::Context,
            "read",
            RemoteErrorKind::status(409, "conflict"),
        );
        assert_eq!(err.status(), Some(409));
        assert!(err.to_string().contains("409"));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(1000);
        let RemoteErrorKind::Status { body, .. } = RemoteErrorKind::status(500, &body) else {
            panic!("expected status kind");
        };
        assert_eq!(body.len(), MAX_ERROR_BODY + 3);
        assert!(body.ends_with("..."));
    }

    #[test]
    fn decode_from_serde() {
        let json_err = serde_json::from_str::<u8>("[]").unwrap_err();
        let err = RemoteCallError::new(Service::Detection, "fetch", json_err);
        assert_eq!(err.kind_label(), "decode");
        assert_eq!(err.service.as_str(), "detection");
    }

    #[test]
    fn catalog_error_names_path() {
        let err = CatalogError::Io {
            path: PathBuf::from("/srv/catalog.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("/srv/catalog.json"));
    }
}
