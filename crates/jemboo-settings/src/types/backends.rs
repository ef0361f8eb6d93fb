//! Remote service endpoints.

use serde::{Deserialize, Serialize};

/// Base URLs and timeout for the context, detection and suggestion services.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendSettings {
    /// Context store collection URL.
    pub context_url: String,
    /// Detection service URL.
    pub detect_url: String,
    /// Suggestion service URL.
    pub suggest_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            context_url: "http://127.0.0.1:5000/context".to_string(),
            detect_url: "http://127.0.0.1:5001/detect".to_string(),
            suggest_url: "http://127.0.0.1:5002/suggest".to_string(),
            timeout_ms: 10_000,
        }
    }
}
