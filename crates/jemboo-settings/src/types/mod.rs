//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a settings
//! file may contain any subset of fields; the rest keep their defaults.

mod backends;
mod server;

pub use backends::*;
pub use server::*;

use jemboo_core::LogFormat;
use serde::{Deserialize, Serialize};

/// Root settings type for the gateway.
///
/// ```json
/// {
///   "server": { "port": 9000 },
///   "backends": { "contextUrl": "http://context.internal/context" },
///   "session": { "defaultPageSize": 40 }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JembooSettings {
    /// Listener and WebSocket transport.
    pub server: ServerSettings,
    /// Remote services.
    pub backends: BackendSettings,
    /// Per-session defaults.
    pub session: SessionSettings,
    /// Product catalog source.
    pub catalog: CatalogSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

/// Defaults applied when a client does not supply them on connect.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// Suggestions per page.
    pub default_page_size: u32,
    /// Locale for clients that do not send one.
    pub default_locale: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            default_locale: "en".to_string(),
        }
    }
}

/// Product catalog source.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogSettings {
    /// JSON file holding an array of products. No catalog when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Minimum log level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace-level (most verbose).
    Trace,
    /// Debug-level.
    Debug,
    /// Info-level (default).
    #[default]
    Info,
    /// Warning-level.
    Warn,
    /// Error-level.
    Error,
}

impl LogLevel {
    /// Convert to a tracing filter string.
    pub fn as_filter_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level. `RUST_LOG` overrides it.
    pub level: LogLevel,
    /// Line format.
    pub format: LogFormat,
}
