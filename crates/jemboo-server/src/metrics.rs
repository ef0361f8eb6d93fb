//! Prometheus metrics recorder and metric names.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the handle used to render `/metrics`. Call once at startup,
/// before any metric is recorded.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// WebSocket connections opened total (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// WebSocket disconnections total (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Active WebSocket connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// Connection lifetime (histogram).
pub const WS_CONNECTION_DURATION_SECONDS: &str = "ws_connection_duration_seconds";
/// Upgrades refused at the connection cap (counter).
pub const WS_REJECTED_TOTAL: &str = "ws_rejected_total";
/// Outbound messages dropped on a full queue (counter).
pub const WS_DROPPED_MESSAGES_TOTAL: &str = "ws_dropped_messages_total";
/// Inbound messages handled (counter, labels: type).
pub const SESSION_MESSAGES_TOTAL: &str = "session_messages_total";
/// Failed inbound messages (counter, labels: kind).
pub const SESSION_ERRORS_TOTAL: &str = "session_errors_total";
/// Handler duration (histogram, labels: type).
pub const SESSION_MESSAGE_DURATION_SECONDS: &str = "session_message_duration_seconds";
/// Suggestion entries dropped for lack of a catalog product (counter).
pub const COMPOSER_MISSING_PRODUCTS_TOTAL: &str = "composer_missing_products_total";
