//! `JembooServer`: Axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use jemboo_core::ConnectionId;
use metrics::counter;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::metrics::WS_REJECTED_TOTAL;
use crate::session::{ConnectParams, MessageDispatcher};
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::registry::ConnectionRegistry;
use crate::websocket::session::run_ws_session;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Message dispatcher shared by every session.
    pub dispatcher: Arc<MessageDispatcher>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// One permit per session, taken before the upgrade.
    pub slots: Arc<Semaphore>,
    /// Prometheus handle rendered on `/metrics`.
    pub metrics: PrometheusHandle,
    /// When the server started.
    pub start_time: Instant,
}

/// The gateway server.
pub struct JembooServer {
    config: Arc<ServerConfig>,
    dispatcher: Arc<MessageDispatcher>,
    shutdown: Arc<ShutdownCoordinator>,
    slots: Arc<Semaphore>,
    metrics: PrometheusHandle,
    start_time: Instant,
}

impl JembooServer {
    /// Create a new server.
    pub fn new(
        config: ServerConfig,
        dispatcher: Arc<MessageDispatcher>,
        metrics: PrometheusHandle,
    ) -> Self {
        let slots = Semaphore::new(config.max_connections.min(Semaphore::MAX_PERMITS));
        Self {
            config: Arc::new(config),
            dispatcher,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            slots: Arc::new(slots),
            metrics,
            start_time: Instant::now(),
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            config: self.config.clone(),
            dispatcher: self.dispatcher.clone(),
            shutdown: self.shutdown.clone(),
            slots: self.slots.clone(),
            metrics: self.metrics.clone(),
            start_time: self.start_time,
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .route("/ws", get(ws_handler))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Bind the configured address and serve until shutdown.
    ///
    /// Returns the bound address (useful with port `0`) and the server task.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        let addr = listener.local_addr()?;
        let app = self.router();
        let token = self.shutdown.token();

        info!(%addr, "jemboo gateway listening");
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await;
            if let Err(e) = result {
                error!(error = %e, "server error");
            }
        });
        Ok((addr, handle))
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the connection registry.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        self.dispatcher.registry()
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connections = state.dispatcher.registry().connection_count().await;
    Json(health::health_check(state.start_time, connections))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.render()
}

/// GET /ws: upgrade to a session.
///
/// A slot is reserved before upgrading and released when the session ends,
/// so concurrent upgrades cannot overshoot `max_connections`.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> Response {
    let Ok(slot) = Arc::clone(&state.slots).try_acquire_owned() else {
        warn!(limit = state.config.max_connections, "connection limit reached");
        counter!(WS_REJECTED_TOTAL).increment(1);
        return (StatusCode::SERVICE_UNAVAILABLE, "connection limit reached").into_response();
    };

    let session = params.into_session(ConnectionId::generate(), &state.config);
    let config = ServerConfig::clone(&state.config);
    let token = state.shutdown.child_token();
    let dispatcher = state.dispatcher;
    ws.max_message_size(config.max_message_size)
        .on_upgrade(move |socket| async move {
            run_ws_session(socket, session, dispatcher, config, token).await;
            drop(slot);
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Backends;
    use axum::body::Body;
    use axum::http::Request;
    use jemboo_clients::{HttpContextClient, HttpDetectionClient, HttpSuggestionClient, JsonCatalog};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    fn make_server(config: ServerConfig) -> JembooServer {
        let http = reqwest::Client::new();
        let backends = Backends {
            context: Arc::new(HttpContextClient::new(http.clone(), "http://127.0.0.1:9/context")),
            detection: Arc::new(HttpDetectionClient::new(http.clone(), "http://127.0.0.1:9/detect")),
            suggestion: Arc::new(HttpSuggestionClient::new(http, "http://127.0.0.1:9/suggest")),
        };
        let dispatcher = MessageDispatcher::new(
            backends,
            Arc::new(JsonCatalog::default()),
            Arc::new(ConnectionRegistry::new()),
        );
        let handle = PrometheusBuilder::new().build_recorder().handle();
        JembooServer::new(config, Arc::new(dispatcher), handle)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn accessors() {
        let server = make_server(ServerConfig::default());
        assert_eq!(server.config().host, "127.0.0.1");
        assert_eq!(server.registry().connection_count().await, 0);
        assert!(!server.shutdown().is_shutting_down());
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let app = make_server(ServerConfig::default()).router();

        let resp = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), 10_000)
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["connections"], 0);
        assert!(parsed["uptime_secs"].is_number());
    }

    #[tokio::test]
    async fn metrics_endpoint_renders_text() {
        let app = make_server(ServerConfig::default()).router();
        let resp = app.oneshot(get("/metrics")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ws_without_upgrade_is_rejected() {
        let app = make_server(ServerConfig::default()).router();
        let resp = app
            .oneshot(get("/ws?application_id=app&session_id=sess"))
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = make_server(ServerConfig::default()).router();
        let resp = app.oneshot(get("/nonexistent")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn listen_binds_ephemeral_port_and_stops() {
        let server = make_server(ServerConfig::default());
        let (addr, handle) = server.listen().await.unwrap();
        assert_ne!(addr.port(), 0);

        server.shutdown().shutdown();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
