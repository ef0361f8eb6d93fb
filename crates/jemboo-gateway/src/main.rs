//! # jemboo-gateway
//!
//! Jemboo gateway binary: loads settings, wires the backend clients and the
//! product catalog into the session server, and serves until ctrl-c.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use jemboo_clients::{
    Catalog, HttpContextClient, HttpDetectionClient, HttpSuggestionClient, JsonCatalog,
    build_http_client,
};
use jemboo_server::metrics::install_recorder;
use jemboo_server::{Backends, ConnectionRegistry, JembooServer, MessageDispatcher, ServerConfig};
use jemboo_settings::JembooSettings;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{info, warn};

/// Jemboo WebSocket session gateway.
#[derive(Parser, Debug)]
#[command(name = "jemboo-gateway", about = "Jemboo WebSocket session gateway")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Settings file (default `~/.jemboo/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Product catalog JSON file (overrides settings).
    #[arg(long)]
    catalog: Option<PathBuf>,
}

impl Cli {
    fn settings_path(&self) -> PathBuf {
        self.settings
            .clone()
            .unwrap_or_else(jemboo_settings::settings_path)
    }

    /// Flags win over the settings file and env.
    fn apply(&self, settings: &mut JembooSettings) {
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(path) = &self.catalog {
            settings.catalog.path = Some(path.to_string_lossy().into_owned());
        }
    }
}

fn build_backends(settings: &JembooSettings) -> Result<Backends> {
    let http = build_http_client(Duration::from_millis(settings.backends.timeout_ms))
        .context("Failed to build HTTP client")?;
    let urls = &settings.backends;
    Ok(Backends {
        context: Arc::new(HttpContextClient::new(http.clone(), urls.context_url.clone())),
        detection: Arc::new(HttpDetectionClient::new(http.clone(), urls.detect_url.clone())),
        suggestion: Arc::new(HttpSuggestionClient::new(http, urls.suggest_url.clone())),
    })
}

/// Load the product catalog. Without one, every suggestion is dropped.
fn load_catalog(path: Option<&str>) -> Arc<dyn Catalog> {
    let Some(path) = path else {
        warn!("no catalog configured, suggestions will be empty");
        return Arc::new(JsonCatalog::default());
    };
    match JsonCatalog::load(Path::new(path)) {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            warn!(error = %e, "failed to load catalog, suggestions will be empty");
            Arc::new(JsonCatalog::default())
        }
    }
}

fn build_server(settings: &JembooSettings, metrics: PrometheusHandle) -> Result<JembooServer> {
    let backends = build_backends(settings)?;
    let catalog = load_catalog(settings.catalog.path.as_deref());
    let dispatcher = MessageDispatcher::new(backends, catalog, Arc::new(ConnectionRegistry::new()));
    Ok(JembooServer::new(
        ServerConfig::from_settings(settings),
        Arc::new(dispatcher),
        metrics,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings_path = cli.settings_path();
    // Loading may warn about rejected env overrides before logging is configured.
    let mut settings = jemboo_core::logging::with_bootstrap_subscriber(|| {
        jemboo_settings::load_settings_from_path(&settings_path)
    })
    .with_context(|| format!("Failed to load settings: {}", settings_path.display()))?;
    cli.apply(&mut settings);

    jemboo_core::logging::init_subscriber(
        settings.logging.level.as_filter_str(),
        settings.logging.format,
    );
    let metrics = install_recorder().context("Failed to install metrics recorder")?;

    let server = build_server(&settings, metrics)?;
    let (addr, handle) = server.listen().await.context("Failed to bind server")?;
    info!(
        %addr,
        context_url = %settings.backends.context_url,
        detect_url = %settings.backends.detect_url,
        suggest_url = %settings.backends.suggest_url,
        "jemboo gateway started"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    info!("shutting down");
    server.shutdown().graceful_shutdown(vec![handle], None).await;
    Ok(())
}
