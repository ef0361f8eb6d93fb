//! # jemboo-server
//!
//! Axum HTTP + `WebSocket` gateway for Jemboo chat sessions.
//!
//! - `WebSocket` gateway: one sequential task per connection, bounded outbound
//!   queue, heartbeat pings
//! - Session protocol: context binding, message turns, suggestion pagination,
//!   product feedback
//! - Suggestion composition against the product catalog
//! - HTTP endpoints: health check, Prometheus metrics
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod metrics;
pub mod server;
pub mod session;
pub mod shutdown;
pub mod websocket;

pub use config::ServerConfig;
pub use server::JembooServer;
pub use session::{Backends, MessageDispatcher, ReplyInterpreter, SilentInterpreter};
pub use shutdown::ShutdownCoordinator;
pub use websocket::registry::ConnectionRegistry;
