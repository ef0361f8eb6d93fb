//! WebSocket connection state, registry, frame handling, and session loop.

pub mod connection;
pub mod handler;
pub mod registry;
pub mod session;
