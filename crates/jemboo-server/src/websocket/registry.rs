//! Process-wide map of live connections.

use std::collections::HashMap;
use std::sync::Arc;

use jemboo_core::ConnectionId;
use tokio::sync::RwLock;
use tracing::debug;

use super::connection::ClientConnection;

/// Live connections keyed by connection id.
///
/// Each session task inserts its connection on open and removes it on close.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, Arc<ClientConnection>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. An existing entry with the same id is replaced.
    pub async fn add(&self, connection: Arc<ClientConnection>) {
        let mut conns = self.connections.write().await;
        if conns.insert(connection.id.clone(), connection).is_some() {
            debug!("replaced existing connection entry");
        }
    }

    /// Remove a connection. Returns whether it was present.
    pub async fn remove(&self, connection_id: &ConnectionId) -> bool {
        self.connections
            .write()
            .await
            .remove(connection_id)
            .is_some()
    }

    /// Look up a connection.
    pub async fn get(&self, connection_id: &ConnectionId) -> Option<Arc<ClientConnection>> {
        self.connections.read().await.get(connection_id).cloned()
    }

    /// Number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}
