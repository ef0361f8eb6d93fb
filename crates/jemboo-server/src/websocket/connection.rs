//! WebSocket client connection state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use jemboo_core::{ConnectionId, OutboundMessage};
use metrics::counter;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

use crate::metrics::WS_DROPPED_MESSAGES_TOTAL;

/// A connected WebSocket client, as seen by the session and the registry.
///
/// Outbound text goes through a bounded queue drained by the connection's
/// writer task; [`send`](Self::send) never blocks.
pub struct ClientConnection {
    /// Unique connection ID.
    pub id: ConnectionId,
    tx: mpsc::Sender<String>,
    /// When this connection was established.
    pub connected_at: Instant,
    is_alive: AtomicBool,
    last_pong: Mutex<Instant>,
    dropped_messages: AtomicU64,
}

impl ClientConnection {
    /// Create a new connection.
    pub fn new(id: ConnectionId, tx: mpsc::Sender<String>) -> Self {
        let now = Instant::now();
        Self {
            id,
            tx,
            connected_at: now,
            is_alive: AtomicBool::new(true),
            last_pong: Mutex::new(now),
            dropped_messages: AtomicU64::new(0),
        }
    }

    /// Queue raw text for the client.
    ///
    /// Returns `false` if the queue is full or closed, and counts the drop.
    pub fn send(&self, text: String) -> bool {
        if self.tx.try_send(text).is_ok() {
            true
        } else {
            let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
            counter!(WS_DROPPED_MESSAGES_TOTAL).increment(1);
            false
        }
    }

    /// Serialize and queue a protocol message.
    pub fn send_message(&self, message: &OutboundMessage) -> bool {
        match serde_json::to_string(message) {
            Ok(json) => {
                let sent = self.send(json);
                if !sent {
                    warn!(
                        connection_id = %self.id,
                        message_type = message.message_type(),
                        "outbound queue full or closed, message dropped"
                    );
                }
                sent
            }
            Err(e) => {
                warn!(connection_id = %self.id, error = %e, "failed to serialize outbound message");
                false
            }
        }
    }

    /// Total messages dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Record a pong (or any liveness signal).
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
        *self.last_pong.lock() = Instant::now();
    }

    /// Time since the last pong, or since connect.
    pub fn last_pong_elapsed(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }

    /// Read and reset the alive flag. `true` if the client answered since the last check.
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
