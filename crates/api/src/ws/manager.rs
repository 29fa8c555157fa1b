//! Per-user WebSocket connection registry.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};

use ecoloop_core::types::{DbId, Timestamp};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Unique id of this connection, used for keyed removal: an
    /// `unregister` carrying a stale conn_id must not tear down a newer
    /// binding for the same user.
    pub conn_id: String,
    /// Role the connection authenticated with (`"user"` / `"technician"`).
    pub role: String,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
}

/// Registry of active WebSocket connections, at most one per user.
///
/// A reconnect from the same user replaces the prior binding
/// (last-writer-wins); the replaced handle is not closed and simply fails
/// sends into a dropped channel. Thread-safe via interior `RwLock`;
/// designed to be wrapped in `Arc`, constructed once at process start,
/// and injected through `AppState` so tests get isolated instances.
pub struct WsManager {
    connections: RwLock<HashMap<DbId, WsConnection>>,
}

impl WsManager {
    /// Create a new, empty connection registry.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection for a user, replacing any prior binding.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn register(
        &self,
        user_id: DbId,
        conn_id: String,
        role: String,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            conn_id,
            role,
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(user_id, conn);
        rx
    }

    /// Remove a user's binding, but only if it still belongs to `conn_id`.
    ///
    /// Guards the register/unregister race on reconnect: the old
    /// connection's teardown must not remove the binding a newer
    /// connection just installed.
    pub async fn unregister(&self, user_id: DbId, conn_id: &str) {
        let mut conns = self.connections.write().await;
        if conns.get(&user_id).is_some_and(|c| c.conn_id == conn_id) {
            conns.remove(&user_id);
        }
    }

    /// Send a message to a user's active connection, if any.
    ///
    /// Silently drops the message when the user has no binding or the
    /// channel is closed; fan-out is best-effort and never blocks.
    /// Returns `true` if the message was handed to a live channel.
    pub async fn send_to_user(&self, user_id: DbId, message: Message) -> bool {
        let conns = self.connections.read().await;
        match conns.get(&user_id) {
            Some(conn) => conn.sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Send a message to every connection tagged with `role`.
    ///
    /// Used for discovery-style events (new repair requests go to all
    /// technician sessions). Returns the number of connections the
    /// message was sent to.
    pub async fn send_to_role(&self, role: &str, message: Message) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values() {
            if conn.role == role && conn.sender.send(message.clone()).is_ok() {
                count += 1;
            }
        }
        count
    }

    /// Broadcast a message to all connected clients regardless of role.
    ///
    /// Connections whose send channels are closed are silently skipped
    /// (they will be cleaned up on their next receive loop iteration).
    pub async fn broadcast(&self, message: Message) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(message.clone());
        }
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Ping frame to every connected client, pruning any whose
    /// channel has closed. Returns the number of pruned entries.
    pub async fn ping_all(&self) -> usize {
        let mut conns = self.connections.write().await;
        let before = conns.len();
        conns.retain(|_, conn| conn.sender.send(Message::Ping(Bytes::new())).is_ok());
        before - conns.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops accepting new connections.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
