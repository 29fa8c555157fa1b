//! WebSocket upgrade handler.
//!
//! Clients connect to `/api/v1/ws?token=<jwt>`; the token is carried as a
//! query parameter because browser WebSocket clients cannot set an
//! `Authorization` header on the handshake.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use ecoloop_core::error::CoreError;
use ecoloop_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;
use crate::ws::manager::WsManager;

/// Query parameters for the WebSocket handshake.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// JWT access token identifying the connecting user.
    pub token: String,
}

/// HTTP handler that authenticates the handshake and upgrades to WebSocket.
///
/// After the upgrade the connection is registered with [`WsManager`] under
/// the authenticated user id and managed by two tasks (sender + receiver).
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let claims = validate_token(&query.token, &state.config.jwt)
        .map_err(|_| AppError::Core(CoreError::Unauthorized("Invalid or expired token".into())))?;

    let user_id = claims.sub;
    let role = claims.role;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state.ws_manager, user_id, role)))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `WsManager`, replacing any prior
///      binding for the user.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Processes inbound messages on the current task.
///   4. Unregisters on disconnect, keyed by conn_id so a reconnect's fresh
///      binding survives the old connection's teardown.
async fn handle_socket(socket: WebSocket, ws_manager: Arc<WsManager>, user_id: DbId, role: String) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(user_id, conn_id = %conn_id, role = %role, "WebSocket connected");

    // Register and get the receiver for outbound messages.
    let mut rx = ws_manager.register(user_id, conn_id.clone(), role).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // Receiver loop: the protocol is push-only, so inbound traffic is
    // limited to control frames.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_msg) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: keyed unregister and abort the sender task.
    ws_manager.unregister(user_id, &conn_id).await;
    send_task.abort();
    tracing::info!(user_id, conn_id = %conn_id, "WebSocket disconnected");
}
