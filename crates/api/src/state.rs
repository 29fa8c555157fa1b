use std::sync::Arc;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
/// The WebSocket registry and event bus are injected here rather than living
/// in module-level statics so tests can instantiate isolated copies.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: ecoloop_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection registry (one binding per user).
    pub ws_manager: Arc<WsManager>,
    /// In-process event bus carrying lifecycle events to the fan-out layer.
    pub event_bus: Arc<ecoloop_events::EventBus>,
}
