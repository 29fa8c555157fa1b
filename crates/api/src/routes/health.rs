use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status: `ok` or `degraded`.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable.
    pub db_healthy: bool,
    /// Number of live WebSocket connections.
    pub ws_connections: usize,
}

/// GET /health -- service, database, and push-channel health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = ecoloop_db::health_check(&state.pool).await.is_ok();
    let ws_connections = state.ws_manager.connection_count().await;

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        ws_connections,
    })
}

/// Mounted at the root, outside `/api/v1`, so load balancers can probe
/// without a token.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
