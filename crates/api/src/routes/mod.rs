//! Route tree assembly.

pub mod health;
pub mod impact;
pub mod notification;
pub mod repair;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws                WebSocket (token via query parameter)
/// /repairs           repair request lifecycle
/// /notifications     persisted notification mailbox
/// /impact            carbon / points totals
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/repairs", repair::router())
        .nest("/notifications", notification::router())
        .nest("/impact", impact::router())
}
