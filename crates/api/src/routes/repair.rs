//! Route definitions for the `/repairs` resource.
//!
//! All endpoints require authentication; the lifecycle is exposed only as
//! named transitions.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::repair;
use crate::state::AppState;

/// Routes mounted at `/repairs`.
///
/// ```text
/// POST   /                 -> create_repair_request
/// GET    /available        -> list_available       (technician)
/// GET    /mine             -> list_my_requests
/// GET    /assigned         -> list_assigned        (technician)
/// GET    /{id}             -> get_repair_request
/// POST   /{id}/accept      -> accept_repair_request (technician)
/// POST   /{id}/start       -> start_repair          (technician)
/// POST   /{id}/confirm     -> confirm_estimate
/// POST   /{id}/complete    -> complete_repair       (technician)
/// POST   /{id}/cancel      -> cancel_repair_request
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(repair::create_repair_request))
        .route("/available", get(repair::list_available))
        .route("/mine", get(repair::list_my_requests))
        .route("/assigned", get(repair::list_assigned))
        .route("/{id}", get(repair::get_repair_request))
        .route("/{id}/accept", post(repair::accept_repair_request))
        .route("/{id}/start", post(repair::start_repair))
        .route("/{id}/confirm", post(repair::confirm_estimate))
        .route("/{id}/complete", post(repair::complete_repair))
        .route("/{id}/cancel", post(repair::cancel_repair_request))
}
