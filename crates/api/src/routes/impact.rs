//! Route definitions for the `/impact` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::impact;
use crate::state::AppState;

/// Routes mounted at `/impact`.
///
/// ```text
/// GET    /                 -> get_impact_totals
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(impact::get_impact_totals))
}
