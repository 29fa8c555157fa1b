//! Handlers for the `/impact` resource and the shared impact-crediting
//! mechanism used by repair completion.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use ecoloop_core::error::CoreError;
use ecoloop_core::impact::points_for_carbon;
use ecoloop_core::notify::KIND_ACHIEVEMENT;
use ecoloop_core::types::DbId;
use ecoloop_db::models::user::ImpactTotals;
use ecoloop_db::repositories::{NotificationRepo, UserRepo};
use ecoloop_events::{DomainEvent, EVENT_IMPACT_RECORDED};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Credit a carbon saving to a user's running totals.
///
/// Points derive from the saving at a fixed rate; both counters are
/// incremented by a single SQL statement so concurrent completions never
/// lose an update. Persists an achievement notification and publishes the
/// new totals to the user.
pub async fn credit_carbon_saved(
    state: &AppState,
    user_id: DbId,
    carbon_saved_kg: f64,
) -> AppResult<ImpactTotals> {
    let points = points_for_carbon(carbon_saved_kg);

    let totals = UserRepo::credit_impact(&state.pool, user_id, carbon_saved_kg, points)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))?;

    NotificationRepo::create(
        &state.pool,
        user_id,
        "Environmental impact recorded",
        &format!(
            "You saved {carbon_saved_kg:.2} kg of CO2 and earned {points} points. \
             Total: {:.2} kg, {} points",
            totals.total_carbon_saved_kg, totals.points
        ),
        KIND_ACHIEVEMENT,
    )
    .await?;

    let event = DomainEvent::new(EVENT_IMPACT_RECORDED)
        .with_target(user_id)
        .with_payload(serde_json::json!({
            "carbon_saved_kg": carbon_saved_kg,
            "points_earned": points,
            "total_carbon_saved_kg": totals.total_carbon_saved_kg,
            "total_points": totals.points,
        }));
    state.event_bus.publish(event);

    tracing::info!(user_id, carbon_saved_kg, points, "Impact credited");

    Ok(totals)
}

/// GET /api/v1/impact
///
/// The caller's running carbon and points totals.
pub async fn get_impact_totals(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let totals = UserRepo::impact_totals(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;

    Ok(Json(DataResponse { data: totals }))
}
