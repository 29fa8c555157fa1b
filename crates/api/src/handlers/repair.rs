//! Handlers for the `/repairs` resource.
//!
//! The lifecycle is exposed only through named transition endpoints; there
//! is no generic status-setting route. Every transition follows the same
//! sequence: persist the state change, insert the notification row, then
//! publish the domain event. A failed persist therefore produces neither a
//! notification nor an event.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use ecoloop_core::error::CoreError;
use ecoloop_core::notify::{
    KIND_REPAIR_CONFIRMED, KIND_REPAIR_ESTIMATE, KIND_REPAIR_REQUEST, KIND_REPAIR_UPDATE,
    KIND_STATUS_UPDATE,
};
use ecoloop_core::repair::{validate_accept_fields, validate_estimate, validate_new_request};
use ecoloop_core::roles::ROLE_TECHNICIAN;
use ecoloop_core::types::DbId;
use ecoloop_db::models::repair_request::{
    AcceptRepairRequest, CompleteRepair, CreateRepairRequest, RepairRequest, StartRepair,
};
use ecoloop_db::repositories::{NotificationRepo, RepairRequestRepo};
use ecoloop_events::{DomainEvent, EVENT_NEW_REPAIR_REQUEST, EVENT_REPAIR_STATUS_UPDATE};

use crate::error::{AppError, AppResult};
use crate::handlers::impact::credit_carbon_saved;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireTechnician, RequireUser};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Explain why a conditional lifecycle update matched no row.
///
/// The repositories fold the state guard into the UPDATE itself, so a miss
/// is ambiguous: the record may not exist, the caller may not be the right
/// party, or the record is in the wrong state. One follow-up read settles
/// it. `expected` names the state the transition needed, for the message.
async fn explain_transition_miss(
    pool: &sqlx::PgPool,
    id: DbId,
    required_party: Option<DbId>,
    party_of: fn(&RepairRequest) -> Option<DbId>,
    expected: &str,
) -> AppError {
    match RepairRequestRepo::find_by_id(pool, id).await {
        Ok(Some(record)) => {
            if let Some(required) = required_party {
                let actual = party_of(&record);
                if actual.is_some() && actual != Some(required) {
                    return AppError::Core(CoreError::Forbidden(
                        "Not a party to this repair request".to_string(),
                    ));
                }
            }
            AppError::Core(CoreError::InvalidState(format!(
                "Repair request is {} but {expected} is required",
                record.status
            )))
        }
        Ok(None) => AppError::Core(CoreError::NotFound {
            entity: "Repair request",
            id,
        }),
        Err(e) => AppError::Database(e),
    }
}

/// Publish the current record to both parties after a successful transition.
fn publish_status_update(state: &AppState, record: &RepairRequest) {
    let event = DomainEvent::new(EVENT_REPAIR_STATUS_UPDATE)
        .with_target(record.user_id)
        .with_target_opt(record.technician_id)
        .with_payload(serde_json::json!(record));
    state.event_bus.publish(event);
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/v1/repairs
///
/// File a new repair request. Customer role only; returns 201 with the
/// created record. Technicians currently online are notified over
/// WebSocket so they can claim the job.
pub async fn create_repair_request(
    RequireUser(auth): RequireUser,
    State(state): State<AppState>,
    Json(input): Json<CreateRepairRequest>,
) -> AppResult<impl IntoResponse> {
    validate_new_request(&input.device_type, &input.description, &input.customer_address)?;

    let record = RepairRequestRepo::create(
        &state.pool,
        auth.user_id,
        &input.device_type,
        &input.description,
        &input.customer_address,
    )
    .await?;

    NotificationRepo::create(
        &state.pool,
        auth.user_id,
        "Repair request submitted",
        &format!(
            "Your repair request for {} has been submitted and is awaiting a technician",
            record.device_type
        ),
        KIND_REPAIR_REQUEST,
    )
    .await?;

    let event = DomainEvent::new(EVENT_NEW_REPAIR_REQUEST)
        .with_target(auth.user_id)
        .with_audience_role(ROLE_TECHNICIAN)
        .with_payload(serde_json::json!(record));
    state.event_bus.publish(event);

    tracing::info!(
        repair_id = record.id,
        user_id = auth.user_id,
        device_type = %record.device_type,
        "Repair request created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: record })))
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// GET /api/v1/repairs/available
///
/// All unclaimed requests, newest first. Technicians only.
pub async fn list_available(
    RequireTechnician(_auth): RequireTechnician,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let records = RepairRequestRepo::list_available(&state.pool).await?;
    Ok(Json(DataResponse { data: records }))
}

/// GET /api/v1/repairs/mine
///
/// The caller's own requests, newest first.
pub async fn list_my_requests(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let records = RepairRequestRepo::list_by_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: records }))
}

/// GET /api/v1/repairs/assigned
///
/// Requests assigned to the calling technician, newest first.
pub async fn list_assigned(
    RequireTechnician(auth): RequireTechnician,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let records = RepairRequestRepo::list_by_technician(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: records }))
}

/// GET /api/v1/repairs/{id}
///
/// Fetch a single request. Only the owner or the assigned technician may
/// view it.
pub async fn get_repair_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let record = RepairRequestRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Repair request",
            id,
        }))?;

    let is_party =
        record.user_id == auth.user_id || record.technician_id == Some(auth.user_id);
    // Unassigned requests are visible to technicians browsing for work.
    let is_browsing_technician =
        record.technician_id.is_none() && auth.role == ROLE_TECHNICIAN;
    if !is_party && !is_browsing_technician {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not a party to this repair request".to_string(),
        )));
    }

    Ok(Json(DataResponse { data: record }))
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// POST /api/v1/repairs/{id}/accept
///
/// Claim a pending request. The status guard in the UPDATE makes this
/// first-writer-wins: under concurrent accepts exactly one technician gets
/// the assignment and the rest receive 409.
pub async fn accept_repair_request(
    RequireTechnician(auth): RequireTechnician,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AcceptRepairRequest>,
) -> AppResult<impl IntoResponse> {
    validate_accept_fields(
        &input.pickup_address,
        &input.technician_phone,
        &input.technician_email,
    )?;

    let Some(record) = RepairRequestRepo::accept(&state.pool, id, auth.user_id, &input).await?
    else {
        return Err(explain_transition_miss(&state.pool, id, None, |_| None, "PENDING").await);
    };

    let pickup_date = input.pickup_date.format("%Y-%m-%d %H:%M UTC");
    NotificationRepo::create(
        &state.pool,
        record.user_id,
        "Repair request accepted",
        &format!(
            "A technician will pick up your {} on {pickup_date} at {}. \
             Contact: {} / {}",
            record.device_type, input.pickup_address, input.technician_phone,
            input.technician_email,
        ),
        KIND_REPAIR_UPDATE,
    )
    .await?;

    publish_status_update(&state, &record);

    tracing::info!(
        repair_id = record.id,
        technician_id = auth.user_id,
        "Repair request accepted",
    );

    Ok(Json(DataResponse { data: record }))
}

/// POST /api/v1/repairs/{id}/start
///
/// Begin work on an accepted request. An estimate supplied here overwrites
/// any previous one and asks the customer for confirmation.
pub async fn start_repair(
    RequireTechnician(auth): RequireTechnician,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<StartRepair>,
) -> AppResult<impl IntoResponse> {
    if let Some(cost) = input.estimated_cost {
        validate_estimate(cost)?;
    }

    let Some(record) =
        RepairRequestRepo::start(&state.pool, id, auth.user_id, input.estimated_cost).await?
    else {
        return Err(explain_transition_miss(
            &state.pool,
            id,
            Some(auth.user_id),
            |r| r.technician_id,
            "ACCEPTED",
        )
        .await);
    };

    if let Some(cost) = input.estimated_cost {
        NotificationRepo::create(
            &state.pool,
            record.user_id,
            "Repair estimate",
            &format!(
                "Repair of your {} has started. Estimated cost: {cost:.2}. \
                 Please confirm the estimate to proceed",
                record.device_type
            ),
            KIND_REPAIR_ESTIMATE,
        )
        .await?;
    } else {
        NotificationRepo::create(
            &state.pool,
            record.user_id,
            "Repair started",
            &format!("Repair of your {} is now in progress", record.device_type),
            KIND_STATUS_UPDATE,
        )
        .await?;
    }

    publish_status_update(&state, &record);

    tracing::info!(
        repair_id = record.id,
        technician_id = auth.user_id,
        estimated_cost = ?input.estimated_cost,
        "Repair started",
    );

    Ok(Json(DataResponse { data: record }))
}

/// POST /api/v1/repairs/{id}/confirm
///
/// Customer confirms an outstanding cost estimate. Fails with 409 when no
/// estimate has been supplied.
pub async fn confirm_estimate(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let Some(record) = RepairRequestRepo::confirm_estimate(&state.pool, id, auth.user_id).await?
    else {
        // The statement also guards on estimated_cost, so an in-progress
        // record owned by the caller can still miss; call that out.
        let err = match RepairRequestRepo::find_by_id(&state.pool, id).await? {
            None => CoreError::NotFound {
                entity: "Repair request",
                id,
            },
            Some(r) if r.user_id != auth.user_id => {
                CoreError::Forbidden("Not a party to this repair request".to_string())
            }
            Some(r) if r.estimated_cost.is_none() => {
                CoreError::InvalidState("No estimate to confirm".to_string())
            }
            Some(r) => CoreError::InvalidState(format!(
                "Repair request is {} but IN_PROGRESS is required",
                r.status
            )),
        };
        return Err(AppError::Core(err));
    };

    if let Some(technician_id) = record.technician_id {
        NotificationRepo::create(
            &state.pool,
            technician_id,
            "Estimate confirmed",
            &format!(
                "The customer confirmed the estimate for repair request #{}",
                record.id
            ),
            KIND_REPAIR_CONFIRMED,
        )
        .await?;
    }

    publish_status_update(&state, &record);

    tracing::info!(repair_id = record.id, user_id = auth.user_id, "Estimate confirmed");

    Ok(Json(DataResponse { data: record }))
}

/// POST /api/v1/repairs/{id}/complete
///
/// Finish a repair. A supplied carbon saving is credited to the customer's
/// running totals in the same request.
pub async fn complete_repair(
    RequireTechnician(auth): RequireTechnician,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CompleteRepair>,
) -> AppResult<impl IntoResponse> {
    if let Some(kg) = input.carbon_saved_kg {
        ecoloop_core::impact::validate_carbon_saved(kg)?;
    }

    let Some(record) = RepairRequestRepo::complete(&state.pool, id, auth.user_id).await? else {
        return Err(explain_transition_miss(
            &state.pool,
            id,
            Some(auth.user_id),
            |r| r.technician_id,
            "IN_PROGRESS or ESTIMATE_CONFIRMED",
        )
        .await);
    };

    NotificationRepo::create(
        &state.pool,
        record.user_id,
        "Repair completed",
        &format!("Repair of your {} has been completed", record.device_type),
        KIND_STATUS_UPDATE,
    )
    .await?;

    publish_status_update(&state, &record);

    if let Some(kg) = input.carbon_saved_kg {
        credit_carbon_saved(&state, record.user_id, kg).await?;
    }

    tracing::info!(
        repair_id = record.id,
        technician_id = auth.user_id,
        carbon_saved_kg = ?input.carbon_saved_kg,
        "Repair completed",
    );

    Ok(Json(DataResponse { data: record }))
}

/// POST /api/v1/repairs/{id}/cancel
///
/// Cancel a request from any non-terminal state. Either party may cancel;
/// the other party is notified when one exists.
pub async fn cancel_repair_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    // Party check runs before the mutation so a stranger cannot cancel.
    let existing = RepairRequestRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Repair request",
            id,
        }))?;
    if existing.user_id != auth.user_id && existing.technician_id != Some(auth.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not a party to this repair request".to_string(),
        )));
    }

    let Some(record) = RepairRequestRepo::cancel(&state.pool, id).await? else {
        return Err(AppError::Core(CoreError::InvalidState(format!(
            "Repair request is {} and can no longer be cancelled",
            existing.status
        ))));
    };

    // Notify the party that did not initiate the cancellation.
    let other_party = if auth.user_id == record.user_id {
        record.technician_id
    } else {
        Some(record.user_id)
    };
    if let Some(other) = other_party {
        NotificationRepo::create(
            &state.pool,
            other,
            "Repair cancelled",
            &format!("Repair request #{} has been cancelled", record.id),
            KIND_STATUS_UPDATE,
        )
        .await?;
    }

    publish_status_update(&state, &record);

    tracing::info!(repair_id = record.id, cancelled_by = auth.user_id, "Repair cancelled");

    Ok(Json(DataResponse { data: record }))
}
