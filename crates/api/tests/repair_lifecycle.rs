//! HTTP-level integration tests for the repair request lifecycle.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router.
//! Users are created via the repository layer; everything else goes through
//! the HTTP API so the full middleware and auth stack is exercised.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, build_test_app_with_state, get_auth, post_json_auth, seed_technician,
    seed_user, token_for,
};
use ecoloop_core::roles::{ROLE_TECHNICIAN, ROLE_USER};
use ecoloop_db::models::repair_request::AcceptRepairRequest;
use ecoloop_db::repositories::{NotificationRepo, RepairRequestRepo};
use serde_json::json;
use sqlx::PgPool;

fn create_body() -> serde_json::Value {
    json!({
        "device_type": "Laptop",
        "description": "Screen flickers and the battery drains in minutes",
        "customer_address": "12 Green Lane",
    })
}

fn accept_body() -> serde_json::Value {
    json!({
        "pickup_date": "2026-09-01T10:00:00Z",
        "pickup_address": "12 Green Lane",
        "technician_phone": "+49 30 1234567",
        "technician_email": "tech@ecoloop.example",
        "pickup_notes": "Ring twice",
    })
}

fn accept_input() -> AcceptRepairRequest {
    AcceptRepairRequest {
        pickup_date: "2026-09-01T10:00:00Z".parse().unwrap(),
        pickup_address: "12 Green Lane".to_string(),
        technician_phone: "+49 30 1234567".to_string(),
        technician_email: "tech@ecoloop.example".to_string(),
        pickup_notes: None,
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_starts_pending_and_unassigned(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let token = token_for(user.id, ROLE_USER);
    let app = build_test_app(pool);

    let response = post_json_auth(app, "/api/v1/repairs", create_body(), &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "PENDING");
    assert!(json["data"]["technician_id"].is_null());
    assert_eq!(json["data"]["user_id"], user.id);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_rejects_empty_fields(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let token = token_for(user.id, ROLE_USER);
    let app = build_test_app(pool);

    let body = json!({
        "device_type": "",
        "description": "broken",
        "customer_address": "12 Green Lane",
    });
    let response = post_json_auth(app, "/api/v1/repairs", body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_requires_customer_role(pool: PgPool) {
    let tech = seed_technician(&pool, "bob").await;
    let token = token_for(tech.id, ROLE_TECHNICIAN);
    let app = build_test_app(pool.clone());

    let response = post_json_auth(app, "/api/v1/repairs", create_body(), &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Nothing was inserted.
    assert!(RepairRequestRepo::list_by_user(&pool, tech.id)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_requires_auth(pool: PgPool) {
    let app = build_test_app(pool);
    let response = post_json_auth(app, "/api/v1/repairs", create_body(), "not-a-token").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_publishes_to_technician_audience(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let token = token_for(user.id, ROLE_USER);
    let (app, state) = build_test_app_with_state(pool);

    // Subscribe before the request so the event cannot be missed.
    let mut rx = state.event_bus.subscribe();

    let response = post_json_auth(app, "/api/v1/repairs", create_body(), &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let event = rx.try_recv().expect("expected a published event");
    assert_eq!(event.event_type, "NEW_REPAIR_REQUEST");
    assert_eq!(event.audience_role.as_deref(), Some(ROLE_TECHNICIAN));
    assert!(event.targets.contains(&user.id));
    assert_eq!(event.payload["device_type"], "Laptop");
}

// ---------------------------------------------------------------------------
// Accept
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_accept_assigns_technician(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let tech = seed_technician(&pool, "bob").await;
    let record = RepairRequestRepo::create(&pool, user.id, "Phone", "Cracked", "12 Green Lane")
        .await
        .unwrap();

    let token = token_for(tech.id, ROLE_TECHNICIAN);
    let app = build_test_app(pool.clone());

    let uri = format!("/api/v1/repairs/{}/accept", record.id);
    let response = post_json_auth(app, &uri, accept_body(), &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "ACCEPTED");
    assert_eq!(json["data"]["technician_id"], tech.id);
    assert_eq!(json["data"]["pickup_address"], "12 Green Lane");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_accept_requires_technician_role(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let record = RepairRequestRepo::create(&pool, user.id, "Phone", "Cracked", "12 Green Lane")
        .await
        .unwrap();

    let token = token_for(user.id, ROLE_USER);
    let app = build_test_app(pool);

    let uri = format!("/api/v1/repairs/{}/accept", record.id);
    let response = post_json_auth(app, &uri, accept_body(), &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_accept_missing_record_is_404(pool: PgPool) {
    let tech = seed_technician(&pool, "bob").await;
    let token = token_for(tech.id, ROLE_TECHNICIAN);
    let app = build_test_app(pool);

    let response = post_json_auth(app, "/api/v1/repairs/9999/accept", accept_body(), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_accept_persists_notification_with_pickup_details(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let tech = seed_technician(&pool, "bob").await;
    let record = RepairRequestRepo::create(&pool, user.id, "Phone", "Cracked", "12 Green Lane")
        .await
        .unwrap();

    let token = token_for(tech.id, ROLE_TECHNICIAN);
    let app = build_test_app(pool.clone());
    let uri = format!("/api/v1/repairs/{}/accept", record.id);
    let response = post_json_auth(app, &uri, accept_body(), &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let notifications = NotificationRepo::list_for_user(&pool, user.id, false, 50, 0)
        .await
        .unwrap();
    // Exactly one accept notification, carrying the pickup date and
    // technician contact details.
    let accept_notes: Vec<_> = notifications
        .iter()
        .filter(|n| n.kind == "REPAIR_UPDATE")
        .collect();
    assert_eq!(accept_notes.len(), 1);
    let note = accept_notes[0];
    assert!(note.message.contains("2026-09-01"));
    assert!(note.message.contains("+49 30 1234567"));
    assert!(note.message.contains("tech@ecoloop.example"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_concurrent_accepts_only_one_wins(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let tech_a = seed_technician(&pool, "bob").await;
    let tech_b = seed_technician(&pool, "carol").await;
    let record = RepairRequestRepo::create(&pool, user.id, "Phone", "Cracked", "12 Green Lane")
        .await
        .unwrap();

    let input = accept_input();
    let (a, b) = tokio::join!(
        RepairRequestRepo::accept(&pool, record.id, tech_a.id, &input),
        RepairRequestRepo::accept(&pool, record.id, tech_b.id, &input),
    );
    let a = a.unwrap();
    let b = b.unwrap();

    // First-writer-wins: exactly one claim succeeds.
    assert!(a.is_some() != b.is_some(), "exactly one accept must win");

    let current = RepairRequestRepo::find_by_id(&pool, record.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.status, "ACCEPTED");
    let winner = a.or(b).unwrap();
    assert_eq!(current.technician_id, winner.technician_id);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_accept_already_claimed_is_conflict(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let tech_a = seed_technician(&pool, "bob").await;
    let tech_b = seed_technician(&pool, "carol").await;
    let record = RepairRequestRepo::create(&pool, user.id, "Phone", "Cracked", "12 Green Lane")
        .await
        .unwrap();
    RepairRequestRepo::accept(&pool, record.id, tech_a.id, &accept_input())
        .await
        .unwrap()
        .expect("first accept should win");

    let token = token_for(tech_b.id, ROLE_TECHNICIAN);
    let app = build_test_app(pool);
    let uri = format!("/api/v1/repairs/{}/accept", record.id);
    let response = post_json_auth(app, &uri, accept_body(), &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_STATE");
}

// ---------------------------------------------------------------------------
// Start / estimate / confirm
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_confirm_without_estimate_is_conflict(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let tech = seed_technician(&pool, "bob").await;
    let record = RepairRequestRepo::create(&pool, user.id, "Phone", "Cracked", "12 Green Lane")
        .await
        .unwrap();
    RepairRequestRepo::accept(&pool, record.id, tech.id, &accept_input())
        .await
        .unwrap()
        .unwrap();
    // Start WITHOUT an estimate.
    RepairRequestRepo::start(&pool, record.id, tech.id, None)
        .await
        .unwrap()
        .unwrap();

    let token = token_for(user.id, ROLE_USER);
    let app = build_test_app(pool.clone());
    let uri = format!("/api/v1/repairs/{}/confirm", record.id);
    let response = post_json_auth(app, &uri, json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // No state change and no notification from the failed confirm.
    let current = RepairRequestRepo::find_by_id(&pool, record.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.status, "IN_PROGRESS");
    let tech_notes = NotificationRepo::list_for_user(&pool, tech.id, false, 50, 0)
        .await
        .unwrap();
    assert!(tech_notes.iter().all(|n| n.kind != "REPAIR_CONFIRMED"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_start_with_estimate_notifies_customer(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let tech = seed_technician(&pool, "bob").await;
    let record = RepairRequestRepo::create(&pool, user.id, "Phone", "Cracked", "12 Green Lane")
        .await
        .unwrap();
    RepairRequestRepo::accept(&pool, record.id, tech.id, &accept_input())
        .await
        .unwrap()
        .unwrap();

    let token = token_for(tech.id, ROLE_TECHNICIAN);
    let app = build_test_app(pool.clone());
    let uri = format!("/api/v1/repairs/{}/start", record.id);
    let response = post_json_auth(app, &uri, json!({"estimated_cost": 49.5}), &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "IN_PROGRESS");
    assert_eq!(json["data"]["estimated_cost"], 49.5);

    let notes = NotificationRepo::list_for_user(&pool, user.id, false, 50, 0)
        .await
        .unwrap();
    assert!(notes.iter().any(|n| n.kind == "REPAIR_ESTIMATE"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_start_by_other_technician_is_forbidden(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let tech_a = seed_technician(&pool, "bob").await;
    let tech_b = seed_technician(&pool, "carol").await;
    let record = RepairRequestRepo::create(&pool, user.id, "Phone", "Cracked", "12 Green Lane")
        .await
        .unwrap();
    RepairRequestRepo::accept(&pool, record.id, tech_a.id, &accept_input())
        .await
        .unwrap()
        .unwrap();

    let token = token_for(tech_b.id, ROLE_TECHNICIAN);
    let app = build_test_app(pool);
    let uri = format!("/api/v1/repairs/{}/start", record.id);
    let response = post_json_auth(app, &uri, json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Full lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_full_lifecycle_with_estimate_and_impact(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let tech = seed_technician(&pool, "bob").await;
    let user_token = token_for(user.id, ROLE_USER);
    let tech_token = token_for(tech.id, ROLE_TECHNICIAN);

    let (app, _state) = build_test_app_with_state(pool.clone());

    // Customer files a request.
    let response =
        post_json_auth(app.clone(), "/api/v1/repairs", create_body(), &user_token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    // Technician sees it in the available list.
    let response = get_auth(app.clone(), "/api/v1/repairs/available", &tech_token).await;
    let json = body_json(response).await;
    assert!(json["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["id"] == id));

    // Technician accepts.
    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/repairs/{id}/accept"),
        accept_body(),
        &tech_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Technician starts work and supplies an estimate.
    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/repairs/{id}/start"),
        json!({"estimated_cost": 80.0}),
        &tech_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Customer confirms the estimate.
    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/repairs/{id}/confirm"),
        json!({}),
        &user_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "ESTIMATE_CONFIRMED");

    // Technician completes with a carbon saving.
    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/repairs/{id}/complete"),
        json!({"carbon_saved_kg": 2.5}),
        &tech_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "COMPLETED");
    assert_eq!(json["data"]["estimated_cost"], 80.0);

    // Customer's impact totals reflect the saving: 2.5 kg -> 25 points.
    let response = get_auth(app.clone(), "/api/v1/impact", &user_token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["total_carbon_saved_kg"], 2.5);
    assert_eq!(json["data"]["points"], 25);

    // An achievement notification was persisted.
    let notes = NotificationRepo::list_for_user(&pool, user.id, false, 50, 0)
        .await
        .unwrap();
    assert!(notes.iter().any(|n| n.kind == "ACHIEVEMENT"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_complete_from_in_progress_without_confirmation(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let tech = seed_technician(&pool, "bob").await;
    let record = RepairRequestRepo::create(&pool, user.id, "Phone", "Cracked", "12 Green Lane")
        .await
        .unwrap();
    RepairRequestRepo::accept(&pool, record.id, tech.id, &accept_input())
        .await
        .unwrap()
        .unwrap();
    RepairRequestRepo::start(&pool, record.id, tech.id, None)
        .await
        .unwrap()
        .unwrap();

    let token = token_for(tech.id, ROLE_TECHNICIAN);
    let app = build_test_app(pool);
    let uri = format!("/api/v1/repairs/{}/complete", record.id);
    let response = post_json_auth(app, &uri, json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "COMPLETED");
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_cancel_completed_is_conflict(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let tech = seed_technician(&pool, "bob").await;
    let record = RepairRequestRepo::create(&pool, user.id, "Phone", "Cracked", "12 Green Lane")
        .await
        .unwrap();
    RepairRequestRepo::accept(&pool, record.id, tech.id, &accept_input())
        .await
        .unwrap()
        .unwrap();
    RepairRequestRepo::start(&pool, record.id, tech.id, None)
        .await
        .unwrap()
        .unwrap();
    RepairRequestRepo::complete(&pool, record.id, tech.id)
        .await
        .unwrap()
        .unwrap();

    let token = token_for(user.id, ROLE_USER);
    let app = build_test_app(pool);
    let uri = format!("/api/v1/repairs/{}/cancel", record.id);
    let response = post_json_auth(app, &uri, json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_cancel_by_stranger_is_forbidden(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let stranger = seed_user(&pool, "mallory").await;
    let record = RepairRequestRepo::create(&pool, user.id, "Phone", "Cracked", "12 Green Lane")
        .await
        .unwrap();

    let token = token_for(stranger.id, ROLE_USER);
    let app = build_test_app(pool);
    let uri = format!("/api/v1/repairs/{}/cancel", record.id);
    let response = post_json_auth(app, &uri, json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_cancel_notifies_the_other_party(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let tech = seed_technician(&pool, "bob").await;
    let record = RepairRequestRepo::create(&pool, user.id, "Phone", "Cracked", "12 Green Lane")
        .await
        .unwrap();
    RepairRequestRepo::accept(&pool, record.id, tech.id, &accept_input())
        .await
        .unwrap()
        .unwrap();

    let token = token_for(user.id, ROLE_USER);
    let app = build_test_app(pool.clone());
    let uri = format!("/api/v1/repairs/{}/cancel", record.id);
    let response = post_json_auth(app, &uri, json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let tech_notes = NotificationRepo::list_for_user(&pool, tech.id, false, 50, 0)
        .await
        .unwrap();
    assert!(tech_notes
        .iter()
        .any(|n| n.kind == "STATUS_UPDATE" && n.message.contains("cancelled")));
}
