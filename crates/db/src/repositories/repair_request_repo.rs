//! Repository for the `repair_requests` table.
//!
//! Every lifecycle mutation is a single conditional `UPDATE ... WHERE
//! status = ... RETURNING *`, so the legality check and the persist are
//! one atomic statement. A mutation returning no row means the record was
//! not in a state that permits the transition (or does not exist); the
//! caller distinguishes the two with [`RepairRequestRepo::find_by_id`].

use sqlx::PgPool;

use ecoloop_core::repair::RepairStatus;
use ecoloop_core::types::DbId;

use crate::models::repair_request::{AcceptRepairRequest, RepairRequest};

/// Column list for `repair_requests` queries.
const COLUMNS: &str = "\
    id, user_id, technician_id, device_type, description, customer_address, \
    status, estimated_cost, pickup_date, pickup_address, \
    technician_phone, technician_email, pickup_notes, created_at";

/// Provides lifecycle operations for repair requests.
pub struct RepairRequestRepo;

impl RepairRequestRepo {
    /// Insert a new request. Status is forced to `PENDING` and the
    /// technician assignment starts out empty regardless of input.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        device_type: &str,
        description: &str,
        customer_address: &str,
    ) -> Result<RepairRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO repair_requests (user_id, device_type, description, customer_address, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RepairRequest>(&query)
            .bind(user_id)
            .bind(device_type)
            .bind(description)
            .bind(customer_address)
            .bind(RepairStatus::Pending.as_str())
            .fetch_one(pool)
            .await
    }

    /// Fetch a single request by id.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<RepairRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM repair_requests WHERE id = $1");
        sqlx::query_as::<_, RepairRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All unclaimed (`PENDING`) requests, newest first.
    pub async fn list_available(pool: &PgPool) -> Result<Vec<RepairRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM repair_requests \
             WHERE status = $1 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, RepairRequest>(&query)
            .bind(RepairStatus::Pending.as_str())
            .fetch_all(pool)
            .await
    }

    /// All requests owned by a customer, newest first.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<RepairRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM repair_requests \
             WHERE user_id = $1 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, RepairRequest>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// All requests assigned to a technician, newest first.
    pub async fn list_by_technician(
        pool: &PgPool,
        technician_id: DbId,
    ) -> Result<Vec<RepairRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM repair_requests \
             WHERE technician_id = $1 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, RepairRequest>(&query)
            .bind(technician_id)
            .fetch_all(pool)
            .await
    }

    /// Atomically claim a `PENDING` request for a technician, setting the
    /// assignment and all pickup/contact fields in one statement.
    ///
    /// Guarded by `status = 'PENDING'`: under concurrent accepts exactly
    /// one caller gets the row back, the rest get `None`.
    pub async fn accept(
        pool: &PgPool,
        id: DbId,
        technician_id: DbId,
        input: &AcceptRepairRequest,
    ) -> Result<Option<RepairRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE repair_requests \
             SET technician_id = $2, status = $3, pickup_date = $4, pickup_address = $5, \
                 technician_phone = $6, technician_email = $7, pickup_notes = $8 \
             WHERE id = $1 AND status = $9 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RepairRequest>(&query)
            .bind(id)
            .bind(technician_id)
            .bind(RepairStatus::Accepted.as_str())
            .bind(input.pickup_date)
            .bind(&input.pickup_address)
            .bind(&input.technician_phone)
            .bind(&input.technician_email)
            .bind(&input.pickup_notes)
            .bind(RepairStatus::Pending.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Move an `ACCEPTED` request to `IN_PROGRESS` for its assignee,
    /// optionally setting or overwriting the cost estimate.
    pub async fn start(
        pool: &PgPool,
        id: DbId,
        technician_id: DbId,
        estimated_cost: Option<f64>,
    ) -> Result<Option<RepairRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE repair_requests \
             SET status = $3, estimated_cost = COALESCE($4, estimated_cost) \
             WHERE id = $1 AND technician_id = $2 AND status = $5 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RepairRequest>(&query)
            .bind(id)
            .bind(technician_id)
            .bind(RepairStatus::InProgress.as_str())
            .bind(estimated_cost)
            .bind(RepairStatus::Accepted.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Confirm an outstanding estimate on an `IN_PROGRESS` request owned
    /// by `user_id`. The estimate-exists check is part of the statement,
    /// so a concurrent estimate removal cannot slip through.
    pub async fn confirm_estimate(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<RepairRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE repair_requests \
             SET status = $3 \
             WHERE id = $1 AND user_id = $2 AND status = $4 AND estimated_cost IS NOT NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RepairRequest>(&query)
            .bind(id)
            .bind(user_id)
            .bind(RepairStatus::EstimateConfirmed.as_str())
            .bind(RepairStatus::InProgress.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Complete a repair. Legal from `IN_PROGRESS` or `ESTIMATE_CONFIRMED`,
    /// and only for the assigned technician.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        technician_id: DbId,
    ) -> Result<Option<RepairRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE repair_requests \
             SET status = $3 \
             WHERE id = $1 AND technician_id = $2 AND status IN ($4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RepairRequest>(&query)
            .bind(id)
            .bind(technician_id)
            .bind(RepairStatus::Completed.as_str())
            .bind(RepairStatus::InProgress.as_str())
            .bind(RepairStatus::EstimateConfirmed.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Cancel a request from any non-terminal state.
    pub async fn cancel(pool: &PgPool, id: DbId) -> Result<Option<RepairRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE repair_requests \
             SET status = $2 \
             WHERE id = $1 AND status NOT IN ($3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RepairRequest>(&query)
            .bind(id)
            .bind(RepairStatus::Cancelled.as_str())
            .bind(RepairStatus::Completed.as_str())
            .bind(RepairStatus::Cancelled.as_str())
            .fetch_optional(pool)
            .await
    }
}
