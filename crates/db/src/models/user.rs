//! User entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use ecoloop_core::types::{DbId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    /// Role name, one of the constants in `ecoloop_core::roles`.
    pub role: String,
    pub total_carbon_saved_kg: f64,
    pub points: i64,
    pub created_at: Timestamp,
}

/// DTO for creating a user (used by seeding and tests; registration
/// itself is handled by the external identity provider).
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub role: String,
}

/// Snapshot of a user's cumulative impact totals.
#[derive(Debug, Clone, Copy, FromRow, Serialize)]
pub struct ImpactTotals {
    pub total_carbon_saved_kg: f64,
    pub points: i64,
}
