//! Repository for the `users` table.

use sqlx::PgPool;

use ecoloop_core::types::DbId;

use crate::models::user::{CreateUser, ImpactTotals, User};

/// Column list for `users` queries.
const COLUMNS: &str = "id, username, email, role, total_carbon_saved_kg, points, created_at";

/// Provides identity lookups and the atomic impact-totals increment.
pub struct UserRepo;

impl UserRepo {
    /// Create a user. Used by seeding and tests; interactive registration
    /// belongs to the external identity provider.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, email, role) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.role)
            .fetch_one(pool)
            .await
    }

    /// Fetch a user by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Atomically credit carbon and points to a user's running totals.
    ///
    /// One SQL statement does the arithmetic, so concurrent completions
    /// for the same user never lose an update. Returns the new totals,
    /// or `None` if the user does not exist.
    pub async fn credit_impact(
        pool: &PgPool,
        user_id: DbId,
        carbon_saved_kg: f64,
        points: i64,
    ) -> Result<Option<ImpactTotals>, sqlx::Error> {
        sqlx::query_as::<_, ImpactTotals>(
            "UPDATE users \
             SET total_carbon_saved_kg = total_carbon_saved_kg + $2, \
                 points = points + $3 \
             WHERE id = $1 \
             RETURNING total_carbon_saved_kg, points",
        )
        .bind(user_id)
        .bind(carbon_saved_kg)
        .bind(points)
        .fetch_optional(pool)
        .await
    }

    /// Read a user's current impact totals.
    pub async fn impact_totals(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<ImpactTotals>, sqlx::Error> {
        sqlx::query_as::<_, ImpactTotals>(
            "SELECT total_carbon_saved_kg, points FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}
