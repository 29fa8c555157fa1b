//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does
//! not meet the requirement. Use these in route handlers to enforce
//! authorization at the type level.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use ecoloop_core::error::CoreError;
use ecoloop_core::roles::{ROLE_TECHNICIAN, ROLE_USER};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `technician` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn technician_only(RequireTechnician(user): RequireTechnician) -> AppResult<Json<()>> {
///     // user is guaranteed to be a technician here
///     Ok(Json(()))
/// }
/// ```
pub struct RequireTechnician(pub AuthUser);

impl FromRequestParts<AppState> for RequireTechnician {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_TECHNICIAN {
            return Err(AppError::Core(CoreError::Forbidden(
                "Technician role required".into(),
            )));
        }
        Ok(RequireTechnician(user))
    }
}

/// Requires the customer (`user`) role. Rejects with 403 Forbidden
/// otherwise; keeps technicians out of customer-only operations like
/// filing a repair request.
pub struct RequireUser(pub AuthUser);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_USER {
            return Err(AppError::Core(CoreError::Forbidden(
                "Customer role required".into(),
            )));
        }
        Ok(RequireUser(user))
    }
}
