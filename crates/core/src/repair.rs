//! Repair request lifecycle: status enum, legal transitions, and
//! creation-input validation.
//!
//! The status is a closed enum rather than a free-form string so that
//! illegal transitions are unrepresentable at the API surface: the only
//! mutations the platform exposes are the named transition operations
//! (accept, start, confirm estimate, complete, cancel).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum length for a repair request's free-text description.
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Maximum length for device type and address fields.
pub const MAX_FIELD_LENGTH: usize = 500;

/// Lifecycle status of a repair request.
///
/// Stored in the `repair_requests.status` column as the uppercase string
/// returned by [`RepairStatus::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairStatus {
    /// Filed by a customer, not yet claimed by a technician.
    Pending,
    /// Claimed by a technician; pickup logistics are set.
    Accepted,
    /// The technician is working on the device.
    InProgress,
    /// The customer accepted the technician's cost estimate.
    EstimateConfirmed,
    /// Terminal: the repair is done.
    Completed,
    /// Terminal: the request was withdrawn.
    Cancelled,
}

impl RepairStatus {
    /// The database/wire representation of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            RepairStatus::Pending => "PENDING",
            RepairStatus::Accepted => "ACCEPTED",
            RepairStatus::InProgress => "IN_PROGRESS",
            RepairStatus::EstimateConfirmed => "ESTIMATE_CONFIRMED",
            RepairStatus::Completed => "COMPLETED",
            RepairStatus::Cancelled => "CANCELLED",
        }
    }

    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, RepairStatus::Completed | RepairStatus::Cancelled)
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    ///
    /// Cancellation is legal from any non-terminal state. Completion is
    /// reachable from `InProgress` directly or after the customer has
    /// confirmed the estimate.
    pub fn can_transition_to(self, next: RepairStatus) -> bool {
        use RepairStatus::*;
        match (self, next) {
            (Pending, Accepted) => true,
            (Accepted, InProgress) => true,
            (InProgress, EstimateConfirmed) => true,
            (InProgress, Completed) | (EstimateConfirmed, Completed) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for RepairStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepairStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(RepairStatus::Pending),
            "ACCEPTED" => Ok(RepairStatus::Accepted),
            "IN_PROGRESS" => Ok(RepairStatus::InProgress),
            "ESTIMATE_CONFIRMED" => Ok(RepairStatus::EstimateConfirmed),
            "COMPLETED" => Ok(RepairStatus::Completed),
            "CANCELLED" => Ok(RepairStatus::Cancelled),
            other => Err(CoreError::Validation(format!(
                "Unknown repair status '{other}'"
            ))),
        }
    }
}

/// Validate the immutable fields of a new repair request.
///
/// All three fields are required; device type and address are capped at
/// [`MAX_FIELD_LENGTH`], the description at [`MAX_DESCRIPTION_LENGTH`].
pub fn validate_new_request(
    device_type: &str,
    description: &str,
    customer_address: &str,
) -> Result<(), CoreError> {
    validate_required("device_type", device_type, MAX_FIELD_LENGTH)?;
    validate_required("description", description, MAX_DESCRIPTION_LENGTH)?;
    validate_required("customer_address", customer_address, MAX_FIELD_LENGTH)?;
    Ok(())
}

/// Validate the pickup/contact fields supplied when accepting a request.
///
/// `pickup_notes` is optional and therefore not checked for presence.
pub fn validate_accept_fields(
    pickup_address: &str,
    technician_phone: &str,
    technician_email: &str,
) -> Result<(), CoreError> {
    validate_required("pickup_address", pickup_address, MAX_FIELD_LENGTH)?;
    validate_required("technician_phone", technician_phone, MAX_FIELD_LENGTH)?;
    validate_required("technician_email", technician_email, MAX_FIELD_LENGTH)?;
    Ok(())
}

/// Validate a technician-supplied cost estimate.
pub fn validate_estimate(estimated_cost: f64) -> Result<(), CoreError> {
    if !estimated_cost.is_finite() || estimated_cost < 0.0 {
        return Err(CoreError::Validation(format!(
            "Estimated cost must be a non-negative amount, got {estimated_cost}"
        )));
    }
    Ok(())
}

fn validate_required(field: &str, value: &str, max_len: usize) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(CoreError::Validation(format!(
            "{field} exceeds maximum length of {max_len} characters"
        )));
    }
    Ok(())
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
