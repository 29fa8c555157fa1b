//! Repair request entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use ecoloop_core::types::{DbId, Timestamp};

/// A row from the `repair_requests` table.
///
/// `status` is kept as the raw column string here; parse it with
/// [`RepairStatus`](ecoloop_core::RepairStatus) when lifecycle decisions
/// are needed. Serialization keeps the wire shape identical to the
/// database shape so fan-out payloads carry the full record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RepairRequest {
    pub id: DbId,
    pub user_id: DbId,
    pub technician_id: Option<DbId>,
    pub device_type: String,
    pub description: String,
    pub customer_address: String,
    pub status: String,
    pub estimated_cost: Option<f64>,
    pub pickup_date: Option<Timestamp>,
    pub pickup_address: Option<String>,
    pub technician_phone: Option<String>,
    pub technician_email: Option<String>,
    pub pickup_notes: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for filing a new repair request.
#[derive(Debug, Deserialize)]
pub struct CreateRepairRequest {
    pub device_type: String,
    pub description: String,
    pub customer_address: String,
}

/// DTO for a technician accepting a request.
///
/// All pickup/contact fields are applied atomically together with the
/// status change; `pickup_notes` alone is optional.
#[derive(Debug, Deserialize)]
pub struct AcceptRepairRequest {
    pub pickup_date: Timestamp,
    pub pickup_address: String,
    pub technician_phone: String,
    pub technician_email: String,
    pub pickup_notes: Option<String>,
}

/// DTO for starting work on an accepted request.
#[derive(Debug, Default, Deserialize)]
pub struct StartRepair {
    /// Optional cost estimate; overwrites any previously supplied value.
    pub estimated_cost: Option<f64>,
}

/// DTO for completing a repair.
#[derive(Debug, Default, Deserialize)]
pub struct CompleteRepair {
    /// Optional carbon saving credited to the customer on completion.
    pub carbon_saved_kg: Option<f64>,
}
