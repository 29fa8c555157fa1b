//! Typed server push events.
//!
//! The server sends JSON frames with the shape `{"type": "<kind>",
//! "data": {...}}`. This module deserializes them into a strongly-typed
//! [`ServerEvent`] enum; unknown kinds are surfaced as a parse error the
//! caller logs and ignores.

use serde::Deserialize;
use serde_json::Value;

use ecoloop_core::types::DbId;

/// All known server push event types.
///
/// Deserialized via the internally-tagged `"type"` field with associated
/// `"data"` content.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerEvent {
    /// A new repair request was filed (technician audiences only).
    #[serde(rename = "NEW_REPAIR_REQUEST")]
    NewRepairRequest(RepairRecord),

    /// A repair request changed state; carries the full current record.
    #[serde(rename = "REPAIR_STATUS_UPDATE")]
    RepairStatusUpdate(RepairRecord),

    /// The user's carbon/points totals changed.
    #[serde(rename = "IMPACT_RECORDED")]
    ImpactRecorded(ImpactSnapshot),
}

/// The repair request record as pushed by the server.
///
/// Only the fields the sync layer acts on are typed; the rest ride along
/// in `extra` so alerts can show them without chasing schema drift.
#[derive(Debug, Clone, Deserialize)]
pub struct RepairRecord {
    pub id: DbId,
    pub user_id: DbId,
    pub technician_id: Option<DbId>,
    pub device_type: String,
    pub status: String,
    #[serde(flatten)]
    pub extra: Value,
}

/// Totals snapshot carried by an impact event.
#[derive(Debug, Clone, Deserialize)]
pub struct ImpactSnapshot {
    pub carbon_saved_kg: f64,
    pub points_earned: i64,
    pub total_carbon_saved_kg: f64,
    pub total_points: i64,
}

/// Parse a raw text frame into a [`ServerEvent`].
pub fn parse_event(text: &str) -> Result<ServerEvent, serde_json::Error> {
    serde_json::from_str(text)
}
