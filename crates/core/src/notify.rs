//! Well-known notification kind constants.
//!
//! These must match the values stored in the `notifications.kind` column.
//! Each kind tags why a notification was produced; clients use it to pick
//! an icon and a destination view.

/// A repair request was filed (sent to the submitting customer).
pub const KIND_REPAIR_REQUEST: &str = "REPAIR_REQUEST";

/// A technician accepted a request; carries pickup and contact details.
pub const KIND_REPAIR_UPDATE: &str = "REPAIR_UPDATE";

/// A technician provided a cost estimate awaiting customer confirmation.
pub const KIND_REPAIR_ESTIMATE: &str = "REPAIR_ESTIMATE";

/// The customer confirmed a cost estimate (sent to the technician).
pub const KIND_REPAIR_CONFIRMED: &str = "REPAIR_CONFIRMED";

/// A generic lifecycle status change (completion, cancellation).
pub const KIND_STATUS_UPDATE: &str = "STATUS_UPDATE";

/// Carbon-saved / points were credited to the user.
pub const KIND_ACHIEVEMENT: &str = "ACHIEVEMENT";

/// Reserved for the pickup-request flow, which shares this mailbox.
pub const KIND_PICKUP_REQUEST: &str = "PICKUP_REQUEST";

/// All notification kinds the platform currently emits or reserves.
pub const VALID_KINDS: &[&str] = &[
    KIND_REPAIR_REQUEST,
    KIND_REPAIR_UPDATE,
    KIND_REPAIR_ESTIMATE,
    KIND_REPAIR_CONFIRMED,
    KIND_STATUS_UPDATE,
    KIND_ACHIEVEMENT,
    KIND_PICKUP_REQUEST,
];
