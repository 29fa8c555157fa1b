//! Ecoloop domain core.
//!
//! Pure domain logic shared by the db, events, api, and sync crates:
//! the repair lifecycle state machine, role and notification-kind
//! constants, carbon-impact math, and input validation helpers.
//! No I/O lives here.

pub mod error;
pub mod impact;
pub mod notify;
pub mod repair;
pub mod roles;
pub mod types;

pub use error::CoreError;
pub use repair::RepairStatus;
