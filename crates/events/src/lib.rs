//! Ecoloop event bus.
//!
//! Building blocks of the realtime fan-out pipeline:
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`DomainEvent`] — the canonical lifecycle event envelope, carrying
//!   its own delivery targets (user ids and/or a role audience).

pub mod bus;

pub use bus::{
    DomainEvent, EventBus, EVENT_IMPACT_RECORDED, EVENT_NEW_REPAIR_REQUEST,
    EVENT_REPAIR_STATUS_UPDATE,
};
