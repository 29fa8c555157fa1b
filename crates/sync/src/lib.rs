//! Client-side synchronization over the server's WebSocket push channel.
//!
//! Connects with an access token, parses `{"type": ..., "data": ...}`
//! frames into typed [`ServerEvent`]s, and keeps a [`ViewCache`] of
//! staleness flags so the embedding application knows which views to
//! refetch. Delivery is best-effort: a missed event costs at most one
//! stale view until the next update arrives.

pub mod cache;
pub mod client;
pub mod events;

pub use cache::{Alert, ViewCache, VIEW_AVAILABLE, VIEW_TECHNICIAN, VIEW_USER};
pub use client::{SyncClient, SyncError, SyncSession};
pub use events::ServerEvent;
