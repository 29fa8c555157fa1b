//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`DomainEvent`]s. It is
//! designed to be shared via `Arc<EventBus>` across the application.
//! Delivery is best-effort: no queuing beyond the channel buffer, no
//! replay, no acknowledgment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use ecoloop_core::types::DbId;

// ---------------------------------------------------------------------------
// Event type names
// ---------------------------------------------------------------------------

/// A repair request was filed; fanned out to technician sessions.
pub const EVENT_NEW_REPAIR_REQUEST: &str = "NEW_REPAIR_REQUEST";

/// A repair request changed lifecycle state; fanned out to the affected
/// customer and technician sessions with the full current record.
pub const EVENT_REPAIR_STATUS_UPDATE: &str = "REPAIR_STATUS_UPDATE";

/// Carbon/points were credited; fanned out to the credited user.
pub const EVENT_IMPACT_RECORDED: &str = "IMPACT_RECORDED";

// ---------------------------------------------------------------------------
// DomainEvent
// ---------------------------------------------------------------------------

/// A lifecycle event with its own delivery addressing.
///
/// Constructed via [`DomainEvent::new`] and enriched with the builder
/// methods [`with_target`](DomainEvent::with_target),
/// [`with_audience_role`](DomainEvent::with_audience_role), and
/// [`with_payload`](DomainEvent::with_payload). The notification router
/// delivers to every target user id and, when set, to every connection
/// tagged with the audience role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Event name, e.g. `"REPAIR_STATUS_UPDATE"`.
    pub event_type: String,

    /// User ids whose connections should receive the event.
    pub targets: Vec<DbId>,

    /// Optional role whose connections should all receive the event
    /// (discovery-style events like `NEW_REPAIR_REQUEST`).
    pub audience_role: Option<String>,

    /// Free-form JSON payload, sent on the wire as the `data` field.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            targets: Vec::new(),
            audience_role: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Add a recipient user. Duplicate ids are dropped so a customer who
    /// is also the assignee receives the event once.
    pub fn with_target(mut self, user_id: DbId) -> Self {
        if !self.targets.contains(&user_id) {
            self.targets.push(user_id);
        }
        self
    }

    /// Add an optional recipient; `None` is a no-op. Convenient for the
    /// not-yet-assigned technician slot.
    pub fn with_target_opt(self, user_id: Option<DbId>) -> Self {
        match user_id {
            Some(id) => self.with_target(id),
            None => self,
        }
    }

    /// Address the event to every connection tagged with `role`.
    pub fn with_audience_role(mut self, role: impl Into<String>) -> Self {
        self.audience_role = Some(role.into());
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`DomainEvent`].
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed messages are dropped
    /// and slow receivers observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// fan-out is best-effort and publish never fails for the caller.
    pub fn publish(&self, event: DomainEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let event = DomainEvent::new(EVENT_REPAIR_STATUS_UPDATE)
            .with_target(7)
            .with_target_opt(Some(9))
            .with_payload(serde_json::json!({"status": "ACCEPTED"}));

        bus.publish(event);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, EVENT_REPAIR_STATUS_UPDATE);
        assert_eq!(received.targets, vec![7, 9]);
        assert_eq!(received.payload["status"], "ACCEPTED");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(DomainEvent::new(EVENT_NEW_REPAIR_REQUEST).with_audience_role("technician"));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1.event_type, EVENT_NEW_REPAIR_REQUEST);
        assert_eq!(e2.audience_role.as_deref(), Some("technician"));
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(DomainEvent::new(EVENT_IMPACT_RECORDED));
    }

    #[test]
    fn duplicate_targets_are_collapsed() {
        let event = DomainEvent::new(EVENT_REPAIR_STATUS_UPDATE)
            .with_target(3)
            .with_target(3)
            .with_target_opt(Some(3));
        assert_eq!(event.targets, vec![3]);
    }

    #[test]
    fn default_event_has_empty_addressing() {
        let event = DomainEvent::new("bare.event");
        assert!(event.targets.is_empty());
        assert!(event.audience_role.is_none());
        assert!(event.payload.is_object());
    }
}
