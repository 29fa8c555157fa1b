//! Event-to-WebSocket fan-out.
//!
//! [`NotificationRouter`] subscribes to the domain event bus and pushes each
//! event to the connected clients it addresses. Persistent notification rows
//! are written by the handlers before the event is published, so the router
//! only handles live delivery; an offline user still finds the notification
//! on next fetch.

use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::broadcast;

use ecoloop_events::DomainEvent;

use crate::ws::WsManager;

/// Fans domain events out to live WebSocket connections.
pub struct NotificationRouter {
    ws_manager: Arc<WsManager>,
}

impl NotificationRouter {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the main fan-out loop.
    ///
    /// Consumes events from the broadcast channel until it closes (i.e. the
    /// [`EventBus`](ecoloop_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<DomainEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.route_event(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Deliver one event to its explicit targets and, if set, to every
    /// connection authenticated with the audience role.
    async fn route_event(&self, event: &DomainEvent) {
        let msg = serde_json::json!({
            "type": event.event_type,
            "data": event.payload,
            "timestamp": event.timestamp,
        });
        let ws_msg = Message::Text(msg.to_string().into());

        for &user_id in &event.targets {
            let delivered = self.ws_manager.send_to_user(user_id, ws_msg.clone()).await;
            if !delivered {
                tracing::trace!(user_id, event_type = %event.event_type, "Target not connected");
            }
        }

        if let Some(role) = &event.audience_role {
            let count = self.ws_manager.send_to_role(role, ws_msg).await;
            tracing::debug!(
                role = %role,
                count,
                event_type = %event.event_type,
                "Delivered event to role audience"
            );
        }
    }
}

/// Subscribe to the bus and spawn the router loop as a background task.
pub fn start_notification_router(
    ws_manager: Arc<WsManager>,
    bus: &ecoloop_events::EventBus,
) -> tokio::task::JoinHandle<()> {
    let receiver = bus.subscribe();
    let router = NotificationRouter::new(ws_manager);
    tokio::spawn(router.run(receiver))
}
