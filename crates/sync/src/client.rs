//! WebSocket sync client.
//!
//! [`SyncClient`] holds the connection configuration; [`SyncClient::connect`]
//! establishes a live [`SyncSession`] that reads push frames and applies
//! them to a [`ViewCache`]. The event-application logic is a pure function
//! of (role, event) so it can be tested without a socket.

use futures::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream};

use ecoloop_core::roles::ROLE_TECHNICIAN;

use crate::cache::{ViewCache, VIEW_AVAILABLE, VIEW_TECHNICIAN, VIEW_USER};
use crate::events::{parse_event, ServerEvent};

/// Errors that can occur when working with the sync client.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Failed to establish the initial WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Configuration handle for the server's push channel.
pub struct SyncClient {
    ws_url: String,
    token: String,
    role: String,
}

/// A live sync session over WebSocket.
pub struct SyncSession {
    /// Role the session authenticated with; gates technician-only events.
    pub role: String,
    /// Staleness flags and alerts driven by incoming events.
    pub cache: ViewCache,
    ws_stream: tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

impl SyncClient {
    /// Create a new client.
    ///
    /// * `ws_url` - WebSocket base URL, e.g. `ws://host:3000`.
    /// * `token`  - access token; sent as the `token` query parameter.
    /// * `role`   - role the token was minted for.
    pub fn new(ws_url: String, token: String, role: String) -> Self {
        Self { ws_url, token, role }
    }

    /// Connect to the server's push endpoint.
    pub async fn connect(&self) -> Result<SyncSession, SyncError> {
        let url = format!("{}/api/v1/ws?token={}", self.ws_url, self.token);

        let (ws_stream, _response) = connect_async(&url).await.map_err(|e| {
            SyncError::Connection(format!("Failed to connect to {}: {e}", self.ws_url))
        })?;

        tracing::info!(role = %self.role, "Sync session connected to {}", self.ws_url);

        Ok(SyncSession {
            role: self.role.clone(),
            cache: ViewCache::new(),
            ws_stream,
        })
    }
}

impl SyncSession {
    /// Read and apply frames until the socket closes or errors.
    ///
    /// Text frames are parsed into [`ServerEvent`]s and applied to the
    /// cache; unparseable frames are logged at debug and skipped, so a
    /// newer server can introduce event types without breaking old clients.
    pub async fn run(&mut self) {
        while let Some(msg_result) = self.ws_stream.next().await {
            match msg_result {
                Ok(Message::Text(text)) => match parse_event(&text) {
                    Ok(event) => apply_event(&self.role, &event, &mut self.cache),
                    Err(e) => {
                        tracing::debug!(error = %e, "Ignoring unrecognized push frame");
                    }
                },
                Ok(Message::Ping(_) | Message::Pong(_)) => {
                    // Handled automatically by tungstenite.
                }
                Ok(Message::Close(frame)) => {
                    tracing::info!(?frame, "Sync session closed by server");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Sync session receive error");
                    break;
                }
            }
        }
    }
}

/// Apply one server event to the cache.
///
/// Status updates invalidate both party views unconditionally; working out
/// which side actually changed costs more than the refetch it would save.
/// New-request events only matter to technician sessions.
pub fn apply_event(role: &str, event: &ServerEvent, cache: &mut ViewCache) {
    match event {
        ServerEvent::RepairStatusUpdate(record) => {
            cache.invalidate(VIEW_USER);
            cache.invalidate(VIEW_TECHNICIAN);
            cache.push_alert(format!(
                "Repair request #{} is now {}",
                record.id, record.status
            ));
        }
        ServerEvent::NewRepairRequest(record) => {
            if role == ROLE_TECHNICIAN {
                cache.invalidate(VIEW_AVAILABLE);
                cache.push_alert(format!("New repair request: {}", record.device_type));
            }
        }
        ServerEvent::ImpactRecorded(snap) => {
            cache.push_alert(format!(
                "You saved {:.2} kg of CO2 and earned {} points",
                snap.carbon_saved_kg, snap.points_earned
            ));
        }
    }
}
