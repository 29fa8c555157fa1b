//! Periodic WebSocket keep-alive.

use std::sync::Arc;
use std::time::Duration;

use crate::ws::manager::WsManager;

const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Spawn a background task that pings all connections at a fixed interval.
///
/// Connections whose channel has closed are pruned by `ping_all`, so the
/// registry does not accumulate dead entries between disconnect races.
pub fn start_heartbeat(ws_manager: Arc<WsManager>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));
        // Skip the immediate first tick.
        interval.tick().await;
        loop {
            interval.tick().await;
            let pruned = ws_manager.ping_all().await;
            if pruned > 0 {
                tracing::debug!(pruned, "Pruned dead WebSocket connections");
            }
        }
    })
}
