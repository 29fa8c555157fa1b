//! Tests for the WebSocket connection registry.
//!
//! The registry keeps at most one binding per user; these tests cover the
//! replace-on-reconnect semantics, the keyed unregister that protects a
//! fresh binding from a stale connection's teardown, and the targeted and
//! role-scoped send paths.

use axum::extract::ws::Message;
use ecoloop_api::ws::WsManager;
use ecoloop_core::roles::{ROLE_TECHNICIAN, ROLE_USER};

#[tokio::test]
async fn register_and_send_to_user() {
    let manager = WsManager::new();
    let mut rx = manager.register(1, "conn-a".into(), ROLE_USER.into()).await;

    let delivered = manager
        .send_to_user(1, Message::Text("hello".into()))
        .await;
    assert!(delivered);

    let msg = rx.recv().await.unwrap();
    assert_eq!(msg, Message::Text("hello".into()));
}

#[tokio::test]
async fn send_to_unbound_user_is_a_noop() {
    let manager = WsManager::new();
    let delivered = manager.send_to_user(42, Message::Text("x".into())).await;
    assert!(!delivered);
    assert_eq!(manager.connection_count().await, 0);
}

#[tokio::test]
async fn reconnect_replaces_the_previous_binding() {
    let manager = WsManager::new();
    let mut old_rx = manager.register(1, "conn-a".into(), ROLE_USER.into()).await;
    let mut new_rx = manager.register(1, "conn-b".into(), ROLE_USER.into()).await;

    assert_eq!(manager.connection_count().await, 1);

    manager.send_to_user(1, Message::Text("fresh".into())).await;
    assert_eq!(new_rx.recv().await.unwrap(), Message::Text("fresh".into()));
    // The old receiver gets nothing; its sender half was dropped on replace.
    assert!(old_rx.try_recv().is_err());
}

#[tokio::test]
async fn stale_unregister_keeps_the_new_binding() {
    let manager = WsManager::new();
    let _old_rx = manager.register(1, "conn-a".into(), ROLE_USER.into()).await;
    let mut new_rx = manager.register(1, "conn-b".into(), ROLE_USER.into()).await;

    // The old connection's teardown races the reconnect; its keyed
    // unregister must not evict the new binding.
    manager.unregister(1, "conn-a").await;
    assert_eq!(manager.connection_count().await, 1);

    let delivered = manager.send_to_user(1, Message::Text("still here".into())).await;
    assert!(delivered);
    assert!(new_rx.recv().await.is_some());
}

#[tokio::test]
async fn matching_unregister_removes_the_binding() {
    let manager = WsManager::new();
    let _rx = manager.register(1, "conn-a".into(), ROLE_USER.into()).await;

    manager.unregister(1, "conn-a").await;
    assert_eq!(manager.connection_count().await, 0);
    assert!(!manager.send_to_user(1, Message::Text("x".into())).await);
}

#[tokio::test]
async fn send_to_role_reaches_only_that_role() {
    let manager = WsManager::new();
    let mut tech_a = manager
        .register(1, "conn-a".into(), ROLE_TECHNICIAN.into())
        .await;
    let mut tech_b = manager
        .register(2, "conn-b".into(), ROLE_TECHNICIAN.into())
        .await;
    let mut customer = manager.register(3, "conn-c".into(), ROLE_USER.into()).await;

    let count = manager
        .send_to_role(ROLE_TECHNICIAN, Message::Text("new job".into()))
        .await;
    assert_eq!(count, 2);

    assert!(tech_a.recv().await.is_some());
    assert!(tech_b.recv().await.is_some());
    assert!(customer.try_recv().is_err());
}

#[tokio::test]
async fn broadcast_reaches_everyone() {
    let manager = WsManager::new();
    let mut a = manager.register(1, "conn-a".into(), ROLE_USER.into()).await;
    let mut b = manager
        .register(2, "conn-b".into(), ROLE_TECHNICIAN.into())
        .await;

    manager.broadcast(Message::Text("maintenance".into())).await;
    assert!(a.recv().await.is_some());
    assert!(b.recv().await.is_some());
}

#[tokio::test]
async fn ping_all_prunes_closed_channels() {
    let manager = WsManager::new();
    let rx = manager.register(1, "conn-a".into(), ROLE_USER.into()).await;
    let _live_rx = manager.register(2, "conn-b".into(), ROLE_USER.into()).await;

    // Simulate a dead connection by dropping the receiver half.
    drop(rx);

    let pruned = manager.ping_all().await;
    assert_eq!(pruned, 1);
    assert_eq!(manager.connection_count().await, 1);
}

#[tokio::test]
async fn shutdown_all_closes_and_clears() {
    let manager = WsManager::new();
    let mut rx = manager.register(1, "conn-a".into(), ROLE_USER.into()).await;

    manager.shutdown_all().await;
    assert_eq!(manager.connection_count().await, 0);
    assert_eq!(rx.recv().await, Some(Message::Close(None)));
}
