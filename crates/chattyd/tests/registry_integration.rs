//! Integration tests for the Registry Actor.
//!
//! These tests verify the registry works correctly as a complete system,
//! testing the spawn_registry() function and RegistryHandle interface
//! with in-memory outboxes standing in for client connections.
//!
//! Tests CAN use `.unwrap()` and `.expect()` - this is allowed.
//! We test the panic-free behavior of production code through assertions.

use std::collections::HashSet;
use std::time::Duration;

use chatty_core::{Nickname, SessionId};
use chattyd::registry::{
    spawn_registry, DepartureReason, DirectOutcome, OutboundLine, Peer, RegistryError,
    RegistryHandle, MAX_SESSIONS,
};
use tokio::sync::mpsc;
use tokio::time::timeout;

// ============================================================================
// Test Helpers
// ============================================================================

/// Receiving side of a fake client.
struct Inbox {
    rx: mpsc::Receiver<OutboundLine>,
}

impl Inbox {
    /// Everything queued so far.
    fn drain(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = self.rx.try_recv() {
            lines.push(line.to_string());
        }
        lines
    }

    async fn recv(&mut self) -> String {
        timeout(Duration::from_secs(2), self.rx.recv())
            .await
            .expect("timed out waiting for a line")
            .expect("outbox closed")
            .to_string()
    }
}

/// Helper to create a peer with its inbox.
fn create_peer(id: u64) -> (Peer, Inbox) {
    let (tx, rx) = mpsc::channel(256);
    (Peer::new(SessionId::new(id), tx), Inbox { rx })
}

fn nick(name: &str) -> Nickname {
    Nickname::new(name).unwrap()
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_join_and_leave() {
    let handle = spawn_registry(MAX_SESSIONS);
    let (peer, _inbox) = create_peer(1);

    let membership = handle.join(peer).await.expect("join should succeed");
    assert!(membership.initial_nickname().is_anonymous());
    assert_eq!(handle.session_count().await, 1);

    let left = membership.leave(DepartureReason::Quit).await.unwrap();
    assert_eq!(left, Some(Nickname::anonymous()));
    assert_eq!(handle.session_count().await, 0);
    assert!(handle.snapshot().await.is_empty());
}

#[tokio::test]
async fn test_dropped_membership_unregisters() {
    let handle = spawn_registry(MAX_SESSIONS);
    let (peer_a, _inbox_a) = create_peer(1);
    let (peer_b, mut inbox_b) = create_peer(2);

    let membership = handle.join(peer_a).await.unwrap();
    let _b = handle.join(peer_b).await.unwrap();

    drop(membership);

    assert_eq!(inbox_b.recv().await, "Anonymous has left the chat.");
    assert_eq!(handle.session_count().await, 1);
}

#[tokio::test]
async fn test_duplicate_join_fails() {
    let handle = spawn_registry(MAX_SESSIONS);
    let (peer, _inbox) = create_peer(1);

    let _membership = handle.join(peer.clone()).await.unwrap();
    let result = handle.join(peer).await;

    assert!(
        matches!(result, Err(RegistryError::SessionAlreadyExists(_))),
        "expected SessionAlreadyExists, got a different result"
    );
}

#[tokio::test]
async fn test_capacity_limit() {
    let handle = spawn_registry(2);
    let (a, _ia) = create_peer(1);
    let (b, _ib) = create_peer(2);
    let (c, mut ic) = create_peer(3);

    let _ma = handle.join(a).await.unwrap();
    let _mb = handle.join(b).await.unwrap();

    let result = handle.join(c).await;
    assert!(matches!(result, Err(RegistryError::RegistryFull { max: 2 })));
    assert_eq!(handle.session_count().await, 2);
    assert!(ic.drain().is_empty(), "refused peer gets no notices");
}

// ============================================================================
// Routing Tests
// ============================================================================

#[tokio::test]
async fn test_rename_then_chat_uses_new_name() {
    let handle = spawn_registry(MAX_SESSIONS);
    let (a, mut ia) = create_peer(1);
    let (b, mut ib) = create_peer(2);

    let ma = handle.join(a).await.unwrap();
    let _mb = handle.join(b).await.unwrap();
    ia.drain();

    let previous = handle.rename(ma.session_id(), nick("alice")).await.unwrap();
    assert!(previous.is_anonymous());
    assert_eq!(ia.drain(), vec!["Your nickname is now alice"]);

    let delivery = handle
        .chat(ma.session_id(), "hello".to_string())
        .await
        .unwrap();
    assert_eq!(delivery.delivered, 1);
    assert_eq!(ib.drain(), vec!["alice: hello"]);
    assert!(ia.drain().is_empty());
}

#[tokio::test]
async fn test_direct_message_outcomes() {
    let handle = spawn_registry(MAX_SESSIONS);
    let (a, mut ia) = create_peer(1);
    let (b, mut ib) = create_peer(2);
    let (c, mut ic) = create_peer(3);

    let ma = handle.join(a).await.unwrap();
    let mb = handle.join(b).await.unwrap();
    let mc = handle.join(c).await.unwrap();
    handle.rename(mb.session_id(), nick("bob")).await.unwrap();
    handle.rename(mc.session_id(), nick("bob")).await.unwrap();
    ia.drain();
    ib.drain();
    ic.drain();

    let outcome = handle
        .direct_message(ma.session_id(), nick("bob"), "hi".to_string())
        .await
        .unwrap();
    match outcome {
        DirectOutcome::Delivered(delivery) => assert_eq!(delivery.delivered, 2),
        DirectOutcome::NotFound => panic!("bob should be found"),
    }
    assert_eq!(ib.drain(), vec!["[DM from Anonymous]: hi"]);
    assert_eq!(ic.drain(), vec!["[DM from Anonymous]: hi"]);
    assert!(ia.drain().is_empty());

    let outcome = handle
        .direct_message(ma.session_id(), nick("carol"), "hi".to_string())
        .await
        .unwrap();
    assert_eq!(outcome, DirectOutcome::NotFound);
    assert_eq!(ia.drain(), vec!["User carol not found."]);
    assert!(ib.drain().is_empty());
    assert!(ic.drain().is_empty());
}

#[tokio::test]
async fn test_lookup_and_snapshot() {
    let handle = spawn_registry(MAX_SESSIONS);
    let (a, _ia) = create_peer(1);
    let (b, _ib) = create_peer(2);

    let ma = handle.join(a).await.unwrap();
    let _mb = handle.join(b).await.unwrap();
    handle.rename(ma.session_id(), nick("zoe")).await.unwrap();

    assert_eq!(handle.lookup(nick("zoe")).await, vec![SessionId::new(1)]);
    assert_eq!(
        handle.lookup(Nickname::anonymous()).await,
        vec![SessionId::new(2)]
    );
    assert!(handle.lookup(nick("nobody")).await.is_empty());

    let snapshot = handle.snapshot().await;
    let names: Vec<&str> = snapshot.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["Anonymous", "zoe"]);
}

// ============================================================================
// Concurrency Tests
// ============================================================================

/// Checks that every session appears under exactly one name and no name is empty.
async fn assert_registry_consistent(handle: &RegistryHandle) {
    let snapshot = handle.snapshot().await;
    let mut seen = HashSet::new();

    for (name, sessions) in &snapshot {
        assert!(!sessions.is_empty(), "empty entry for {name}");
        for id in sessions {
            assert!(seen.insert(*id), "{id} registered under two names");
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_join_rename_leave() {
    let handle = spawn_registry(MAX_SESSIONS);

    let mut tasks = Vec::new();
    for i in 0..50u64 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            let (peer, mut inbox) = create_peer(i);
            let membership = handle.join(peer).await.unwrap();

            for round in 0..10 {
                let name = nick(&format!("user{}", (i + round) % 7));
                handle.rename(membership.session_id(), name).await.unwrap();
                handle
                    .chat(membership.session_id(), format!("{i}:{round}"))
                    .await
                    .unwrap();
                inbox.drain();
            }

            membership.leave(DepartureReason::Quit).await.unwrap();
        }));
    }

    // Check consistency while the tasks run
    for _ in 0..20 {
        assert_registry_consistent(&handle).await;
        tokio::task::yield_now().await;
    }

    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(handle.session_count().await, 0);
    assert!(handle.snapshot().await.is_empty());
}

#[tokio::test]
async fn test_broadcast_never_reaches_sender() {
    let handle = spawn_registry(MAX_SESSIONS);

    let mut members = Vec::new();
    let mut inboxes = Vec::new();
    for i in 0..5 {
        let (peer, inbox) = create_peer(i);
        members.push(handle.join(peer).await.unwrap());
        inboxes.push(inbox);
    }
    for inbox in &mut inboxes {
        inbox.drain();
    }

    for (i, member) in members.iter().enumerate() {
        handle
            .chat(member.session_id(), format!("from {i}"))
            .await
            .unwrap();
    }

    for (i, inbox) in inboxes.iter_mut().enumerate() {
        let lines = inbox.drain();
        assert_eq!(lines.len(), 4);
        assert!(!lines.contains(&format!("Anonymous: from {i}")));
    }
}

#[tokio::test]
async fn test_full_outbox_does_not_block_registry() {
    let handle = spawn_registry(MAX_SESSIONS);

    let (slow_tx, _slow_rx) = mpsc::channel(1);
    let slow = Peer::new(SessionId::new(1), slow_tx);
    let (fast, mut fast_inbox) = create_peer(2);
    let (sender, _sender_inbox) = create_peer(3);

    let _ms = handle.join(slow).await.unwrap();
    let _mf = handle.join(fast).await.unwrap();
    let sender = handle.join(sender).await.unwrap();
    fast_inbox.drain();

    let mut dropped = 0;
    for i in 0..20 {
        let delivery = timeout(
            Duration::from_secs(1),
            handle.chat(sender.session_id(), format!("{i}")),
        )
        .await
        .expect("registry must not block on a full outbox")
        .unwrap();
        dropped += delivery.dropped;
    }

    assert!(dropped > 0, "the slow peer should have dropped lines");
    assert_eq!(fast_inbox.drain().len(), 20);
}
