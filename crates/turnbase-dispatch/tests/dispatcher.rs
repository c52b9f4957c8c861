//! Integration tests for the batched event dispatcher.
//!
//! Runs with paused Tokio time so tick boundaries are exact.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio::time::sleep;
use turnbase_dispatch::{
    Batch, DispatchError, DispatcherConfig, EventDispatcher, Transport, TransportError,
};
use turnbase_protocol::{PlayerId, RoomId, Target};

// =========================================================================
// Helpers
// =========================================================================

/// Records every batch it is handed. Targets listed in `failing` error out
/// instead; `delay` makes every send take that long, and `slow` overrides
/// it per target.
#[derive(Clone, Default)]
struct RecordingTransport {
    sent: Arc<Mutex<Vec<(Target, Batch)>>>,
    failing: Arc<Mutex<HashSet<Target>>>,
    slow: Arc<Mutex<HashMap<Target, Duration>>>,
    delay: Option<Duration>,
}

impl RecordingTransport {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    fn slow_for(&self, target: Target, delay: Duration) {
        self.slow.lock().unwrap().insert(target, delay);
    }

    fn fail_for(&self, target: Target) {
        self.failing.lock().unwrap().insert(target);
    }

    fn batches(&self) -> Vec<(Target, Batch)> {
        self.sent.lock().unwrap().clone()
    }

    fn batches_for(&self, target: &Target) -> Vec<Batch> {
        self.batches()
            .into_iter()
            .filter(|(t, _)| t == target)
            .map(|(_, b)| b)
            .collect()
    }

    async fn record(&self, target: Target, batch: Batch) -> Result<(), TransportError> {
        let delay = self.slow.lock().unwrap().get(&target).copied().or(self.delay);
        if let Some(delay) = delay {
            sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(&target) {
            return Err(TransportError::Failed(format!("{target} unreachable")));
        }
        self.sent.lock().unwrap().push((target, batch));
        Ok(())
    }
}

impl Transport for RecordingTransport {
    async fn send_to_group(&self, room_id: &RoomId, batch: Batch) -> Result<(), TransportError> {
        self.record(Target::Room(room_id.clone()), batch).await
    }

    async fn send_to_user(&self, user_id: &PlayerId, batch: Batch) -> Result<(), TransportError> {
        self.record(Target::User(user_id.clone()), batch).await
    }
}

fn room() -> RoomId {
    RoomId::from("lobby")
}

// =========================================================================
// Batching
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_payloads_within_one_tick_share_a_batch() {
    let transport = RecordingTransport::default();
    let dispatcher = EventDispatcher::spawn(transport.clone(), DispatcherConfig::default());

    dispatcher.enqueue_broadcast(&room(), json!({"n": 1})).unwrap();
    dispatcher.enqueue_broadcast(&room(), json!({"n": 2})).unwrap();
    sleep(Duration::from_millis(150)).await;

    assert_eq!(
        transport.batches(),
        vec![(Target::Room(room()), vec![json!({"n": 1}), json!({"n": 2})])]
    );

    dispatcher.enqueue_broadcast(&room(), json!({"n": 3})).unwrap();
    sleep(Duration::from_millis(100)).await;

    let batches = transport.batches_for(&Target::Room(room()));
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[1], vec![json!({"n": 3})]);
}

#[tokio::test(start_paused = true)]
async fn test_nothing_sent_before_first_tick() {
    let transport = RecordingTransport::default();
    let dispatcher = EventDispatcher::spawn(transport.clone(), DispatcherConfig::default());

    dispatcher.enqueue_broadcast(&room(), json!("early")).unwrap();
    sleep(Duration::from_millis(50)).await;
    assert!(transport.batches().is_empty());

    sleep(Duration::from_millis(60)).await;
    assert_eq!(transport.batches().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_each_target_gets_its_own_ordered_batch() {
    let transport = RecordingTransport::default();
    let dispatcher = EventDispatcher::spawn(transport.clone(), DispatcherConfig::default());
    let alice = PlayerId::from("alice");
    let bob = PlayerId::from("bob");

    dispatcher.enqueue_to_user(&alice, json!("a1")).unwrap();
    dispatcher.enqueue_broadcast(&room(), json!("r1")).unwrap();
    dispatcher.enqueue_to_user(&bob, json!("b1")).unwrap();
    dispatcher.enqueue_to_user(&alice, json!("a2")).unwrap();
    sleep(Duration::from_millis(110)).await;

    assert_eq!(transport.batches().len(), 3);
    assert_eq!(
        transport.batches_for(&Target::User(alice)),
        vec![vec![json!("a1"), json!("a2")]]
    );
    assert_eq!(
        transport.batches_for(&Target::User(bob)),
        vec![vec![json!("b1")]]
    );
    assert_eq!(
        transport.batches_for(&Target::Room(room())),
        vec![vec![json!("r1")]]
    );
}

#[tokio::test(start_paused = true)]
async fn test_idle_ticks_send_nothing() {
    let transport = RecordingTransport::default();
    let dispatcher = EventDispatcher::spawn(transport.clone(), DispatcherConfig::default());

    sleep(Duration::from_millis(1_050)).await;

    assert!(transport.batches().is_empty());
    let stats = dispatcher.stats().await.unwrap();
    assert_eq!(stats.flushes, 0);
    assert_eq!(stats.ticker.total_ticks, 10);
}

// =========================================================================
// Failures
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_failed_target_is_dropped_without_blocking_others() {
    let transport = RecordingTransport::default();
    transport.fail_for(Target::User(PlayerId::from("bob")));
    let dispatcher = EventDispatcher::spawn(transport.clone(), DispatcherConfig::default());

    dispatcher
        .enqueue_to_user(&PlayerId::from("bob"), json!("lost"))
        .unwrap();
    dispatcher
        .enqueue_to_user(&PlayerId::from("alice"), json!("kept"))
        .unwrap();
    sleep(Duration::from_millis(110)).await;

    assert_eq!(
        transport.batches(),
        vec![(Target::User(PlayerId::from("alice")), vec![json!("kept")])]
    );

    // No retry on the next tick.
    sleep(Duration::from_millis(100)).await;
    assert_eq!(transport.batches().len(), 1);

    let stats = dispatcher.stats().await.unwrap();
    assert_eq!(stats.batches_delivered, 1);
    assert_eq!(stats.batches_dropped, 1);
    assert_eq!(stats.messages_dropped, 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_target_does_not_hold_back_other_targets() {
    let transport = RecordingTransport::default();
    let alice = PlayerId::from("alice");
    transport.slow_for(Target::User(alice.clone()), Duration::from_secs(4));
    let dispatcher = EventDispatcher::spawn(transport.clone(), DispatcherConfig::default());

    dispatcher.enqueue_to_user(&alice, json!("a1")).unwrap();
    dispatcher.enqueue_broadcast(&room(), json!("r1")).unwrap();
    sleep(Duration::from_millis(150)).await;
    assert_eq!(
        transport.batches_for(&Target::Room(room())),
        vec![vec![json!("r1")]]
    );

    dispatcher.enqueue_broadcast(&room(), json!("r2")).unwrap();
    dispatcher.enqueue_to_user(&alice, json!("a2")).unwrap();
    sleep(Duration::from_millis(60)).await;

    // The room's next tick went out while alice's first send still runs.
    assert_eq!(
        transport.batches_for(&Target::Room(room())),
        vec![vec![json!("r1")], vec![json!("r2")]]
    );
    assert!(transport.batches_for(&Target::User(alice.clone())).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_target_keeps_its_batches_in_order() {
    let transport = RecordingTransport::default();
    let alice = PlayerId::from("alice");
    transport.slow_for(Target::User(alice.clone()), Duration::from_secs(4));
    let dispatcher = EventDispatcher::spawn(transport.clone(), DispatcherConfig::default());

    dispatcher.enqueue_to_user(&alice, json!("a1")).unwrap();
    sleep(Duration::from_millis(150)).await;
    dispatcher.enqueue_to_user(&alice, json!("a2")).unwrap();
    dispatcher.enqueue_to_user(&alice, json!("a3")).unwrap();

    // a1 lands at 4.1 s; a2 and a3 wait for it and go out together.
    sleep(Duration::from_secs(9)).await;

    assert_eq!(
        transport.batches_for(&Target::User(alice)),
        vec![vec![json!("a1")], vec![json!("a2"), json!("a3")]]
    );
    let stats = dispatcher.stats().await.unwrap();
    assert_eq!(stats.batches_delivered, 2);
    assert_eq!(stats.batches_dropped, 0);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_delivers_batch_held_behind_slow_send() {
    let transport = RecordingTransport::default();
    let alice = PlayerId::from("alice");
    transport.slow_for(Target::User(alice.clone()), Duration::from_secs(1));
    let dispatcher = EventDispatcher::spawn(transport.clone(), DispatcherConfig::default());

    dispatcher.enqueue_to_user(&alice, json!("a1")).unwrap();
    sleep(Duration::from_millis(150)).await;
    dispatcher.enqueue_to_user(&alice, json!("a2")).unwrap();

    let stats = dispatcher.shutdown().await.unwrap();

    assert_eq!(stats.batches_delivered, 2);
    assert_eq!(
        transport.batches_for(&Target::User(alice)),
        vec![vec![json!("a1")], vec![json!("a2")]]
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_send_times_out_and_drops() {
    let transport = RecordingTransport::with_delay(Duration::from_secs(30));
    let config = DispatcherConfig {
        send_timeout: Duration::from_secs(1),
        ..DispatcherConfig::default()
    };
    let dispatcher = EventDispatcher::spawn(transport.clone(), config);

    dispatcher.enqueue_broadcast(&room(), json!("slow")).unwrap();
    sleep(Duration::from_secs(2)).await;

    assert!(transport.batches().is_empty());
    let stats = dispatcher.stats().await.unwrap();
    assert_eq!(stats.batches_dropped, 1);
}

// =========================================================================
// Shutdown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_shutdown_delivers_pending_messages() {
    let transport = RecordingTransport::default();
    let dispatcher = EventDispatcher::spawn(transport.clone(), DispatcherConfig::default());

    dispatcher.enqueue_broadcast(&room(), json!("last words")).unwrap();
    let stats = dispatcher.shutdown().await.unwrap();

    assert_eq!(stats.batches_delivered, 1);
    assert_eq!(
        transport.batches(),
        vec![(Target::Room(room()), vec![json!("last words")])]
    );
}

#[tokio::test(start_paused = true)]
async fn test_enqueue_after_shutdown_fails() {
    let transport = RecordingTransport::default();
    let dispatcher = EventDispatcher::spawn(transport.clone(), DispatcherConfig::default());
    let other_handle = dispatcher.clone();

    dispatcher.shutdown().await.unwrap();

    let err = other_handle
        .enqueue_broadcast(&room(), json!("too late"))
        .unwrap_err();
    assert!(matches!(err, DispatchError::ShuttingDown));
    assert!(matches!(
        dispatcher.shutdown().await,
        Err(DispatchError::Stopped)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_waits_for_in_flight_flush() {
    let transport = RecordingTransport::with_delay(Duration::from_millis(50));
    let dispatcher = EventDispatcher::spawn(transport.clone(), DispatcherConfig::default());

    dispatcher.enqueue_broadcast(&room(), json!("in flight")).unwrap();
    // The tick at 100 ms starts a send that finishes at 150 ms.
    sleep(Duration::from_millis(120)).await;
    assert!(transport.batches().is_empty());

    let stats = dispatcher.shutdown().await.unwrap();
    assert_eq!(stats.batches_delivered, 1);
    assert_eq!(transport.batches().len(), 1);
}
