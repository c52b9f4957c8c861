//! End-to-end tests for the `Turnbase` facade: builder, join/leave, action
//! submission and shutdown, with a transport that records what it is sent.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::sleep;
use turnbase::prelude::*;

// =========================================================================
// Helpers
// =========================================================================

#[derive(Clone, Default)]
struct RecordingTransport {
    sent: Arc<Mutex<Vec<(Target, Batch)>>>,
}

impl RecordingTransport {
    /// Event types delivered to `target`, in order, across all batches.
    fn event_types(&self, target: &Target) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == target)
            .flat_map(|(_, batch)| batch.iter())
            .map(|payload| payload["EventType"].as_str().unwrap().to_string())
            .collect()
    }

    fn batch_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Transport for RecordingTransport {
    async fn send_to_group(&self, room_id: &RoomId, batch: Batch) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push((Target::Room(room_id.clone()), batch));
        Ok(())
    }

    async fn send_to_user(&self, user_id: &PlayerId, batch: Batch) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push((Target::User(user_id.clone()), batch));
        Ok(())
    }
}

struct Harness {
    server: Turnbase<InMemoryPersistence>,
    transport: RecordingTransport,
    persistence: Arc<InMemoryPersistence>,
}

fn harness() -> Harness {
    let transport = RecordingTransport::default();
    let persistence = Arc::new(InMemoryPersistence::new());
    let server = Turnbase::<InMemoryPersistence>::builder()
        .room_config(RoomConfig {
            max_players: 2,
            ..RoomConfig::default()
        })
        .word_config(WordConfig {
            tile_bag: TileBagSource::Fixed("HELLOABHELLOCDXYZ".chars().collect()),
            dictionary: Arc::new(Dictionary::from_words(["HELLO", "HE"])),
            ..WordConfig::default()
        })
        .rng_seed(3)
        .build(transport.clone(), Arc::clone(&persistence));
    Harness {
        server,
        transport,
        persistence,
    }
}

fn duel() -> RoomId {
    RoomId::from("duel")
}

fn pid(name: &str) -> PlayerId {
    PlayerId::from(name)
}

const HELLO: &str = r#"{"Action":"PlaceTiles","Tiles":[
    {"Row":7,"Col":7,"Letter":"H"},{"Row":7,"Col":8,"Letter":"E"},
    {"Row":7,"Col":9,"Letter":"L"},{"Row":7,"Col":10,"Letter":"L"},
    {"Row":7,"Col":11,"Letter":"O"}]}"#;

// =========================================================================
// Game flow
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_move_reaches_room_and_mover() {
    let h = harness();
    let room = h
        .server
        .join(&duel(), GameKind::WordPlacement, pid("alice"))
        .unwrap();
    h.server
        .join(&duel(), GameKind::WordPlacement, pid("bob"))
        .unwrap();

    room.start().await.unwrap();
    h.server.submit(&duel(), pid("alice"), HELLO).await.unwrap();
    sleep(Duration::from_millis(150)).await;

    assert_eq!(
        h.transport.event_types(&Target::Room(duel())),
        ["GameStarted", "TilesPlaced"]
    );
    assert_eq!(
        h.transport.event_types(&Target::User(pid("alice"))),
        ["RackUpdated", "RackUpdated"]
    );
    assert_eq!(
        h.transport.event_types(&Target::User(pid("bob"))),
        ["RackUpdated"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_rejected_move_answers_only_the_sender() {
    let h = harness();
    let room = h
        .server
        .join(&duel(), GameKind::WordPlacement, pid("alice"))
        .unwrap();
    h.server
        .join(&duel(), GameKind::WordPlacement, pid("bob"))
        .unwrap();
    room.start().await.unwrap();
    sleep(Duration::from_millis(150)).await;

    h.server.submit(&duel(), pid("bob"), HELLO).await.unwrap();
    sleep(Duration::from_millis(100)).await;

    assert_eq!(
        h.transport.event_types(&Target::User(pid("bob"))),
        ["RackUpdated", "Error"]
    );
    assert_eq!(
        h.transport.event_types(&Target::Room(duel())),
        ["GameStarted"]
    );
    assert_eq!(room.info().await.unwrap().turn_count, 0);
}

#[tokio::test]
async fn test_submit_to_unknown_room_fails() {
    let h = harness();
    let err = h
        .server
        .submit(&RoomId::from("nowhere"), pid("alice"), HELLO)
        .await
        .unwrap_err();
    assert!(matches!(err, TurnbaseError::Room(RoomError::NotFound(_))));
}

// =========================================================================
// Membership
// =========================================================================

#[tokio::test]
async fn test_join_past_max_players_is_refused() {
    let h = harness();
    h.server
        .join(&duel(), GameKind::CoinFlip, pid("alice"))
        .unwrap();
    h.server.join(&duel(), GameKind::CoinFlip, pid("bob")).unwrap();

    let err = h
        .server
        .join(&duel(), GameKind::CoinFlip, pid("carol"))
        .unwrap_err();
    assert!(matches!(err, TurnbaseError::Room(RoomError::RoomFull(_))));
}

#[tokio::test]
async fn test_last_leave_tears_the_room_down() {
    let h = harness();
    h.server
        .join(&duel(), GameKind::CoinFlip, pid("alice"))
        .unwrap();
    assert_eq!(h.server.registry().room_count(), 1);

    h.server.leave(&duel(), &pid("alice")).await.unwrap();
    assert_eq!(h.server.registry().room_count(), 0);
    assert!(h.server.room(&duel()).is_err());
}

// =========================================================================
// Shutdown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_shutdown_persists_live_games_and_flushes() {
    let h = harness();
    let room = h
        .server
        .join(&duel(), GameKind::WordPlacement, pid("alice"))
        .unwrap();
    room.start().await.unwrap();

    let stats = h.server.shutdown().await.unwrap();

    assert_eq!(h.persistence.snapshot_count(&duel()), 1);
    assert_eq!(h.server.registry().room_count(), 0);
    assert_eq!(stats.batches_dropped, 0);
    assert_eq!(stats.batches_delivered as usize, h.transport.batch_count());
    assert_eq!(
        h.transport.event_types(&Target::Room(duel())),
        ["GameStarted"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_enqueue_after_shutdown_is_refused() {
    let h = harness();
    h.server.shutdown().await.unwrap();

    let err = h
        .server
        .dispatcher()
        .enqueue_broadcast(&duel(), serde_json::json!({"late": true}))
        .unwrap_err();
    assert!(matches!(err, DispatchError::ShuttingDown | DispatchError::Stopped));
}
