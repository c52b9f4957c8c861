//! A scripted two-player word game and coin flip, run end to end through
//! Turnbase with a transport that only logs what it would send.
//!
//! ```text
//! RUST_LOG=debug cargo run -p word-duel [-- path/to/words.txt]
//! ```

use std::sync::Arc;

use tracing::info;
use turnbase::prelude::*;
use turnbase::telemetry::init_tracing;

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Logs every batch instead of writing it to a socket.
struct LoggingTransport;

impl LoggingTransport {
    fn log(target: Target, batch: &Batch) {
        let events: Vec<&str> = batch
            .iter()
            .filter_map(|payload| payload["EventType"].as_str())
            .collect();
        info!(%target, ?events, "batch delivered");
        for payload in batch {
            tracing::debug!(%target, %payload, "payload");
        }
    }
}

impl Transport for LoggingTransport {
    async fn send_to_group(&self, room_id: &RoomId, batch: Batch) -> Result<(), TransportError> {
        Self::log(Target::Room(room_id.clone()), &batch);
        Ok(())
    }

    async fn send_to_user(&self, user_id: &PlayerId, batch: Batch) -> Result<(), TransportError> {
        Self::log(Target::User(user_id.clone()), &batch);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

/// Alice draws HELLOAB, Bob draws TAXIESR.
const BAG: &str = "HELLOABTAXIESRNUDGE";

const WORDS: [&str; 6] = ["HELLO", "HAT", "HE", "AT", "TAXI", "SIT"];

const ALICE_HELLO: &str = r#"{"Action":"PlaceTiles","Tiles":[
    {"Row":7,"Col":7,"Letter":"H"},{"Row":7,"Col":8,"Letter":"E"},
    {"Row":7,"Col":9,"Letter":"L"},{"Row":7,"Col":10,"Letter":"L"},
    {"Row":7,"Col":11,"Letter":"O"}]}"#;

/// A lone T under the H spells HT, which is not a word.
const BOB_BOGUS: &str = r#"{"Action":"PlaceTiles","Tiles":[
    {"Row":8,"Col":7,"Letter":"T"}]}"#;

/// A and T under the H spell HAT downwards.
const BOB_HAT: &str = r#"{"Action":"PlaceTiles","Tiles":[
    {"Row":8,"Col":7,"Letter":"A"},{"Row":9,"Col":7,"Letter":"T"}]}"#;

fn dictionary() -> Result<Dictionary, TurnbaseError> {
    match std::env::args().nth(1) {
        Some(path) => {
            info!(%path, "loading dictionary");
            Ok(Dictionary::from_path(path)?)
        }
        None => Ok(Dictionary::from_words(WORDS)),
    }
}

async fn word_duel(server: &Turnbase<InMemoryPersistence>) -> Result<(), TurnbaseError> {
    let room_id = RoomId::from("word-duel");
    let alice = PlayerId::from("alice");
    let bob = PlayerId::from("bob");

    let room = server.join(&room_id, GameKind::WordPlacement, alice.clone())?;
    server.join(&room_id, GameKind::WordPlacement, bob.clone())?;
    room.start().await?;

    server.submit(&room_id, alice.clone(), ALICE_HELLO).await?;
    server.submit(&room_id, bob.clone(), BOB_BOGUS).await?;
    server.submit(&room_id, bob.clone(), BOB_HAT).await?;

    room.stop().await?;
    let summary = room.info().await?;
    info!(
        room_id = %summary.room_id,
        state = %summary.state,
        turns = summary.turn_count,
        winner = ?summary.winner,
        "word duel finished"
    );

    server.leave(&room_id, &alice).await?;
    server.leave(&room_id, &bob).await?;
    Ok(())
}

async fn coin_toss(server: &Turnbase<InMemoryPersistence>) -> Result<(), TurnbaseError> {
    let room_id = RoomId::from("coin-toss");
    let alice = PlayerId::from("alice");
    let bob = PlayerId::from("bob");

    let room = server.join(&room_id, GameKind::CoinFlip, alice.clone())?;
    server.join(&room_id, GameKind::CoinFlip, bob)?;
    room.start().await?;
    server
        .submit(&room_id, alice, ClientAction::FlipCoin.encode()?)
        .await?;

    let summary = room.info().await?;
    info!(
        room_id = %summary.room_id,
        state = %summary.state,
        winner = ?summary.winner,
        "coin toss finished"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), TurnbaseError> {
    init_tracing("info")?;

    let persistence = Arc::new(InMemoryPersistence::new());
    let server = Turnbase::<InMemoryPersistence>::builder()
        .word_config(WordConfig {
            tile_bag: TileBagSource::Fixed(BAG.chars().collect()),
            dictionary: Arc::new(dictionary()?),
            ..WordConfig::default()
        })
        .rng_seed(2024)
        .build(LoggingTransport, Arc::clone(&persistence));

    word_duel(&server).await?;
    coin_toss(&server).await?;

    let stats = server.shutdown().await?;
    info!(
        batches = stats.batches_delivered,
        messages = stats.messages_delivered,
        snapshots = persistence.snapshot_count(&RoomId::from("word-duel")),
        "demo complete"
    );
    Ok(())
}
