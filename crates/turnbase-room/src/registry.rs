//! The room registry: one owned map from room id to running room.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info, warn};
use turnbase_dispatch::EventDispatcher;
use turnbase_protocol::{GameKind, PlayerId, RoomId};

use crate::room::spawn_room;
use crate::{
    Engines, GameInstance, PersistenceGateway, PlayerSet, RoomConfig, RoomError, RoomHandle,
    SessionHandle,
};

struct RoomEntry {
    handle: RoomHandle,
    players: PlayerSet,
}

/// Owns every live room and tracks who is in which.
///
/// All methods take `&self`; share the registry behind an `Arc`. The map is
/// sharded, so operations on different rooms don't contend.
///
/// A room exists from the first join (or `get_or_create`) for its id until
/// its last player leaves. A later join with the same id builds a fresh
/// room.
pub struct RoomRegistry<P: PersistenceGateway> {
    rooms: DashMap<RoomId, RoomEntry>,
    config: RoomConfig,
    engines: Engines,
    dispatcher: EventDispatcher,
    persistence: Arc<P>,
}

impl<P: PersistenceGateway> RoomRegistry<P> {
    pub fn new(config: RoomConfig, dispatcher: EventDispatcher, persistence: Arc<P>) -> Self {
        let config = config.validated();
        Self {
            rooms: DashMap::new(),
            engines: Engines::new(&config),
            config,
            dispatcher,
            persistence,
        }
    }

    /// Returns the room for `room_id`, creating it if needed.
    ///
    /// Exactly one room is ever created per unseen id, however many callers
    /// race on it. If the room already exists with a different kind, the
    /// existing room wins.
    pub fn get_or_create(&self, room_id: &RoomId, kind: GameKind) -> RoomHandle {
        self.entry(room_id, kind).0
    }

    /// Puts `player_id` in the room, creating the room if needed.
    pub fn join(
        &self,
        room_id: &RoomId,
        kind: GameKind,
        player_id: PlayerId,
        session: SessionHandle,
    ) -> Result<RoomHandle, RoomError> {
        loop {
            let (handle, players) = self.entry(room_id, kind);
            players.insert(room_id, player_id.clone(), session, self.config.max_players)?;

            // The last member may have left, and the room been torn down,
            // between the lookup and the insert. Only keep the seat if the
            // room is still the registered one.
            let current = self
                .rooms
                .get(room_id)
                .is_some_and(|entry| entry.handle.same_room(&handle));
            if current {
                info!(
                    %room_id,
                    %player_id,
                    %session,
                    players = players.len(),
                    "player joined"
                );
                return Ok(handle);
            }

            players.remove(&player_id);
            debug!(%room_id, %player_id, "room torn down during join, retrying");
        }
    }

    /// Takes `player_id` out of the room. When the room becomes empty it is
    /// removed and shut down (persisting an unfinished game).
    pub async fn leave(&self, room_id: &RoomId, player_id: &PlayerId) -> Result<(), RoomError> {
        let players = self
            .rooms
            .get(room_id)
            .map(|entry| entry.players.clone())
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;

        let session = players
            .remove(player_id)
            .ok_or_else(|| RoomError::NotInRoom(player_id.clone(), room_id.clone()))?;
        info!(
            %room_id,
            %player_id,
            %session,
            players = players.len(),
            "player left"
        );

        if players.is_empty() {
            self.remove(room_id).await.or_else(|error| match error {
                // Someone joined, or another leave already tore it down.
                RoomError::InvalidState(_) | RoomError::NotFound(_) => Ok(()),
                other => Err(other),
            })?;
        }
        Ok(())
    }

    /// Removes an empty room and shuts its actor down.
    ///
    /// Fails with [`RoomError::InvalidState`] if the room still has players.
    pub async fn remove(&self, room_id: &RoomId) -> Result<(), RoomError> {
        match self
            .rooms
            .remove_if(room_id, |_, entry| entry.players.is_empty())
        {
            Some((_, entry)) => {
                info!(%room_id, "room removed");
                shutdown_room(&entry.handle).await;
                Ok(())
            }
            None if self.rooms.contains_key(room_id) => Err(RoomError::InvalidState(format!(
                "room {room_id} still has players"
            ))),
            None => Err(RoomError::NotFound(room_id.clone())),
        }
    }

    /// Removes and shuts down every room, players or not.
    pub async fn close_all(&self) {
        let ids = self.room_ids();
        for room_id in ids {
            if let Some((_, entry)) = self.rooms.remove(&room_id) {
                shutdown_room(&entry.handle).await;
            }
        }
        info!("all rooms closed");
    }

    pub fn get(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.get(room_id).map(|entry| entry.handle.clone())
    }

    /// Members of a room, shared with the room itself.
    pub fn players(&self, room_id: &RoomId) -> Option<PlayerSet> {
        self.rooms.get(room_id).map(|entry| entry.players.clone())
    }

    /// Ids of all live rooms, sorted.
    pub fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self.rooms.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    fn entry(&self, room_id: &RoomId, kind: GameKind) -> (RoomHandle, PlayerSet) {
        let entry = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            let players = PlayerSet::new();
            let instance = GameInstance::new(
                room_id.clone(),
                kind,
                players.clone(),
                &self.engines,
                self.dispatcher.clone(),
                Arc::clone(&self.persistence),
                self.config.rng_seed,
            );
            info!(%room_id, %kind, "room created");
            RoomEntry {
                handle: spawn_room(instance, self.config.command_channel_size),
                players,
            }
        });
        if entry.handle.kind() != kind {
            debug!(
                %room_id,
                existing = %entry.handle.kind(),
                requested = %kind,
                "room exists with another game kind, keeping it"
            );
        }
        (entry.handle.clone(), entry.players.clone())
    }
}

async fn shutdown_room(handle: &RoomHandle) {
    if let Err(error) = handle.shutdown().await {
        warn!(room_id = %handle.room_id(), %error, "room was already stopped");
    }
}
