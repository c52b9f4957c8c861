//! `Turnbase` builder and the running server handle.
//!
//! Ties the layers together: one dispatcher in front of the transport, one
//! room registry in front of the rule engines.

use std::sync::Arc;

use tracing::info;
use turnbase_dispatch::{DispatchStats, DispatcherConfig, EventDispatcher, Transport};
use turnbase_protocol::{GameKind, PlayerId, RoomId};
use turnbase_room::{
    PersistenceGateway, RoomConfig, RoomError, RoomHandle, RoomRegistry, SessionHandle,
};
use turnbase_rules::word::WordConfig;

use crate::TurnbaseError;

/// Builder for configuring and starting a Turnbase server.
///
/// # Example
///
/// ```rust,ignore
/// let server = Turnbase::builder()
///     .dispatcher_config(DispatcherConfig { flush_interval: Duration::from_millis(50), ..Default::default() })
///     .rng_seed(42)
///     .build(my_transport, Arc::new(InMemoryPersistence::new()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TurnbaseBuilder {
    room_config: RoomConfig,
    dispatcher_config: DispatcherConfig,
}

impl TurnbaseBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration every room is created with.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets the word placement settings, keeping the rest of the room config.
    pub fn word_config(mut self, config: WordConfig) -> Self {
        self.room_config.word = config;
        self
    }

    /// Seeds every room's RNG, for reproducible games.
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.room_config.rng_seed = Some(seed);
        self
    }

    /// Sets the flush interval and send timeout of the dispatcher.
    pub fn dispatcher_config(mut self, config: DispatcherConfig) -> Self {
        self.dispatcher_config = config;
        self
    }

    /// Spawns the dispatcher over `transport` and builds the registry.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build<T, P>(self, transport: T, persistence: Arc<P>) -> Turnbase<P>
    where
        T: Transport,
        P: PersistenceGateway,
    {
        let flush_interval = self.dispatcher_config.flush_interval;
        let dispatcher = EventDispatcher::spawn(transport, self.dispatcher_config);
        let registry = RoomRegistry::new(self.room_config, dispatcher.clone(), persistence);
        info!(?flush_interval, "turnbase server started");
        Turnbase {
            registry: Arc::new(registry),
            dispatcher,
        }
    }
}

/// A running Turnbase server.
///
/// Cheap to clone: clones share the same registry and dispatcher, so each
/// connection task can hold its own.
pub struct Turnbase<P: PersistenceGateway> {
    registry: Arc<RoomRegistry<P>>,
    dispatcher: EventDispatcher,
}

impl<P: PersistenceGateway> Clone for Turnbase<P> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<P: PersistenceGateway> Turnbase<P> {
    /// Creates a new builder.
    pub fn builder() -> TurnbaseBuilder {
        TurnbaseBuilder::new()
    }

    pub fn registry(&self) -> &Arc<RoomRegistry<P>> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// Puts `player_id` in the room under a fresh session handle, creating
    /// the room if needed.
    pub fn join(
        &self,
        room_id: &RoomId,
        kind: GameKind,
        player_id: PlayerId,
    ) -> Result<RoomHandle, TurnbaseError> {
        self.join_with_session(room_id, kind, player_id, SessionHandle::next())
    }

    /// Like [`join`](Self::join), for callers that track their own sessions.
    pub fn join_with_session(
        &self,
        room_id: &RoomId,
        kind: GameKind,
        player_id: PlayerId,
        session: SessionHandle,
    ) -> Result<RoomHandle, TurnbaseError> {
        Ok(self.registry.join(room_id, kind, player_id, session)?)
    }

    /// Takes `player_id` out of the room; the room is torn down once empty.
    pub async fn leave(&self, room_id: &RoomId, player_id: &PlayerId) -> Result<(), TurnbaseError> {
        Ok(self.registry.leave(room_id, player_id).await?)
    }

    /// The live room for `room_id`.
    pub fn room(&self, room_id: &RoomId) -> Result<RoomHandle, TurnbaseError> {
        self.registry
            .get(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()).into())
    }

    /// Forwards a raw client action to its room.
    pub async fn submit(
        &self,
        room_id: &RoomId,
        player_id: PlayerId,
        payload: impl Into<String>,
    ) -> Result<(), TurnbaseError> {
        Ok(self.room(room_id)?.process_event(player_id, payload).await?)
    }

    /// Closes every room, then flushes and stops the dispatcher.
    ///
    /// Rooms with a game in progress persist a final snapshot on the way
    /// down, and their last events are still delivered.
    pub async fn shutdown(&self) -> Result<DispatchStats, TurnbaseError> {
        self.registry.close_all().await;
        let stats = self.dispatcher.shutdown().await?;
        info!(
            batches = stats.batches_delivered,
            dropped = stats.batches_dropped,
            "turnbase server stopped"
        );
        Ok(stats)
    }
}
