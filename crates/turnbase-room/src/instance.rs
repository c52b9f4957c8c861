//! The per-room game state machine.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};
use turnbase_dispatch::EventDispatcher;
use turnbase_protocol::{ClientAction, GameKind, PlayerId, RoomId, ServerEvent};

use crate::game::{Delivery, Game};
use crate::{Engines, InstanceState, PersistenceGateway, PlayerSet, RoomError};

/// One room's game: lifecycle, turn counter and the rule engine state.
///
/// Not thread-safe by itself. The room actor owns it and feeds it one
/// command at a time, which makes every method here single-writer.
///
/// Events go out through the [`EventDispatcher`] and never block on
/// delivery. The final state goes to the [`PersistenceGateway`] exactly once
/// per game, when the game ends.
pub struct GameInstance<P: PersistenceGateway> {
    room_id: RoomId,
    kind: GameKind,
    state: InstanceState,
    turn_count: u64,
    game: Game,
    players: PlayerSet,
    dispatcher: EventDispatcher,
    persistence: Arc<P>,
    rng: StdRng,
    /// The `GameEnded` event, fixed the moment the game ends.
    ended: Option<ServerEvent>,
    snapshot_written: bool,
}

impl<P: PersistenceGateway> GameInstance<P> {
    pub fn new(
        room_id: RoomId,
        kind: GameKind,
        players: PlayerSet,
        engines: &Engines,
        dispatcher: EventDispatcher,
        persistence: Arc<P>,
        rng_seed: Option<u64>,
    ) -> Self {
        let rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Self {
            room_id,
            kind,
            state: InstanceState::Idle,
            turn_count: 0,
            game: Game::new(kind, engines),
            players,
            dispatcher,
            persistence,
            rng,
            ended: None,
            snapshot_written: false,
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn kind(&self) -> GameKind {
        self.kind
    }

    pub fn state(&self) -> InstanceState {
        self.state
    }

    /// Accepted moves since the last start.
    pub fn turn_count(&self) -> u64 {
        self.turn_count
    }

    /// The winner once the game has ended. `None` before that, and on a tie.
    pub fn winner(&self) -> Option<PlayerId> {
        match &self.ended {
            Some(ServerEvent::GameEnded { winner, .. }) => winner.clone(),
            _ => None,
        }
    }

    pub fn players(&self) -> &PlayerSet {
        &self.players
    }

    /// Starts a game with the current members in join order.
    ///
    /// From `Active` this resets: a fresh game, turn counter at zero, and
    /// `GameStarted` broadcast again. From `Ended` it fails.
    pub async fn start(&mut self) -> Result<(), RoomError> {
        if !self.state.can_start() {
            return Err(RoomError::InvalidState(format!(
                "cannot start a game in state {}",
                self.state
            )));
        }

        let order = self.players.turn_order();
        let needed = self.kind.min_players();
        if order.len() < needed {
            return Err(RoomError::InvalidState(format!(
                "{} needs at least {needed} players, room has {}",
                self.kind,
                order.len()
            )));
        }

        self.game
            .begin(order, &mut self.rng)
            .map_err(|rejection| RoomError::InvalidState(rejection.to_string()))?;

        let restarted = self.state.is_active();
        self.state = InstanceState::Active;
        self.turn_count = 0;
        self.ended = None;
        self.snapshot_written = false;

        info!(
            room_id = %self.room_id,
            kind = %self.kind,
            players = self.players.len(),
            restarted,
            "game started"
        );
        self.announce_start();
        Ok(())
    }

    /// Handles one raw action payload from `player_id`.
    ///
    /// Outside `Active` this is a logged no-op. A malformed payload or a
    /// refused move sends an `Error` event to that player only and leaves
    /// the game untouched. An accepted move bumps the turn counter, is
    /// broadcast, and ends the game if the engine says it's over.
    pub async fn process_event(&mut self, player_id: &PlayerId, payload: &str) {
        if !self.state.is_active() {
            debug!(
                room_id = %self.room_id,
                %player_id,
                state = %self.state,
                "ignoring action, game not active"
            );
            return;
        }

        let action = match ClientAction::decode(payload) {
            Ok(action) => action,
            Err(error) => {
                debug!(room_id = %self.room_id, %player_id, %error, "undecodable action");
                self.send(player_id, ServerEvent::error(error.to_string()));
                return;
            }
        };

        if !self.players.contains(player_id) {
            debug!(room_id = %self.room_id, %player_id, "action from non-member");
            self.send(
                player_id,
                ServerEvent::error(format!("player {player_id} is not in this room")),
            );
            return;
        }

        let action_name = action.name();
        let turn = self.turn_count + 1;
        match self.game.play(player_id, action, turn, &mut self.rng) {
            Ok(deliveries) => {
                self.turn_count = turn;
                debug!(
                    room_id = %self.room_id,
                    %player_id,
                    action = action_name,
                    turn,
                    "move accepted"
                );
                for delivery in deliveries {
                    self.deliver(delivery);
                }
                if self.game.is_finished() {
                    self.stop().await;
                }
            }
            Err(rejection) => {
                debug!(
                    room_id = %self.room_id,
                    %player_id,
                    action = action_name,
                    reason = %rejection,
                    "move rejected"
                );
                self.send(player_id, ServerEvent::error(rejection.to_string()));
            }
        }
    }

    /// Ends the game.
    ///
    /// The first call fixes the winner, broadcasts `GameEnded` and appends
    /// one final snapshot. Later calls only broadcast the same `GameEnded`
    /// again. On an instance that never started this is a logged no-op.
    pub async fn stop(&mut self) {
        match self.state {
            InstanceState::Idle => {
                debug!(room_id = %self.room_id, "stop on idle instance ignored");
            }
            InstanceState::Ended => {
                if let Some(event) = self.ended.clone() {
                    self.broadcast(&event);
                }
            }
            InstanceState::Active => {
                let event = ServerEvent::GameEnded {
                    winner: self.game.winner(),
                    scores: self.game.scores(),
                };
                self.state = InstanceState::Ended;
                self.ended = Some(event.clone());

                info!(
                    room_id = %self.room_id,
                    winner = ?self.winner(),
                    turns = self.turn_count,
                    "game ended"
                );
                self.broadcast(&event);
                self.persist_final().await;
            }
        }
    }

    /// Resumes from the newest stored snapshot.
    ///
    /// Only valid on an `Idle` instance. Returns `false` if there is no
    /// snapshot. A snapshot of a finished game lands straight in `Ended`.
    pub async fn restore(&mut self) -> Result<bool, RoomError> {
        if self.state != InstanceState::Idle {
            return Err(RoomError::InvalidState(format!(
                "cannot restore into state {}",
                self.state
            )));
        }

        let Some(json) = self.persistence.latest_snapshot(&self.room_id).await? else {
            debug!(room_id = %self.room_id, "no snapshot to restore");
            return Ok(false);
        };
        self.game
            .restore(&json)
            .map_err(|error| RoomError::Snapshot(self.room_id.clone(), error))?;
        self.turn_count = 0;

        if self.game.is_finished() {
            let event = ServerEvent::GameEnded {
                winner: self.game.winner(),
                scores: self.game.scores(),
            };
            self.state = InstanceState::Ended;
            self.ended = Some(event.clone());
            self.snapshot_written = true;
            info!(room_id = %self.room_id, "restored a finished game");
            self.broadcast(&event);
        } else {
            self.state = InstanceState::Active;
            self.snapshot_written = false;
            info!(room_id = %self.room_id, kind = %self.kind, "game restored");
            self.announce_start();
        }
        Ok(true)
    }

    /// Appends the current state if a game is still running. Called when
    /// the room is torn down so an unfinished game can be resumed later.
    pub async fn persist_on_teardown(&mut self) {
        if self.state.is_active() {
            self.write_snapshot("teardown").await;
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn announce_start(&self) {
        self.broadcast(&ServerEvent::GameStarted {
            kind: self.kind,
            metadata: self.game.metadata(),
        });
        for delivery in self.game.rack_updates() {
            self.deliver(delivery);
        }
    }

    async fn persist_final(&mut self) {
        if self.snapshot_written {
            return;
        }
        self.snapshot_written = true;
        self.write_snapshot("final").await;
    }

    async fn write_snapshot(&self, reason: &'static str) {
        let json = match self.game.snapshot() {
            Ok(Some(json)) => json,
            Ok(None) => return,
            Err(error) => {
                warn!(room_id = %self.room_id, %error, reason, "could not encode snapshot");
                return;
            }
        };
        match self.persistence.append_snapshot(&self.room_id, json).await {
            Ok(()) => debug!(room_id = %self.room_id, reason, "snapshot saved"),
            Err(error) => {
                warn!(room_id = %self.room_id, %error, reason, "snapshot dropped");
            }
        }
    }

    fn deliver(&self, delivery: Delivery) {
        match delivery {
            Delivery::Broadcast(event) => self.broadcast(&event),
            Delivery::ToPlayer(player_id, event) => self.send(&player_id, event),
        }
    }

    fn broadcast(&self, event: &ServerEvent) {
        if let Err(error) = self.dispatcher.broadcast_event(&self.room_id, event) {
            warn!(room_id = %self.room_id, event = event.name(), %error, "broadcast dropped");
        }
    }

    fn send(&self, player_id: &PlayerId, event: ServerEvent) {
        if let Err(error) = self.dispatcher.send_event(player_id, &event) {
            warn!(
                room_id = %self.room_id,
                %player_id,
                event = event.name(),
                %error,
                "message dropped"
            );
        }
    }
}
