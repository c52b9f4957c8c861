//! Room actor: an isolated Tokio task that owns a game instance.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. Commands are handled strictly one at a time,
//! so the game instance never sees two writers.

use turnbase_protocol::{GameKind, PlayerId, RoomId};
use tokio::sync::{mpsc, oneshot};

use crate::{GameInstance, InstanceState, PersistenceGateway, RoomError};

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel: the caller
/// sends a command and waits for the response on it.
pub(crate) enum RoomCommand {
    /// Start (or restart) the game.
    Start {
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// End the game.
    Stop { reply: oneshot::Sender<()> },

    /// Deliver a raw action payload from a player.
    Event { player_id: PlayerId, payload: String },

    /// Resume from the newest snapshot.
    Restore {
        reply: oneshot::Sender<Result<bool, RoomError>>,
    },

    /// Request the current room info.
    Info { reply: oneshot::Sender<RoomInfo> },

    /// Persist an unfinished game and stop the actor.
    Shutdown { reply: oneshot::Sender<()> },
}

/// A snapshot of room metadata (not the game state itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub kind: GameKind,
    pub state: InstanceState,
    pub player_count: usize,
    /// Accepted moves since the last start.
    pub turn_count: u64,
    /// Set once the game has ended with a single winner.
    pub winner: Option<PlayerId>,
}

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone; it's just an `mpsc::Sender` wrapper.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    kind: GameKind,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn kind(&self) -> GameKind {
        self.kind
    }

    /// `true` if both handles talk to the same actor.
    pub fn same_room(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    /// `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Starts the game with the room's current members.
    pub async fn start(&self) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Start { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Ends the game. Idempotent.
    pub async fn stop(&self) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Stop { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Sends a raw action payload to the room (fire-and-forget).
    ///
    /// The outcome reaches the player as events through the dispatcher.
    pub async fn process_event(
        &self,
        player_id: PlayerId,
        payload: impl Into<String>,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Event {
            player_id,
            payload: payload.into(),
        })
        .await
    }

    /// Resumes an idle room from its newest snapshot. Returns `false` if
    /// there was none.
    pub async fn restore(&self) -> Result<bool, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Restore { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Requests the current room info.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Info { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the room to shut down and waits until it has.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Shutdown { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    async fn send(&self, command: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_id.clone())
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<P: PersistenceGateway> {
    instance: GameInstance<P>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl<P: PersistenceGateway> RoomActor<P> {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        let room_id = self.instance.room_id().clone();
        tracing::info!(%room_id, kind = %self.instance.kind(), "room actor started");

        while let Some(command) = self.receiver.recv().await {
            match command {
                RoomCommand::Start { reply } => {
                    let result = self.instance.start().await;
                    let _ = reply.send(result);
                }
                RoomCommand::Stop { reply } => {
                    self.instance.stop().await;
                    let _ = reply.send(());
                }
                RoomCommand::Event { player_id, payload } => {
                    self.instance.process_event(&player_id, &payload).await;
                }
                RoomCommand::Restore { reply } => {
                    let result = self.instance.restore().await;
                    let _ = reply.send(result);
                }
                RoomCommand::Info { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown { reply } => {
                    tracing::info!(%room_id, "room shutting down");
                    self.instance.persist_on_teardown().await;
                    let _ = reply.send(());
                    break;
                }
            }
        }

        tracing::info!(%room_id, "room actor stopped");
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.instance.room_id().clone(),
            kind: self.instance.kind(),
            state: self.instance.state(),
            player_count: self.instance.players().len(),
            turn_count: self.instance.turn_count(),
            winner: self.instance.winner(),
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
///
/// `channel_size` controls backpressure: when the channel fills up,
/// senders wait.
pub(crate) fn spawn_room<P: PersistenceGateway>(
    instance: GameInstance<P>,
    channel_size: usize,
) -> RoomHandle {
    let (sender, receiver) = mpsc::channel(channel_size);
    let handle = RoomHandle {
        room_id: instance.room_id().clone(),
        kind: instance.kind(),
        sender,
    };

    tokio::spawn(RoomActor { instance, receiver }.run());

    handle
}
