//! Error types for the room layer.

use turnbase_protocol::{PlayerId, RoomId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room is full, with no more player slots available.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The player is already in this room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// The player is not in this room.
    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomId),

    /// The instance is in a state that doesn't allow this operation,
    /// for example starting a game that has already ended.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// The room's actor has stopped.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),

    /// A stored snapshot could not be decoded.
    #[error("snapshot for room {0} is unreadable")]
    Snapshot(RoomId, #[source] serde_json::Error),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Errors reported by a [`PersistenceGateway`](crate::PersistenceGateway).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// The store could not be reached.
    #[error("snapshot store unavailable: {0}")]
    Unavailable(String),

    /// The store refused or failed the operation.
    #[error("snapshot store error: {0}")]
    Storage(String),
}
