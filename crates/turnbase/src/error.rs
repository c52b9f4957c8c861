//! Unified error type for Turnbase.

use turnbase_dispatch::{DispatchError, TransportError};
use turnbase_protocol::ProtocolError;
use turnbase_room::{PersistenceError, RoomError};
use turnbase_rules::Rejection;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TurnbaseError {
    /// A payload could not be decoded or encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A move was refused by its rule engine.
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// The dispatcher is shutting down or gone.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// A transport failed to deliver a batch.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A room-level error (full, not found, invalid state).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The snapshot store failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Reading a dictionary or other file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A global tracing subscriber could not be installed.
    #[error("failed to initialise tracing: {0}")]
    Telemetry(String),
}

#[cfg(test)]
mod tests {
    use turnbase_protocol::{PlayerId, RoomId};

    use super::*;

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::UnknownGameKind("chess".into());
        let turnbase_err: TurnbaseError = err.into();
        assert!(matches!(turnbase_err, TurnbaseError::Protocol(_)));
        assert!(turnbase_err.to_string().contains("chess"));
    }

    #[test]
    fn test_from_rejection() {
        let turnbase_err: TurnbaseError = Rejection::NotYourTurn.into();
        assert!(matches!(turnbase_err, TurnbaseError::Rejected(_)));
        assert_eq!(turnbase_err.to_string(), "not your turn");
    }

    #[test]
    fn test_from_dispatch_error() {
        let turnbase_err: TurnbaseError = DispatchError::ShuttingDown.into();
        assert!(matches!(turnbase_err, TurnbaseError::Dispatch(_)));
    }

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::NotConnected("room:lobby".into());
        let turnbase_err: TurnbaseError = err.into();
        assert!(matches!(turnbase_err, TurnbaseError::Transport(_)));
        assert!(turnbase_err.to_string().contains("room:lobby"));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotInRoom(PlayerId::from("eve"), RoomId::from("duel"));
        let turnbase_err: TurnbaseError = err.into();
        assert!(matches!(turnbase_err, TurnbaseError::Room(_)));
    }

    #[test]
    fn test_from_persistence_error() {
        let err = PersistenceError::Storage("disk full".into());
        let turnbase_err: TurnbaseError = err.into();
        assert!(matches!(turnbase_err, TurnbaseError::Persistence(_)));
        assert!(turnbase_err.to_string().contains("disk full"));
    }
}
