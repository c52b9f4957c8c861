//! Error types for the dispatch layer.

use turnbase_protocol::ProtocolError;

/// Errors returned to callers of the dispatcher.
///
/// Delivery failures are not here: those happen on the flush task, long
/// after the caller has moved on, and are logged and counted there.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// `shutdown` has been called; no new messages are accepted.
    #[error("dispatcher is shutting down")]
    ShuttingDown,

    /// The flush task has exited.
    #[error("dispatcher has stopped")]
    Stopped,

    /// An event could not be encoded into a payload.
    #[error(transparent)]
    Encode(#[from] ProtocolError),
}
