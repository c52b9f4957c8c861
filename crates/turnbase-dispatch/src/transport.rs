//! The seam between the dispatcher and whatever moves bytes to clients.

use std::future::Future;
use std::time::Duration;

use turnbase_protocol::{PlayerId, RoomId};

/// One flush worth of payloads for a single target, in enqueue order.
///
/// Always delivered as an array, even when it holds a single payload.
pub type Batch = Vec<serde_json::Value>;

/// Errors a transport can report for one batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Nobody is listening on that group or user.
    #[error("no connection for {0}")]
    NotConnected(String),

    /// The send did not finish within the configured timeout.
    #[error("send timed out after {0:?}")]
    Timeout(Duration),

    /// Any other delivery failure.
    #[error("transport failure: {0}")]
    Failed(String),
}

/// Delivers batches to clients.
///
/// Implement this for your connection layer (WebSocket hub, SSE fan-out,
/// an in-process channel for tests). The dispatcher calls it from its flush
/// task, possibly for many targets at once, so implementations must be
/// `Send + Sync`.
///
/// Uses `impl Future + Send` rather than `async fn` so the future can be
/// spawned onto the runtime. Implementors can still write `async fn`.
pub trait Transport: Send + Sync + 'static {
    /// Sends `batch` to every connection in the room's group.
    fn send_to_group(
        &self,
        room_id: &RoomId,
        batch: Batch,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Sends `batch` to one player's connection(s).
    fn send_to_user(
        &self,
        user_id: &PlayerId,
        batch: Batch,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
