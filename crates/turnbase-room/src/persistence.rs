//! The snapshot store seam, plus an in-memory implementation.

use std::future::Future;

use dashmap::DashMap;
use turnbase_protocol::RoomId;

use crate::PersistenceError;

/// Append-only storage for game state snapshots.
///
/// Snapshots are opaque JSON text. Callers append a final snapshot when a
/// game ends or a room is torn down, and read the newest one back to resume.
///
/// Uses `impl Future + Send` so room actors can await it on a spawned task.
/// Implementors can still write `async fn`.
pub trait PersistenceGateway: Send + Sync + 'static {
    /// Stores `state_json` as the newest snapshot for `room_id`.
    fn append_snapshot(
        &self,
        room_id: &RoomId,
        state_json: String,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;

    /// The newest snapshot for `room_id`, if any.
    fn latest_snapshot(
        &self,
        room_id: &RoomId,
    ) -> impl Future<Output = Result<Option<String>, PersistenceError>> + Send;
}

/// Keeps every snapshot in memory. For tests, demos and single-process
/// deployments that don't need durability.
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    snapshots: DashMap<RoomId, Vec<String>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every snapshot appended for `room_id`, oldest first.
    pub fn history(&self, room_id: &RoomId) -> Vec<String> {
        self.snapshots
            .get(room_id)
            .map(|s| s.value().clone())
            .unwrap_or_default()
    }

    pub fn snapshot_count(&self, room_id: &RoomId) -> usize {
        self.snapshots.get(room_id).map_or(0, |s| s.len())
    }
}

impl PersistenceGateway for InMemoryPersistence {
    async fn append_snapshot(&self, room_id: &RoomId, state_json: String) -> Result<(), PersistenceError> {
        self.snapshots
            .entry(room_id.clone())
            .or_default()
            .push(state_json);
        Ok(())
    }

    async fn latest_snapshot(&self, room_id: &RoomId) -> Result<Option<String>, PersistenceError> {
        Ok(self
            .snapshots
            .get(room_id)
            .and_then(|s| s.last().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_latest_is_last_appended() {
        let store = InMemoryPersistence::new();
        let room = RoomId::from("r1");
        assert_eq!(store.latest_snapshot(&room).await.unwrap(), None);

        store.append_snapshot(&room, "{\"v\":1}".into()).await.unwrap();
        store.append_snapshot(&room, "{\"v\":2}".into()).await.unwrap();

        assert_eq!(
            store.latest_snapshot(&room).await.unwrap().as_deref(),
            Some("{\"v\":2}")
        );
        assert_eq!(store.snapshot_count(&room), 2);
        assert_eq!(store.history(&room)[0], "{\"v\":1}");
    }

    #[tokio::test]
    async fn test_rooms_are_kept_apart() {
        let store = InMemoryPersistence::new();
        store
            .append_snapshot(&RoomId::from("a"), "{}".into())
            .await
            .unwrap();
        assert_eq!(store.snapshot_count(&RoomId::from("b")), 0);
    }
}
