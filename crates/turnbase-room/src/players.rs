//! Room membership.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use turnbase_protocol::{PlayerId, RoomId};

use crate::RoomError;

/// Counter for generating unique session handles.
static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Opaque handle for one client connection.
///
/// A player reconnecting gets a new handle; the room only uses it to
/// address unicast messages to the right connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionHandle(u64);

impl SessionHandle {
    /// A fresh, process-unique handle.
    pub fn next() -> Self {
        Self(NEXT_SESSION.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct Membership {
    session: SessionHandle,
    joined: u64,
}

/// Concurrent map from player to session handle for one room.
///
/// Cheap to clone; clones share the same members. Insert and remove are
/// the only mutations. Join order is remembered and becomes the turn
/// order when a game starts.
#[derive(Debug, Clone, Default)]
pub struct PlayerSet {
    members: Arc<DashMap<PlayerId, Membership>>,
    /// Seats taken, including joins still in progress. Reserved before the
    /// map insert so capacity can't be overshot by concurrent joins.
    seats: Arc<AtomicUsize>,
    next_join: Arc<AtomicU64>,
}

impl PlayerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `player` with `session`, unless the room is full or they are
    /// already in it.
    pub fn insert(
        &self,
        room_id: &RoomId,
        player: PlayerId,
        session: SessionHandle,
        max_players: usize,
    ) -> Result<(), RoomError> {
        self.seats
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max_players).then_some(n + 1)
            })
            .map_err(|_| RoomError::RoomFull(room_id.clone()))?;

        match self.members.entry(player) {
            Entry::Occupied(entry) => {
                self.seats.fetch_sub(1, Ordering::AcqRel);
                Err(RoomError::AlreadyInRoom(entry.key().clone(), room_id.clone()))
            }
            Entry::Vacant(entry) => {
                let joined = self.next_join.fetch_add(1, Ordering::Relaxed);
                entry.insert(Membership { session, joined });
                Ok(())
            }
        }
    }

    /// Removes `player`, returning their session handle if they were a member.
    pub fn remove(&self, player: &PlayerId) -> Option<SessionHandle> {
        let (_, membership) = self.members.remove(player)?;
        self.seats.fetch_sub(1, Ordering::AcqRel);
        Some(membership.session)
    }

    pub fn session_of(&self, player: &PlayerId) -> Option<SessionHandle> {
        self.members.get(player).map(|m| m.session)
    }

    pub fn contains(&self, player: &PlayerId) -> bool {
        self.members.contains_key(player)
    }

    /// Seats taken, counting joins that are still in progress.
    pub fn len(&self) -> usize {
        self.seats.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Members in the order they joined.
    pub fn turn_order(&self) -> Vec<PlayerId> {
        let mut members: Vec<(u64, PlayerId)> = self
            .members
            .iter()
            .map(|m| (m.joined, m.key().clone()))
            .collect();
        members.sort_unstable_by_key(|(joined, _)| *joined);
        members.into_iter().map(|(_, id)| id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> RoomId {
        RoomId::from("r1")
    }

    #[test]
    fn test_session_handles_are_unique() {
        let a = SessionHandle::next();
        let b = SessionHandle::next();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("conn-"));
    }

    #[test]
    fn test_insert_and_remove() {
        let players = PlayerSet::new();
        let session = SessionHandle::next();
        players
            .insert(&room(), PlayerId::from("alice"), session, 4)
            .unwrap();
        assert!(players.contains(&PlayerId::from("alice")));
        assert_eq!(players.session_of(&PlayerId::from("alice")), Some(session));
        assert_eq!(players.len(), 1);

        assert_eq!(players.remove(&PlayerId::from("alice")), Some(session));
        assert_eq!(players.remove(&PlayerId::from("alice")), None);
        assert!(players.is_empty());
    }

    #[test]
    fn test_duplicate_insert_rejected_and_seat_released() {
        let players = PlayerSet::new();
        players
            .insert(&room(), PlayerId::from("alice"), SessionHandle::next(), 2)
            .unwrap();
        let err = players
            .insert(&room(), PlayerId::from("alice"), SessionHandle::next(), 2)
            .unwrap_err();
        assert!(matches!(err, RoomError::AlreadyInRoom(..)));
        assert_eq!(players.len(), 1);
        players
            .insert(&room(), PlayerId::from("bob"), SessionHandle::next(), 2)
            .unwrap();
    }

    #[test]
    fn test_full_room_rejected() {
        let players = PlayerSet::new();
        players
            .insert(&room(), PlayerId::from("a"), SessionHandle::next(), 1)
            .unwrap();
        let err = players
            .insert(&room(), PlayerId::from("b"), SessionHandle::next(), 1)
            .unwrap_err();
        assert!(matches!(err, RoomError::RoomFull(_)));
    }

    #[test]
    fn test_turn_order_follows_join_order() {
        let players = PlayerSet::new();
        for name in ["zed", "amy", "moe"] {
            players
                .insert(&room(), PlayerId::from(name), SessionHandle::next(), 8)
                .unwrap();
        }
        players.remove(&PlayerId::from("amy"));
        assert_eq!(
            players.turn_order(),
            vec![PlayerId::from("zed"), PlayerId::from("moe")]
        );
    }
}
