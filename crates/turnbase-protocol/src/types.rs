//! Identity and addressing types shared by every Turnbase crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Player ids come from the (external) authentication layer and are opaque
/// strings. The newtype keeps them from being mixed up with room ids.
/// `#[serde(transparent)]` makes `PlayerId("alice")` travel as `"alice"`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Creates a player id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A unique identifier for a room (one running game session).
///
/// Room ids are chosen by the caller, so two clients naming the same id
/// end up in the same room.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Creates a room id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ---------------------------------------------------------------------------
// GameKind
// ---------------------------------------------------------------------------

/// The closed set of games a room can host.
///
/// Adding a game means adding a variant here; every `match` over the kind
/// then fails to compile until the new game is wired in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "PascalCase")]
pub enum GameKind {
    /// Scrabble-like word placement on a square board.
    WordPlacement,
    /// Two players, one flip, heads wins.
    CoinFlip,
}

impl GameKind {
    /// Fewest players the game can start with.
    pub fn min_players(self) -> usize {
        match self {
            Self::WordPlacement => 1,
            Self::CoinFlip => 2,
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WordPlacement => write!(f, "WordPlacement"),
            Self::CoinFlip => write!(f, "CoinFlip"),
        }
    }
}

impl FromStr for GameKind {
    type Err = ProtocolError;

    /// Parses the tag a client sends when joining a room.
    ///
    /// Matching is case-insensitive and accepts `Scrabble` as an alias for
    /// the word game.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wordplacement" | "scrabble" => Ok(Self::WordPlacement),
            "coinflip" => Ok(Self::CoinFlip),
            _ => Err(ProtocolError::UnknownGameKind(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Target: where does an outbound message go?
// ---------------------------------------------------------------------------

/// The destination of an outbound message.
///
/// Every target owns its own outbound queue in the dispatcher, and order is
/// preserved per target only.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Target {
    /// Everyone in the room (the transport's group for that room).
    Room(RoomId),
    /// One specific player, wherever they are connected.
    User(PlayerId),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Room(id) => write!(f, "room:{id}"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&PlayerId::new("alice")).unwrap();
        assert_eq!(json, "\"alice\"");
    }

    #[test]
    fn test_room_id_display() {
        assert_eq!(RoomId::from("lobby-1").to_string(), "lobby-1");
    }

    #[test]
    fn test_game_kind_parses_case_insensitively() {
        assert_eq!("coinflip".parse::<GameKind>().unwrap(), GameKind::CoinFlip);
        assert_eq!(
            "Scrabble".parse::<GameKind>().unwrap(),
            GameKind::WordPlacement
        );
        assert!("Battleship".parse::<GameKind>().is_err());
    }

    #[test]
    fn test_game_kind_serializes_as_pascal_case() {
        let json = serde_json::to_string(&GameKind::WordPlacement).unwrap();
        assert_eq!(json, "\"WordPlacement\"");
    }

    #[test]
    fn test_min_players_per_kind() {
        assert_eq!(GameKind::WordPlacement.min_players(), 1);
        assert_eq!(GameKind::CoinFlip.min_players(), 2);
    }

    #[test]
    fn test_target_display() {
        assert_eq!(Target::Room(RoomId::from("r")).to_string(), "room:r");
        assert_eq!(Target::User(PlayerId::from("p")).to_string(), "user:p");
    }
}
