//! Server events: what a room tells its players.
//!
//! Events are internally tagged with `EventType`, and field names are
//! PascalCase to match the action envelopes clients already send:
//!
//! ```json
//! {"EventType":"TilesPlaced","PlayerId":"alice","Words":["HELLO"],"ScoreDelta":8, ...}
//! ```
//!
//! The dispatcher treats an encoded event as an opaque JSON value and
//! delivers it inside a batch array.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{GameKind, PlayerId, ProtocolError, TilePlacement};

/// Game-specific details sent along with `GameStarted`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartMetadata {
    /// Turn order, first to move first.
    pub player_order: Vec<PlayerId>,
    /// Whose turn it is right now.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_player: Option<PlayerId>,
    /// Side length of the square board, for board games.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_size: Option<usize>,
    /// Tiles left to draw, for tile games.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiles_in_bag: Option<usize>,
}

/// An event emitted by a game room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "EventType", rename_all_fields = "PascalCase")]
pub enum ServerEvent {
    /// Broadcast when a game starts (or is reset, or resumed).
    GameStarted {
        kind: GameKind,
        metadata: StartMetadata,
    },

    /// Sent privately to one player with the full contents of their rack.
    RackUpdated { rack: Vec<char> },

    /// Broadcast after an accepted word placement.
    TilesPlaced {
        player_id: PlayerId,
        tiles: Vec<TilePlacement>,
        words: Vec<String>,
        score_delta: u32,
        next_player: PlayerId,
        turn_count: u64,
    },

    /// Broadcast after an accepted coin flip.
    CoinFlipped {
        player_id: PlayerId,
        is_heads: bool,
        winner: Option<PlayerId>,
        turn_count: u64,
    },

    /// Sent privately to the player whose action was refused.
    Error { reason: String },

    /// Broadcast when the game ends. `winner` is `None` on a tie.
    GameEnded {
        winner: Option<PlayerId>,
        scores: BTreeMap<PlayerId, u32>,
    },
}

impl ServerEvent {
    /// Shorthand for an `Error` event.
    pub fn error(reason: impl Into<String>) -> Self {
        Self::Error {
            reason: reason.into(),
        }
    }

    /// Encodes the event as the opaque JSON payload the dispatcher queues.
    pub fn to_payload(&self) -> Result<serde_json::Value, ProtocolError> {
        serde_json::to_value(self).map_err(ProtocolError::Encode)
    }

    /// The `EventType` discriminator, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GameStarted { .. } => "GameStarted",
            Self::RackUpdated { .. } => "RackUpdated",
            Self::TilesPlaced { .. } => "TilesPlaced",
            Self::CoinFlipped { .. } => "CoinFlipped",
            Self::Error { .. } => "Error",
            Self::GameEnded { .. } => "GameEnded",
        }
    }
}
