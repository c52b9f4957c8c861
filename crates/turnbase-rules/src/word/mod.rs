//! Scrabble-like word placement.
//!
//! Players take turns laying tiles from their rack in one row or column.
//! Every word the placement forms (the main line plus one perpendicular
//! word per placed tile) must be in the dictionary, and each word scores
//! the sum of its letter values.

mod board;
mod dictionary;
mod engine;
mod state;
pub mod tiles;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use board::Board;
pub use dictionary::Dictionary;
pub use engine::{WordEngine, WordMove, WordOutcome};
pub use state::{PlayerRack, WordState};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Where the tile bag comes from when a game starts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileBagSource {
    /// The 98-tile English set, shuffled with the room's RNG.
    #[default]
    Standard,
    /// Exactly these tiles, drawn front to back. For deterministic play.
    Fixed(Vec<char>),
}

/// Settings for the word-placement game.
#[derive(Debug, Clone)]
pub struct WordConfig {
    /// Side length of the square board.
    pub board_size: usize,
    /// Tiles a rack is refilled to after each move.
    pub rack_capacity: usize,
    /// The cell the opening move must cover, as `(row, col)`.
    pub center: (usize, usize),
    /// End the game as soon as a player reaches this score. `None` plays
    /// until the bag and a rack run dry.
    pub target_score: Option<u32>,
    pub tile_bag: TileBagSource,
    /// Accepted words. Shared by every room playing this game.
    pub dictionary: Arc<Dictionary>,
}

impl Default for WordConfig {
    fn default() -> Self {
        Self {
            board_size: 15,
            rack_capacity: 7,
            center: (7, 7),
            target_score: None,
            tile_bag: TileBagSource::Standard,
            dictionary: Arc::new(Dictionary::default()),
        }
    }
}

impl WordConfig {
    /// Largest supported board.
    pub const MAX_BOARD_SIZE: usize = 64;

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// - `board_size` clamped to `1..=MAX_BOARD_SIZE`.
    /// - `rack_capacity` at least 1.
    /// - `center` moved to the middle of the board if it falls outside.
    pub fn validated(mut self) -> Self {
        let size = self.board_size.clamp(1, Self::MAX_BOARD_SIZE);
        if size != self.board_size {
            warn!(
                board_size = self.board_size,
                clamped = size,
                "board_size out of range, clamping"
            );
            self.board_size = size;
        }
        if self.rack_capacity == 0 {
            warn!("rack_capacity of 0 would deal empty racks, using 1");
            self.rack_capacity = 1;
        }
        let (row, col) = self.center;
        if row >= size || col >= size {
            let mid = size / 2;
            warn!(row, col, mid, "center outside the board, using the middle cell");
            self.center = (mid, mid);
        }
        self
    }
}
