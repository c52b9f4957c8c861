//! Validation and scoring for word placement.

use std::collections::{BTreeMap, HashSet};

use rand::Rng;
use turnbase_protocol::{PlayerId, TilePlacement};

use super::tiles::{shuffled_standard_bag, word_value};
use super::{Board, TileBagSource, WordConfig, WordState};
use crate::{Rejection, RuleEngine};

/// A decoded placement, tagged with who made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordMove {
    pub player_id: PlayerId,
    pub tiles: Vec<TilePlacement>,
}

impl WordMove {
    pub fn new(player_id: PlayerId, tiles: Vec<TilePlacement>) -> Self {
        Self { player_id, tiles }
    }
}

/// What an accepted placement produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordOutcome {
    /// Every scored word, main line first, uppercase.
    pub words: Vec<String>,
    /// Points added to the mover's score.
    pub score_delta: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line {
    Row,
    Column,
}

impl Line {
    fn step(self) -> (i32, i32) {
        match self {
            Self::Row => (0, 1),
            Self::Column => (1, 0),
        }
    }

    fn across(self) -> Self {
        match self {
            Self::Row => Self::Column,
            Self::Column => Self::Row,
        }
    }
}

/// The word-placement rule engine.
///
/// Holds only configuration and the shared dictionary; every game's data
/// lives in its [`WordState`].
#[derive(Debug, Clone)]
pub struct WordEngine {
    config: WordConfig,
}

impl WordEngine {
    pub fn new(config: WordConfig) -> Self {
        Self {
            config: config.validated(),
        }
    }

    pub fn config(&self) -> &WordConfig {
        &self.config
    }

    /// Fills a bag according to the configured source and deals racks.
    pub fn new_game<R: Rng + ?Sized>(
        &self,
        player_order: Vec<PlayerId>,
        rng: &mut R,
    ) -> Result<WordState, Rejection> {
        let bag = match &self.config.tile_bag {
            TileBagSource::Standard => shuffled_standard_bag(rng),
            TileBagSource::Fixed(tiles) => {
                tiles.iter().map(char::to_ascii_uppercase).collect()
            }
        };
        WordState::deal(
            player_order,
            bag,
            self.config.board_size,
            self.config.rack_capacity,
        )
    }

    fn check_rack(&self, state: &WordState, mv: &WordMove) -> Result<(), Rejection> {
        let mut rack = state
            .rack(&mv.player_id)
            .map(<[char]>::to_vec)
            .unwrap_or_default();
        for tile in &mv.tiles {
            let letter = tile.letter.to_ascii_uppercase();
            match rack.iter().position(|c| c.eq_ignore_ascii_case(&letter)) {
                Some(i) => {
                    rack.swap_remove(i);
                }
                None => return Err(Rejection::TileNotInRack(letter)),
            }
        }
        Ok(())
    }

    fn check_cells(&self, board: &Board, tiles: &[TilePlacement]) -> Result<(), Rejection> {
        for tile in tiles {
            let (row, col) = (tile.row, tile.col);
            if !board.in_bounds(row, col) {
                return Err(Rejection::OutOfBounds { row, col });
            }
            if board.is_occupied(row, col) {
                return Err(Rejection::CellOccupied { row, col });
            }
        }
        let mut seen = HashSet::with_capacity(tiles.len());
        for tile in tiles {
            if !seen.insert((tile.row, tile.col)) {
                return Err(Rejection::DuplicatePosition {
                    row: tile.row,
                    col: tile.col,
                });
            }
        }
        Ok(())
    }

    fn check_connected(&self, state: &WordState, tiles: &[TilePlacement]) -> Result<(), Rejection> {
        if state.first_move {
            let (row, col) = self.config.center;
            let covers = tiles
                .iter()
                .any(|t| usize::try_from(t.row) == Ok(row) && usize::try_from(t.col) == Ok(col));
            if !covers {
                return Err(Rejection::FirstMoveMustCoverCenter);
            }
        } else if !tiles.iter().any(|t| state.board.has_neighbour(t.row, t.col)) {
            return Err(Rejection::NotConnected);
        }
        Ok(())
    }

    fn check_words(&self, words: &[String]) -> Result<(), Rejection> {
        if words.is_empty() {
            return Err(Rejection::NoWordsFormed);
        }
        for word in words {
            if !self.config.dictionary.contains(word) {
                return Err(Rejection::WordNotInDictionary(word.clone()));
            }
        }
        Ok(())
    }
}

impl RuleEngine for WordEngine {
    type State = WordState;
    type Move = WordMove;
    type Outcome = WordOutcome;

    fn validate_move(&self, state: &WordState, mv: &WordMove) -> Result<(), Rejection> {
        if self.is_finished(state) {
            return Err(Rejection::GameOver);
        }
        if mv.player_id != state.current_player {
            return Err(Rejection::NotYourTurn);
        }
        if mv.tiles.is_empty() {
            return Err(Rejection::NoTiles);
        }
        self.check_rack(state, mv)?;
        self.check_cells(&state.board, &mv.tiles)?;

        let line = line_of(&mv.tiles).ok_or(Rejection::NotStraightLine)?;
        self.check_connected(state, &mv.tiles)?;
        if !is_contiguous(&state.board, &mv.tiles, line) {
            return Err(Rejection::NotContiguous);
        }

        let mut board = state.board.clone();
        lay_tiles(&mut board, &mv.tiles);
        self.check_words(&find_words(&board, &mv.tiles, line))
    }

    fn apply_move(&self, state: &WordState, mv: &WordMove) -> (WordState, WordOutcome) {
        let mut next = state.clone();
        lay_tiles(&mut next.board, &mv.tiles);

        let mut rack = std::mem::take(next.rack_mut(&mv.player_id));
        for tile in &mv.tiles {
            if let Some(i) = rack.iter().position(|c| c.eq_ignore_ascii_case(&tile.letter)) {
                rack.remove(i);
            }
        }
        let draw = self
            .config
            .rack_capacity
            .saturating_sub(rack.len())
            .min(next.tile_bag.len());
        rack.extend(next.tile_bag.drain(..draw));
        *next.rack_mut(&mv.player_id) = rack;

        let words = line_of(&mv.tiles)
            .map(|line| find_words(&next.board, &mv.tiles, line))
            .unwrap_or_default();
        let score_delta = words.iter().map(|w| word_value(w)).sum();
        *next.player_scores.entry(mv.player_id.clone()).or_insert(0) += score_delta;

        next.current_player = next.next_after(&mv.player_id);
        next.first_move = false;

        (next, WordOutcome { words, score_delta })
    }

    fn calculate_scores(&self, state: &WordState) -> BTreeMap<PlayerId, u32> {
        let mut scores = state.player_scores.clone();
        for id in &state.player_order {
            scores.entry(id.clone()).or_insert(0);
        }
        scores
    }

    /// A game is over once the bag is empty and the player who just moved
    /// has played out their rack, or once anyone reaches the target score.
    fn is_finished(&self, state: &WordState) -> bool {
        if let Some(target) = self.config.target_score {
            if state.player_scores.values().any(|s| *s >= target) {
                return true;
            }
        }
        if state.first_move || !state.tile_bag.is_empty() {
            return false;
        }
        state
            .last_mover()
            .is_some_and(|mover| state.rack(mover).is_none_or(<[char]>::is_empty))
    }
}

// ---------------------------------------------------------------------------
// Board geometry
// ---------------------------------------------------------------------------

/// The line all tiles share. A single tile counts as a row.
fn line_of(tiles: &[TilePlacement]) -> Option<Line> {
    let first = tiles.first()?;
    if tiles.iter().all(|t| t.row == first.row) {
        Some(Line::Row)
    } else if tiles.iter().all(|t| t.col == first.col) {
        Some(Line::Column)
    } else {
        None
    }
}

/// Every cell between the outermost placed tiles is either being placed now
/// or already on the board.
fn is_contiguous(board: &Board, tiles: &[TilePlacement], line: Line) -> bool {
    let placed: HashSet<(i32, i32)> = tiles.iter().map(|t| (t.row, t.col)).collect();
    let along = |t: &TilePlacement| match line {
        Line::Row => t.col,
        Line::Column => t.row,
    };
    let (Some(lo), Some(hi)) = (
        tiles.iter().map(along).min(),
        tiles.iter().map(along).max(),
    ) else {
        return true;
    };
    let fixed = match line {
        Line::Row => tiles[0].row,
        Line::Column => tiles[0].col,
    };
    (lo..=hi).all(|i| {
        let cell = match line {
            Line::Row => (fixed, i),
            Line::Column => (i, fixed),
        };
        placed.contains(&cell) || board.is_occupied(cell.0, cell.1)
    })
}

fn lay_tiles(board: &mut Board, tiles: &[TilePlacement]) {
    for tile in tiles {
        board.place(tile.row, tile.col, tile.letter.to_ascii_uppercase());
    }
}

/// The maximal run of letters through `(row, col)` along `line`.
fn word_through(board: &Board, row: i32, col: i32, line: Line) -> String {
    let (dr, dc) = line.step();
    let (mut r, mut c) = (row, col);
    while board.is_occupied(r - dr, c - dc) {
        r -= dr;
        c -= dc;
    }
    let mut word = String::new();
    while let Some(letter) = board.get(r, c) {
        word.push(letter);
        r += dr;
        c += dc;
    }
    word
}

/// Words formed by a placement on a board that already holds it: the main
/// word along `line`, then one perpendicular word per tile. Runs shorter
/// than two letters are not words, and a word spelled twice counts once.
fn find_words(board: &Board, tiles: &[TilePlacement], line: Line) -> Vec<String> {
    let main = tiles
        .first()
        .map(|first| word_through(board, first.row, first.col, line));
    let crosses = tiles
        .iter()
        .map(|tile| word_through(board, tile.row, tile.col, line.across()));

    let mut words: Vec<String> = Vec::new();
    for word in main.into_iter().chain(crosses) {
        if word.chars().count() >= 2 && !words.contains(&word) {
            words.push(word);
        }
    }
    words
}
