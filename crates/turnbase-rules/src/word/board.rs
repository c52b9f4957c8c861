//! The square letter grid.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A square grid of optional letters, stored flat in row-major order.
///
/// Cells are write-once: [`Board::place`] refuses an occupied cell, and
/// nothing clears one. On the wire the board is a list of rows so that
/// snapshots stay readable:
///
/// ```json
/// [["H", null], [null, null]]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Option<char>>,
}

impl Board {
    /// An empty `size` x `size` board.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// `true` if `(row, col)` lies on the board. Takes signed coordinates
    /// because they come straight from client input.
    pub fn in_bounds(&self, row: i32, col: i32) -> bool {
        self.index_of(row, col).is_some()
    }

    /// The letter at `(row, col)`, or `None` if empty or off the board.
    pub fn get(&self, row: i32, col: i32) -> Option<char> {
        self.index_of(row, col).and_then(|i| self.cells[i])
    }

    pub fn is_occupied(&self, row: i32, col: i32) -> bool {
        self.get(row, col).is_some()
    }

    /// `true` if any of the four orthogonal neighbours holds a letter.
    pub fn has_neighbour(&self, row: i32, col: i32) -> bool {
        [(-1, 0), (1, 0), (0, -1), (0, 1)]
            .iter()
            .any(|(dr, dc)| self.is_occupied(row + dr, col + dc))
    }

    /// Writes `letter` at `(row, col)`.
    ///
    /// Returns `false` and leaves the board untouched if the cell is
    /// occupied or off the board.
    pub(crate) fn place(&mut self, row: i32, col: i32, letter: char) -> bool {
        match self.index_of(row, col) {
            Some(i) if self.cells[i].is_none() => {
                self.cells[i] = Some(letter);
                true
            }
            _ => false,
        }
    }

    /// Number of occupied cells.
    pub fn tile_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    fn index_of(&self, row: i32, col: i32) -> Option<usize> {
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        (row < self.size && col < self.size).then(|| row * self.size + col)
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.size == 0 {
            return serializer.collect_seq(std::iter::empty::<Vec<Option<char>>>());
        }
        serializer.collect_seq(self.cells.chunks(self.size))
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rows = Vec::<Vec<Option<char>>>::deserialize(deserializer)?;
        let size = rows.len();
        if let Some(bad) = rows.iter().position(|r| r.len() != size) {
            return Err(D::Error::custom(format!(
                "board must be square: row {bad} has {} cells, expected {size}",
                rows[bad].len()
            )));
        }
        Ok(Self {
            size,
            cells: rows.into_iter().flatten().collect(),
        })
    }
}
