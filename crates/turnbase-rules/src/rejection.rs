//! Validation errors: why a rule engine refused a move.

use turnbase_protocol::PlayerId;

/// A refused move.
///
/// Rejections are never fatal. The room sends the `Display` text back to
/// the acting player and leaves the state untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The mover is not the current player.
    #[error("not your turn")]
    NotYourTurn,

    /// A placement with no tiles in it.
    #[error("no tiles placed")]
    NoTiles,

    /// The mover tried to place a letter they do not hold (or more copies
    /// of it than they hold).
    #[error("tile not in rack: {0}")]
    TileNotInRack(char),

    /// A tile targets a cell outside the board.
    #[error("out of bounds: ({row}, {col})")]
    OutOfBounds { row: i32, col: i32 },

    /// A tile targets a cell that already holds a letter.
    #[error("cell occupied: ({row}, {col})")]
    CellOccupied { row: i32, col: i32 },

    /// Two tiles in the same move target the same cell.
    #[error("duplicate tile position: ({row}, {col})")]
    DuplicatePosition { row: i32, col: i32 },

    /// Tiles span more than one row and more than one column.
    #[error("must be a straight line")]
    NotStraightLine,

    /// Tiles are on one line but leave an empty cell between them.
    #[error("must be a straight line without gaps")]
    NotContiguous,

    /// The opening move does not cover the center cell.
    #[error("first move must cover center")]
    FirstMoveMustCoverCenter,

    /// A later move does not touch any tile already on the board.
    #[error("move must connect to existing tiles")]
    NotConnected,

    /// The placement produces no word of two or more letters.
    #[error("move forms no words")]
    NoWordsFormed,

    /// A formed word is missing from the dictionary.
    #[error("word not in dictionary: {0}")]
    WordNotInDictionary(String),

    /// The game has already been decided.
    #[error("game is already over")]
    GameOver,

    /// No game has been set up yet.
    #[error("game has not started")]
    NotStarted,

    /// The action belongs to a different game.
    #[error("action {0} is not part of this game")]
    UnsupportedAction(String),

    /// Too few players to set up the game.
    #[error("game needs at least {needed} players, has {got}")]
    NotEnoughPlayers { needed: usize, got: usize },

    /// The player has no seat in this game.
    #[error("player {0} is not in this game")]
    UnknownPlayer(PlayerId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasons_use_expected_wording() {
        assert!(Rejection::NotYourTurn.to_string().contains("not your turn"));
        assert!(Rejection::FirstMoveMustCoverCenter.to_string().contains("center"));
        assert_eq!(
            Rejection::WordNotInDictionary("QZX".into()).to_string(),
            "word not in dictionary: QZX"
        );
        assert_eq!(
            Rejection::CellOccupied { row: 7, col: 8 }.to_string(),
            "cell occupied: (7, 8)"
        );
    }
}
