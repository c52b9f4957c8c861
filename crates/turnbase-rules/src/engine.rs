//! The `RuleEngine` trait: the extension point every game implements.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, de::DeserializeOwned};
use turnbase_protocol::PlayerId;

use crate::Rejection;

/// The pure rules of one game.
///
/// Each associated type defines the shape of the game's data:
/// - `State`: everything needed to resume the game (board, racks, scores,
///   whose turn). Serializable so it can be snapshotted.
/// - `Move`: one decoded player action, already carrying the mover's id.
/// - `Outcome`: what happened as a side product of applying the move
///   (words formed, points scored). The room turns it into events.
///
/// Engines never mutate in place: `apply_move` returns a whole new state,
/// so a failure part-way through can never leave a half-applied move.
pub trait RuleEngine: Send + Sync + 'static {
    type State: Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync;
    type Move: fmt::Debug + Send + Sync;
    type Outcome: fmt::Debug + Send;

    /// Checks whether `mv` is legal in `state`.
    fn validate_move(&self, state: &Self::State, mv: &Self::Move) -> Result<(), Rejection>;

    /// Applies a move that `validate_move` accepted.
    fn apply_move(&self, state: &Self::State, mv: &Self::Move) -> (Self::State, Self::Outcome);

    /// Current score of every player in turn order.
    fn calculate_scores(&self, state: &Self::State) -> BTreeMap<PlayerId, u32>;

    /// Returns `true` once no further moves are possible.
    fn is_finished(&self, state: &Self::State) -> bool;

    /// The player who won, or `None` while undecided or on a tie.
    ///
    /// Default: the unique top scorer.
    fn winner(&self, state: &Self::State) -> Option<PlayerId> {
        top_scorer(&self.calculate_scores(state))
    }

    /// Validates and applies in one step.
    fn try_move(
        &self,
        state: &Self::State,
        mv: &Self::Move,
    ) -> Result<(Self::State, Self::Outcome), Rejection> {
        self.validate_move(state, mv)?;
        Ok(self.apply_move(state, mv))
    }
}

/// Returns the player with the strictly highest score.
///
/// Two or more players sharing the top score is a tie and yields `None`,
/// as does an empty map.
pub fn top_scorer(scores: &BTreeMap<PlayerId, u32>) -> Option<PlayerId> {
    let best = scores.values().copied().max()?;
    let mut leaders = scores.iter().filter(|(_, s)| **s == best);
    let (leader, _) = leaders.next()?;
    match leaders.next() {
        Some(_) => None,
        None => Some(leader.clone()),
    }
}
