//! A one-flip coin game.
//!
//! The current player flips once. Heads, they win; tails, the next player
//! in turn order wins. The engine stays pure: the random outcome is drawn
//! by the caller and travels inside the move.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use turnbase_protocol::PlayerId;

use crate::{Rejection, RuleEngine};

/// The result of the one flip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlipResult {
    pub player_id: PlayerId,
    pub is_heads: bool,
    pub winner: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CoinFlipState {
    pub player_order: Vec<PlayerId>,
    pub current_player: PlayerId,
    #[serde(default)]
    pub result: Option<FlipResult>,
}

impl CoinFlipState {
    /// Minimum seats for a coin flip.
    pub const MIN_PLAYERS: usize = 2;

    pub fn new(player_order: Vec<PlayerId>) -> Result<Self, Rejection> {
        match player_order.first() {
            Some(first) if player_order.len() >= Self::MIN_PLAYERS => Ok(Self {
                current_player: first.clone(),
                player_order,
                result: None,
            }),
            _ => Err(Rejection::NotEnoughPlayers {
                needed: Self::MIN_PLAYERS,
                got: player_order.len(),
            }),
        }
    }
}

/// A flip, with the outcome already decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinFlip {
    pub player_id: PlayerId,
    pub is_heads: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CoinFlipEngine;

impl CoinFlipEngine {
    pub fn new() -> Self {
        Self
    }
}

impl RuleEngine for CoinFlipEngine {
    type State = CoinFlipState;
    type Move = CoinFlip;
    type Outcome = FlipResult;

    fn validate_move(&self, state: &CoinFlipState, mv: &CoinFlip) -> Result<(), Rejection> {
        if state.result.is_some() {
            return Err(Rejection::GameOver);
        }
        if !state.player_order.contains(&mv.player_id) {
            return Err(Rejection::UnknownPlayer(mv.player_id.clone()));
        }
        if mv.player_id != state.current_player {
            return Err(Rejection::NotYourTurn);
        }
        Ok(())
    }

    fn apply_move(&self, state: &CoinFlipState, mv: &CoinFlip) -> (CoinFlipState, FlipResult) {
        let winner = if mv.is_heads {
            Some(mv.player_id.clone())
        } else {
            let order = &state.player_order;
            order
                .iter()
                .position(|p| p == &mv.player_id)
                .map(|i| order[(i + 1) % order.len()].clone())
                .filter(|p| p != &mv.player_id)
        };
        let result = FlipResult {
            player_id: mv.player_id.clone(),
            is_heads: mv.is_heads,
            winner,
        };
        let next = CoinFlipState {
            result: Some(result.clone()),
            ..state.clone()
        };
        (next, result)
    }

    fn calculate_scores(&self, state: &CoinFlipState) -> BTreeMap<PlayerId, u32> {
        let winner = state.result.as_ref().and_then(|r| r.winner.as_ref());
        state
            .player_order
            .iter()
            .map(|id| (id.clone(), u32::from(Some(id) == winner)))
            .collect()
    }

    fn is_finished(&self, state: &CoinFlipState) -> bool {
        state.result.is_some()
    }

    fn winner(&self, state: &CoinFlipState) -> Option<PlayerId> {
        state.result.as_ref().and_then(|r| r.winner.clone())
    }
}
