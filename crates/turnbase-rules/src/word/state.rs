//! The snapshot-able state of one word game.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use turnbase_protocol::PlayerId;

use super::Board;
use crate::Rejection;

/// One player's rack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerRack {
    pub id: PlayerId,
    pub rack: Vec<char>,
}

/// Everything needed to resume a word game.
///
/// This is also the snapshot format:
///
/// ```json
/// {"Board":[[...]],"Players":[{"Id":"a","Rack":["E"]}],"TileBag":["Q"],
///  "CurrentPlayer":"a","PlayerOrder":["a"],"PlayerScores":{"a":8},"FirstMove":false}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WordState {
    pub board: Board,
    pub players: Vec<PlayerRack>,
    /// Remaining tiles, drawn from the front. Never refilled.
    pub tile_bag: Vec<char>,
    pub current_player: PlayerId,
    pub player_order: Vec<PlayerId>,
    pub player_scores: BTreeMap<PlayerId, u32>,
    pub first_move: bool,
}

impl WordState {
    /// Sets up a fresh game: an empty board, racks dealt from the front of
    /// `bag` in turn order, all scores at zero, first player to move.
    pub fn deal(
        player_order: Vec<PlayerId>,
        mut bag: Vec<char>,
        board_size: usize,
        rack_capacity: usize,
    ) -> Result<Self, Rejection> {
        let Some(first) = player_order.first().cloned() else {
            return Err(Rejection::NotEnoughPlayers { needed: 1, got: 0 });
        };

        let players = player_order
            .iter()
            .map(|id| {
                let take = rack_capacity.min(bag.len());
                PlayerRack {
                    id: id.clone(),
                    rack: bag.drain(..take).collect(),
                }
            })
            .collect();
        let player_scores = player_order.iter().map(|id| (id.clone(), 0)).collect();

        Ok(Self {
            board: Board::new(board_size),
            players,
            tile_bag: bag,
            current_player: first,
            player_order,
            player_scores,
            first_move: true,
        })
    }

    /// The rack held by `player`, if they have a seat.
    pub fn rack(&self, player: &PlayerId) -> Option<&[char]> {
        self.players
            .iter()
            .find(|p| &p.id == player)
            .map(|p| p.rack.as_slice())
    }

    pub(crate) fn rack_mut(&mut self, player: &PlayerId) -> &mut Vec<char> {
        let index = match self.players.iter().position(|p| &p.id == player) {
            Some(index) => index,
            None => {
                self.players.push(PlayerRack {
                    id: player.clone(),
                    rack: Vec::new(),
                });
                self.players.len() - 1
            }
        };
        &mut self.players[index].rack
    }

    pub fn score(&self, player: &PlayerId) -> u32 {
        self.player_scores.get(player).copied().unwrap_or(0)
    }

    /// The player who moved last: the one before `current_player` in turn
    /// order. `None` if the current player is not seated.
    pub fn last_mover(&self) -> Option<&PlayerId> {
        let i = self
            .player_order
            .iter()
            .position(|p| *p == self.current_player)?;
        let len = self.player_order.len();
        self.player_order.get((i + len - 1) % len)
    }

    /// The player after `player` in turn order, wrapping around.
    pub fn next_after(&self, player: &PlayerId) -> PlayerId {
        let position = self.player_order.iter().position(|p| p == player);
        let next = match position {
            Some(i) => (i + 1) % self.player_order.len(),
            None => 0,
        };
        self.player_order
            .get(next)
            .cloned()
            .unwrap_or_else(|| player.clone())
    }
}
