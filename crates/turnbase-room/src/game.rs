//! The closed set of games a room can run, behind one interface.
//!
//! [`Game`] pairs each [`GameKind`] with its rule engine and the state that
//! engine works on. It turns decoded client actions into engine moves and
//! engine outcomes into server events; the instance above it only deals in
//! "accepted, here are the events" or "rejected, here is why".

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;
use turnbase_protocol::{ClientAction, GameKind, PlayerId, ServerEvent, StartMetadata};
use turnbase_rules::coin::{CoinFlip, CoinFlipEngine, CoinFlipState};
use turnbase_rules::word::{WordEngine, WordMove};
use turnbase_rules::{Rejection, RuleEngine};

use crate::RoomConfig;

/// One engine per game kind, shared by every room of that kind.
#[derive(Debug, Clone)]
pub struct Engines {
    word: Arc<WordEngine>,
    coin: Arc<CoinFlipEngine>,
}

impl Engines {
    pub fn new(config: &RoomConfig) -> Self {
        Self {
            word: Arc::new(WordEngine::new(config.word.clone())),
            coin: Arc::new(CoinFlipEngine::new()),
        }
    }
}

/// Who an event goes to.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Delivery {
    Broadcast(ServerEvent),
    ToPlayer(PlayerId, ServerEvent),
}

// ---------------------------------------------------------------------------
// Table: one engine plus the state it is playing
// ---------------------------------------------------------------------------

pub(crate) struct Table<E: RuleEngine> {
    engine: Arc<E>,
    state: Option<E::State>,
}

impl<E: RuleEngine> Table<E> {
    fn new(engine: Arc<E>) -> Self {
        Self {
            engine,
            state: None,
        }
    }

    fn state(&self) -> Result<&E::State, Rejection> {
        self.state.as_ref().ok_or(Rejection::NotStarted)
    }

    /// Validates and applies `mv`. The stored state is replaced only when
    /// the move is accepted.
    fn play(&mut self, mv: &E::Move) -> Result<(&E::State, E::Outcome), Rejection> {
        let (next, outcome) = self.engine.try_move(self.state()?, mv)?;
        let state = self.state.insert(next);
        Ok((state, outcome))
    }

    fn is_finished(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|s| self.engine.is_finished(s))
    }

    fn winner(&self) -> Option<PlayerId> {
        self.state.as_ref().and_then(|s| self.engine.winner(s))
    }

    fn scores(&self) -> BTreeMap<PlayerId, u32> {
        self.state
            .as_ref()
            .map(|s| self.engine.calculate_scores(s))
            .unwrap_or_default()
    }

    fn snapshot(&self) -> Result<Option<String>, serde_json::Error> {
        self.state.as_ref().map(serde_json::to_string).transpose()
    }

    fn restore(&mut self, json: &str) -> Result<(), serde_json::Error> {
        self.state = Some(serde_json::from_str(json)?);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

pub(crate) enum Game {
    WordPlacement(Table<WordEngine>),
    CoinFlip(Table<CoinFlipEngine>),
}

impl Game {
    pub(crate) fn new(kind: GameKind, engines: &Engines) -> Self {
        match kind {
            GameKind::WordPlacement => Self::WordPlacement(Table::new(Arc::clone(&engines.word))),
            GameKind::CoinFlip => Self::CoinFlip(Table::new(Arc::clone(&engines.coin))),
        }
    }

    /// Sets up a fresh game for `order`, discarding any previous state.
    pub(crate) fn begin<R: Rng + ?Sized>(
        &mut self,
        order: Vec<PlayerId>,
        rng: &mut R,
    ) -> Result<(), Rejection> {
        match self {
            Self::WordPlacement(table) => {
                table.state = Some(table.engine.new_game(order, rng)?);
            }
            Self::CoinFlip(table) => {
                table.state = Some(CoinFlipState::new(order)?);
            }
        }
        Ok(())
    }

    /// What clients need to render the game from scratch.
    pub(crate) fn metadata(&self) -> StartMetadata {
        match self {
            Self::WordPlacement(table) => match &table.state {
                Some(state) => StartMetadata {
                    player_order: state.player_order.clone(),
                    current_player: Some(state.current_player.clone()),
                    board_size: Some(state.board.size()),
                    tiles_in_bag: Some(state.tile_bag.len()),
                },
                None => StartMetadata::default(),
            },
            Self::CoinFlip(table) => match &table.state {
                Some(state) => StartMetadata {
                    player_order: state.player_order.clone(),
                    current_player: Some(state.current_player.clone()),
                    ..StartMetadata::default()
                },
                None => StartMetadata::default(),
            },
        }
    }

    /// Private rack contents for every player, for games that have racks.
    pub(crate) fn rack_updates(&self) -> Vec<Delivery> {
        match self {
            Self::WordPlacement(Table {
                state: Some(state), ..
            }) => state
                .players
                .iter()
                .map(|p| {
                    Delivery::ToPlayer(
                        p.id.clone(),
                        ServerEvent::RackUpdated {
                            rack: p.rack.clone(),
                        },
                    )
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Runs one player action. `turn` is the turn number this action will
    /// become if accepted.
    pub(crate) fn play<R: Rng + ?Sized>(
        &mut self,
        player: &PlayerId,
        action: ClientAction,
        turn: u64,
        rng: &mut R,
    ) -> Result<Vec<Delivery>, Rejection> {
        match (self, action) {
            (Self::WordPlacement(table), ClientAction::PlaceTiles { tiles }) => {
                let mv = WordMove::new(player.clone(), tiles);
                let (state, outcome) = table.play(&mv)?;
                let rack = state.rack(player).map(<[char]>::to_vec).unwrap_or_default();
                Ok(vec![
                    Delivery::Broadcast(ServerEvent::TilesPlaced {
                        player_id: player.clone(),
                        tiles: mv.tiles,
                        words: outcome.words,
                        score_delta: outcome.score_delta,
                        next_player: state.current_player.clone(),
                        turn_count: turn,
                    }),
                    Delivery::ToPlayer(player.clone(), ServerEvent::RackUpdated { rack }),
                ])
            }
            (Self::CoinFlip(table), ClientAction::FlipCoin) => {
                let mv = CoinFlip {
                    player_id: player.clone(),
                    is_heads: rng.random_bool(0.5),
                };
                let (_, outcome) = table.play(&mv)?;
                Ok(vec![Delivery::Broadcast(ServerEvent::CoinFlipped {
                    player_id: outcome.player_id,
                    is_heads: outcome.is_heads,
                    winner: outcome.winner,
                    turn_count: turn,
                })])
            }
            (_, action) => Err(Rejection::UnsupportedAction(action.name().to_string())),
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        match self {
            Self::WordPlacement(table) => table.is_finished(),
            Self::CoinFlip(table) => table.is_finished(),
        }
    }

    pub(crate) fn winner(&self) -> Option<PlayerId> {
        match self {
            Self::WordPlacement(table) => table.winner(),
            Self::CoinFlip(table) => table.winner(),
        }
    }

    pub(crate) fn scores(&self) -> BTreeMap<PlayerId, u32> {
        match self {
            Self::WordPlacement(table) => table.scores(),
            Self::CoinFlip(table) => table.scores(),
        }
    }

    /// The current state as snapshot JSON, or `None` before the first start.
    pub(crate) fn snapshot(&self) -> Result<Option<String>, serde_json::Error> {
        match self {
            Self::WordPlacement(table) => table.snapshot(),
            Self::CoinFlip(table) => table.snapshot(),
        }
    }

    /// Replaces the current state with one decoded from snapshot JSON.
    pub(crate) fn restore(&mut self, json: &str) -> Result<(), serde_json::Error> {
        match self {
            Self::WordPlacement(table) => table.restore(json),
            Self::CoinFlip(table) => table.restore(json),
        }
    }
}
