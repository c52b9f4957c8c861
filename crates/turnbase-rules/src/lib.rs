//! Rule engines for Turnbase.
//!
//! A rule engine is pure: it takes a game state and a proposed move and
//! answers two questions. Is the move legal? What does the state look like
//! after it? It does no I/O and holds no per-room data, so one engine can
//! serve every room of its kind.
//!
//! # Key types
//!
//! - [`RuleEngine`]: the trait every game implements
//! - [`Rejection`]: why a move was refused
//! - [`word`]: Scrabble-like word placement
//! - [`coin`]: a two-player coin flip

mod engine;
mod rejection;

pub mod coin;
pub mod word;

pub use engine::{RuleEngine, top_scorer};
pub use rejection::Rejection;
