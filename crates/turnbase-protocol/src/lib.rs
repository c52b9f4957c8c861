//! Wire protocol for Turnbase.
//!
//! This crate defines the "language" spoken between the connection layer
//! and the game rooms:
//!
//! - **Identifiers** ([`PlayerId`], [`RoomId`], [`GameKind`]) and the
//!   delivery [`Target`] of an outbound message.
//! - **Client actions** ([`ClientAction`]): the closed set of things a
//!   player can ask a room to do, decoded from a JSON action envelope.
//! - **Server events** ([`ServerEvent`]): what rooms tell players.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding.
//!
//! ```text
//! Connection layer (JSON text) → Protocol (ClientAction) → Room (GameInstance)
//! ```

mod action;
mod error;
mod event;
mod types;

pub use action::{ClientAction, TilePlacement};
pub use error::ProtocolError;
pub use event::{ServerEvent, StartMetadata};
pub use types::{GameKind, PlayerId, RoomId, Target};
