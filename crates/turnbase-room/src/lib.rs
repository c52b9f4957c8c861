//! Room lifecycle management for Turnbase.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns one
//! [`GameInstance`]. All mutation of a room's game happens on that task, one
//! command at a time. Membership lives next to the actor in a concurrent
//! [`PlayerSet`] so joins and leaves never wait behind a slow game command.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: get-or-create rooms, join/leave, teardown on empty
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`GameInstance`]: the Idle → Active → Ended state machine
//! - [`PersistenceGateway`]: where final snapshots go
//! - [`RoomConfig`]: channel sizes, player limits, word game settings

#![allow(async_fn_in_trait)]

mod config;
mod error;
mod game;
mod instance;
mod persistence;
mod players;
mod registry;
mod room;

pub use config::{InstanceState, RoomConfig};
pub use error::{PersistenceError, RoomError};
pub use game::Engines;
pub use instance::GameInstance;
pub use persistence::{InMemoryPersistence, PersistenceGateway};
pub use players::{PlayerSet, SessionHandle};
pub use registry::RoomRegistry;
pub use room::{RoomHandle, RoomInfo};
