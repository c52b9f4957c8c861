//! # Turnbase
//!
//! Server-authoritative rooms for turn-based multiplayer games.
//!
//! Clients send JSON actions to a room. The room validates each one against
//! a pure rule engine, applies it, and fans the resulting events out through
//! a batching dispatcher. You bring the [`Transport`](turnbase_dispatch::Transport)
//! that reaches your clients and a
//! [`PersistenceGateway`](turnbase_room::PersistenceGateway) for snapshots.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use turnbase::prelude::*;
//!
//! let server = Turnbase::builder()
//!     .room_config(RoomConfig::default())
//!     .build(my_transport, Arc::new(InMemoryPersistence::new()));
//!
//! let room = server.join(&RoomId::from("duel"), GameKind::CoinFlip, PlayerId::from("alice"))?;
//! server.join(&RoomId::from("duel"), GameKind::CoinFlip, PlayerId::from("bob"))?;
//! room.start().await?;
//! server.submit(&RoomId::from("duel"), PlayerId::from("alice"), r#"{"Action":"FlipCoin"}"#).await?;
//! server.shutdown().await?;
//! ```

mod error;
mod server;
pub mod telemetry;

pub use error::TurnbaseError;
pub use server::{Turnbase, TurnbaseBuilder};

pub use turnbase_dispatch as dispatch;
pub use turnbase_protocol as protocol;
pub use turnbase_room as room;
pub use turnbase_rules as rules;

/// Everything a typical server needs in one import.
pub mod prelude {
    pub use crate::{Turnbase, TurnbaseBuilder, TurnbaseError};
    pub use turnbase_dispatch::{
        Batch, DispatchError, DispatchStats, DispatcherConfig, Transport, TransportError,
    };
    pub use turnbase_protocol::{ClientAction, GameKind, PlayerId, RoomId, ServerEvent, Target};
    pub use turnbase_room::{
        InMemoryPersistence, InstanceState, PersistenceError, PersistenceGateway, RoomConfig,
        RoomError, RoomHandle, RoomInfo, SessionHandle,
    };
    pub use turnbase_rules::word::{Dictionary, TileBagSource, WordConfig};
    pub use turnbase_rules::{Rejection, RuleEngine};
}
