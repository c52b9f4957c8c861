//! Outbound event dispatch for Turnbase.
//!
//! Rooms never talk to the network directly. They enqueue JSON payloads
//! addressed to a [`Target`](turnbase_protocol::Target) and return at once.
//! A single background task owns one queue per target and, on every flush
//! tick, hands each non-empty queue to the [`Transport`] as one batch.
//!
//! ```ignore
//! let dispatcher = EventDispatcher::spawn(transport, DispatcherConfig::default());
//! dispatcher.enqueue_broadcast(&room_id, payload)?;
//! // ...up to 100 ms later the transport receives `[payload]`.
//! ```

#![allow(async_fn_in_trait)]

mod config;
mod dispatcher;
mod error;
mod ticker;
mod transport;

pub use config::DispatcherConfig;
pub use dispatcher::{DispatchStats, EventDispatcher, Outbound, OutboundReceiver};
pub use error::DispatchError;
pub use ticker::{FlushMetrics, FlushTicker, TickInfo};
pub use transport::{Batch, Transport, TransportError};
