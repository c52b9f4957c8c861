//! Tracing setup for binaries built on Turnbase.
//!
//! Library crates only emit events. Call [`init_tracing`] once from `main`
//! to print them.

use tracing_subscriber::EnvFilter;

use crate::TurnbaseError;

/// Installs a global `fmt` subscriber filtered by `RUST_LOG`.
///
/// Falls back to `default_filter` (e.g. `"info,turnbase_room=debug"`) when
/// `RUST_LOG` is unset or unparsable. Fails if a global subscriber is
/// already installed.
pub fn init_tracing(default_filter: &str) -> Result<(), TurnbaseError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| TurnbaseError::Telemetry(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| TurnbaseError::Telemetry(e.to_string()))
}
