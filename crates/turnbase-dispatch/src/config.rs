//! Dispatcher configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Settings for the flush loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Time between flushes. Everything enqueued within one interval for the
    /// same target is delivered as one batch.
    pub flush_interval: Duration,

    /// Upper bound on a single transport call. A send that runs longer is
    /// abandoned and its batch dropped.
    pub send_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_millis(100),
            send_timeout: Duration::from_secs(5),
        }
    }
}

impl DispatcherConfig {
    pub const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(1);
    pub const MAX_FLUSH_INTERVAL: Duration = Duration::from_secs(60);

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`EventDispatcher::spawn`](crate::EventDispatcher::spawn).
    pub fn validated(mut self) -> Self {
        let clamped = self
            .flush_interval
            .clamp(Self::MIN_FLUSH_INTERVAL, Self::MAX_FLUSH_INTERVAL);
        if clamped != self.flush_interval {
            warn!(
                requested_ms = self.flush_interval.as_millis() as u64,
                clamped_ms = clamped.as_millis() as u64,
                "flush_interval out of range, clamping"
            );
            self.flush_interval = clamped;
        }
        if self.send_timeout.is_zero() {
            warn!("send_timeout of 0 would drop every batch, using flush_interval");
            self.send_timeout = self.flush_interval;
        }
        self
    }
}
