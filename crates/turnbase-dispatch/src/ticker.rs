//! The fixed-interval flush clock.
//!
//! Sits inside the dispatcher's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         cmd = receiver.recv() => { /* queue it */ }
//!         _ = ticker.wait_for_tick() => {
//!             flush().await;
//!             ticker.record_flush_end();
//!         }
//!     }
//! }
//! ```
//!
//! A flush that runs past the next deadline does not cause a burst of
//! catch-up ticks: the missed ticks are skipped and the cadence restarts
//! from now.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

/// Information about a tick, returned by [`FlushTicker::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// `true` if this tick fired noticeably late.
    pub overrun: bool,
    /// How many whole intervals were skipped because of the delay.
    pub ticks_skipped: u64,
}

/// Runtime metrics for the flush clock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushMetrics {
    pub total_ticks: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
    /// Exponential moving average of flush time (α = 0.1).
    pub avg_flush_time: Duration,
    pub max_flush_time: Duration,
}

/// Fires once per flush interval until stopped.
pub struct FlushTicker {
    period: Duration,
    tick_count: u64,
    next_tick: Instant,
    flush_start: Option<Instant>,
    stopped: bool,
    metrics: FlushMetrics,
}

impl FlushTicker {
    /// Creates a ticker whose first tick fires one `period` from now.
    pub fn new(period: Duration) -> Self {
        debug!(period_ms = period.as_millis() as u64, "flush ticker created");
        Self {
            period,
            tick_count: 0,
            next_tick: Instant::now() + period,
            flush_start: None,
            stopped: false,
            metrics: FlushMetrics::default(),
        }
    }

    /// Waits until the next tick is due.
    ///
    /// Once [`stop`](Self::stop) has been called this future pends forever,
    /// which lets the other `select!` branches run to completion.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        if self.stopped {
            std::future::pending::<()>().await;
        }

        let deadline = self.next_tick;
        time::sleep_until(deadline).await;

        let now = Instant::now();
        self.tick_count += 1;
        self.flush_start = Some(now);

        let late_by = now.saturating_duration_since(deadline);
        let overrun = late_by > self.period / 10;
        let mut ticks_skipped = 0;
        if overrun {
            ticks_skipped = (late_by.as_nanos() / self.period.as_nanos().max(1)) as u64;
            self.metrics.total_overruns += 1;
            if ticks_skipped > 0 {
                warn!(
                    tick = self.tick_count,
                    skipped = ticks_skipped,
                    late_ms = late_by.as_secs_f64() * 1000.0,
                    "flush tick overrun, skipping ahead"
                );
            }
        }
        self.next_tick = now + self.period;
        self.metrics.total_ticks += 1;
        self.metrics.total_skipped += ticks_skipped;

        trace!(tick = self.tick_count, overrun, "flush tick");

        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// Records that the flush for the current tick has finished.
    pub fn record_flush_end(&mut self) {
        let Some(start) = self.flush_start.take() else {
            return;
        };
        let elapsed = start.elapsed();

        if elapsed > self.period {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                period_ms = self.period.as_secs_f64() * 1000.0,
                "flush took longer than the flush interval"
            );
        }
        if elapsed > self.metrics.max_flush_time {
            self.metrics.max_flush_time = elapsed;
        }
        let alpha = 0.1;
        let prev = self.metrics.avg_flush_time.as_secs_f64();
        self.metrics.avg_flush_time =
            Duration::from_secs_f64(prev * (1.0 - alpha) + elapsed.as_secs_f64() * alpha);
    }

    /// Stops the ticker. Idempotent.
    pub fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            debug!(tick = self.tick_count, "flush ticker stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn metrics(&self) -> &FlushMetrics {
        &self.metrics
    }
}
