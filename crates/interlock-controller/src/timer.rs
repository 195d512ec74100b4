//! Idle timer.
//!
//! Accumulates wall-clock time between ticks while enabled. Both `enable`
//! and `disable` reset the count, so the timer measures one continuous
//! stretch rather than a running total.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdleTimer {
    enabled: bool,
    elapsed: Duration,
    last_tick: Option<Instant>,
}

impl IdleTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to zero and start counting from `now`.
    pub fn enable(&mut self, now: Instant) {
        self.enabled = true;
        self.elapsed = Duration::ZERO;
        self.last_tick = Some(now);
    }

    /// Reset to zero and stop.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.elapsed = Duration::ZERO;
        self.last_tick = None;
    }

    /// Add the time since the previous tick. Does nothing while disabled.
    ///
    /// A `now` earlier than the previous tick adds nothing.
    pub fn advance(&mut self, now: Instant) {
        if !self.enabled {
            return;
        }
        if let Some(last) = self.last_tick {
            self.elapsed += now.saturating_duration_since(last);
        }
        self.last_tick = Some(now);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Whether the timer is running and has strictly passed `limit`.
    pub fn exceeded(&self, limit: Duration) -> bool {
        self.enabled && self.elapsed > limit
    }
}
