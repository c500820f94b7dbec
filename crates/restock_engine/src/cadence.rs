//! Fixed wall-clock cadence for reconciliation passes.
//!
//! Host frames arrive far more often than passes should run. The cadence
//! gates frame ticks down to one pass per interval of wall-clock time.

use crate::clock::Timestamp;
use core::time::Duration;

/// Tracks when the next pass is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    interval: Duration,
    last_run: Option<Timestamp>,
}

impl Cadence {
    /// Creates a cadence whose first pass is due immediately.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    /// Returns the interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true if a pass should run at `now`.
    ///
    /// A clock that stepped backwards past the last run makes the pass due,
    /// so a wall-clock correction never stalls the loop.
    #[must_use]
    pub fn is_due(&self, now: Timestamp) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now
                .elapsed_since(last)
                .is_none_or(|elapsed| elapsed >= self.interval),
        }
    }

    /// Records that a pass ran at `now`.
    pub fn mark_run(&mut self, now: Timestamp) {
        self.last_run = Some(now);
    }
}
