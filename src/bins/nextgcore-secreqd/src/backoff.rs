//! Retry delay for the socket loops
//!
//! A failing `recv` or `accept` waits before the next attempt. The delay
//! doubles on each consecutive failure up to `BACKOFF_MAX` and drops back to
//! `BACKOFF_MIN` after a success.

use std::time::Duration;

/// Delay after the first failure
pub const BACKOFF_MIN: Duration = Duration::from_millis(10);

/// Upper bound on the delay
pub const BACKOFF_MAX: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Default)]
pub struct Backoff {
    current: Duration,
}

impl Backoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay before the next attempt after a failure
    pub fn next_delay(&mut self) -> Duration {
        self.current = if self.current.is_zero() {
            BACKOFF_MIN
        } else {
            (self.current * 2).min(BACKOFF_MAX)
        };
        self.current
    }

    pub fn reset(&mut self) {
        self.current = Duration::ZERO;
    }
}
