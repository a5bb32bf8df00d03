//! System time adapter.
//!
//! Monotonic milliseconds since the adapter was created, from
//! `std::time::Instant`.  Wall-clock changes do not affect deadlines.

use std::thread;
use std::time::{Duration, Instant};

use crate::app::ports::{Clock, Timestamp};

/// Real clock for the control loops.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Time since the clock was created.
    pub fn uptime(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(u64::try_from(self.uptime().as_millis()).unwrap_or(u64::MAX))
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}
