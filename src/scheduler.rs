//! Tick scheduler for the control loops.
//!
//! Each loop is a [`PollTask`]: it is polled, does its work, and says how
//! long to wait before the next poll.  [`PollLoop`] owns the timing so
//! the tasks never sleep themselves, which lets the same task run on a
//! real thread with [`SystemClock`](crate::adapters::time::SystemClock)
//! or in virtual time under
//! [`Simulation`](crate::adapters::sim::Simulation).
//!
//! ```text
//!   ┌────────────┐  poll(now) -> wait   ┌──────────────────┐
//!   │  PollLoop  │ ───────────────────▶ │ PollTask         │
//!   │            │                      │  supervisor      │
//!   │ next_due  ◀┤                      │  igniter         │
//!   │ sleep in   │                      └──────────────────┘
//!   │ ≤100ms     │ ◀── CancelToken (signal handler)
//!   └────────────┘
//! ```

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info};

use crate::app::ports::{Clock, Timestamp};
use crate::safety::CancelToken;

/// Longest single sleep; bounds how long a cancelled loop keeps running.
pub const MAX_SLEEP_SLICE: Duration = Duration::from_millis(100);

/// A unit of periodic work driven by a [`PollLoop`].
pub trait PollTask {
    /// Loop name, also used as the thread name.
    fn name(&self) -> &'static str;

    /// Do one step of work at `now`.  Returns the wait before the next poll.
    fn poll(&mut self, now: Timestamp) -> Duration;

    /// Called once when the loop stops.
    fn shutdown(&mut self) {}
}

// ═══════════════════════════════════════════════════════════════
//  Poll loop
// ═══════════════════════════════════════════════════════════════

/// Runs one [`PollTask`] until its token is cancelled.
pub struct PollLoop {
    clock: Arc<dyn Clock>,
    token: CancelToken,
    slice: Duration,
}

impl PollLoop {
    pub fn new(clock: Arc<dyn Clock>, token: CancelToken) -> Self {
        Self {
            clock,
            token,
            slice: MAX_SLEEP_SLICE,
        }
    }

    /// Use a shorter sleep slice (clamped to 1ms..=100ms).
    #[must_use]
    pub fn with_slice(mut self, slice: Duration) -> Self {
        self.slice = slice.clamp(Duration::from_millis(1), MAX_SLEEP_SLICE);
        self
    }

    /// Poll `task` until cancelled, then shut it down.  Returns the
    /// number of polls made.
    ///
    /// Polls are scheduled from the previous due time, not from when the
    /// poll finished, so cadence does not drift.  A loop that falls
    /// behind resynchronises to the current time instead of bursting.
    pub fn run(&self, task: &mut dyn PollTask) -> u64 {
        info!("{}: loop started", task.name());
        let mut polls = 0u64;
        let mut due = self.clock.now();

        while !self.token.is_cancelled() {
            let wait = task.poll(self.clock.now());
            polls += 1;

            due = due + wait;
            let now = self.clock.now();
            if due < now {
                debug!(
                    "{}: running {}ms late, resyncing",
                    task.name(),
                    now.saturating_duration_since(due).as_millis()
                );
                due = now;
            }

            if !self.sleep_until(due) {
                break;
            }
        }

        task.shutdown();
        info!("{}: loop stopped after {} polls", task.name(), polls);
        polls
    }

    /// Sleep until `due` in slices.  Returns `false` if cancelled first.
    fn sleep_until(&self, due: Timestamp) -> bool {
        loop {
            if self.token.is_cancelled() {
                return false;
            }
            let now = self.clock.now();
            if now >= due {
                return true;
            }
            self.clock
                .sleep(due.saturating_duration_since(now).min(self.slice));
        }
    }
}

/// Run `task` in a [`PollLoop`] on its own named thread.
pub fn spawn<T>(
    mut task: T,
    clock: Arc<dyn Clock>,
    token: CancelToken,
) -> io::Result<JoinHandle<u64>>
where
    T: PollTask + Send + 'static,
{
    let name = task.name();
    info!("Spawning '{}' loop", name);
    thread::Builder::new()
        .name(name.into())
        .spawn(move || PollLoop::new(clock, token).run(&mut task))
}
