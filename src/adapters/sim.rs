//! Deterministic simulation adapters.
//!
//! - [`SimLine`]: an in-memory digital line implementing the
//!   `embedded-hal` pin traits, with switchable failure.
//! - [`ManualClock`]: virtual time; `sleep` advances it instead of
//!   blocking.
//! - [`Simulation`]: runs several [`PollTask`]s against one
//!   `ManualClock` in due-time order and calls an observer after every
//!   poll, so safety properties can be checked at each instant the
//!   outputs can change.
//! - [`RecordingSink`]: an [`EventSink`] that keeps every event.
//!
//! Nothing here touches hardware; the library's own tests and the
//! integration tests run on these.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};

use crate::app::events::BurnerEvent;
use crate::app::ports::{Clock, EventSink, Timestamp};
use crate::scheduler::PollTask;

// ───────────────────────────────────────────────────────────────
// SimLine
// ───────────────────────────────────────────────────────────────

/// Error returned by a [`SimLine`] switched to failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimLineError;

impl digital::Error for SimLineError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Shared in-memory line.  Clones observe and drive the same level.
#[derive(Debug, Clone, Default)]
pub struct SimLine {
    level: Arc<AtomicBool>,
    failing: Arc<AtomicBool>,
    writes: Arc<AtomicU64>,
}

impl SimLine {
    pub fn new(level: bool) -> Self {
        let line = Self::default();
        line.set(level);
        line
    }

    /// Drive the line from outside (the "world" side of an input).
    pub fn set(&self, level: bool) {
        self.level.store(level, Ordering::SeqCst);
    }

    /// Current level.
    pub fn level(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }

    /// Make every pin access fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successful writes through the pin traits.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), SimLineError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(SimLineError)
        } else {
            Ok(())
        }
    }

    fn write(&self, level: bool) -> Result<(), SimLineError> {
        self.check()?;
        self.set(level);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl ErrorType for SimLine {
    type Error = SimLineError;
}

impl InputPin for SimLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.check()?;
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

impl OutputPin for SimLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

// ───────────────────────────────────────────────────────────────
// ManualClock
// ───────────────────────────────────────────────────────────────

/// Virtual clock.  Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(t: Timestamp) -> Self {
        let clock = Self::new();
        clock.set(t);
        clock
    }

    /// Jump to `t`.  Time never moves backwards.
    pub fn set(&self, t: Timestamp) {
        self.now_ms.fetch_max(t.as_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.set(self.now() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.now_ms.load(Ordering::SeqCst))
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

struct Slot<'a> {
    task: Box<dyn PollTask + 'a>,
    due: Timestamp,
}

/// Co-schedules poll tasks in virtual time.
///
/// The task with the earliest due time runs next; ties go to the task
/// added first.  Each poll happens exactly at its due time.
pub struct Simulation<'a> {
    clock: ManualClock,
    slots: Vec<Slot<'a>>,
    polls: u64,
}

impl<'a> Simulation<'a> {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            slots: Vec::new(),
            polls: 0,
        }
    }

    /// Add a task, first polled at the current time.
    pub fn add(&mut self, task: impl PollTask + 'a) {
        self.slots.push(Slot {
            task: Box::new(task),
            due: self.clock.now(),
        });
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Total polls made so far.
    pub fn polls(&self) -> u64 {
        self.polls
    }

    /// Run every poll due at or before `end`, calling `on_step` with the
    /// poll time after each one.  The clock is left at `end`.
    pub fn run_until(&mut self, end: Timestamp, mut on_step: impl FnMut(Timestamp)) {
        while let Some(idx) = self.next_due(end) {
            let slot = &mut self.slots[idx];
            let at = slot.due;
            self.clock.set(at);
            let wait = slot.task.poll(at);
            slot.due = at + wait;
            self.polls += 1;
            on_step(at);
        }
        self.clock.set(end);
    }

    /// Run for `span` of virtual time from now.
    pub fn run_for(&mut self, span: Duration, on_step: impl FnMut(Timestamp)) {
        let end = self.now() + span;
        self.run_until(end, on_step);
    }

    /// Shut every task down, in insertion order.
    pub fn shutdown(&mut self) {
        for slot in &mut self.slots {
            slot.task.shutdown();
        }
    }

    fn next_due(&self, end: Timestamp) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due <= end)
            .min_by_key(|(i, s)| (s.due, *i))
            .map(|(i, _)| i)
    }
}

// ───────────────────────────────────────────────────────────────
// RecordingSink
// ───────────────────────────────────────────────────────────────

/// Event sink that records every event.  Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<BurnerEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BurnerEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &BurnerEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
