//! The shared igniter command.
//!
//! One boolean crosses between the two control loops: "the igniter should
//! be pulsing".  The supervisor holds the only [`IgniterCommand`] (not
//! `Clone`), the pulse driver holds an [`IgniterCommandReader`].  Writes
//! use `Release` and reads use `Acquire`, so a gas-valve write sequenced
//! before `activate()` is visible to any reader that sees the command.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Write half of the igniter command.  Owned by the supervisor.
#[derive(Debug, Default)]
pub struct IgniterCommand {
    active: Arc<AtomicBool>,
}

/// Read half of the igniter command.
#[derive(Debug, Clone)]
pub struct IgniterCommandReader {
    active: Arc<AtomicBool>,
}

impl IgniterCommand {
    /// A new command, initially inactive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a reader for the pulse driver (or an observer).
    pub fn reader(&self) -> IgniterCommandReader {
        IgniterCommandReader {
            active: Arc::clone(&self.active),
        }
    }

    /// Request igniter pulsing.  Returns `true` if this changed the command.
    pub fn activate(&self) -> bool {
        !self.active.swap(true, Ordering::AcqRel)
    }

    /// Stop igniter pulsing.  Returns `true` if this changed the command.
    pub fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl IgniterCommandReader {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}
