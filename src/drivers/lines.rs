//! Fail-safe digital line wrappers.
//!
//! The DigitalIO boundary: everything above this module sees plain
//! booleans, everything below is an `embedded-hal` pin that can fail.
//!
//! ## Safety contract
//!
//! - [`DigitalInput::read`] returns `false` when the pin cannot be read,
//!   so a dead gas-request line reads as "not requesting" and a dead
//!   flame sensor reads as "no flame".
//! - [`SharedOutput`] only records a new level after the pin accepted it.
//! - [`SharedOutput::force_off`] drives the line low and latches a
//!   lockout; every later `set(true)` drives it low instead.  The
//!   shutdown path uses this so a loop still mid-poll cannot re-open the
//!   gas valve after the forced-off step ran.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::digital::{InputPin, OutputPin};
use log::{error, info, warn};

use crate::app::ports::IgniterPort;
use crate::error::LineFault;

// ── Inputs ────────────────────────────────────────────────────

/// An input line that reads low on failure.
pub struct DigitalInput<P> {
    name: &'static str,
    pin: P,
    faulted: bool,
}

impl<P: InputPin> DigitalInput<P> {
    pub fn new(name: &'static str, pin: P) -> Self {
        Self {
            name,
            pin,
            faulted: false,
        }
    }

    /// Current logical level, `false` if the pin could not be read.
    pub fn read(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(level) => {
                if self.faulted {
                    self.faulted = false;
                    info!("{}: line readable again", self.name);
                }
                level
            }
            Err(e) => {
                if !self.faulted {
                    self.faulted = true;
                    warn!("{}: {} ({:?})", self.name, LineFault::ReadFailed, e);
                }
                false
            }
        }
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }
}

// ── Outputs ───────────────────────────────────────────────────

struct OutputState<P> {
    pin: P,
    high: bool,
    locked_out: bool,
    faulted: bool,
}

/// An output line shared between its loop and the shutdown path.
///
/// Cloning yields another handle to the same line.
pub struct SharedOutput<P> {
    name: &'static str,
    inner: Arc<Mutex<OutputState<P>>>,
}

impl<P> Clone for SharedOutput<P> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: OutputPin> SharedOutput<P> {
    /// Wrap `pin`, driving it low immediately.
    pub fn new(name: &'static str, pin: P) -> Self {
        let line = Self {
            name,
            inner: Arc::new(Mutex::new(OutputState {
                pin,
                high: false,
                locked_out: false,
                faulted: false,
            })),
        };
        line.drive(&mut line.lock(), false);
        line
    }

    /// Drive the line.  Returns the level the line now reports.
    pub fn set(&self, high: bool) -> bool {
        let mut state = self.lock();
        let level = high && !state.locked_out;
        self.drive(&mut state, level);
        state.high
    }

    /// Drive the line low and refuse any further `set(true)`.
    pub fn force_off(&self) {
        let mut state = self.lock();
        state.locked_out = true;
        self.drive(&mut state, false);
    }

    /// Last level the pin accepted.
    pub fn is_high(&self) -> bool {
        self.lock().high
    }

    pub fn is_locked_out(&self) -> bool {
        self.lock().locked_out
    }

    fn lock(&self) -> MutexGuard<'_, OutputState<P>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn drive(&self, state: &mut OutputState<P>, high: bool) {
        let result = if high {
            state.pin.set_high()
        } else {
            state.pin.set_low()
        };
        match result {
            Ok(()) => {
                state.high = high;
                if state.faulted {
                    state.faulted = false;
                    info!("{}: line writable again", self.name);
                }
            }
            Err(e) => {
                if !state.faulted {
                    state.faulted = true;
                    error!(
                        "{}: {} driving {} ({:?})",
                        self.name,
                        LineFault::WriteFailed,
                        if high { "high" } else { "low" },
                        e
                    );
                }
            }
        }
    }
}

impl<P: OutputPin> IgniterPort for SharedOutput<P> {
    fn set_igniter(&mut self, energised: bool) {
        self.set(energised);
    }
}
