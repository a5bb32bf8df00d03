//! Igniter pulse driver.
//!
//! Reflects the shared [`IgniterCommand`](crate::app::commands::IgniterCommand)
//! onto the igniter output as a repeating on/off pulse train:
//!
//! ```text
//!  command ─┐ ┌──────────────────────────────┐
//!           └─┘                              └──────────
//!  output     ┌──pulse──┐       ┌──pulse──┐
//!  ───────────┘         └─gap───┘         └─gap── (low)
//! ```
//!
//! The command is sampled at the end of every hold interval, so the
//! output stays high at most one pulse duration after the command drops.
//! With the command inactive the driver re-checks at the idle cadence.

use std::time::Duration;

use log::debug;

use crate::app::commands::IgniterCommandReader;
use crate::app::ports::{IgniterPort, Timestamp};
use crate::config::BurnerConfig;
use crate::scheduler::PollTask;

/// Where the pulse train currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulsePhase {
    /// Command inactive, output low.
    Idle,
    /// Output held high for the pulse duration.
    On,
    /// Output held low for the gap between pulses.
    Off,
}

/// Drives the igniter output from the igniter command.
pub struct IgniterPulseDriver<P: IgniterPort> {
    output: P,
    command: IgniterCommandReader,
    pulse: Duration,
    gap: Duration,
    idle_poll: Duration,
    phase: PulsePhase,
    pulses: u64,
}

impl<P: IgniterPort> IgniterPulseDriver<P> {
    pub fn new(config: &BurnerConfig, command: IgniterCommandReader, mut output: P) -> Self {
        output.set_igniter(false);
        Self {
            output,
            command,
            pulse: config.igniter_pulse_duration(),
            gap: config.igniter_time_between_pulses(),
            idle_poll: config.poll_interval(),
            phase: PulsePhase::Idle,
            pulses: 0,
        }
    }

    pub fn phase(&self) -> PulsePhase {
        self.phase
    }

    /// Number of pulses started since construction.
    pub fn pulses(&self) -> u64 {
        self.pulses
    }

    fn start_pulse(&mut self) -> Duration {
        self.output.set_igniter(true);
        self.phase = PulsePhase::On;
        self.pulses += 1;
        self.pulse
    }
}

impl<P: IgniterPort> PollTask for IgniterPulseDriver<P> {
    fn name(&self) -> &'static str {
        "igniter"
    }

    fn poll(&mut self, now: Timestamp) -> Duration {
        match self.phase {
            PulsePhase::Idle => {
                if self.command.is_active() {
                    debug!("igniter: pulsing from {now}");
                    self.start_pulse()
                } else {
                    self.idle_poll
                }
            }
            PulsePhase::On => {
                self.output.set_igniter(false);
                self.phase = PulsePhase::Off;
                self.gap
            }
            PulsePhase::Off => {
                if self.command.is_active() {
                    self.start_pulse()
                } else {
                    debug!("igniter: stopped at {now} after {} pulses", self.pulses);
                    self.phase = PulsePhase::Idle;
                    self.idle_poll
                }
            }
        }
    }

    fn shutdown(&mut self) {
        self.output.set_igniter(false);
        self.phase = PulsePhase::Idle;
    }
}
