//! Shared mutable context threaded through every FSM handler.
//!
//! `SupervisorContext` is the single struct that state handlers read from
//! and write to: the latest input snapshot, the output commands, the two
//! deadlines, and the events raised during the tick.  The supervisor
//! applies the commands to hardware after each tick.

use std::time::Duration;

use crate::app::events::BurnerEvent;
use crate::app::ports::Timestamp;

// ---------------------------------------------------------------------------
// Input snapshot (read-only to state handlers; written by the sensor port)
// ---------------------------------------------------------------------------

/// A point-in-time reading of both inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    /// The brewing controller wants the burner lit.
    pub gas_requested: bool,
    /// The flame sensor sees a flame.
    pub flame_present: bool,
}

// ---------------------------------------------------------------------------
// Output commands (written by state handlers; applied by the supervisor)
// ---------------------------------------------------------------------------

/// Commands that state handlers write to request output levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputCommands {
    /// Gas valve open.
    pub gas_valve: bool,
    /// Igniter pulsing.  Only ever set together with `gas_valve`.
    pub igniter: bool,
}

impl OutputCommands {
    /// Gas closed, igniter off.
    pub fn all_off() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// SupervisorContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
#[derive(Debug)]
pub struct SupervisorContext {
    // -- Timing --
    /// Time of the current tick.
    pub now: Timestamp,
    /// Ignition timeout, also used as the retry cooldown.
    pub no_flame_shutdown: Duration,

    // -- Deadlines --
    /// When the current ignition attempt started.
    pub ignition_started: Timestamp,
    /// Flame must be seen before this instant.
    pub ignition_deadline: Timestamp,
    /// No new attempt starts before this instant after a failure.
    pub retry_deadline: Timestamp,

    // -- Inputs / outputs --
    pub inputs: InputSnapshot,
    pub commands: OutputCommands,

    // -- Events raised by handlers this tick --
    pub events: Vec<BurnerEvent>,
}

impl SupervisorContext {
    pub fn new(no_flame_shutdown: Duration) -> Self {
        Self {
            now: Timestamp::ZERO,
            no_flame_shutdown,
            ignition_started: Timestamp::ZERO,
            ignition_deadline: Timestamp::ZERO,
            retry_deadline: Timestamp::ZERO,
            inputs: InputSnapshot::default(),
            commands: OutputCommands::all_off(),
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: BurnerEvent) {
        self.events.push(event);
    }
}
