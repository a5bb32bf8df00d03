//! Ignition supervisor, the hexagonal core.
//!
//! [`IgnitionSupervisor`] owns the FSM and its context, and is the only
//! writer of the gas valve and the igniter command.  All I/O flows
//! through port traits injected at call sites.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │   IgnitionSupervisor     │
//! ActuatorPort ◀──│  FSM · deadlines         │ ──▶ IgniterCommand
//!                 └──────────────────────────┘        │
//!                                                     ▼
//!                                           IgniterPulseDriver
//! ```
//!
//! ## Output ordering
//!
//! Within one tick the outputs are applied as: igniter command off (if
//! it is to be off), gas valve, igniter command on (only if the valve
//! reports open).  The command is therefore never true while the valve
//! is closed, at any instant another thread can observe.
//!
//! The [`StateWatch`] is published before the outputs when entering a
//! gas-open state and after them otherwise, so it never reports Idle or
//! Cooldown while the valve is still open.

use std::time::Duration;

use log::{debug, info, warn};

use crate::config::BurnerConfig;
use crate::fsm::context::SupervisorContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId, StateWatch};
use crate::scheduler::PollTask;

use super::commands::IgniterCommand;
use super::events::BurnerEvent;
use super::ports::{ActuatorPort, EventSink, SensorPort, Timestamp};

// ───────────────────────────────────────────────────────────────
// IgnitionSupervisor
// ───────────────────────────────────────────────────────────────

/// The flame/gas state machine and its output sequencing.
pub struct IgnitionSupervisor {
    fsm: Fsm,
    ctx: SupervisorContext,
    igniter: IgniterCommand,
    watch: StateWatch,
    /// Set while the igniter is wanted but the valve refused to open.
    valve_refused: bool,
}

impl IgnitionSupervisor {
    /// Construct the supervisor.  Call [`start`](Self::start) next.
    pub fn new(config: &BurnerConfig, igniter: IgniterCommand) -> Self {
        let ctx = SupervisorContext::new(config.no_flame_shutdown_time());
        let fsm = Fsm::new(build_state_table(), StateId::Idle);
        Self {
            fsm,
            ctx,
            igniter,
            watch: StateWatch::new(StateId::Idle),
            valve_refused: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter Idle with both outputs off.
    pub fn start(&mut self, now: Timestamp, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        self.ctx.now = now;
        self.fsm.start(&mut self.ctx);
        self.apply_outputs(hw);
        self.watch.publish(self.fsm.current_state());
        sink.emit(&BurnerEvent::Started { at: now });
        info!("Supervisor started in {:?}", self.fsm.current_state());
    }

    /// Force Idle with both outputs off, whatever the current state.
    pub fn shutdown(&mut self, hw: &mut impl ActuatorPort) {
        self.igniter.deactivate();
        hw.set_gas_valve(false);
        self.fsm.force_transition(StateId::Idle, &mut self.ctx);
        self.ctx.events.clear();
        self.watch.publish(StateId::Idle);
        info!("Supervisor stopped: gas valve closed, igniter off");
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one poll: read inputs → FSM → outputs → events.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`]; this avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        now: Timestamp,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        // 1. Sample inputs
        self.ctx.now = now;
        self.ctx.inputs = hw.read_inputs();

        // 2. FSM tick (pure state logic)
        let transition = self.fsm.tick(&mut self.ctx);

        // 3. Apply outputs in safe order, bracketed by the watch update
        let opening = transition.filter(|(_, to)| !to.requires_gas_closed());
        if let Some((_, to)) = opening {
            self.watch.publish(to);
        }
        self.apply_outputs(hw);
        if let Some((_, to)) = transition.filter(|(_, to)| to.requires_gas_closed()) {
            self.watch.publish(to);
        }

        // 4. Events raised by the handlers, then the transition itself
        for event in self.ctx.events.drain(..) {
            sink.emit(&event);
        }
        if let Some((from, to)) = transition {
            sink.emit(&BurnerEvent::StateChanged { at: now, from, to });
        }
    }

    fn apply_outputs(&mut self, hw: &mut impl ActuatorPort) {
        let commands = self.ctx.commands;

        if !commands.igniter && self.igniter.deactivate() {
            debug!("igniter command cleared");
        }

        hw.set_gas_valve(commands.gas_valve);

        if commands.igniter && hw.gas_valve_open() {
            self.valve_refused = false;
            if self.igniter.activate() {
                debug!("igniter command set");
            }
        } else {
            self.igniter.deactivate();
            if commands.igniter && !self.valve_refused {
                self.valve_refused = true;
                warn!("Gas valve did not open; igniter held off");
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn igniter_active(&self) -> bool {
        self.igniter.is_active()
    }

    /// Flame deadline of the current (or last) ignition attempt.
    pub fn ignition_deadline(&self) -> Timestamp {
        self.ctx.ignition_deadline
    }

    /// End of the current (or last) retry cooldown.
    pub fn retry_deadline(&self) -> Timestamp {
        self.ctx.retry_deadline
    }

    /// A cross-thread view of the current state.
    pub fn watch(&self) -> StateWatch {
        self.watch.clone()
    }
}

// ───────────────────────────────────────────────────────────────
// SupervisorTask
// ───────────────────────────────────────────────────────────────

/// The supervisor bundled with its hardware and sink as a poll loop.
pub struct SupervisorTask<H, S> {
    supervisor: IgnitionSupervisor,
    hw: H,
    sink: S,
    poll_interval: Duration,
    started: bool,
}

impl<H, S> SupervisorTask<H, S>
where
    H: SensorPort + ActuatorPort,
    S: EventSink,
{
    pub fn new(config: &BurnerConfig, igniter: IgniterCommand, hw: H, sink: S) -> Self {
        Self {
            supervisor: IgnitionSupervisor::new(config, igniter),
            hw,
            sink,
            poll_interval: config.poll_interval(),
            started: false,
        }
    }

    pub fn supervisor(&self) -> &IgnitionSupervisor {
        &self.supervisor
    }

    pub fn watch(&self) -> StateWatch {
        self.supervisor.watch()
    }
}

impl<H, S> PollTask for SupervisorTask<H, S>
where
    H: SensorPort + ActuatorPort,
    S: EventSink,
{
    fn name(&self) -> &'static str {
        "supervisor"
    }

    fn poll(&mut self, now: Timestamp) -> Duration {
        if !self.started {
            self.started = true;
            self.supervisor.start(now, &mut self.hw, &mut self.sink);
        }
        self.supervisor.tick(now, &mut self.hw, &mut self.sink);
        self.poll_interval
    }

    fn shutdown(&mut self) {
        self.supervisor.shutdown(&mut self.hw);
    }
}
