//! Mock hardware adapter for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history without touching real GPIO lines.

use flamefeedback::app::events::BurnerEvent;
use flamefeedback::app::ports::{ActuatorPort, EventSink, SensorPort};
use flamefeedback::fsm::context::InputSnapshot;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    SetGasValve { open: bool },
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub inputs: InputSnapshot,
    pub calls: Vec<ActuatorCall>,
    /// Inputs sampled so far.
    pub reads: usize,
    valve_open: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            inputs: InputSnapshot::default(),
            calls: Vec::new(),
            reads: 0,
            valve_open: false,
        }
    }

    pub fn request(&mut self, on: bool) {
        self.inputs.gas_requested = on;
    }

    pub fn flame(&mut self, on: bool) {
        self.inputs.flame_present = on;
    }

    pub fn gas_open(&self) -> bool {
        self.valve_open
    }

    /// Number of times the valve was driven to a different level.
    pub fn valve_edges(&self) -> usize {
        let mut level = false;
        let mut edges = 0;
        for ActuatorCall::SetGasValve { open } in &self.calls {
            if *open != level {
                edges += 1;
                level = *open;
            }
        }
        edges
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_inputs(&mut self) -> InputSnapshot {
        self.reads += 1;
        self.inputs
    }
}

impl ActuatorPort for MockHardware {
    fn set_gas_valve(&mut self, open: bool) {
        self.calls.push(ActuatorCall::SetGasValve { open });
        self.valve_open = open;
    }

    fn gas_valve_open(&self) -> bool {
        self.valve_open
    }
}

// ── LogSink: records every event ──────────────────────────────

pub struct LogSink {
    pub events: Vec<BurnerEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&BurnerEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &BurnerEvent) {
        self.events.push(event.clone());
    }
}
