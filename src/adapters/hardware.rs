//! Hardware adapter: bridges the burner lines to domain port traits.
//!
//! Owns the two input lines and a handle to the gas-valve output,
//! exposing them through [`SensorPort`] and [`ActuatorPort`].  The
//! igniter output is not here: the pulse driver owns it.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::lines::{DigitalInput, SharedOutput};
use crate::fsm::context::InputSnapshot;

/// The supervisor's view of the burner hardware.
pub struct BurnerHardware<R, F, G> {
    gas_request: DigitalInput<R>,
    flame_sensor: DigitalInput<F>,
    gas_valve: SharedOutput<G>,
}

impl<R: InputPin, F: InputPin, G: OutputPin> BurnerHardware<R, F, G> {
    pub fn new(gas_request: R, flame_sensor: F, gas_valve: SharedOutput<G>) -> Self {
        Self {
            gas_request: DigitalInput::new("gas-request", gas_request),
            flame_sensor: DigitalInput::new("flame-sensor", flame_sensor),
            gas_valve,
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<R: InputPin, F: InputPin, G: OutputPin> SensorPort for BurnerHardware<R, F, G> {
    fn read_inputs(&mut self) -> InputSnapshot {
        InputSnapshot {
            gas_requested: self.gas_request.read(),
            flame_present: self.flame_sensor.read(),
        }
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<R: InputPin, F: InputPin, G: OutputPin> ActuatorPort for BurnerHardware<R, F, G> {
    fn set_gas_valve(&mut self, open: bool) {
        self.gas_valve.set(open);
    }

    fn gas_valve_open(&self) -> bool {
        self.gas_valve.is_high()
    }
}
