//! Port traits: the hexagonal boundary between ignition logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ IgnitionSupervisor / IgniterPulseDriver
//! ```
//!
//! Driven adapters (GPIO lines, clocks, event sinks) implement these
//! traits.  The supervisor and the pulse driver consume them via
//! generics, so the domain core never touches hardware directly.
//!
//! ## Safety notes
//!
//! - **SensorPort** implementations MUST fail toward "no request / no
//!   flame" when a line cannot be read.
//! - **ActuatorPort** and **IgniterPort** writes never return errors; a
//!   failed write leaves the reported level unchanged.

use core::ops::Add;
use std::time::Duration;

use crate::fsm::context::InputSnapshot;

// ───────────────────────────────────────────────────────────────
// Time
// ───────────────────────────────────────────────────────────────

/// Monotonic point in time, in milliseconds since the clock's epoch.
///
/// Deadlines are compared with `>=`; arithmetic saturates instead of
/// wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const ZERO: Self = Self(0);

    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is later.
    pub fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        let ms = u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(ms))
    }
}

impl core::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:03}s", self.0 / 1000, self.0 % 1000)
    }
}

/// Source of time for the control loops.
///
/// The real clock sleeps the calling thread; the simulated clock
/// advances virtual time instead, which makes every timing rule testable
/// without waiting.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;

    fn sleep(&self, duration: Duration);
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the supervisor calls this once per poll.
pub trait SensorPort {
    /// Sample the gas-request and flame-sensor inputs.
    fn read_inputs(&mut self) -> InputSnapshot;
}

// ───────────────────────────────────────────────────────────────
// Actuator ports (driven adapters: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Gas-valve output, written only by the supervisor.
pub trait ActuatorPort {
    /// Open (`true`) or close the gas valve.
    fn set_gas_valve(&mut self, open: bool);

    /// Whether the valve output is currently driven open.
    fn gas_valve_open(&self) -> bool;
}

/// Igniter output, written only by the pulse driver.
pub trait IgniterPort {
    /// Energise (`true`) or de-energise the spark igniter.
    fn set_igniter(&mut self, energised: bool);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The supervisor emits structured [`BurnerEvent`](super::events::BurnerEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::BurnerEvent);
}
