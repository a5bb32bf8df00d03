//! Outbound supervisor events.
//!
//! The [`IgnitionSupervisor`](super::service::IgnitionSupervisor) emits
//! these through the [`EventSink`](super::ports::EventSink) port.  None of
//! them is an error: ignition failure and flame loss are ordinary,
//! expected transitions of the interlock.

use std::time::Duration;

use super::ports::Timestamp;
use crate::fsm::StateId;

/// Structured events emitted by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BurnerEvent {
    /// The supervisor has started (outputs off, state Idle).
    Started { at: Timestamp },

    /// The supervisor transitioned between states.
    StateChanged {
        at: Timestamp,
        from: StateId,
        to: StateId,
    },

    /// Flame seen while igniting; `after` is how long the attempt took.
    FlameEstablished { at: Timestamp, after: Duration },

    /// No flame within the ignition timeout; gas is off until `retry_at`.
    IgnitionFailed { at: Timestamp, retry_at: Timestamp },

    /// Flame went out while burning; reignition starts with gas flowing.
    FlameLost { at: Timestamp },

    /// The gas-request line dropped while the burner was not idle.
    RequestWithdrawn { at: Timestamp, during: StateId },

    /// The retry cooldown elapsed with gas still requested.
    RetryReady { at: Timestamp },
}

impl BurnerEvent {
    /// When the event happened.
    pub fn at(&self) -> Timestamp {
        match self {
            Self::Started { at }
            | Self::StateChanged { at, .. }
            | Self::FlameEstablished { at, .. }
            | Self::IgnitionFailed { at, .. }
            | Self::FlameLost { at }
            | Self::RequestWithdrawn { at, .. }
            | Self::RetryReady { at } => *at,
        }
    }
}
