//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing burner events through the `log`
//! facade.  With `debug` set in the config every event is logged;
//! otherwise only ignition failures and flame loss are, as warnings.

use log::{info, warn};

use crate::app::events::BurnerEvent;
use crate::app::ports::EventSink;

/// Adapter that logs [`BurnerEvent`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventSink {
    verbose: bool,
}

impl LogEventSink {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &BurnerEvent) {
        match event {
            BurnerEvent::IgnitionFailed { at, retry_at } => {
                warn!(
                    "IGNITION FAILED | at={} | no flame, gas closed until {}",
                    at, retry_at
                );
            }
            BurnerEvent::FlameLost { at } => {
                warn!("FLAME LOST | at={} | reigniting with gas open", at);
            }
            _ if !self.verbose => {}
            BurnerEvent::Started { at } => {
                info!("START | at={} | gas closed, igniter off", at);
            }
            BurnerEvent::StateChanged { at, from, to } => {
                info!("STATE | at={} | {:?} -> {:?}", at, from, to);
            }
            BurnerEvent::FlameEstablished { at, after } => {
                info!(
                    "FLAME | at={} | established after {}ms",
                    at,
                    after.as_millis()
                );
            }
            BurnerEvent::RequestWithdrawn { at, during } => {
                info!("REQUEST | at={} | withdrawn during {:?}", at, during);
            }
            BurnerEvent::RetryReady { at } => {
                info!("RETRY | at={} | cooldown over, gas still requested", at);
            }
        }
    }
}
