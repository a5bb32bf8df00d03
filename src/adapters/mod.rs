//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements               | Connects to                  |
//! |-------------|--------------------------|------------------------------|
//! | `hardware`  | SensorPort, ActuatorPort | gas-request, flame, gas valve|
//! | `gpio`      | embedded-hal pins        | Linux GPIO character device  |
//! | `log_sink`  | EventSink                | `log` facade                 |
//! | `time`      | Clock                    | monotonic system clock       |
//! | `sim`       | pins, Clock, EventSink   | in-memory, virtual time      |

#[cfg(feature = "gpio-cdev")]
pub mod gpio;
pub mod hardware;
pub mod log_sink;
pub mod sim;
pub mod time;
