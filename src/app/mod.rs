//! Application core: pure ignition logic, zero I/O.
//!
//! This module contains the rules of the burner interlock: supervisor
//! orchestration, the shared igniter command, and the events emitted on
//! every transition.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real GPIO lines.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
