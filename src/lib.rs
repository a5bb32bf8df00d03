//! Flame feedback library: the gas burner ignition interlock.
//!
//! Exposes the pure-logic modules and the simulation adapters for
//! integration testing.  Linux GPIO access is behind the `gpio-cdev`
//! feature, in [`adapters::gpio`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod safety;
pub mod scheduler;
