//! Output drivers and the fail-safe line wrappers they sit on.

pub mod igniter;
pub mod lines;
