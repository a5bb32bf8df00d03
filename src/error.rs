//! Error types for the flame feedback controller.
//!
//! Only configuration loading can fail in a way that is propagated to the
//! caller.  Everything that goes wrong at the hardware boundary is folded
//! into the safe state by the line wrappers and reported as a [`LineFault`]
//! in the log; the control loops never see an `Err`.

use core::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Why a configuration source could not be turned into a [`BurnerConfig`].
///
/// [`BurnerConfig`]: crate::config::BurnerConfig
#[derive(Debug)]
pub enum ConfigError {
    /// The source does not exist or cannot be read.
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The source was read but is not a valid key/value document.
    Parse { path: PathBuf, message: String },
    /// A value is outside its permitted range.
    /// The `&'static str` names the key and the rule it broke.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable { path, source } => {
                write!(f, "config file \"{}\" not readable: {source}", path.display())
            }
            Self::Parse { path, message } => {
                write!(f, "config file \"{}\" is malformed: {message}", path.display())
            }
            Self::Invalid(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unreadable { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Line faults
// ---------------------------------------------------------------------------

/// A digital line access that failed and was replaced by the safe level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFault {
    /// An input could not be read; it is treated as low.
    ReadFailed,
    /// An output could not be written; its tracked level is unchanged.
    WriteFailed,
}

impl fmt::Display for LineFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed => write!(f, "read failed, treating input as low"),
            Self::WriteFailed => write!(f, "write failed"),
        }
    }
}
