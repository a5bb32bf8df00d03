//! Burner configuration parameters
//!
//! Loaded once at startup from a `key = value` file and never mutated
//! afterwards.  Key names match the field names used by the existing
//! `/etc/cbpflamefeedback.config` files, so those files load unchanged.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

/// Config source used when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/cbpflamefeedback.config";

/// GPIO character device used when the config does not name one.
pub const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";

/// Supervisor poll cadence used when the config does not set one.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Upper bound on the poll cadence; slower polling would let gas flow
/// unchecked for longer than one hardware debounce period.
pub const MAX_POLL_INTERVAL_MS: u64 = 100;

/// Core burner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnerConfig {
    // --- Diagnostics ---
    /// Verbose transition logging
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub debug: bool,

    // --- Lines ---
    /// Gas-request input (driven by the brewing controller)
    #[serde(rename = "CBPGasGPIO")]
    pub gas_request_line: u32,
    /// Gas-valve output
    #[serde(rename = "FBGasGPIO")]
    pub gas_valve_line: u32,
    /// Igniter output
    #[serde(rename = "FBIgniterGPIO")]
    pub igniter_line: u32,
    /// Flame-sensor input
    #[serde(rename = "FBFlameSensorGPIO")]
    pub flame_sensor_line: u32,
    /// GPIO character device holding all four lines
    #[serde(rename = "gpioChip", default = "default_gpio_chip")]
    pub gpio_chip: String,

    // --- Igniter timing ---
    /// Igniter on-time per pulse (milliseconds)
    #[serde(rename = "igniterPulseDuration")]
    pub igniter_pulse_duration_ms: u64,
    /// Igniter off-time between pulses (milliseconds)
    #[serde(rename = "igniterTimeBetweenPulses")]
    pub igniter_time_between_pulses_ms: u64,

    // --- Safety timing ---
    /// Ignition timeout and post-failure retry cooldown (milliseconds)
    #[serde(rename = "noFlameShutdownTime")]
    pub no_flame_shutdown_time_ms: u64,
    /// Poll cadence of both control loops (milliseconds)
    #[serde(rename = "pollInterval", default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for BurnerConfig {
    fn default() -> Self {
        Self {
            debug: false,

            // Lines (BCM numbering on a Raspberry Pi header)
            gas_request_line: 17,
            gas_valve_line: 27,
            igniter_line: 22,
            flame_sensor_line: 23,
            gpio_chip: default_gpio_chip(),

            // Igniter timing
            igniter_pulse_duration_ms: 100,
            igniter_time_between_pulses_ms: 50,

            // Safety timing
            no_flame_shutdown_time_ms: 5000,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl BurnerConfig {
    /// Read, parse, and validate a config source.
    ///
    /// Files ending in `.json` are parsed as JSON; anything else is parsed
    /// as `key = value` lines.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_kv_str(&text)
        };

        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?
        .validated()
    }

    /// Parse a `key = value` document without validating it.
    ///
    /// Each value is read as a TOML value; one that is not valid TOML
    /// (`debug = yes`, an unquoted path) is taken as a bare string.
    pub fn from_kv_str(text: &str) -> Result<Self, String> {
        let table = parse_kv_table(text)?;
        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| e.to_string())
    }

    /// Parse a JSON document without validating it.
    pub fn from_json_str(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    /// Check every range rule, returning the config unchanged on success.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let lines = [
            self.gas_request_line,
            self.gas_valve_line,
            self.igniter_line,
            self.flame_sensor_line,
        ];
        for (i, a) in lines.iter().enumerate() {
            if lines[i + 1..].contains(a) {
                return Err(ConfigError::Invalid(
                    "CBPGasGPIO, FBGasGPIO, FBIgniterGPIO and FBFlameSensorGPIO must be distinct",
                ));
            }
        }
        if self.igniter_pulse_duration_ms == 0 {
            return Err(ConfigError::Invalid("igniterPulseDuration must be > 0"));
        }
        if self.no_flame_shutdown_time_ms == 0 {
            return Err(ConfigError::Invalid("noFlameShutdownTime must be > 0"));
        }
        if self.poll_interval_ms == 0 || self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(ConfigError::Invalid("pollInterval must be within 1..=100 ms"));
        }
        Ok(self)
    }

    pub fn igniter_pulse_duration(&self) -> Duration {
        Duration::from_millis(self.igniter_pulse_duration_ms)
    }

    pub fn igniter_time_between_pulses(&self) -> Duration {
        Duration::from_millis(self.igniter_time_between_pulses_ms)
    }

    pub fn no_flame_shutdown_time(&self) -> Duration {
        Duration::from_millis(self.no_flame_shutdown_time_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_gpio_chip() -> String {
    DEFAULT_GPIO_CHIP.to_string()
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn parse_kv_table(text: &str) -> Result<toml::Table, String> {
    let mut table = toml::Table::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let lineno = idx + 1;
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| format!("line {lineno}: expected `key = value`"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("line {lineno}: missing key"));
        }
        if table.contains_key(key) {
            return Err(format!("line {lineno}: duplicate key `{key}`"));
        }
        table.insert(key.to_string(), parse_kv_value(value.trim()));
    }
    Ok(table)
}

fn parse_kv_value(raw: &str) -> toml::Value {
    let typed = toml::from_str::<toml::Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut t| t.remove("v"));
    typed.unwrap_or_else(|| {
        let bare = raw.split_once(" #").map_or(raw, |(v, _)| v).trim_end();
        toml::Value::String(bare.to_string())
    })
}

/// Accept `true`, `1`, `yes`, `on` and friends for boolean keys.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(n) => Ok(n != 0),
        Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean, got \"{other}\""
            ))),
        },
    }
}
