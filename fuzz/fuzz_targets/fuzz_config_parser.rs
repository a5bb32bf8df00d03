//! Fuzz target: config file parsing
//!
//! Feeds arbitrary bytes through both config parsers and validation,
//! verifying:
//! - No panics on any input
//! - A config that validates always has a usable poll interval, a
//!   non-zero pulse and timeout, and four distinct lines
//!
//! cargo fuzz run fuzz_config_parser

#![no_main]

use flamefeedback::config::{BurnerConfig, MAX_POLL_INTERVAL_MS};
use libfuzzer_sys::fuzz_target;

fn check(parsed: Result<BurnerConfig, String>) {
    let Ok(config) = parsed else { return };
    let Ok(config) = config.validated() else { return };

    assert!(config.poll_interval_ms >= 1 && config.poll_interval_ms <= MAX_POLL_INTERVAL_MS);
    assert!(config.igniter_pulse_duration_ms > 0);
    assert!(config.no_flame_shutdown_time_ms > 0);

    let lines = [
        config.gas_request_line,
        config.gas_valve_line,
        config.igniter_line,
        config.flame_sensor_line,
    ];
    for (i, a) in lines.iter().enumerate() {
        assert!(!lines[i + 1..].contains(a), "duplicate line {a}");
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    check(BurnerConfig::from_kv_str(text));
    check(BurnerConfig::from_json_str(text));
});
