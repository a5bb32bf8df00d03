//! Flame feedback: main entry point
//!
//! Gas burner ignition interlock for a Linux single-board computer.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  GpioChip/CdevLine   BurnerHardware      LogEventSink          │
//! │  (embedded-hal pins) (Sensor+Actuator)   (EventSink)           │
//! │  SystemClock         ShutdownGuard + ctrlc                     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌───────────────────────────┐   ┌─────────────────────────┐   │
//! │  │ IgnitionSupervisor (FSM)  │──▶│ IgniterPulseDriver      │   │
//! │  │ "supervisor" thread       │   │ "igniter" thread        │   │
//! │  └───────────────────────────┘   └─────────────────────────┘   │
//! │            IgniterCommand (one atomic flag)                    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{error, info};

use flamefeedback::adapters::gpio::GpioChip;
use flamefeedback::adapters::hardware::BurnerHardware;
use flamefeedback::adapters::log_sink::LogEventSink;
use flamefeedback::adapters::time::SystemClock;
use flamefeedback::app::commands::IgniterCommand;
use flamefeedback::app::ports::Clock;
use flamefeedback::app::service::SupervisorTask;
use flamefeedback::config::{BurnerConfig, DEFAULT_CONFIG_PATH};
use flamefeedback::drivers::igniter::IgniterPulseDriver;
use flamefeedback::drivers::lines::SharedOutput;
use flamefeedback::safety::ShutdownGuard;
use flamefeedback::scheduler::{self, MAX_SLEEP_SLICE};

// ── Command line ──────────────────────────────────────────────

/// Gas burner ignition interlock.
#[derive(Debug, Parser)]
#[command(name = "flamefeedback", version, about)]
struct Cli {
    /// Configuration file [default: /etc/cbpflamefeedback.config]
    config: Option<PathBuf>,
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}

fn log_config(path: &std::path::Path, config: &BurnerConfig) {
    info!("Config source: {}", path.display());
    info!("  debug                    = {}", config.debug);
    info!("  gpioChip                 = {}", config.gpio_chip);
    info!("  CBPGasGPIO               = {}", config.gas_request_line);
    info!("  FBGasGPIO                = {}", config.gas_valve_line);
    info!("  FBIgniterGPIO            = {}", config.igniter_line);
    info!("  FBFlameSensorGPIO        = {}", config.flame_sensor_line);
    info!("  igniterPulseDuration     = {}ms", config.igniter_pulse_duration_ms);
    info!("  igniterTimeBetweenPulses = {}ms", config.igniter_time_between_pulses_ms);
    info!("  noFlameShutdownTime      = {}ms", config.no_flame_shutdown_time_ms);
    info!("  pollInterval             = {}ms", config.poll_interval_ms);
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. Configuration (before any hardware is touched) ─────
    let cli = Cli::parse();
    let path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = BurnerConfig::load(&path)
        .with_context(|| format!("cannot load configuration from {}", path.display()))?;

    init_logging(config.debug);
    info!("flamefeedback v{}", env!("CARGO_PKG_VERSION"));
    log_config(&path, &config);

    // ── 2. Hardware bring-up: outputs low before any loop runs ─
    let mut chip = GpioChip::open(&config.gpio_chip)
        .with_context(|| format!("cannot open GPIO chip {}", config.gpio_chip))?;
    let gas_valve = SharedOutput::new(
        "gas-valve",
        chip.output(config.gas_valve_line)
            .context("cannot request gas-valve line")?,
    );
    let igniter = SharedOutput::new(
        "igniter",
        chip.output(config.igniter_line)
            .context("cannot request igniter line")?,
    );
    let gas_request = chip
        .input(config.gas_request_line)
        .context("cannot request gas-request line")?;
    let flame_sensor = chip
        .input(config.flame_sensor_line)
        .context("cannot request flame-sensor line")?;

    // ── 3. Shutdown guard + termination signals ───────────────
    let guard = ShutdownGuard::new();
    {
        let line = gas_valve.clone();
        guard.register("gas valve off", move || line.force_off());
    }
    {
        let line = igniter.clone();
        guard.register("igniter off", move || line.force_off());
    }
    let handle = guard.handle();
    ctrlc::set_handler(move || {
        handle.trigger();
    })
    .context("cannot install termination handler")?;

    // ── 4. Control loops ──────────────────────────────────────
    let command = IgniterCommand::new();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());

    let driver = IgniterPulseDriver::new(&config, command.reader(), igniter);
    let hardware = BurnerHardware::new(gas_request, flame_sensor, gas_valve);
    let supervisor =
        SupervisorTask::new(&config, command, hardware, LogEventSink::new(config.debug));

    let igniter_loop = scheduler::spawn(driver, Arc::clone(&clock), guard.token())
        .context("cannot spawn igniter loop")?;
    let supervisor_loop = scheduler::spawn(supervisor, clock, guard.token())
        .context("cannot spawn supervisor loop")?;

    // ── 5. Wait: both loops run until cancelled ───────────────
    while !(igniter_loop.is_finished() || supervisor_loop.is_finished()) {
        thread::sleep(MAX_SLEEP_SLICE);
    }
    // Either a signal arrived or a loop died; stop the other one too.
    guard.run_cleanups();

    let igniter_result = igniter_loop.join();
    let supervisor_result = supervisor_loop.join();
    guard.run_cleanups();

    match (supervisor_result, igniter_result) {
        (Ok(supervisor_polls), Ok(igniter_polls)) => {
            info!(
                "Stopped: {} supervisor polls, {} igniter polls, outputs off",
                supervisor_polls, igniter_polls
            );
            Ok(())
        }
        _ => {
            error!("A control loop panicked; outputs forced off");
            bail!("control loop panicked")
        }
    }
}
