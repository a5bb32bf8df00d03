//! Integration tests for the shutdown path with both loops on real threads.
//!
//! Wires the system the way `main` does, on simulated lines and the
//! system clock, then triggers shutdown while gas is flowing.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use flamefeedback::adapters::hardware::BurnerHardware;
use flamefeedback::adapters::sim::{RecordingSink, SimLine};
use flamefeedback::adapters::time::SystemClock;
use flamefeedback::app::commands::IgniterCommand;
use flamefeedback::app::ports::Clock;
use flamefeedback::app::service::SupervisorTask;
use flamefeedback::config::BurnerConfig;
use flamefeedback::drivers::igniter::IgniterPulseDriver;
use flamefeedback::drivers::lines::SharedOutput;
use flamefeedback::fsm::StateId;
use flamefeedback::safety::ShutdownGuard;
use flamefeedback::scheduler;

struct Lines {
    request: SimLine,
    flame: SimLine,
    gas: SimLine,
    igniter: SimLine,
}

fn wait_for(what: &str, mut cond: impl FnMut() -> bool) {
    let start = Instant::now();
    while !cond() {
        assert!(start.elapsed() < Duration::from_secs(5), "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn signal_forces_outputs_off_and_stops_loops() {
    let config = BurnerConfig {
        igniter_pulse_duration_ms: 20,
        igniter_time_between_pulses_ms: 10,
        no_flame_shutdown_time_ms: 10_000,
        poll_interval_ms: 10,
        ..BurnerConfig::default()
    };
    let lines = Lines {
        request: SimLine::new(true),
        flame: SimLine::new(false),
        gas: SimLine::new(false),
        igniter: SimLine::new(false),
    };

    let gas_valve = SharedOutput::new("gas-valve", lines.gas.clone());
    let igniter = SharedOutput::new("igniter", lines.igniter.clone());

    let guard = ShutdownGuard::new();
    {
        let line = gas_valve.clone();
        guard.register("gas valve off", move || line.force_off());
    }
    {
        let line = igniter.clone();
        guard.register("igniter off", move || line.force_off());
    }

    let command = IgniterCommand::new();
    let reader = command.reader();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let driver = IgniterPulseDriver::new(&config, command.reader(), igniter.clone());
    let hardware = BurnerHardware::new(lines.request.clone(), lines.flame.clone(), gas_valve.clone());
    let sink = RecordingSink::new();
    let task = SupervisorTask::new(&config, command, hardware, sink.clone());
    let watch = task.watch();

    let igniter_loop = scheduler::spawn(driver, Arc::clone(&clock), guard.token()).unwrap();
    let supervisor_loop = scheduler::spawn(task, clock, guard.token()).unwrap();

    wait_for("ignition", || watch.get() == StateId::Igniting);
    wait_for("a spark", || lines.igniter.writes() > 2);
    assert!(lines.gas.level());

    assert!(guard.handle().trigger());

    // Outputs are off the moment trigger returns, whatever the loops do.
    assert!(!lines.gas.level());
    assert!(!lines.igniter.level());
    assert!(gas_valve.is_locked_out());
    assert!(igniter.is_locked_out());

    assert!(supervisor_loop.join().unwrap() > 0);
    assert!(igniter_loop.join().unwrap() > 0);

    assert!(!lines.gas.level());
    assert!(!lines.igniter.level());
    assert!(!reader.is_active());
    assert_eq!(watch.get(), StateId::Idle);
    assert!(!sink.events().is_empty());
}

#[test]
fn dropping_guard_forces_outputs_off() {
    let gas = SimLine::new(false);
    let gas_valve = SharedOutput::new("gas-valve", gas.clone());
    gas_valve.set(true);
    {
        let guard = ShutdownGuard::new();
        let line = gas_valve.clone();
        guard.register("gas valve off", move || line.force_off());
    }
    assert!(!gas.level());
    assert!(!gas_valve.set(true), "locked out after shutdown");
}
