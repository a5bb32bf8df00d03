//! End-to-end scenarios in virtual time.
//!
//! Both loops run under [`Simulation`] on simulated lines, exactly as
//! `main` wires them on real GPIO.  The supervisor is added first, so
//! when both loops are due at the same instant it polls first.

use std::time::Duration;

use flamefeedback::adapters::hardware::BurnerHardware;
use flamefeedback::adapters::sim::{ManualClock, RecordingSink, SimLine, Simulation};
use flamefeedback::app::commands::{IgniterCommand, IgniterCommandReader};
use flamefeedback::app::events::BurnerEvent;
use flamefeedback::app::ports::Timestamp;
use flamefeedback::app::service::SupervisorTask;
use flamefeedback::config::BurnerConfig;
use flamefeedback::drivers::igniter::IgniterPulseDriver;
use flamefeedback::drivers::lines::SharedOutput;
use flamefeedback::fsm::{StateId, StateWatch};

/// Observable side of a simulated burner.
struct Burner {
    request: SimLine,
    flame: SimLine,
    gas: SimLine,
    igniter: SimLine,
    command: IgniterCommandReader,
    watch: StateWatch,
    sink: RecordingSink,
}

/// What the observer saw across a run.
#[derive(Default)]
struct Trace {
    pulses: u32,
    igniter_was_high: bool,
    /// (time, state) at every state change seen by the observer.
    states: Vec<(u64, StateId)>,
}

impl Burner {
    /// Check the safety invariants and record igniter edges.
    fn observe(&self, now: Timestamp, trace: &mut Trace) {
        let state = self.watch.get();
        if state.requires_gas_closed() {
            assert!(!self.gas.level(), "gas open in {state:?} at {now}");
        }
        if self.command.is_active() {
            assert!(self.gas.level(), "igniter commanded without gas at {now}");
        }

        let high = self.igniter.level();
        if high && !trace.igniter_was_high {
            trace.pulses += 1;
        }
        trace.igniter_was_high = high;

        if trace.states.last().map(|(_, s)| *s) != Some(state) {
            trace.states.push((now.as_millis(), state));
        }
    }
}

fn build(config: &BurnerConfig) -> (Simulation<'static>, Burner) {
    let (request, flame) = (SimLine::new(false), SimLine::new(false));
    let (gas, igniter) = (SimLine::new(false), SimLine::new(false));
    let sink = RecordingSink::new();

    let command = IgniterCommand::new();
    let reader = command.reader();
    let driver = IgniterPulseDriver::new(
        config,
        command.reader(),
        SharedOutput::new("igniter", igniter.clone()),
    );
    let hw = BurnerHardware::new(
        request.clone(),
        flame.clone(),
        SharedOutput::new("gas-valve", gas.clone()),
    );
    let task = SupervisorTask::new(config, command, hw, sink.clone());
    let watch = task.watch();

    let mut sim = Simulation::new(ManualClock::new());
    sim.add(task);
    sim.add(driver);

    let burner = Burner {
        request,
        flame,
        gas,
        igniter,
        command: reader,
        watch,
        sink,
    };
    (sim, burner)
}

fn run_until(sim: &mut Simulation<'_>, burner: &Burner, trace: &mut Trace, ms: u64) {
    sim.run_until(Timestamp::from_millis(ms), |now| burner.observe(now, trace));
}

fn scenario_config() -> BurnerConfig {
    BurnerConfig {
        igniter_pulse_duration_ms: 100,
        igniter_time_between_pulses_ms: 50,
        no_flame_shutdown_time_ms: 900,
        poll_interval_ms: 100,
        ..BurnerConfig::default()
    }
}

#[test]
fn no_flame_one_second_request_times_out_at_900ms() {
    let (mut sim, burner) = build(&scenario_config());
    let mut trace = Trace::default();

    burner.request.set(true);
    run_until(&mut sim, &burner, &mut trace, 899);
    assert_eq!(burner.watch.get(), StateId::Igniting);
    assert!(burner.gas.level());

    run_until(&mut sim, &burner, &mut trace, 999);
    assert_eq!(burner.watch.get(), StateId::CooldownAfterFailure);
    assert!(!burner.gas.level());
    assert!(!burner.igniter.level());

    burner.request.set(false);
    run_until(&mut sim, &burner, &mut trace, 3_000);

    // Pulses start at 0, 150, 300, 450, 600 and 750ms.
    assert_eq!(trace.pulses, 6);
    assert_eq!(
        trace.states,
        vec![
            (0, StateId::Igniting),
            (900, StateId::CooldownAfterFailure),
            (1_000, StateId::Idle),
        ]
    );
    assert!(burner.sink.events().contains(&BurnerEvent::IgnitionFailed {
        at: Timestamp::from_millis(900),
        retry_at: Timestamp::from_millis(1_800),
    }));
    assert!(!burner.gas.level());
}

#[test]
fn held_request_retries_after_cooldown() {
    let (mut sim, burner) = build(&scenario_config());
    let mut trace = Trace::default();

    burner.request.set(true);
    run_until(&mut sim, &burner, &mut trace, 2_000);

    assert_eq!(
        trace.states,
        vec![
            (0, StateId::Igniting),
            (900, StateId::CooldownAfterFailure),
            (1_800, StateId::Igniting),
        ]
    );
    assert!(burner.gas.level());
}

#[test]
fn flame_stops_the_igniter_and_keeps_gas() {
    let (mut sim, burner) = build(&scenario_config());
    let mut trace = Trace::default();

    burner.request.set(true);
    run_until(&mut sim, &burner, &mut trace, 320);
    burner.flame.set(true);
    run_until(&mut sim, &burner, &mut trace, 1_000);

    assert_eq!(burner.watch.get(), StateId::Burning);
    assert!(burner.gas.level());
    assert!(!burner.igniter.level());
    assert!(!burner.command.is_active());

    let flame_at = burner
        .sink
        .events()
        .iter()
        .find_map(|e| match e {
            BurnerEvent::FlameEstablished { at, after } => Some((*at, *after)),
            _ => None,
        });
    assert_eq!(
        flame_at,
        Some((Timestamp::from_millis(400), Duration::from_millis(400)))
    );
}

#[test]
fn igniter_stops_within_one_pulse_of_command_drop() {
    let (mut sim, burner) = build(&scenario_config());
    let mut trace = Trace::default();

    burner.request.set(true);
    // Pulse 2 runs 150..250; drop the request mid-pulse.
    run_until(&mut sim, &burner, &mut trace, 160);
    assert!(burner.igniter.level());
    burner.request.set(false);

    run_until(&mut sim, &burner, &mut trace, 200);
    assert!(!burner.command.is_active());
    assert_eq!(burner.watch.get(), StateId::Idle);

    run_until(&mut sim, &burner, &mut trace, 250);
    assert!(!burner.igniter.level(), "low by the end of the pulse");
    run_until(&mut sim, &burner, &mut trace, 2_000);
    assert_eq!(trace.pulses, 2);
}

#[test]
fn flame_loss_relights_without_closing_gas() {
    let (mut sim, burner) = build(&scenario_config());
    let mut trace = Trace::default();

    burner.request.set(true);
    burner.flame.set(true);
    run_until(&mut sim, &burner, &mut trace, 500);
    assert_eq!(burner.watch.get(), StateId::Burning);
    let pulses_before = trace.pulses;

    burner.flame.set(false);
    run_until(&mut sim, &burner, &mut trace, 700);
    assert_eq!(burner.watch.get(), StateId::Igniting);
    assert!(burner.gas.level());
    assert!(trace.pulses > pulses_before, "igniter restarted");

    burner.flame.set(true);
    run_until(&mut sim, &burner, &mut trace, 900);
    assert_eq!(burner.watch.get(), StateId::Burning);
    assert!(burner.gas.level());
}

#[test]
fn failing_flame_sensor_reads_as_no_flame() {
    let (mut sim, burner) = build(&scenario_config());
    let mut trace = Trace::default();

    burner.request.set(true);
    burner.flame.set(true);
    burner.flame.set_failing(true);
    run_until(&mut sim, &burner, &mut trace, 1_000);

    assert_eq!(burner.watch.get(), StateId::CooldownAfterFailure);
    assert!(!burner.gas.level());
}

#[test]
fn failing_request_line_shuts_gas() {
    let (mut sim, burner) = build(&scenario_config());
    let mut trace = Trace::default();

    burner.request.set(true);
    burner.flame.set(true);
    run_until(&mut sim, &burner, &mut trace, 500);
    assert_eq!(burner.watch.get(), StateId::Burning);

    burner.request.set_failing(true);
    run_until(&mut sim, &burner, &mut trace, 600);
    assert_eq!(burner.watch.get(), StateId::Idle);
    assert!(!burner.gas.level());
}

#[test]
fn simulation_shutdown_leaves_outputs_low() {
    let (mut sim, burner) = build(&scenario_config());
    let mut trace = Trace::default();

    burner.request.set(true);
    run_until(&mut sim, &burner, &mut trace, 170);
    assert!(burner.gas.level());
    assert!(burner.igniter.level());

    sim.shutdown();
    assert!(!burner.gas.level());
    assert!(!burner.igniter.level());
    assert_eq!(burner.watch.get(), StateId::Idle);
}
