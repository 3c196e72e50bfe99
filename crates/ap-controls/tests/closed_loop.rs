//! Closed-loop tests: controller driving a first-order plant.

use std::cell::Cell;
use std::rc::Rc;

use ap_controls::{
    AutoPid, BangBand, Constant, ControllerConfig, FirstOrderPlant, FnSink, FnSource, Gains,
    OutputRange, PlantState, RunOutcome, SignalCell,
};
use ap_core::{ManualClock, MonotonicClock};

const TICK_MS: u64 = 10;

#[test]
fn heater_settles_at_setpoint() {
    let plant = FirstOrderPlant::new(1.0, 2000.0).unwrap().with_ambient(20.0);
    let config = ControllerConfig::new(Gains::new(2.0, 0.002, 0.0), OutputRange::new(0.0, 100.0))
        .with_time_step(100);

    let input = SignalCell::new(20.0);
    let setpoint = SignalCell::new(60.0);
    let output = SignalCell::new(0.0);
    let clock = ManualClock::shared(0);
    let mut pid = AutoPid::from_config(
        &config,
        input.clone(),
        setpoint.clone(),
        output.clone(),
        Rc::clone(&clock),
    );

    let mut state = PlantState { value: 20.0 };
    for _ in 0..12_000 {
        clock.advance(TICK_MS);
        pid.run();
        state = plant.step(&state, TICK_MS, output.get());
        input.set(state.value);
        assert!((0.0..=100.0).contains(&output.get()));
    }

    assert!(pid.at_set_point(0.5), "settled at {}", state.value);
    // The integral carries the 40 units of steady drive.
    assert!((pid.integral() * 0.002 - 40.0).abs() < 1.0);
}

#[test]
fn bang_bang_hands_over_to_pid_near_setpoint() {
    let plant = FirstOrderPlant::new(1.0, 1000.0).unwrap();
    let config = ControllerConfig::new(Gains::new(1.0, 0.001, 0.0), OutputRange::new(0.0, 50.0))
        .with_time_step(50)
        .with_bang_band(BangBand::symmetric(5.0));

    let input = SignalCell::new(0.0);
    let output = SignalCell::new(0.0);
    let clock = ManualClock::shared(0);
    let mut pid = AutoPid::from_config(
        &config,
        input.clone(),
        Constant(30.0),
        output.clone(),
        Rc::clone(&clock),
    );

    let mut state = PlantState::default();
    let mut forced = 0;
    let mut computed_after_forced = false;
    for _ in 0..5_000 {
        clock.advance(TICK_MS);
        match pid.run() {
            RunOutcome::Forced { output, .. } => {
                assert_eq!(output, 50.0);
                forced += 1;
            }
            RunOutcome::Computed { .. } if forced > 0 => computed_after_forced = true,
            _ => {}
        }
        state = plant.step(&state, TICK_MS, output.get());
        input.set(state.value);
    }

    assert!(forced > 0);
    assert!(computed_after_forced);
    assert!(pid.at_set_point(1.0), "settled at {}", state.value);
}

#[test]
fn stop_and_resume_in_running_loop() {
    let input = SignalCell::new(0.0);
    let output = SignalCell::new(0.0);
    let clock = ManualClock::shared(0);
    let mut pid = AutoPid::new(
        input.clone(),
        Constant(10.0),
        output.clone(),
        OutputRange::new(-5.0, 5.0),
        Gains::new(0.2, 0.0, 0.0),
        100,
        Rc::clone(&clock),
    );

    clock.advance(100);
    pid.run();
    assert_eq!(output.get(), 2.0);

    pid.stop();
    for _ in 0..10 {
        clock.advance(100);
        assert_eq!(pid.run(), RunOutcome::Stopped);
        assert_eq!(output.get(), -5.0);
    }

    pid.resume();
    clock.advance(99);
    assert_eq!(pid.run(), RunOutcome::Skipped);
    assert_eq!(output.get(), -5.0);
    clock.advance(1);
    pid.run();
    assert_eq!(output.get(), 2.0);
}

#[test]
fn callback_signals_and_platform_clock() {
    let millis = Cell::new(0u64);
    let sensor = Cell::new(12.0);
    let duty = Cell::new(f64::NAN);

    let clock = ap_core::FnClock::new(|| millis.get());
    let mut pid = AutoPid::new(
        FnSource(|| sensor.get()),
        Constant(20.0),
        FnSink(|v: f64| duty.set(v)),
        OutputRange::new(0.0, 255.0),
        Gains::new(10.0, 0.0, 0.0),
        ap_controls::DEFAULT_TIME_STEP_MS,
        &clock,
    );

    millis.set(999);
    assert_eq!(pid.run(), RunOutcome::Skipped);
    assert!(duty.get().is_nan());

    millis.set(1000);
    pid.run();
    assert_eq!(duty.get(), 80.0);
    assert_eq!(pid.last_run_ms(), clock.now_ms());
}
