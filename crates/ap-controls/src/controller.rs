//! Sampled PID controller with bang-bang override.
//!
//! [`AutoPid`] reads the process variable and setpoint from caller-owned
//! signals, and writes a bounded output back into a caller-owned signal. The
//! host calls [`AutoPid::run`] as often as its main loop spins; evaluations
//! happen at most once per time step of the injected clock.
//!
//! Every evaluation:
//! - Computes `error = setpoint - input`
//! - Pins the output to a bound if the error is outside the bang-bang band
//! - Otherwise accumulates `integral += error * elapsed`, differentiates
//!   against the previous error, and clamps `Kp*e + Ki*I + Kd*D`
//! - Holds the integral while the output is saturated and the error would
//!   push it further into saturation (conditional integration)
//!
//! Time is measured in clock ticks (milliseconds), so `Ki` is per tick and
//! `Kd` is in ticks.

use ap_core::{Millis, MonotonicClock, Real, clamp_unchecked};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::bang_bang::{BangBand, Rail};
use crate::config::ControllerConfig;
use crate::sampled::StepGate;
use crate::signal::{ReadSignal, WriteSignal};

/// Default minimum interval between evaluations.
pub const DEFAULT_TIME_STEP_MS: Millis = 1000;

/// Tuning coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Gains {
    /// Proportional gain.
    pub kp: Real,
    /// Integral gain (per tick).
    pub ki: Real,
    /// Derivative gain (ticks).
    pub kd: Real,
}

impl Gains {
    pub fn new(kp: Real, ki: Real, kd: Real) -> Self {
        Self { kp, ki, kd }
    }
}

/// Output clamp bounds. `min < max` is assumed, not checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputRange {
    pub min: Real,
    pub max: Real,
}

impl OutputRange {
    pub fn new(min: Real, max: Real) -> Self {
        Self { min, max }
    }

    /// Clamp `value` into the range. Never panics, even on inverted bounds.
    pub fn clamp(&self, value: Real) -> Real {
        clamp_unchecked(value, self.min, self.max)
    }

    pub fn contains(&self, value: Real) -> bool {
        self.min <= value && value <= self.max
    }

    /// Which bound `raw` would hit, if any.
    pub fn saturation(&self, raw: Real) -> Option<Rail> {
        if raw > self.max {
            Some(Rail::Max)
        } else if raw < self.min {
            Some(Rail::Min)
        } else {
            None
        }
    }

    pub fn rail(&self, rail: Rail) -> Real {
        match rail {
            Rail::Min => self.min,
            Rail::Max => self.max,
        }
    }
}

/// Lifecycle of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerState {
    Running,
    Stopped,
}

/// What a single [`AutoPid::run`] call did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunOutcome {
    /// The controller is stopped; nothing was read or written.
    Stopped,
    /// Too early for another evaluation; nothing changed.
    Skipped,
    /// The bang-bang band pinned the output to a bound.
    Forced { output: Real, rail: Rail },
    /// A PID evaluation ran.
    Computed {
        output: Real,
        error: Real,
        /// Bound the unclamped output exceeded, if any.
        saturated: Option<Rail>,
    },
}

impl RunOutcome {
    /// The value written to the output cell this call, if any.
    pub fn output(&self) -> Option<Real> {
        match self {
            Self::Forced { output, .. } | Self::Computed { output, .. } => Some(*output),
            Self::Stopped | Self::Skipped => None,
        }
    }

    /// True if this call consumed a time step.
    pub fn evaluated(&self) -> bool {
        self.output().is_some()
    }
}

/// Single-loop PID controller bound to caller-owned signals and a clock.
///
/// # Example
///
/// ```
/// use ap_controls::{AutoPid, Gains, OutputRange, SignalCell};
/// use ap_core::ManualClock;
///
/// let input = SignalCell::new(0.0);
/// let setpoint = SignalCell::new(50.0);
/// let output = SignalCell::new(0.0);
/// let clock = ManualClock::shared(1);
///
/// let mut pid = AutoPid::new(
///     input.clone(),
///     setpoint.clone(),
///     output.clone(),
///     OutputRange::new(0.0, 100.0),
///     Gains::new(1.0, 0.0, 0.0),
///     0,
///     clock.clone(),
/// );
///
/// pid.run();
/// assert_eq!(output.get(), 50.0);
/// ```
#[derive(Debug)]
pub struct AutoPid<I, S, O, C> {
    input: I,
    setpoint: S,
    output: O,
    clock: C,
    gains: Gains,
    range: OutputRange,
    band: BangBand,
    gate: StepGate,
    integral: Real,
    previous_error: Real,
    integral_limit: Option<Real>,
    state: ControllerState,
}

impl<I, S, O, C> AutoPid<I, S, O, C>
where
    I: ReadSignal,
    S: ReadSignal,
    O: WriteSignal,
    C: MonotonicClock,
{
    /// Create a running controller with a cleared integral and the bang-bang
    /// band disabled.
    ///
    /// # Arguments
    ///
    /// * `input` - Process variable, written by the host
    /// * `setpoint` - Target value, written by the host
    /// * `output` - Control output, written only by the controller
    /// * `range` - Output clamp bounds
    /// * `gains` - Kp, Ki, Kd
    /// * `time_step` - Minimum ticks between evaluations
    /// * `clock` - Monotonic tick source
    pub fn new(
        input: I,
        setpoint: S,
        output: O,
        range: OutputRange,
        gains: Gains,
        time_step: Millis,
        clock: C,
    ) -> Self {
        Self {
            input,
            setpoint,
            output,
            clock,
            gains,
            range,
            band: BangBand::disabled(),
            gate: StepGate::new(time_step),
            integral: 0.0,
            previous_error: 0.0,
            integral_limit: None,
            state: ControllerState::Running,
        }
    }

    /// Create a controller from a loaded configuration.
    pub fn from_config(
        config: &ControllerConfig,
        input: I,
        setpoint: S,
        output: O,
        clock: C,
    ) -> Self {
        let mut pid = Self::new(
            input,
            setpoint,
            output,
            config.output,
            config.gains,
            config.time_step_ms,
            clock,
        );
        pid.band = config.bang_band;
        pid.integral_limit = config.integral_limit.map(Real::abs);
        pid
    }

    /// Replace the gains for future evaluations.
    ///
    /// The integral keeps accumulating while `ki` is zero, so switching the
    /// integral term on later applies everything gathered so far. Call
    /// [`reset`](Self::reset) or [`set_integral`](Self::set_integral) first
    /// to avoid the bump.
    pub fn set_gains(&mut self, kp: Real, ki: Real, kd: Real) {
        self.gains = Gains::new(kp, ki, kd);
        debug!(kp, ki, kd, "gains updated");
    }

    /// Set independent upper and lower trigger offsets. Zero disables a side.
    pub fn set_bang_band(&mut self, on: Real, off: Real) {
        self.band = BangBand::new(on, off);
        debug!(on, off, "bang-bang band updated");
    }

    /// Set the same trigger offset on both sides of the setpoint.
    pub fn set_bang_range(&mut self, range: Real) {
        self.set_bang_band(range, range);
    }

    /// Redefine the clamp bounds for future evaluations. The value already in
    /// the output cell is left alone.
    pub fn set_output_range(&mut self, min: Real, max: Real) {
        self.range = OutputRange::new(min, max);
        debug!(min, max, "output range updated");
    }

    pub fn set_time_step(&mut self, step: Millis) {
        self.gate.time_step = step;
        debug!(step, "time step updated");
    }

    /// Clamp the integral to `[-limit, limit]` after every accumulation.
    /// `None` leaves only the saturation hold in place.
    pub fn set_integral_limit(&mut self, limit: Option<Real>) {
        self.integral_limit = limit.map(Real::abs);
    }

    pub fn integral(&self) -> Real {
        self.integral
    }

    /// Override the accumulated integral, e.g. for bumpless start-up.
    pub fn set_integral(&mut self, integral: Real) {
        self.integral = integral;
    }

    pub fn is_stopped(&self) -> bool {
        self.state == ControllerState::Stopped
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn gains(&self) -> Gains {
        self.gains
    }

    pub fn output_range(&self) -> OutputRange {
        self.range
    }

    pub fn bang_band(&self) -> BangBand {
        self.band
    }

    pub fn time_step(&self) -> Millis {
        self.gate.time_step
    }

    pub fn integral_limit(&self) -> Option<Real> {
        self.integral_limit
    }

    pub fn previous_error(&self) -> Real {
        self.previous_error
    }

    /// Clock reading of the last evaluation.
    pub fn last_run_ms(&self) -> Millis {
        self.gate.last_run
    }

    /// True if `|setpoint - input| <= threshold`. Reads the signals now and
    /// ignores the time step.
    pub fn at_set_point(&self, threshold: Real) -> bool {
        (self.setpoint.read() - self.input.read()).abs() <= threshold
    }

    /// Evaluate the loop if a time step has passed.
    pub fn run(&mut self) -> RunOutcome {
        if self.is_stopped() {
            return RunOutcome::Stopped;
        }

        let now = self.clock.now_ms();
        let Some(elapsed) = self.gate.poll(now) else {
            return RunOutcome::Skipped;
        };

        let error = self.setpoint.read() - self.input.read();

        if let Some(rail) = self.band.decide(error) {
            let output = self.range.rail(rail);
            self.output.write(output);
            debug!(now, error, ?rail, output, "bang-bang override");
            return RunOutcome::Forced { output, rail };
        }

        let (output, saturated) = self.evaluate(error, elapsed as Real);
        self.output.write(output);
        trace!(now, elapsed, error, integral = self.integral, output, "pid evaluated");

        RunOutcome::Computed {
            output,
            error,
            saturated,
        }
    }

    /// Stop the loop: clear the PID memory and pin the output to its minimum.
    pub fn stop(&mut self) {
        self.state = ControllerState::Stopped;
        self.integral = 0.0;
        self.previous_error = 0.0;
        self.output.write(self.range.min);
        debug!(output = self.range.min, "controller stopped");
    }

    /// Clear the integral and previous error and restart the step window at
    /// the current clock reading. The stop flag is left as is.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = 0.0;
        self.gate.rearm(self.clock.now_ms());
        debug!(last_run = self.gate.last_run, "controller reset");
    }

    /// Leave the stopped state with fresh PID memory.
    pub fn resume(&mut self) {
        self.state = ControllerState::Running;
        self.reset();
    }

    fn evaluate(&mut self, error: Real, dt: Real) -> (Real, Option<Rail>) {
        let Gains { kp, ki, kd } = self.gains;

        let mut candidate = self.integral + error * dt;
        if let Some(limit) = self.integral_limit {
            candidate = clamp_unchecked(candidate, -limit, limit);
        }
        let derivative = (error - self.previous_error) / dt;

        let raw = kp * error + ki * candidate + kd * derivative;
        let output = self.range.clamp(raw);
        let saturated = self.range.saturation(raw);

        // Direction the integral moves the output; with Ki = 0 fall back to
        // the error so a dormant integral cannot grow while saturated either.
        let push = if ki == 0.0 { error } else { ki * error };
        let winding = match saturated {
            Some(Rail::Max) => push > 0.0,
            Some(Rail::Min) => push < 0.0,
            None => false,
        };
        if !winding && candidate.is_finite() {
            self.integral = candidate;
        }
        if error.is_finite() {
            self.previous_error = error;
        }

        (output, saturated)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::signal::SignalCell;
    use ap_core::ManualClock;
    use proptest::prelude::*;
    use std::rc::Rc;

    fn gains() -> impl Strategy<Value = Gains> {
        (-50.0..50.0, -5.0..5.0, -50.0..50.0).prop_map(|(kp, ki, kd)| Gains::new(kp, ki, kd))
    }

    fn range() -> impl Strategy<Value = OutputRange> {
        (-1000.0..1000.0, 0.001..1000.0).prop_map(|(min, width)| OutputRange::new(min, min + width))
    }

    proptest! {
        #[test]
        fn output_always_within_bounds(
            gains in gains(),
            range in range(),
            band in (0.0..20.0, 0.0..20.0),
            time_step in 0u64..50,
            steps in prop::collection::vec((-500.0..500.0, -500.0..500.0, 0u64..100), 1..60),
        ) {
            let input = SignalCell::new(0.0);
            let setpoint = SignalCell::new(0.0);
            let output = SignalCell::new(range.min);
            let clock = ManualClock::shared(0);
            let mut pid = AutoPid::new(
                input.clone(),
                setpoint.clone(),
                output.clone(),
                range,
                gains,
                time_step,
                Rc::clone(&clock),
            );
            pid.set_bang_band(band.0, band.1);

            for (pv, sp, dt) in steps {
                input.set(pv);
                setpoint.set(sp);
                clock.advance(dt);
                pid.run();
                prop_assert!(range.contains(output.get()), "output {} outside {:?}", output.get(), range);
                prop_assert!(pid.integral().is_finite());
            }
        }

        #[test]
        fn at_most_one_evaluation_per_time_step(
            time_step in 1u64..200,
            advances in prop::collection::vec(0u64..60, 1..200),
        ) {
            let clock = ManualClock::shared(0);
            let output = SignalCell::new(0.0);
            let mut pid = AutoPid::new(
                SignalCell::new(1.0),
                SignalCell::new(2.0),
                output.clone(),
                OutputRange::new(-1e9, 1e9),
                Gains::new(1.0, 0.1, 0.0),
                time_step,
                Rc::clone(&clock),
            );

            let mut last_eval: Option<Millis> = None;
            for dt in advances {
                clock.advance(dt);
                let before = (pid.integral(), pid.previous_error(), output.get());
                let outcome = pid.run();
                let now = clock.now_ms();
                if outcome.evaluated() {
                    if let Some(prev) = last_eval {
                        prop_assert!(now - prev >= time_step);
                    }
                    last_eval = Some(now);
                } else {
                    prop_assert_eq!(outcome, RunOutcome::Skipped);
                    prop_assert_eq!(before, (pid.integral(), pid.previous_error(), output.get()));
                }
            }
        }
    }
}
