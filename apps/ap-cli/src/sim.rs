//! Closed-loop simulation: one controller driving a first-order plant.

use std::rc::Rc;

use ap_controls::{AutoPid, ControllerConfig, FirstOrderPlant, PlantState, RunOutcome, SignalCell};
use ap_core::{ManualClock, Millis, Real};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{CliError, CliResult};

/// Simulation parameters outside the controller config.
#[derive(Debug, Clone)]
pub struct SimOptions {
    pub setpoint: Real,
    pub initial: Real,
    pub duration_ms: Millis,
    pub tick_ms: Millis,
    pub plant: FirstOrderPlant,
    /// Threshold for the at-setpoint column and the settle time.
    pub tolerance: Real,
}

/// How a host tick went, as recorded in the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickKind {
    Skipped,
    Forced,
    Computed,
}

#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    pub t_ms: Millis,
    pub setpoint: Real,
    pub input: Real,
    pub output: Real,
    pub integral: Real,
    pub kind: TickKind,
    pub at_setpoint: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimSummary {
    pub final_input: Real,
    pub final_output: Real,
    pub evaluations: usize,
    pub forced: usize,
    /// First time the input entered the tolerance band and stayed there.
    pub settled_at_ms: Option<Millis>,
}

pub fn simulate(
    config: &ControllerConfig,
    opts: &SimOptions,
) -> CliResult<(Vec<Sample>, SimSummary)> {
    if opts.tick_ms == 0 {
        return Err(CliError::InvalidArg {
            what: "tick_ms must be positive".to_string(),
        });
    }

    let input = SignalCell::new(opts.initial);
    let setpoint = SignalCell::new(opts.setpoint);
    let output = SignalCell::new(config.output.min);
    let clock = ManualClock::shared(0);
    let mut pid = AutoPid::from_config(
        config,
        input.clone(),
        setpoint.clone(),
        output.clone(),
        Rc::clone(&clock),
    );

    info!(
        setpoint = opts.setpoint,
        initial = opts.initial,
        duration_ms = opts.duration_ms,
        "starting simulation"
    );

    let mut state = PlantState {
        value: opts.initial,
    };
    let mut samples = Vec::new();
    let mut evaluations = 0;
    let mut forced = 0;
    let mut settled_at_ms = None;

    let mut t = 0;
    while t < opts.duration_ms {
        t += opts.tick_ms;
        clock.set(t);

        let kind = match pid.run() {
            RunOutcome::Forced { .. } => {
                forced += 1;
                TickKind::Forced
            }
            RunOutcome::Computed { .. } => TickKind::Computed,
            RunOutcome::Skipped | RunOutcome::Stopped => TickKind::Skipped,
        };
        if kind != TickKind::Skipped {
            evaluations += 1;
        }

        state = opts.plant.step(&state, opts.tick_ms, output.get());
        input.set(state.value);

        let at_setpoint = pid.at_set_point(opts.tolerance);
        match (at_setpoint, settled_at_ms) {
            (true, None) => settled_at_ms = Some(t),
            (false, Some(_)) => settled_at_ms = None,
            _ => {}
        }

        samples.push(Sample {
            t_ms: t,
            setpoint: setpoint.get(),
            input: state.value,
            output: output.get(),
            integral: pid.integral(),
            kind,
            at_setpoint,
        });
    }

    let summary = SimSummary {
        final_input: state.value,
        final_output: output.get(),
        evaluations,
        forced,
        settled_at_ms,
    };
    debug!(?summary, "simulation finished");
    Ok((samples, summary))
}

pub fn to_csv(samples: &[Sample]) -> String {
    let mut csv = String::from("t_ms,setpoint,input,output,integral,kind,at_setpoint\n");
    for s in samples {
        let kind = match s.kind {
            TickKind::Skipped => "skipped",
            TickKind::Forced => "forced",
            TickKind::Computed => "computed",
        };
        csv.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            s.t_ms, s.setpoint, s.input, s.output, s.integral, kind, s.at_setpoint
        ));
    }
    csv
}
