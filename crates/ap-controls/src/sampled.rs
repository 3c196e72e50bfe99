//! Time-step gating for sampled controllers.
//!
//! The host may call the controller as often as it likes; the gate lets at
//! most one evaluation through per configured step and reports the real
//! elapsed time since the previous one. Between evaluations the last output
//! stays in the output cell (zero-order hold).

use ap_core::Millis;
use serde::{Deserialize, Serialize};

/// Tracks when the controller last evaluated and whether it may again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepGate {
    /// Minimum clock ticks between evaluations.
    pub time_step: Millis,
    /// Clock reading of the last evaluation.
    pub last_run: Millis,
}

impl StepGate {
    /// Create a gate that has never fired (last run at tick 0).
    pub fn new(time_step: Millis) -> Self {
        Self {
            time_step,
            last_run: 0,
        }
    }

    /// Ticks since the last evaluation. A clock reading behind `last_run`
    /// counts as zero.
    pub fn elapsed(&self, now: Millis) -> Millis {
        now.saturating_sub(self.last_run)
    }

    /// Check if an evaluation may happen at `now`.
    ///
    /// Zero elapsed time never passes, even with a zero time step: the
    /// derivative term divides by it.
    pub fn should_sample(&self, now: Millis) -> bool {
        let elapsed = self.elapsed(now);
        elapsed > 0 && elapsed >= self.time_step
    }

    /// Consume a sample slot.
    ///
    /// Returns the elapsed ticks and marks `now` as the last run, or `None`
    /// (leaving the gate untouched) if it is too early.
    pub fn poll(&mut self, now: Millis) -> Option<Millis> {
        if !self.should_sample(now) {
            return None;
        }
        let elapsed = self.elapsed(now);
        self.last_run = now;
        Some(elapsed)
    }

    /// Restart the step window at `now`.
    pub fn rearm(&mut self, now: Millis) {
        self.last_run = now;
    }
}
