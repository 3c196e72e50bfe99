//! First-order process model for closed-loop simulation.
//!
//! Many loops an embedded PID drives (heaters, fans, motor speed) respond
//! roughly like a first-order lag: `dy/dt = (ambient + gain * u - y) / tau`.
//! The model is discretised exactly, so any step size is stable.

use ap_core::{Millis, Real};
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// State of the simulated process.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantState {
    /// Current process variable.
    pub value: Real,
}

/// First-order lag process.
///
/// # Example
///
/// ```
/// use ap_controls::{FirstOrderPlant, PlantState};
///
/// let plant = FirstOrderPlant::new(2.0, 1000.0).unwrap();
/// let mut state = PlantState { value: 0.0 };
///
/// for _ in 0..100 {
///     state = plant.step(&state, 100, 10.0);
/// }
///
/// // Settles at gain * drive
/// assert!((state.value - 20.0).abs() < 0.01);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FirstOrderPlant {
    /// Steady-state output per unit of drive.
    pub gain: Real,
    /// Time constant in milliseconds, must be positive.
    pub tau_ms: Real,
    /// Value the process relaxes to with zero drive.
    #[serde(default)]
    pub ambient: Real,
}

impl FirstOrderPlant {
    /// Create a new plant relaxing to zero.
    ///
    /// # Errors
    ///
    /// Returns error if `tau_ms` is not positive or `gain` is not finite.
    pub fn new(gain: Real, tau_ms: Real) -> ControlResult<Self> {
        if tau_ms.is_nan() || tau_ms <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "tau_ms must be positive",
            });
        }
        if !gain.is_finite() {
            return Err(ControlError::InvalidArg {
                what: "gain must be finite",
            });
        }
        Ok(Self {
            gain,
            tau_ms,
            ambient: 0.0,
        })
    }

    pub fn with_ambient(mut self, ambient: Real) -> Self {
        self.ambient = ambient;
        self
    }

    /// Steady-state value for a constant drive.
    pub fn steady_state(&self, drive: Real) -> Real {
        self.ambient + self.gain * drive
    }

    /// Advance the process by `dt_ms` holding `drive` constant.
    pub fn step(&self, state: &PlantState, dt_ms: Millis, drive: Real) -> PlantState {
        let target = self.steady_state(drive);
        let alpha = 1.0 - (-(dt_ms as Real) / self.tau_ms).exp();
        PlantState {
            value: state.value + (target - state.value) * alpha,
        }
    }
}
