//! Controller configuration file format.
//!
//! ```yaml
//! gains: { kp: 2.0, ki: 0.001, kd: 50.0 }
//! output: { min: 0.0, max: 255.0 }
//! time_step_ms: 250
//! bang_band: { on: 8.0, off: 4.0 }
//! integral_limit: 50000.0
//! ```
//!
//! Everything after `output` is optional.

use std::path::Path;

use ap_core::{Millis, Real, ensure_finite};
use serde::{Deserialize, Serialize};

use crate::bang_bang::BangBand;
use crate::controller::{DEFAULT_TIME_STEP_MS, Gains, OutputRange};
use crate::error::{ControlError, ControlResult};

fn default_time_step() -> Millis {
    DEFAULT_TIME_STEP_MS
}

/// Serializable description of a controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    pub gains: Gains,
    pub output: OutputRange,
    #[serde(default = "default_time_step")]
    pub time_step_ms: Millis,
    #[serde(default, skip_serializing_if = "is_disabled")]
    pub bang_band: BangBand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integral_limit: Option<Real>,
}

fn is_disabled(band: &BangBand) -> bool {
    !band.is_active()
}

impl ControllerConfig {
    /// Config with the default time step, no bang-bang band and no integral limit.
    pub fn new(gains: Gains, output: OutputRange) -> Self {
        Self {
            gains,
            output,
            time_step_ms: DEFAULT_TIME_STEP_MS,
            bang_band: BangBand::disabled(),
            integral_limit: None,
        }
    }

    pub fn with_time_step(mut self, time_step_ms: Millis) -> Self {
        self.time_step_ms = time_step_ms;
        self
    }

    pub fn with_bang_band(mut self, band: BangBand) -> Self {
        self.bang_band = band;
        self
    }

    pub fn with_integral_limit(mut self, limit: Real) -> Self {
        self.integral_limit = Some(limit);
        self
    }

    /// Reject configs that would make a useless controller.
    ///
    /// The controller accepts any numbers; this check is for configs that
    /// come from files or user input.
    pub fn validate(&self) -> ControlResult<()> {
        ensure_finite(self.gains.kp, "gains.kp")?;
        ensure_finite(self.gains.ki, "gains.ki")?;
        ensure_finite(self.gains.kd, "gains.kd")?;
        ensure_finite(self.output.min, "output.min")?;
        ensure_finite(self.output.max, "output.max")?;
        ensure_finite(self.bang_band.on, "bang_band.on")?;
        ensure_finite(self.bang_band.off, "bang_band.off")?;

        if self.output.min >= self.output.max {
            return Err(ControlError::InvalidConfig {
                what: format!(
                    "output.min ({}) must be less than output.max ({})",
                    self.output.min, self.output.max
                ),
            });
        }
        if self.bang_band.on < 0.0 || self.bang_band.off < 0.0 {
            return Err(ControlError::InvalidArg {
                what: "bang_band offsets must be non-negative",
            });
        }
        if let Some(limit) = self.integral_limit {
            ensure_finite(limit, "integral_limit")?;
            if limit <= 0.0 {
                return Err(ControlError::InvalidArg {
                    what: "integral_limit must be positive",
                });
            }
        }
        Ok(())
    }

    pub fn from_yaml_str(text: &str) -> ControlResult<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> ControlResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn load_yaml(path: &Path) -> ControlResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn save_yaml(&self, path: &Path) -> ControlResult<()> {
        self.validate()?;
        std::fs::write(path, self.to_yaml_string()?)?;
        Ok(())
    }
}
