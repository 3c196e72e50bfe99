//! Threshold ("bang-bang") override.
//!
//! Far from the setpoint the controller drives the output straight to one of
//! its bounds instead of computing a PID response. Each side of the band is
//! enabled independently by a nonzero offset.

use ap_core::Real;
use serde::{Deserialize, Serialize};

/// Which output bound a cycle was pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rail {
    Min,
    Max,
}

/// Trigger offsets relative to the setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BangBand {
    /// Error above which the output is forced to its maximum. Zero disables.
    #[serde(default)]
    pub on: Real,
    /// Error below `-off` forces the output to its minimum. Zero disables.
    #[serde(default)]
    pub off: Real,
}

impl BangBand {
    pub fn new(on: Real, off: Real) -> Self {
        Self { on, off }
    }

    /// Same offset on both sides of the setpoint.
    pub fn symmetric(range: Real) -> Self {
        Self::new(range, range)
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.on != 0.0 || self.off != 0.0
    }

    /// Decide whether `error` (setpoint minus input) forces a rail.
    ///
    /// `None` means the PID computation governs this cycle.
    pub fn decide(&self, error: Real) -> Option<Rail> {
        if self.on != 0.0 && error > self.on {
            Some(Rail::Max)
        } else if self.off != 0.0 && error < -self.off {
            Some(Rail::Min)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_band_never_forces() {
        let band = BangBand::disabled();
        assert!(!band.is_active());
        assert_eq!(band.decide(1e9), None);
        assert_eq!(band.decide(-1e9), None);
    }

    #[test]
    fn symmetric_band() {
        let band = BangBand::symmetric(10.0);
        assert!(band.is_active());
        assert_eq!(band.decide(20.0), Some(Rail::Max));
        assert_eq!(band.decide(-20.0), Some(Rail::Min));
        assert_eq!(band.decide(10.0), None);
        assert_eq!(band.decide(-10.0), None);
        assert_eq!(band.decide(0.0), None);
    }

    #[test]
    fn one_sided_band() {
        // Only the upper side is armed; large negative errors go to PID.
        let band = BangBand::new(5.0, 0.0);
        assert_eq!(band.decide(6.0), Some(Rail::Max));
        assert_eq!(band.decide(-100.0), None);

        let band = BangBand::new(0.0, 5.0);
        assert_eq!(band.decide(100.0), None);
        assert_eq!(band.decide(-6.0), Some(Rail::Min));
    }
}
