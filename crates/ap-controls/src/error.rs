//! Error types for controller configuration.
//!
//! The controller itself never fails; these errors only surface when building
//! or loading a configuration.

use ap_core::CoreError;
use thiserror::Error;

/// Result type for control system operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur while preparing a controller.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Configuration parsed but describes an unusable controller.
    #[error("Invalid controller config: {what}")]
    InvalidConfig { what: String },

    /// Configuration text could not be parsed.
    #[error("Failed to parse controller config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}
