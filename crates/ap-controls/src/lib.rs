//! Single-loop PID control for autopid.
//!
//! This crate provides one sampled feedback controller, [`AutoPid`], and the
//! pieces it is built from. The controller is wired to the host through
//! caller-owned signals and an injected clock, and is driven by calling
//! [`AutoPid::run`] from the host's main loop.
//!
//! # Architecture
//!
//! - Signals are scalar `f64` cells the host reads and writes ([`signal`])
//! - A step gate bounds the evaluation rate ([`sampled`])
//! - A bang-bang band pins the output far from the setpoint ([`bang_bang`])
//! - The controller clamps its output and holds the integral while saturated
//! - Configs load from YAML ([`config`])
//! - A first-order plant closes the loop in simulations ([`plant`])

pub mod bang_bang;
pub mod config;
pub mod controller;
pub mod error;
pub mod plant;
pub mod sampled;
pub mod signal;

pub use bang_bang::{BangBand, Rail};
pub use config::ControllerConfig;
pub use controller::{
    AutoPid, ControllerState, DEFAULT_TIME_STEP_MS, Gains, OutputRange, RunOutcome,
};
pub use error::{ControlError, ControlResult};
pub use plant::{FirstOrderPlant, PlantState};
pub use sampled::StepGate;
pub use signal::{Constant, FnSink, FnSource, ReadSignal, SignalCell, WriteSignal};
