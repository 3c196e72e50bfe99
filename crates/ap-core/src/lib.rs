//! ap-core: stable foundation for autopid.
//!
//! Contains:
//! - numeric (Real + float helpers)
//! - timing (monotonic clock capability + test clocks)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod timing;

// Re-exports: nice ergonomics for downstream crates
pub use error::CoreError;
pub use numeric::*;
pub use timing::{FnClock, ManualClock, Millis, MonotonicClock, SystemClock};
