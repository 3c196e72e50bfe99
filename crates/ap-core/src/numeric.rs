use crate::CoreError;

/// Floating point type used throughout system
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Clamp `v` into `[lo, hi]` without panicking.
///
/// `f64::clamp` asserts `lo <= hi`; controller bounds are caller-supplied and
/// never validated, so an inverted range must still produce a value. With
/// `lo > hi` the result is `hi`. NaN input maps to `lo`.
pub fn clamp_unchecked(v: Real, lo: Real, hi: Real) -> Real {
    if v.is_nan() {
        return lo;
    }
    v.max(lo).min(hi)
}
