//! Monotonic time sources.
//!
//! Controllers never read an ambient clock. The host injects a
//! [`MonotonicClock`] at construction, which lets tests substitute a
//! [`ManualClock`] and drive time deterministically.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

/// Clock reading in milliseconds.
pub type Millis = u64;

/// A non-decreasing millisecond counter.
pub trait MonotonicClock {
    /// Current reading. Successive calls never go backwards.
    fn now_ms(&self) -> Millis;
}

impl<C: MonotonicClock + ?Sized> MonotonicClock for &C {
    fn now_ms(&self) -> Millis {
        (**self).now_ms()
    }
}

impl<C: MonotonicClock + ?Sized> MonotonicClock for Rc<C> {
    fn now_ms(&self) -> Millis {
        (**self).now_ms()
    }
}

impl<C: MonotonicClock + ?Sized> MonotonicClock for Arc<C> {
    fn now_ms(&self) -> Millis {
        (**self).now_ms()
    }
}

impl<C: MonotonicClock + ?Sized> MonotonicClock for Box<C> {
    fn now_ms(&self) -> Millis {
        (**self).now_ms()
    }
}

/// Milliseconds elapsed since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose zero is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemClock {
    fn now_ms(&self) -> Millis {
        // u64 milliseconds covers ~584 million years; truncation is not a concern.
        self.origin.elapsed().as_millis() as Millis
    }
}

/// Hand-driven clock for simulations and tests.
///
/// Share it with a controller through `Rc<ManualClock>` and keep a clone to
/// advance time from the host side.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Millis>,
}

impl ManualClock {
    /// Create a clock reading `start` milliseconds.
    pub fn new(start: Millis) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Create a shareable clock reading `start` milliseconds.
    pub fn shared(start: Millis) -> Rc<Self> {
        Rc::new(Self::new(start))
    }

    /// Move time forward by `delta` milliseconds (saturating).
    pub fn advance(&self, delta: Millis) {
        self.now.set(self.now.get().saturating_add(delta));
    }

    /// Jump to `t`. Readings before the current one are ignored to keep the
    /// clock monotonic.
    pub fn set(&self, t: Millis) {
        if t > self.now.get() {
            self.now.set(t);
        }
    }
}

impl MonotonicClock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }
}

/// Adapts a platform tick callback such as `millis()`.
pub struct FnClock<F> {
    f: F,
}

impl<F: Fn() -> Millis> FnClock<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F: Fn() -> Millis> MonotonicClock for FnClock<F> {
    fn now_ms(&self) -> Millis {
        (self.f)()
    }
}

impl<F> std::fmt::Debug for FnClock<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnClock").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(10);
        assert_eq!(clock.now_ms(), 10);
        clock.advance(5);
        assert_eq!(clock.now_ms(), 15);
    }

    #[test]
    fn manual_clock_never_goes_backwards() {
        let clock = ManualClock::new(100);
        clock.set(50);
        assert_eq!(clock.now_ms(), 100);
        clock.set(150);
        assert_eq!(clock.now_ms(), 150);
    }

    #[test]
    fn manual_clock_advance_saturates() {
        let clock = ManualClock::new(Millis::MAX - 1);
        clock.advance(10);
        assert_eq!(clock.now_ms(), Millis::MAX);
    }

    #[test]
    fn shared_clock_is_seen_through_rc() {
        let clock = ManualClock::shared(0);
        let handle: Rc<ManualClock> = Rc::clone(&clock);
        clock.advance(42);
        assert_eq!(handle.now_ms(), 42);
    }

    #[test]
    fn fn_clock_calls_through() {
        let ticks = Cell::new(7);
        let clock = FnClock::new(|| ticks.get());
        assert_eq!(clock.now_ms(), 7);
        ticks.set(9);
        assert_eq!(clock.now_ms(), 9);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
