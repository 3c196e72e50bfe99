//! Caller-owned numeric cells.
//!
//! The controller does not exchange values through call arguments. It holds
//! handles to storage the host keeps writing (input, setpoint) and reading
//! (output). The host retains write access to input and setpoint; the
//! controller is the only writer of the output.

use std::cell::Cell;
use std::rc::Rc;

use ap_core::Real;

/// A value the controller reads on each evaluation.
pub trait ReadSignal {
    fn read(&self) -> Real;
}

/// A value the controller writes after each evaluation.
pub trait WriteSignal {
    fn write(&mut self, value: Real);
}

/// Shared scalar cell.
///
/// Cloning yields another handle to the same storage. The type is `!Send`,
/// so one loop's cells cannot leak into another thread.
#[derive(Debug, Clone, Default)]
pub struct SignalCell(Rc<Cell<Real>>);

impl SignalCell {
    /// Create a cell holding `value`.
    pub fn new(value: Real) -> Self {
        Self(Rc::new(Cell::new(value)))
    }

    /// Current value.
    pub fn get(&self) -> Real {
        self.0.get()
    }

    /// Overwrite the value from the host side.
    pub fn set(&self, value: Real) {
        self.0.set(value);
    }

    /// True if both handles point at the same storage.
    pub fn aliases(&self, other: &SignalCell) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Real> for SignalCell {
    fn from(value: Real) -> Self {
        Self::new(value)
    }
}

impl ReadSignal for SignalCell {
    fn read(&self) -> Real {
        self.get()
    }
}

impl WriteSignal for SignalCell {
    fn write(&mut self, value: Real) {
        self.set(value);
    }
}

impl<S: ReadSignal + ?Sized> ReadSignal for &S {
    fn read(&self) -> Real {
        (**self).read()
    }
}

impl<S: WriteSignal + ?Sized> WriteSignal for &mut S {
    fn write(&mut self, value: Real) {
        (**self).write(value);
    }
}

/// Fixed value, e.g. a setpoint that never moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant(pub Real);

impl ReadSignal for Constant {
    fn read(&self) -> Real {
        self.0
    }
}

/// Read through a getter callback (e.g. an ADC sample).
pub struct FnSource<F>(pub F);

impl<F: Fn() -> Real> ReadSignal for FnSource<F> {
    fn read(&self) -> Real {
        (self.0)()
    }
}

/// Write through a setter callback (e.g. a PWM duty register).
pub struct FnSink<F>(pub F);

impl<F: FnMut(Real)> WriteSignal for FnSink<F> {
    fn write(&mut self, value: Real) {
        (self.0)(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_cell_handles_share_storage() {
        let host = SignalCell::new(1.0);
        let mut ctrl = host.clone();
        ctrl.write(2.5);
        assert_eq!(host.get(), 2.5);
        host.set(3.0);
        assert_eq!(ctrl.read(), 3.0);
        assert!(host.aliases(&ctrl));
        assert!(!host.aliases(&SignalCell::new(3.0)));
    }

    #[test]
    fn fn_adapters_call_through() {
        let sample = Cell::new(4.0);
        let source = FnSource(|| sample.get());
        assert_eq!(source.read(), 4.0);

        let mut written = Vec::new();
        {
            let mut sink = FnSink(|v: Real| written.push(v));
            sink.write(1.0);
            sink.write(2.0);
        }
        assert_eq!(written, vec![1.0, 2.0]);
    }

    #[test]
    fn constant_reads_back() {
        assert_eq!(Constant(7.5).read(), 7.5);
    }
}
