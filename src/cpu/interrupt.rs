//! Interrupt request line shared between the CPU and the devices that raise interrupts.
//!
//! The PPU holds a clone and raises NMI at vblank; the CPU samples the line at each instruction
//! boundary. Requests are latched until serviced.

use std::{cell::Cell, rc::Rc};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PendingInterrupt {
    #[default]
    None,
    Nmi,
    Irq,
}

/// Cloneable handle to one pending-interrupt latch.
#[derive(Debug, Clone, Default)]
pub struct InterruptLine(Rc<Cell<PendingInterrupt>>);

impl InterruptLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// NMI overrides a pending IRQ.
    pub fn request_nmi(&self) {
        self.0.set(PendingInterrupt::Nmi);
    }

    /// Ignored while an NMI is pending.
    pub fn request_irq(&self) {
        if self.0.get() == PendingInterrupt::None {
            self.0.set(PendingInterrupt::Irq);
        }
    }

    pub fn pending(&self) -> PendingInterrupt {
        self.0.get()
    }

    pub fn clear(&self) {
        self.0.set(PendingInterrupt::None);
    }
}
