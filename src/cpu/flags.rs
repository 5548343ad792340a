//! 6502 processor status register (P) flag bits.

pub const FLAG_CARRY: u8 = 1 << 0;
pub const FLAG_ZERO: u8 = 1 << 1;
pub const FLAG_INTERRUPT_DISABLE: u8 = 1 << 2;
pub const FLAG_DECIMAL: u8 = 1 << 3; // 2A03 has no decimal mode; stored only
pub const FLAG_BREAK: u8 = 1 << 4; // Only exists in pushed copies of P
pub const FLAG_UNUSED: u8 = 1 << 5; // Always 1 when pushed
pub const FLAG_OVERFLOW: u8 = 1 << 6;
pub const FLAG_NEGATIVE: u8 = 1 << 7;

/// P as seven independent flags. Bit 5 has no storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status {
    pub carry: bool,
    pub zero: bool,
    pub interrupt_disable: bool,
    pub decimal: bool,
    pub brk: bool,
    pub overflow: bool,
    pub negative: bool,
}

impl Status {
    pub const fn unpack(byte: u8) -> Self {
        Self {
            carry: byte & FLAG_CARRY != 0,
            zero: byte & FLAG_ZERO != 0,
            interrupt_disable: byte & FLAG_INTERRUPT_DISABLE != 0,
            decimal: byte & FLAG_DECIMAL != 0,
            brk: byte & FLAG_BREAK != 0,
            overflow: byte & FLAG_OVERFLOW != 0,
            negative: byte & FLAG_NEGATIVE != 0,
        }
    }

    /// Byte form with bit 5 forced on.
    pub const fn pack(self) -> u8 {
        let mut byte = FLAG_UNUSED;
        if self.carry {
            byte |= FLAG_CARRY;
        }
        if self.zero {
            byte |= FLAG_ZERO;
        }
        if self.interrupt_disable {
            byte |= FLAG_INTERRUPT_DISABLE;
        }
        if self.decimal {
            byte |= FLAG_DECIMAL;
        }
        if self.brk {
            byte |= FLAG_BREAK;
        }
        if self.overflow {
            byte |= FLAG_OVERFLOW;
        }
        if self.negative {
            byte |= FLAG_NEGATIVE;
        }
        byte
    }

    /// Copy pushed to the stack: B set by BRK/PHP, clear for NMI/IRQ.
    pub const fn pushed(self, brk: bool) -> u8 {
        let byte = self.pack() & !FLAG_BREAK;
        if brk { byte | FLAG_BREAK } else { byte }
    }

    /// Value restored by PLP/RTI: B is dropped.
    pub const fn pulled(byte: u8) -> Self {
        Self::unpack(byte & !FLAG_BREAK)
    }

    pub fn set_zn(&mut self, value: u8) {
        self.zero = value == 0;
        self.negative = value & 0x80 != 0;
    }
}
