//! Internal scroll registers ("loopy" v/t/x/w).
//!
//! See [PPU scrolling](https://www.nesdev.org/wiki/PPU_scrolling). `v` and `t` are 15 bits laid
//! out as `yyy NN YYYYY XXXXX` (fine Y, nametable, coarse Y, coarse X).

/// Current address `v`, temporary address `t`, fine X and the shared $2005/$2006 write toggle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scroll {
    pub v: u16,
    pub t: u16,
    /// Fine X scroll (3 bits).
    pub x: u8,
    /// Write toggle: false = first write, true = second.
    pub w: bool,
}

impl Scroll {
    /// $2000 write: nametable select into t.
    pub fn write_ctrl(&mut self, data: u8) {
        self.t = (self.t & 0xF3FF) | (((data & 0x03) as u16) << 10);
    }

    /// $2005 write: X scroll first, Y scroll second.
    pub fn write_scroll(&mut self, data: u8) {
        let data = data as u16;
        if !self.w {
            self.t = (self.t & 0xFFE0) | (data >> 3);
            self.x = (data & 0x07) as u8;
        } else {
            self.t = (self.t & 0x8FFF) | ((data & 0x07) << 12);
            self.t = (self.t & 0xFC1F) | ((data & 0xF8) << 2);
        }
        self.w = !self.w;
    }

    /// $2006 write: high 6 bits first (bit 14 cleared), low byte second, then v = t.
    pub fn write_addr(&mut self, data: u8) {
        let data = data as u16;
        if !self.w {
            self.t = (self.t & 0x80FF) | ((data & 0x3F) << 8);
        } else {
            self.t = (self.t & 0xFF00) | data;
            self.v = self.t;
        }
        self.w = !self.w;
    }

    /// $2007 access: bump v by 1 or 32.
    pub fn increment(&mut self, step: u16) {
        self.v = self.v.wrapping_add(step) & 0x7FFF;
    }

    /// Coarse X + 1, wrapping into the horizontally adjacent nametable.
    pub fn increment_x(&mut self) {
        if self.v & 0x001F == 31 {
            self.v &= !0x001F;
            self.v ^= 0x0400;
        } else {
            self.v += 1;
        }
    }

    /// Fine Y + 1, carrying into coarse Y. Row 29 wraps to the vertically adjacent nametable;
    /// rows 30-31 (attribute memory) wrap without switching.
    pub fn increment_y(&mut self) {
        if self.v & 0x7000 != 0x7000 {
            self.v += 0x1000;
            return;
        }
        self.v &= !0x7000;
        let mut y = (self.v & 0x03E0) >> 5;
        if y == 29 {
            y = 0;
            self.v ^= 0x0800;
        } else if y == 31 {
            y = 0;
        } else {
            y += 1;
        }
        self.v = (self.v & !0x03E0) | (y << 5);
    }

    /// Horizontal bits t -> v.
    pub fn copy_x(&mut self) {
        self.v = (self.v & 0xFBE0) | (self.t & 0x041F);
    }

    /// Vertical bits t -> v.
    pub fn copy_y(&mut self) {
        self.v = (self.v & 0x841F) | (self.t & 0x7BE0);
    }

    pub fn fine_y(&self) -> u16 {
        (self.v >> 12) & 0x07
    }
}
