//! Background tile fetches and the pixel shift register.
//!
//! Every 8 dots the PPU fetches nametable, attribute, low and high pattern bytes, then packs
//! eight 4-bit pixels (2 bits palette select, 2 bits pattern) into the low half of `tile_data`.
//! The high half is the tile being drawn; it shifts left 4 bits per dot.

use crate::bus::{Bus, BusError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Background {
    nametable_byte: u8,
    attribute_byte: u8,
    low_tile_byte: u8,
    high_tile_byte: u8,
    tile_data: u64,
}

impl Background {
    pub fn shift(&mut self) {
        self.tile_data <<= 4;
    }

    pub fn fetch_nametable_byte(&mut self, bus: &mut impl Bus, v: u16) -> Result<(), BusError> {
        self.nametable_byte = bus.read(0x2000 | (v & 0x0FFF))?;
        Ok(())
    }

    /// Attribute byte for the 2x2-tile quadrant `v` points into, pre-shifted to bits 2-3.
    pub fn fetch_attribute_byte(&mut self, bus: &mut impl Bus, v: u16) -> Result<(), BusError> {
        let addr = 0x23C0 | (v & 0x0C00) | ((v >> 4) & 0x38) | ((v >> 2) & 0x07);
        let shift = ((v >> 4) & 4) | (v & 2);
        self.attribute_byte = ((bus.read(addr)? >> shift) & 3) << 2;
        Ok(())
    }

    /// Low pattern plane of the fetched tile at row `fine_y`.
    pub fn fetch_low_tile_byte(
        &mut self,
        bus: &mut impl Bus,
        fine_y: u16,
        table: u16,
    ) -> Result<(), BusError> {
        self.low_tile_byte = bus.read(self.pattern_addr(fine_y, table))?;
        Ok(())
    }

    pub fn fetch_high_tile_byte(
        &mut self,
        bus: &mut impl Bus,
        fine_y: u16,
        table: u16,
    ) -> Result<(), BusError> {
        self.high_tile_byte = bus.read(self.pattern_addr(fine_y, table) + 8)?;
        Ok(())
    }

    fn pattern_addr(&self, fine_y: u16, table: u16) -> u16 {
        table + self.nametable_byte as u16 * 16 + fine_y
    }

    /// Pack the fetched tile into the low 32 bits of the shift register.
    pub fn store_tile_data(&mut self) {
        let mut low = self.low_tile_byte;
        let mut high = self.high_tile_byte;
        let mut data: u32 = 0;
        for _ in 0..8 {
            let p1 = (low & 0x80) >> 7;
            let p2 = (high & 0x80) >> 6;
            low <<= 1;
            high <<= 1;
            data = (data << 4) | (self.attribute_byte | p1 | p2) as u32;
        }
        self.tile_data |= data as u64;
    }

    /// 4-bit palette index for the current dot; a multiple of 4 is transparent.
    pub fn pixel(&self, fine_x: u8) -> u8 {
        let current = (self.tile_data >> 32) as u32;
        ((current >> ((7 - fine_x as u32) * 4)) & 0x0F) as u8
    }
}
