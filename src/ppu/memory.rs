//! PPU-internal memory: 2 KiB nametable RAM and 32 bytes of palette RAM.

use crate::cartridge::mapper::Mirroring;

pub const NAMETABLE_RAM: usize = 0x800;
pub const PALETTE_RAM: usize = 32;

/// Nametable and palette RAM. CHR lives on the cartridge and is reached through the mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vram {
    pub nametable: [u8; NAMETABLE_RAM],
    /// Palette RAM $3F00-$3F1F (32 bytes, with NES mirroring).
    pub palette: [u8; PALETTE_RAM],
}

impl Default for Vram {
    fn default() -> Self {
        Self::new()
    }
}

impl Vram {
    pub fn new() -> Self {
        Self {
            nametable: [0; NAMETABLE_RAM],
            palette: [0; PALETTE_RAM],
        }
    }

    pub fn read_nametable(&self, addr: u16, mirroring: Mirroring) -> u8 {
        self.nametable[nametable_index(addr, mirroring)]
    }

    pub fn write_nametable(&mut self, addr: u16, mirroring: Mirroring, data: u8) {
        self.nametable[nametable_index(addr, mirroring)] = data;
    }

    pub fn read_palette(&self, addr: u16) -> u8 {
        self.palette[palette_index(addr)]
    }

    /// Palette cells are 6 bits wide.
    pub fn write_palette(&mut self, addr: u16, data: u8) {
        self.palette[palette_index(addr)] = data & 0x3F;
    }
}

/// Palette RAM index for $3F00-$3FFF: 32 bytes mirrored, and $3F10/$14/$18/$1C alias the
/// background entries $3F00/$04/$08/$0C.
pub fn palette_index(addr: u16) -> usize {
    let index = (addr % 32) as usize;
    if index >= 16 && index % 4 == 0 {
        index - 16
    } else {
        index
    }
}

/// Nametable RAM index for $2000-$3EFF under the given mirroring. Four-screen boards would carry
/// extra RAM; with only 2 KiB on hand, tables 2 and 3 fold back onto 0 and 1.
pub fn nametable_index(addr: u16, mirroring: Mirroring) -> usize {
    let addr = (addr.wrapping_sub(0x2000)) % 0x1000;
    let table = (addr / 0x400) as usize;
    let offset = addr % 0x400;
    let physical = mirroring.tables()[table];
    ((physical * 0x400 + offset) as usize) % NAMETABLE_RAM
}
