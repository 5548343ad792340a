//! Mapper trait: PRG/CHR memory access and mirroring.

use crate::bus::BusError;
use crate::cartridge::mapper::Mirroring;

/// Trait for NES cartridge mappers. The CPU and PPU buses route all cartridge address space here.
///
/// CPU-side addresses are $4020–$FFFF, PPU-side addresses are $0000–$1FFF. A mapper returns
/// [`BusError::Unmapped`] for addresses its board leaves unconnected.
pub trait Mapper {
    /// Read PRG ROM/RAM or CHR ROM/RAM.
    fn read(&mut self, addr: u16) -> Result<u8, BusError>;
    /// Write PRG RAM, CHR RAM or mapper registers. Writes to ROM are ignored.
    fn write(&mut self, addr: u16, data: u8) -> Result<(), BusError>;
    /// Current nametable mirroring for the PPU.
    fn mirroring(&self) -> Mirroring;
}
