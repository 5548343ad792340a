//! Memory buses and address decoding for the NES.
//!
//! [`NesBus`] maps CPU addresses to RAM, PPU registers, OAM DMA and the cartridge
//! ([CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map)). [`PpuBus`] maps PPU addresses
//! to CHR, nametable RAM and palette RAM
//! ([PPU memory map](https://www.nesdev.org/wiki/PPU_memory_map)).

use std::fmt;

use thiserror::Error;

use crate::{
    cartridge::mapper::Mapper,
    ppu::{frame::FrameSurface, memory::Vram, ppu::PPU},
};

/// Which bus an address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSpace {
    Cpu,
    Ppu,
}

impl fmt::Display for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressSpace::Cpu => f.write_str("CPU"),
            AddressSpace::Ppu => f.write_str("PPU"),
        }
    }
}

/// Access to an address nothing on the board decodes. Fatal to the running CPU.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    #[error("unmapped {space} address ${addr:04X}")]
    Unmapped { space: AddressSpace, addr: u16 },
}

impl BusError {
    pub fn unmapped(space: AddressSpace, addr: u16) -> Self {
        BusError::Unmapped { space, addr }
    }
}

/// Byte-addressed memory as seen by the CPU or the PPU.
pub trait Bus {
    fn read(&mut self, addr: u16) -> Result<u8, BusError>;
    fn write(&mut self, addr: u16, data: u8) -> Result<(), BusError>;

    /// True once after a write that started an OAM DMA. The CPU charges the stall to the
    /// instruction that did the write.
    fn take_dma_stall(&mut self) -> bool {
        false
    }
}

/// Main NES bus: 2 KiB work RAM, PPU and cartridge mapper.
pub struct NesBus {
    pub ram: [u8; 2048],
    pub ppu: PPU,
    pub mapper: Box<dyn Mapper>,
    dma_pending: bool,
}

impl NesBus {
    pub fn new(mapper: Box<dyn Mapper>, ppu: PPU) -> Self {
        Self {
            ram: [0; 2048],
            ppu,
            mapper,
            dma_pending: false,
        }
    }

    /// Advance the PPU one dot.
    pub fn step_ppu(&mut self, surface: &mut dyn FrameSurface) -> Result<(), BusError> {
        self.ppu.step(self.mapper.as_mut(), surface)
    }

    /// Copy CPU page `$XX00-$XXFF` into OAM. The copy itself is instantaneous; the CPU pays for
    /// it through [`Bus::take_dma_stall`].
    fn oam_dma(&mut self, page: u8) -> Result<(), BusError> {
        let base = (page as u16) << 8;
        let mut data = [0u8; 256];
        for (offset, byte) in data.iter_mut().enumerate() {
            *byte = self.read(base | offset as u16)?;
        }
        self.ppu.oam_dma(&data);
        self.dma_pending = true;
        log::trace!("OAM DMA from ${base:04X}");
        Ok(())
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> Result<u8, BusError> {
        match addr {
            // Internal RAM (mirrored 4x in 0x0000-0x1FFF)
            0x0000..=0x1FFF => Ok(self.ram[(addr & 0x07FF) as usize]),
            // PPU registers $2000-$3FFF (mirrored every 8 bytes)
            0x2000..=0x3FFF => self
                .ppu
                .read_register(0x2000 | (addr & 0x0007), self.mapper.as_mut()),
            // APU, controllers, DMA: not emulated here
            0x4000..=0x401F => Ok(0),
            // Cartridge: expansion, PRG RAM, PRG ROM
            0x4020..=0xFFFF => self.mapper.read(addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) -> Result<(), BusError> {
        match addr {
            0x0000..=0x1FFF => {
                self.ram[(addr & 0x07FF) as usize] = data;
                Ok(())
            }
            0x2000..=0x3FFF => {
                self.ppu
                    .write_register(0x2000 | (addr & 0x0007), data, self.mapper.as_mut())
            }
            0x4014 => self.oam_dma(data),
            0x4000..=0x401F => Ok(()),
            0x4020..=0xFFFF => self.mapper.write(addr, data),
        }
    }

    fn take_dma_stall(&mut self) -> bool {
        std::mem::take(&mut self.dma_pending)
    }
}

/// PPU address space, borrowed from the PPU's own memory and the cartridge for one access
/// sequence.
pub struct PpuBus<'a> {
    vram: &'a mut Vram,
    mapper: &'a mut dyn Mapper,
}

impl<'a> PpuBus<'a> {
    pub fn new(vram: &'a mut Vram, mapper: &'a mut dyn Mapper) -> Self {
        Self { vram, mapper }
    }
}

impl Bus for PpuBus<'_> {
    fn read(&mut self, addr: u16) -> Result<u8, BusError> {
        let addr = addr % 0x4000;
        match addr {
            // Pattern tables: CHR ROM/RAM
            0x0000..=0x1FFF => self.mapper.read(addr),
            // Nametables, $3000-$3EFF mirrors $2000-$2EFF
            0x2000..=0x3EFF => Ok(self.vram.read_nametable(addr, self.mapper.mirroring())),
            // Palette RAM
            _ => Ok(self.vram.read_palette(addr)),
        }
    }

    fn write(&mut self, addr: u16, data: u8) -> Result<(), BusError> {
        let addr = addr % 0x4000;
        match addr {
            0x0000..=0x1FFF => self.mapper.write(addr, data),
            0x2000..=0x3EFF => {
                let mirroring = self.mapper.mirroring();
                self.vram.write_nametable(addr, mirroring, data);
                Ok(())
            }
            _ => {
                self.vram.write_palette(addr, data);
                Ok(())
            }
        }
    }
}
