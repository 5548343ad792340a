//! Mapper 0 (NROM): no bank switching, 16/32 KiB PRG, 8 KiB CHR ROM or RAM, 8 KiB PRG RAM.

use crate::bus::{AddressSpace, BusError};
use crate::cartridge::Cartridge;
use crate::cartridge::cartridge::{CHR_BANK_SIZE, PRG_BANK_SIZE};
use crate::cartridge::mapper::{Mirroring, mapper::Mapper};

const PRG_RAM_SIZE: usize = 8 * 1024;

/// NROM mapper: fixed PRG and CHR, 16 KiB PRG mirrored into $C000.
pub struct Mapper0 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_ram: [u8; PRG_RAM_SIZE],
    mirroring: Mirroring,
}

impl Mapper0 {
    /// Empty `chr_rom` gives the board 8 KiB of CHR RAM.
    pub fn new(prg_rom: Vec<u8>, chr_rom: Vec<u8>, mirroring: Mirroring) -> Self {
        let chr_is_ram = chr_rom.is_empty();
        let chr = if chr_is_ram {
            vec![0; CHR_BANK_SIZE]
        } else {
            chr_rom
        };
        Self {
            prg_rom,
            chr,
            chr_is_ram,
            prg_ram: [0; PRG_RAM_SIZE],
            mirroring,
        }
    }

    pub fn from_cartridge(cartridge: Cartridge) -> Self {
        Self::new(cartridge.prg_rom, cartridge.chr_rom, cartridge.mirroring)
    }

    fn prg_index(&self, addr: u16) -> Option<usize> {
        if self.prg_rom.is_empty() {
            return None;
        }
        let mut index = (addr - 0x8000) as usize;
        if self.prg_rom.len() <= PRG_BANK_SIZE {
            index %= PRG_BANK_SIZE;
        }
        Some(index % self.prg_rom.len())
    }
}

impl Mapper for Mapper0 {
    fn read(&mut self, addr: u16) -> Result<u8, BusError> {
        match addr {
            // CHR ROM/RAM: $0000-$1FFF
            0x0000..=0x1FFF => Ok(self.chr[addr as usize % self.chr.len()]),
            // PRG RAM: $6000-$7FFF
            0x6000..=0x7FFF => Ok(self.prg_ram[(addr - 0x6000) as usize]),
            // PRG ROM: $8000-$FFFF, mirror if 16KB
            0x8000..=0xFFFF => match self.prg_index(addr) {
                Some(index) => Ok(self.prg_rom[index]),
                None => Err(BusError::unmapped(AddressSpace::Cpu, addr)),
            },
            _ => Err(BusError::unmapped(AddressSpace::Cpu, addr)),
        }
    }

    fn write(&mut self, addr: u16, data: u8) -> Result<(), BusError> {
        match addr {
            0x0000..=0x1FFF => {
                if self.chr_is_ram {
                    let len = self.chr.len();
                    self.chr[addr as usize % len] = data;
                }
                Ok(())
            }
            0x6000..=0x7FFF => {
                self.prg_ram[(addr - 0x6000) as usize] = data;
                Ok(())
            }
            0x8000..=0xFFFF => Ok(()), // PRG ROM: no writes
            _ => Err(BusError::unmapped(AddressSpace::Cpu, addr)),
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}
