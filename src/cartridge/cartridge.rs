//! NES cartridge data from iNES format images.
//!
//! Implements the [iNES](https://www.nesdev.org/wiki/INES) format: 16-byte header (magic "NES\x1A",
//! PRG size in 16 KiB units, CHR size in 8 KiB units, flags 6–7 for mapper, mirroring, battery and
//! trainer), an optional 512-byte trainer, then PRG ROM, then CHR ROM. Reading the file is the
//! host's job; this module only decodes bytes.

use thiserror::Error;

use crate::cartridge::mapper::Mirroring;

pub const INES_MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A]; // "NES\x1A"
pub const HEADER_SIZE: usize = 16;
pub const TRAINER_SIZE: usize = 512;
pub const PRG_BANK_SIZE: usize = 16 * 1024;
pub const CHR_BANK_SIZE: usize = 8 * 1024;

const FLAG6_VERTICAL: u8 = 1 << 0;
const FLAG6_BATTERY: u8 = 1 << 1;
const FLAG6_TRAINER: u8 = 1 << 2;
const FLAG6_FOUR_SCREEN: u8 = 1 << 3;

/// Malformed or unusable cartridge image. Raised before any CPU/PPU state exists.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartridgeError {
    #[error("not an iNES image: bad magic {0:02X?}")]
    BadMagic([u8; 4]),

    #[error("truncated iNES image: need {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("unsupported mapper {0}")]
    UnsupportedMapper(u8),
}

/// Cartridge contents as decoded from the header. Immutable once built; bank state and PRG RAM
/// belong to the mapper that takes ownership of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cartridge {
    pub prg_rom: Vec<u8>,
    /// Empty when the board carries CHR RAM instead of ROM.
    pub chr_rom: Vec<u8>,
    pub mirroring: Mirroring,
    pub mapper_id: u8,
    pub has_battery: bool,
    pub has_trainer: bool,
}

impl Cartridge {
    /// Decode an iNES v1 image. Header bytes 4–5 = PRG/CHR size; bytes 6–7 = mapper number
    /// (high nibble of 6 | high nibble of 7) plus mirroring, battery and trainer bits.
    pub fn from_ines(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < HEADER_SIZE {
            // Report a short buffer as bad magic when even the magic is missing.
            if data.len() < INES_MAGIC.len() || data[..4] != INES_MAGIC {
                let mut magic = [0u8; 4];
                for (dst, src) in magic.iter_mut().zip(data) {
                    *dst = *src;
                }
                return Err(CartridgeError::BadMagic(magic));
            }
            return Err(CartridgeError::Truncated {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }

        let magic = [data[0], data[1], data[2], data[3]];
        if magic != INES_MAGIC {
            return Err(CartridgeError::BadMagic(magic));
        }

        let prg_size = data[4] as usize * PRG_BANK_SIZE;
        let chr_size = data[5] as usize * CHR_BANK_SIZE;
        let flags6 = data[6];
        let flags7 = data[7];

        let has_trainer = flags6 & FLAG6_TRAINER != 0;
        let has_battery = flags6 & FLAG6_BATTERY != 0;
        let mirroring = if flags6 & FLAG6_FOUR_SCREEN != 0 {
            Mirroring::FourScreen
        } else if flags6 & FLAG6_VERTICAL != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        let mapper_id = (flags6 >> 4) | (flags7 & 0xF0);

        let prg_start = HEADER_SIZE + if has_trainer { TRAINER_SIZE } else { 0 };
        let chr_start = prg_start + prg_size;
        let end = chr_start + chr_size;
        if data.len() < end {
            return Err(CartridgeError::Truncated {
                expected: end,
                actual: data.len(),
            });
        }

        log::debug!(
            "iNES: mapper {}, PRG {} KiB, CHR {} KiB{}, {:?} mirroring",
            mapper_id,
            prg_size / 1024,
            chr_size / 1024,
            if chr_size == 0 { " (CHR RAM)" } else { "" },
            mirroring
        );

        Ok(Self {
            prg_rom: data[prg_start..chr_start].to_vec(),
            chr_rom: data[chr_start..end].to_vec(),
            mirroring,
            mapper_id,
            has_battery,
            has_trainer,
        })
    }

    pub fn uses_chr_ram(&self) -> bool {
        self.chr_rom.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn build_ines(prg_banks: u8, chr_banks: u8, flags6: u8, flags7: u8) -> Vec<u8> {
    let mut rom = Vec::new();
    rom.extend_from_slice(&INES_MAGIC);
    rom.extend_from_slice(&[prg_banks, chr_banks, flags6, flags7]);
    rom.extend_from_slice(&[0; 8]);
    if flags6 & FLAG6_TRAINER != 0 {
        rom.extend_from_slice(&[0xEE; TRAINER_SIZE]);
    }
    rom.extend_from_slice(&vec![0xFF; prg_banks as usize * PRG_BANK_SIZE]);
    rom.extend_from_slice(&vec![0xAA; chr_banks as usize * CHR_BANK_SIZE]);
    rom
}
