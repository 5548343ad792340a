//! NES mappers for PRG/CHR memory mapping.
//!
//! Mapper0 (NROM), the mirroring modes and the factory that picks a mapper by iNES number.

use crate::cartridge::{Cartridge, CartridgeError};

/// Nametable mirroring mode for the PPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    SingleLower,
    SingleUpper,
    FourScreen,
}

impl Mirroring {
    /// Physical table (0–3) backing each of the four logical nametables.
    pub const fn tables(self) -> [u16; 4] {
        match self {
            Mirroring::Horizontal => [0, 0, 1, 1],
            Mirroring::Vertical => [0, 1, 0, 1],
            Mirroring::SingleLower => [0, 0, 0, 0],
            Mirroring::SingleUpper => [1, 1, 1, 1],
            Mirroring::FourScreen => [0, 1, 2, 3],
        }
    }
}

pub mod mapper;

pub mod mapper0;

pub use mapper::Mapper;
pub use mapper0::Mapper0;

/// Build the mapper named by the cartridge header.
pub fn create(cartridge: Cartridge) -> Result<Box<dyn Mapper>, CartridgeError> {
    match cartridge.mapper_id {
        0 => Ok(Box::new(Mapper0::from_cartridge(cartridge))),
        id => {
            log::error!("cartridge needs mapper {id}, only NROM is supported");
            Err(CartridgeError::UnsupportedMapper(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::cartridge::build_ines;

    #[test]
    fn creates_nrom() {
        let cart = Cartridge::from_ines(&build_ines(1, 1, 0x01, 0)).unwrap();
        let mapper = create(cart).unwrap();
        assert_eq!(mapper.mirroring(), Mirroring::Vertical);
    }

    #[test]
    fn rejects_other_mappers() {
        let cart = Cartridge::from_ines(&build_ines(1, 1, 0x10, 0)).unwrap();
        assert_eq!(create(cart).err(), Some(CartridgeError::UnsupportedMapper(1)));
    }
}
