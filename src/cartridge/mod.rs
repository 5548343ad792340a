//! NES cartridge decoding and mapper support.
//!
//! - **cartridge**: Decodes iNES (.nes) images into PRG/CHR data and header flags.
//! - **mapper**: NROM (0); PRG/CHR address decoding, PRG RAM and nametable mirroring.

pub mod cartridge;
pub mod mapper;

pub use cartridge::{Cartridge, CartridgeError};
