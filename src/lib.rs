//! Famicore: the NES CPU, PPU and cartridge core, without display, audio or input.
//!
//! Implements the NES chipset as documented on the
//! [NESdev Wiki](https://www.nesdev.org/wiki/NES_reference_guide): the Ricoh 2A03's 6502 core,
//! the 2C02 PPU, and cartridge mappers. The host feeds in an iNES image, calls
//! [`console::Console::step`] or [`console::Console::step_frame`], and reads pixels from a
//! [`ppu::FrameSurface`].
//!
//! ## Modules (NESdev references)
//!
//! - **bus** – [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map) and
//!   [PPU memory map](https://www.nesdev.org/wiki/PPU_memory_map); OAM DMA
//! - **cartridge** – [iNES](https://www.nesdev.org/wiki/INES) decoding; [Mapper](https://www.nesdev.org/wiki/Mapper) NROM (0)
//! - **config** – decoder, NMI latency and trace settings
//! - **console** – CPU/PPU lock-step, 3 PPU dots per CPU cycle
//! - **cpu** – [6502](https://www.nesdev.org/wiki/CPU) / 2A03: official + stable undocumented opcodes, [NMI](https://www.nesdev.org/wiki/NMI)
//! - **ppu** – [PPU](https://www.nesdev.org/wiki/PPU), [PPU registers](https://www.nesdev.org/wiki/PPU_registers),
//!   [PPU scrolling](https://www.nesdev.org/wiki/PPU_scrolling), OAM, nametables, 256×240

pub mod bus;
pub mod cartridge;
pub mod config;
pub mod console;
pub mod cpu;
pub mod ppu;

pub use config::Config;
pub use console::{Console, Error};
