//! PPU (Picture Processing Unit) emulation for the NES.
//!
//! See [PPU](https://www.nesdev.org/wiki/PPU), [PPU registers](https://www.nesdev.org/wiki/PPU_registers),
//! [PPU memory map](https://www.nesdev.org/wiki/PPU_memory_map). Handles 341-dot scanlines, 262
//! scanlines per frame, vblank NMI, background and sprite pipelines, OAM, nametables, and palette.

pub mod background;
pub mod frame;
pub mod memory;
pub mod palette;
#[allow(clippy::module_inception)]
pub mod ppu;
pub mod scroll;
pub mod sprites;

pub use frame::{FrameBuffer, FrameSurface};
pub use ppu::PPU;
