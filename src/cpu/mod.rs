//! 6502 CPU emulation for the NES.
//!
//! Table-driven decode with official and stable undocumented opcodes; cycle counts include
//! page-cross, branch and OAM DMA penalties. The [`Bus`](crate::bus::Bus) trait supplies memory.

#[allow(clippy::module_inception)]
pub mod cpu;
pub mod flags;
pub mod interrupt;
pub mod opcode;
pub mod trace;

pub use cpu::{CPU, CpuError};
pub use interrupt::{InterruptLine, PendingInterrupt};

#[cfg(test)]
mod tests;
