//! The console: CPU, PPU and cartridge wired together and stepped in lock-step.
//!
//! One CPU instruction is followed by three PPU dots per CPU cycle it took. NMI flows from the
//! PPU to the CPU through a shared [`InterruptLine`](crate::cpu::InterruptLine).

use thiserror::Error;

use crate::{
    bus::{BusError, NesBus},
    cartridge::{Cartridge, CartridgeError, mapper},
    config::Config,
    cpu::{CPU, CpuError},
    ppu::{FrameBuffer, PPU},
};

pub const PPU_DOTS_PER_CPU_CYCLE: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Cartridge(#[from] CartridgeError),

    #[error(transparent)]
    Cpu(#[from] CpuError),

    #[error(transparent)]
    Bus(#[from] BusError),
}

pub struct Console {
    pub cpu: CPU<NesBus>,
    frame: FrameBuffer,
}

impl Console {
    /// Build the machine around a decoded cartridge and run the reset sequence.
    pub fn new(cartridge: Cartridge, config: Config) -> Result<Self, Error> {
        let mapper = mapper::create(cartridge)?;
        let ppu = PPU::new(&config);
        let mut cpu = CPU::new(NesBus::new(mapper, ppu), config);
        let line = cpu.interrupt_line();
        cpu.bus.ppu.connect_nmi(line);

        let mut console = Self {
            cpu,
            frame: FrameBuffer::new(),
        };
        console.reset()?;
        Ok(console)
    }

    /// Decode an iNES image and build the console from it.
    pub fn from_ines(data: &[u8], config: Config) -> Result<Self, Error> {
        Self::new(Cartridge::from_ines(data)?, config)
    }

    pub fn reset(&mut self) -> Result<(), Error> {
        self.cpu.bus.ppu.reset();
        self.cpu.reset()?;
        Ok(())
    }

    /// One CPU step, then the matching PPU dots. Returns CPU cycles.
    pub fn step(&mut self) -> Result<usize, Error> {
        let cycles = self.cpu.step()?;
        for _ in 0..cycles * PPU_DOTS_PER_CPU_CYCLE {
            self.cpu.bus.step_ppu(&mut self.frame)?;
        }
        Ok(cycles)
    }

    /// Step until the PPU wraps to the next frame. Returns CPU cycles spent.
    pub fn step_frame(&mut self) -> Result<usize, Error> {
        let frame = self.cpu.bus.ppu.frame;
        let mut cycles = 0;
        while self.cpu.bus.ppu.frame == frame {
            cycles += self.step()?;
        }
        Ok(cycles)
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cartridge::cartridge::{HEADER_SIZE, INES_MAGIC, PRG_BANK_SIZE},
        ppu::palette::NES_PALETTE_RGB,
    };

    /// NROM-128 image, CHR RAM, with `program` at $8000 and `nmi` at $8100.
    fn rom(program: &[u8], nmi: &[u8]) -> Vec<u8> {
        let mut prg = vec![0xEA; PRG_BANK_SIZE];
        prg[..program.len()].copy_from_slice(program);
        prg[0x100..0x100 + nmi.len()].copy_from_slice(nmi);
        // vectors at $FFFA (mirrored from $BFFA)
        prg[0x3FFA..].copy_from_slice(&[0x00, 0x81, 0x00, 0x80, 0x00, 0x81]);

        let mut image = Vec::with_capacity(HEADER_SIZE + PRG_BANK_SIZE);
        image.extend_from_slice(&INES_MAGIC);
        image.extend_from_slice(&[1, 0, 0, 0]);
        image.extend_from_slice(&[0; 8]);
        image.extend_from_slice(&prg);
        image
    }

    /// LDA #$80; STA $2000; loop: JMP loop. NMI: INC $10; RTI.
    fn nmi_counter() -> Console {
        let program = [0xA9, 0x80, 0x8D, 0x00, 0x20, 0x4C, 0x05, 0x80];
        let nmi = [0xE6, 0x10, 0x40];
        Console::from_ines(&rom(&program, &nmi), Config::default()).unwrap()
    }

    #[test]
    fn boots_at_reset_vector() {
        let console = nmi_counter();
        assert_eq!(console.cpu.pc, 0x8000);
        assert_eq!(console.cpu.bus.ppu.scanline, 240);
        assert_eq!(console.cpu.bus.ppu.cycle, 340);
    }

    #[test]
    fn nmi_runs_once_per_frame() {
        let mut console = nmi_counter();
        console.step_frame().unwrap();
        console.step_frame().unwrap();
        let before = console.cpu.bus.ram[0x10];
        assert!(before >= 1);
        for _ in 0..3 {
            console.step_frame().unwrap();
        }
        assert_eq!(console.cpu.bus.ram[0x10], before + 3);
    }

    #[test]
    fn frame_cycles_match_ppu_dots() {
        let mut console = nmi_counter();
        console.step_frame().unwrap();
        let cycles = console.step_frame().unwrap();
        let dots = cycles * PPU_DOTS_PER_CPU_CYCLE;
        // both frame edges can land mid-instruction, at most 7 cycles off
        let slack = 7 * PPU_DOTS_PER_CPU_CYCLE;
        assert!((89342 - slack..=89342 + slack).contains(&dots));
    }

    #[test]
    fn backdrop_fills_the_frame_when_rendering_is_off() {
        let mut console = nmi_counter();
        console.step_frame().unwrap();
        console.step_frame().unwrap();
        let backdrop = NES_PALETTE_RGB[0];
        assert!(console.frame_buffer().pixels.iter().all(|&p| p == backdrop));
    }

    #[test]
    fn ram_mirror_through_console() {
        // LDA #$42; STA $0800; JMP *
        let program = [0xA9, 0x42, 0x8D, 0x00, 0x08, 0x4C, 0x05, 0x80];
        let mut console = Console::from_ines(&rom(&program, &[0x40]), Config::default()).unwrap();
        console.step().unwrap();
        console.step().unwrap();
        assert_eq!(console.cpu.bus.ram[0], 0x42);
    }

    #[test]
    fn oam_dma_through_console_stalls_cpu() {
        // LDA #$07; STA $0200; LDA #$02; STA $4014
        let program = [0xA9, 0x07, 0x8D, 0x00, 0x02, 0xA9, 0x02, 0x8D, 0x14, 0x40];
        let mut console = Console::from_ines(&rom(&program, &[0x40]), Config::default()).unwrap();
        for _ in 0..3 {
            console.step().unwrap();
        }
        let cycles = console.step().unwrap();
        assert!(cycles == 4 + 513 || cycles == 4 + 514);
        assert_eq!(console.cpu.bus.ppu.oam[0], 0x07);
    }

    #[test]
    fn unmapped_read_halts_the_cpu() {
        // LDA $5000
        let program = [0xAD, 0x00, 0x50];
        let mut console = Console::from_ines(&rom(&program, &[0x40]), Config::default()).unwrap();
        let err = console.step().unwrap_err();
        assert!(matches!(err, Error::Cpu(CpuError::Bus(_))));
        assert!(matches!(
            console.step(),
            Err(Error::Cpu(CpuError::Halted { .. }))
        ));
        console.reset().unwrap();
        assert!(!console.cpu.halted);
    }

    #[test]
    fn bad_images_are_rejected() {
        assert!(matches!(
            Console::from_ines(b"NOPE", Config::default()),
            Err(Error::Cartridge(CartridgeError::BadMagic(_)))
        ));

        let mut image = rom(&[], &[]);
        image[6] = 0x10; // mapper 1
        assert!(matches!(
            Console::from_ines(&image, Config::default()),
            Err(Error::Cartridge(CartridgeError::UnsupportedMapper(1)))
        ));
    }
}
