//! NES PPU (Picture Processing Unit) implementation.
//!
//! Advances one dot per [`PPU::step`]: 341 dots per scanline, 262 scanlines per frame, with the
//! pre-render line's last dot skipped on odd frames while rendering. Registers: $2000–$2007
//! (mirrored by the CPU bus).

use crate::{
    bus::{Bus, BusError, PpuBus},
    cartridge::mapper::Mapper,
    config::Config,
    cpu::interrupt::InterruptLine,
    ppu::{
        background::Background,
        frame::FrameSurface,
        memory::Vram,
        palette,
        scroll::Scroll,
        sprites::{OAM_LEN, SpriteLine},
    },
};

pub const DOTS_PER_SCANLINE: u16 = 341;
pub const SCANLINES_PER_FRAME: u16 = 262;
pub const VBLANK_SCANLINE: u16 = 241;
pub const PRE_RENDER_SCANLINE: u16 = 261;
const VISIBLE_SCANLINES: u16 = 240;

// PPUCTRL ($2000)
const CTRL_INCREMENT_32: u8 = 0x04;
const CTRL_SPRITE_TABLE: u8 = 0x08;
const CTRL_BACKGROUND_TABLE: u8 = 0x10;
const CTRL_TALL_SPRITES: u8 = 0x20;
const CTRL_NMI: u8 = 0x80;

// PPUMASK ($2001)
const MASK_GREYSCALE: u8 = 0x01;
const MASK_LEFT_BACKGROUND: u8 = 0x02;
const MASK_LEFT_SPRITES: u8 = 0x04;
const MASK_BACKGROUND: u8 = 0x08;
const MASK_SPRITES: u8 = 0x10;

/// PPU state: timing, scroll registers, VRAM, OAM and the NMI edge detector.
pub struct PPU {
    pub cycle: u16,
    pub scanline: u16,
    pub frame: u64,
    odd_frame: bool,

    pub ctrl: u8,
    pub mask: u8,
    pub scroll: Scroll,
    pub vram: Vram,
    /// OAM: 64 sprites × 4 bytes (Y, tile, attr, X). Written via $2003/$2004 or $4014 DMA.
    pub oam: [u8; OAM_LEN],
    /// OAM address for $2003/$2004 (byte index 0..255).
    pub oam_addr: u8,

    /// Sprite 0 hit (PPUSTATUS bit 6).
    pub sprite_zero_hit: bool,
    /// Sprite overflow (PPUSTATUS bit 5).
    pub sprite_overflow: bool,

    background: Background,
    sprites: SpriteLine,

    /// Last byte written to any register; fills the low bits of $2002 and write-only reads.
    register_latch: u8,
    /// $2007 read buffer.
    read_buffer: u8,

    nmi_occurred: bool,
    nmi_previous: bool,
    nmi_countdown: u8,
    nmi_delay: u8,
    nmi_line: Option<InterruptLine>,
}

impl PPU {
    pub fn new(config: &Config) -> Self {
        let mut ppu = Self {
            cycle: 0,
            scanline: 0,
            frame: 0,
            odd_frame: false,
            ctrl: 0,
            mask: 0,
            scroll: Scroll::default(),
            vram: Vram::new(),
            oam: [0; OAM_LEN],
            oam_addr: 0,
            sprite_zero_hit: false,
            sprite_overflow: false,
            background: Background::default(),
            sprites: SpriteLine::default(),
            register_latch: 0,
            read_buffer: 0,
            nmi_occurred: false,
            nmi_previous: false,
            nmi_countdown: 0,
            nmi_delay: config.nmi_delay,
            nmi_line: None,
        };
        ppu.reset();
        ppu
    }

    /// Route NMI requests to the CPU's interrupt line.
    pub fn connect_nmi(&mut self, line: InterruptLine) {
        self.nmi_line = Some(line);
    }

    /// Power-up/reset: dot 340 of scanline 240, frame 0, registers cleared. Memory persists.
    pub fn reset(&mut self) {
        self.cycle = 340;
        self.scanline = 240;
        self.frame = 0;
        self.odd_frame = false;
        self.write_ctrl(0);
        self.mask = 0;
        self.oam_addr = 0;
        self.scroll.w = false;
        self.read_buffer = 0;
        self.nmi_occurred = false;
        self.nmi_previous = false;
        self.nmi_countdown = 0;
        log::debug!("PPU reset");
    }

    pub fn rendering_enabled(&self) -> bool {
        self.mask & (MASK_BACKGROUND | MASK_SPRITES) != 0
    }

    pub fn in_vblank(&self) -> bool {
        self.nmi_occurred
    }

    fn nmi_output(&self) -> bool {
        self.ctrl & CTRL_NMI != 0
    }

    fn vram_increment(&self) -> u16 {
        if self.ctrl & CTRL_INCREMENT_32 != 0 {
            32
        } else {
            1
        }
    }

    fn background_table(&self) -> u16 {
        if self.ctrl & CTRL_BACKGROUND_TABLE != 0 {
            0x1000
        } else {
            0x0000
        }
    }

    fn sprite_table(&self) -> u16 {
        if self.ctrl & CTRL_SPRITE_TABLE != 0 {
            0x1000
        } else {
            0x0000
        }
    }

    /// Advance one dot: timing first, then this dot's pixel, fetches, scroll updates, sprite
    /// evaluation and vblank flags.
    pub fn step(
        &mut self,
        mapper: &mut dyn Mapper,
        surface: &mut dyn FrameSurface,
    ) -> Result<(), BusError> {
        self.tick();

        let rendering = self.rendering_enabled();
        let pre_line = self.scanline == PRE_RENDER_SCANLINE;
        let visible_line = self.scanline < VISIBLE_SCANLINES;
        let render_line = pre_line || visible_line;
        let prefetch_cycle = (321..=336).contains(&self.cycle);
        let visible_cycle = (1..=256).contains(&self.cycle);
        let fetch_cycle = prefetch_cycle || visible_cycle;

        if visible_line && visible_cycle {
            self.render_pixel(surface);
        }

        if rendering {
            let background_table = self.background_table();
            let sprite_table = self.sprite_table();
            let tall = self.ctrl & CTRL_TALL_SPRITES != 0;
            let v = self.scroll.v;
            let fine_y = self.scroll.fine_y();
            let mut bus = PpuBus::new(&mut self.vram, mapper);

            if render_line && fetch_cycle {
                self.background.shift();
                match self.cycle % 8 {
                    1 => self.background.fetch_nametable_byte(&mut bus, v)?,
                    3 => self.background.fetch_attribute_byte(&mut bus, v)?,
                    5 => self
                        .background
                        .fetch_low_tile_byte(&mut bus, fine_y, background_table)?,
                    7 => self
                        .background
                        .fetch_high_tile_byte(&mut bus, fine_y, background_table)?,
                    0 => self.background.store_tile_data(),
                    _ => {}
                }
            }
            if pre_line && (280..=304).contains(&self.cycle) {
                self.scroll.copy_y();
            }
            if render_line {
                if fetch_cycle && self.cycle % 8 == 0 {
                    self.scroll.increment_x();
                }
                if self.cycle == 256 {
                    self.scroll.increment_y();
                }
                if self.cycle == 257 {
                    self.scroll.copy_x();
                }
            }
            if self.cycle == 257 {
                if visible_line {
                    let overflow = self.sprites.evaluate(
                        &self.oam,
                        self.scanline,
                        tall,
                        sprite_table,
                        &mut bus,
                    )?;
                    if overflow {
                        self.sprite_overflow = true;
                    }
                } else {
                    self.sprites.clear();
                }
            }
        }

        if self.scanline == VBLANK_SCANLINE && self.cycle == 1 {
            self.set_vblank();
        }
        if pre_line && self.cycle == 1 {
            self.clear_vblank();
            self.sprite_zero_hit = false;
            self.sprite_overflow = false;
        }
        Ok(())
    }

    /// Count down a pending NMI, then move to the next dot.
    fn tick(&mut self) {
        if self.nmi_countdown > 0 {
            self.nmi_countdown -= 1;
            if self.nmi_countdown == 0 && self.nmi_output() && self.nmi_occurred {
                self.fire_nmi();
            }
        }

        if self.rendering_enabled()
            && self.odd_frame
            && self.scanline == PRE_RENDER_SCANLINE
            && self.cycle == 339
        {
            self.cycle = 0;
            self.scanline = 0;
            self.next_frame();
            return;
        }

        self.cycle += 1;
        if self.cycle >= DOTS_PER_SCANLINE {
            self.cycle = 0;
            self.scanline += 1;
            if self.scanline >= SCANLINES_PER_FRAME {
                self.scanline = 0;
                self.next_frame();
            }
        }
    }

    fn next_frame(&mut self) {
        self.frame += 1;
        self.odd_frame = !self.odd_frame;
    }

    fn render_pixel(&mut self, surface: &mut dyn FrameSurface) {
        let x = self.cycle - 1;
        let y = self.scanline;

        let index = if self.rendering_enabled() {
            self.compose(x)
        } else {
            0
        };
        let mut color = self.vram.read_palette(0x3F00 | index as u16);
        if self.mask & MASK_GREYSCALE != 0 {
            color &= 0x30;
        }
        surface.draw_pixel(x, y, palette::rgb(color));
    }

    /// Palette RAM index (0-31) for column `x` of the current line.
    fn compose(&mut self, x: u16) -> u8 {
        let mut background = if self.mask & MASK_BACKGROUND != 0 {
            self.background.pixel(self.scroll.x)
        } else {
            0
        };
        let mut sprite = if self.mask & MASK_SPRITES != 0 {
            self.sprites.pixel(x)
        } else {
            None
        };
        if x < 8 {
            if self.mask & MASK_LEFT_BACKGROUND == 0 {
                background = 0;
            }
            if self.mask & MASK_LEFT_SPRITES == 0 {
                sprite = None;
            }
        }

        let background_opaque = background % 4 != 0;
        match sprite {
            None if background_opaque => background,
            None => 0,
            Some(sprite) if !background_opaque => sprite.color | 0x10,
            Some(sprite) => {
                if sprite.index == 0 && x < 255 {
                    self.sprite_zero_hit = true;
                }
                if sprite.behind_background {
                    background
                } else {
                    sprite.color | 0x10
                }
            }
        }
    }

    fn set_vblank(&mut self) {
        self.nmi_occurred = true;
        self.nmi_change();
    }

    fn clear_vblank(&mut self) {
        self.nmi_occurred = false;
        self.nmi_change();
    }

    /// Edge detector on `nmiOutput && nmiOccurred`; a rising edge arms the delayed NMI.
    fn nmi_change(&mut self) {
        let nmi = self.nmi_output() && self.nmi_occurred;
        if nmi && !self.nmi_previous {
            if self.nmi_delay == 0 {
                self.fire_nmi();
            } else {
                self.nmi_countdown = self.nmi_delay;
            }
        }
        self.nmi_previous = nmi;
    }

    fn fire_nmi(&mut self) {
        log::trace!(
            "NMI at frame {} scanline {} dot {}",
            self.frame,
            self.scanline,
            self.cycle
        );
        if let Some(line) = &self.nmi_line {
            line.request_nmi();
        }
    }

    /// CPU read of $2000-$2007.
    pub fn read_register(&mut self, addr: u16, mapper: &mut dyn Mapper) -> Result<u8, BusError> {
        match addr {
            0x2002 => Ok(self.read_status()),
            0x2004 => Ok(self.oam[self.oam_addr as usize]),
            0x2007 => self.read_data(mapper),
            _ => Ok(self.register_latch),
        }
    }

    /// CPU write of $2000-$2007.
    pub fn write_register(
        &mut self,
        addr: u16,
        data: u8,
        mapper: &mut dyn Mapper,
    ) -> Result<(), BusError> {
        self.register_latch = data;
        match addr {
            0x2000 => self.write_ctrl(data),
            0x2001 => self.mask = data,
            0x2003 => self.oam_addr = data,
            0x2004 => {
                self.oam[self.oam_addr as usize] = data;
                self.oam_addr = self.oam_addr.wrapping_add(1);
            }
            0x2005 => self.scroll.write_scroll(data),
            0x2006 => self.scroll.write_addr(data),
            0x2007 => return self.write_data(data, mapper),
            _ => {}
        }
        Ok(())
    }

    fn write_ctrl(&mut self, data: u8) {
        self.ctrl = data;
        self.scroll.write_ctrl(data);
        self.nmi_change();
    }

    /// $2002: vblank, sprite 0 hit, overflow; low 5 bits from the latch. Clears vblank and w.
    fn read_status(&mut self) -> u8 {
        let mut status = self.register_latch & 0x1F;
        status |= (self.sprite_overflow as u8) << 5;
        status |= (self.sprite_zero_hit as u8) << 6;
        status |= (self.nmi_occurred as u8) << 7;
        self.nmi_occurred = false;
        self.nmi_change();
        self.scroll.w = false;
        status
    }

    /// $2007 read: buffered below $3F00, immediate for palette (buffer gets the nametable
    /// byte underneath).
    fn read_data(&mut self, mapper: &mut dyn Mapper) -> Result<u8, BusError> {
        let addr = self.scroll.v & 0x3FFF;
        let step = self.vram_increment();
        let mut bus = PpuBus::new(&mut self.vram, mapper);
        let value = if addr < 0x3F00 {
            let buffered = self.read_buffer;
            self.read_buffer = bus.read(addr)?;
            buffered
        } else {
            self.read_buffer = bus.read(addr - 0x1000)?;
            bus.read(addr)?
        };
        self.scroll.increment(step);
        Ok(value)
    }

    fn write_data(&mut self, data: u8, mapper: &mut dyn Mapper) -> Result<(), BusError> {
        let addr = self.scroll.v & 0x3FFF;
        let step = self.vram_increment();
        PpuBus::new(&mut self.vram, mapper).write(addr, data)?;
        self.scroll.increment(step);
        Ok(())
    }

    /// $4014: 256 bytes into OAM starting at OAMADDR, wrapping.
    pub fn oam_dma(&mut self, data: &[u8; OAM_LEN]) {
        for &byte in data {
            self.oam[self.oam_addr as usize] = byte;
            self.oam_addr = self.oam_addr.wrapping_add(1);
        }
    }
}
