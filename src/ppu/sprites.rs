//! Sprite evaluation for the next scanline and per-dot sprite pixels.
//!
//! See [PPU sprite evaluation](https://www.nesdev.org/wiki/PPU_sprite_evaluation). At most eight
//! sprites are kept per line; a ninth sets the overflow flag.

use crate::bus::{Bus, BusError};

/// OAM (Object Attribute Memory): 64 sprites × 4 bytes. Each entry: Y, tile, attr, X.
pub const OAM_LEN: usize = 256;
pub const MAX_SPRITES_PER_LINE: usize = 8;

const ATTR_PALETTE: u8 = 0x03;
const ATTR_BEHIND_BACKGROUND: u8 = 0x20;
const ATTR_FLIP_H: u8 = 0x40;
const ATTR_FLIP_V: u8 = 0x80;

/// Sprites selected for the line being drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpriteLine {
    count: usize,
    patterns: [u32; MAX_SPRITES_PER_LINE],
    positions: [u8; MAX_SPRITES_PER_LINE],
    priorities: [u8; MAX_SPRITES_PER_LINE],
    indexes: [u8; MAX_SPRITES_PER_LINE],
}

/// One opaque sprite pixel at a dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpritePixel {
    /// OAM index, 0 for sprite zero.
    pub index: u8,
    /// 4-bit palette index within the sprite palettes.
    pub color: u8,
    pub behind_background: bool,
}

impl SpriteLine {
    pub fn clear(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Select the first eight sprites covering `scanline` and fetch their patterns.
    /// Returns true if more than eight matched.
    pub fn evaluate(
        &mut self,
        oam: &[u8; OAM_LEN],
        scanline: u16,
        tall: bool,
        table: u16,
        bus: &mut impl Bus,
    ) -> Result<bool, BusError> {
        let height: i32 = if tall { 16 } else { 8 };
        let mut found = 0;
        for index in 0..OAM_LEN / 4 {
            let entry = &oam[index * 4..index * 4 + 4];
            let row = scanline as i32 - entry[0] as i32;
            if row < 0 || row >= height {
                continue;
            }
            if found < MAX_SPRITES_PER_LINE {
                self.patterns[found] = fetch_pattern(entry, row as u16, tall, table, bus)?;
                self.positions[found] = entry[3];
                self.priorities[found] = (entry[2] & ATTR_BEHIND_BACKGROUND) >> 5;
                self.indexes[found] = index as u8;
            }
            found += 1;
        }
        self.count = found.min(MAX_SPRITES_PER_LINE);
        Ok(found > MAX_SPRITES_PER_LINE)
    }

    /// First opaque sprite pixel at screen column `x`, in OAM order.
    pub fn pixel(&self, x: u16) -> Option<SpritePixel> {
        for slot in 0..self.count {
            let offset = x as i32 - self.positions[slot] as i32;
            if !(0..8).contains(&offset) {
                continue;
            }
            let color = ((self.patterns[slot] >> ((7 - offset) * 4)) & 0x0F) as u8;
            if color % 4 == 0 {
                continue;
            }
            return Some(SpritePixel {
                index: self.indexes[slot],
                color,
                behind_background: self.priorities[slot] != 0,
            });
        }
        None
    }
}

/// Eight 4-bit pixels for one sprite row, leftmost in the high nibble.
fn fetch_pattern(
    entry: &[u8],
    row: u16,
    tall: bool,
    table: u16,
    bus: &mut impl Bus,
) -> Result<u32, BusError> {
    let tile = entry[1] as u16;
    let attributes = entry[2];
    let flip_v = attributes & ATTR_FLIP_V != 0;

    let addr = if !tall {
        let row = if flip_v { 7 - row } else { row };
        table + tile * 16 + row
    } else {
        // 8x16: bit 0 of the tile picks the pattern table, the rest picks an even tile pair
        let mut row = if flip_v { 15 - row } else { row };
        let table = 0x1000 * (tile & 1);
        let mut tile = tile & 0xFE;
        if row > 7 {
            tile += 1;
            row -= 8;
        }
        table + tile * 16 + row
    };

    let palette = (attributes & ATTR_PALETTE) << 2;
    let mut low = bus.read(addr)?;
    let mut high = bus.read(addr + 8)?;
    let mut data: u32 = 0;
    for _ in 0..8 {
        let (p1, p2) = if attributes & ATTR_FLIP_H != 0 {
            let bits = (low & 1, (high & 1) << 1);
            low >>= 1;
            high >>= 1;
            bits
        } else {
            let bits = ((low & 0x80) >> 7, (high & 0x80) >> 6);
            low <<= 1;
            high <<= 1;
            bits
        };
        data = (data << 4) | (palette | p1 | p2) as u32;
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlatBus([u8; 0x4000]);

    impl Bus for FlatBus {
        fn read(&mut self, addr: u16) -> Result<u8, BusError> {
            Ok(self.0[(addr % 0x4000) as usize])
        }

        fn write(&mut self, addr: u16, data: u8) -> Result<(), BusError> {
            self.0[(addr % 0x4000) as usize] = data;
            Ok(())
        }
    }

    fn hidden_oam() -> [u8; OAM_LEN] {
        [0xFF; OAM_LEN]
    }

    #[test]
    fn ninth_sprite_sets_overflow() {
        let mut bus = FlatBus([0; 0x4000]);
        let mut oam = hidden_oam();
        for i in 0..9 {
            oam[i * 4] = 10;
            oam[i * 4 + 3] = (i * 8) as u8;
        }
        let mut line = SpriteLine::default();
        assert!(line.evaluate(&oam, 12, false, 0, &mut bus).unwrap());
        assert_eq!(line.count(), 8);

        let mut oam = hidden_oam();
        oam[0] = 10;
        assert!(!line.evaluate(&oam, 12, false, 0, &mut bus).unwrap());
        assert_eq!(line.count(), 1);
    }

    #[test]
    fn sprite_outside_its_rows_is_skipped() {
        let mut bus = FlatBus([0; 0x4000]);
        let mut oam = hidden_oam();
        oam[0] = 10;
        let mut line = SpriteLine::default();
        line.evaluate(&oam, 18, false, 0, &mut bus).unwrap();
        assert_eq!(line.count(), 0);
        line.evaluate(&oam, 18, true, 0, &mut bus).unwrap();
        assert_eq!(line.count(), 1);
    }

    #[test]
    fn pixels_respect_flip_and_transparency() {
        let mut bus = FlatBus([0; 0x4000]);
        bus.0[0x0020] = 0b1000_0000; // tile 2, row 0: only the leftmost pixel
        let mut oam = hidden_oam();
        oam[0..4].copy_from_slice(&[10, 2, 0x01, 40]);
        oam[4..8].copy_from_slice(&[10, 2, ATTR_FLIP_H | ATTR_BEHIND_BACKGROUND, 100]);

        let mut line = SpriteLine::default();
        line.evaluate(&oam, 10, false, 0, &mut bus).unwrap();

        assert_eq!(
            line.pixel(40),
            Some(SpritePixel {
                index: 0,
                color: 0b0101,
                behind_background: false
            })
        );
        assert_eq!(line.pixel(41), None);
        assert_eq!(line.pixel(100), None);
        let flipped = line.pixel(107).unwrap();
        assert_eq!(flipped.index, 1);
        assert!(flipped.behind_background);
    }

    #[test]
    fn vertical_flip_reads_rows_bottom_up() {
        let mut bus = FlatBus([0; 0x4000]);
        bus.0[0x0020 + 7] = 0b1000_0000; // tile 2, row 7
        let mut oam = hidden_oam();
        oam[0..4].copy_from_slice(&[10, 2, ATTR_FLIP_V, 40]);

        let mut line = SpriteLine::default();
        line.evaluate(&oam, 10, false, 0, &mut bus).unwrap();
        assert_eq!(line.pixel(40).map(|p| p.color), Some(1));
        line.evaluate(&oam, 17, false, 0, &mut bus).unwrap();
        assert_eq!(line.pixel(40), None);
    }

    #[test]
    fn vertical_flip_swaps_tall_sprite_halves() {
        let mut bus = FlatBus([0; 0x4000]);
        bus.0[0x1000 + 3 * 16 + 7] = 0xFF; // bottom tile of pair 2/3, row 7
        let mut oam = hidden_oam();
        oam[0..4].copy_from_slice(&[0, 3, ATTR_FLIP_V, 0]);

        let mut line = SpriteLine::default();
        line.evaluate(&oam, 0, true, 0, &mut bus).unwrap();
        assert!(line.pixel(0).is_some());
        assert!(line.pixel(7).is_some());
        line.evaluate(&oam, 15, true, 0, &mut bus).unwrap();
        assert!(line.pixel(0).is_none());
        line.evaluate(&oam, 8, true, 0, &mut bus).unwrap();
        assert!(line.pixel(0).is_none());
    }

    #[test]
    fn tall_sprites_pick_table_from_tile_bit_0() {
        let mut bus = FlatBus([0; 0x4000]);
        bus.0[0x1000 + 3 * 16 + 2] = 0xFF; // tile 3 (second half of pair 2/3), row 2
        let mut oam = hidden_oam();
        oam[0..4].copy_from_slice(&[0, 3, 0, 0]);

        let mut line = SpriteLine::default();
        line.evaluate(&oam, 10, true, 0, &mut bus).unwrap();
        assert!(line.pixel(0).is_some());
        line.evaluate(&oam, 2, true, 0, &mut bus).unwrap();
        assert!(line.pixel(0).is_none());
    }
}
