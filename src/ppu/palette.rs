//! System palette: the 64 colors the 2C02 can emit, packed 0xRRGGBB.
//!
//! See [PPU palettes](https://www.nesdev.org/wiki/PPU_palettes). Palette RAM holds 6-bit indexes
//! into this table; entries $0D-$0F, $1D-$1F, $2D-$2F and $3D-$3F are black.

/// NES 2C02-style 64-color palette (0xRRGGBB). Index 0 = the default grey backdrop.
pub const NES_PALETTE_RGB: [u32; 64] = [
    0x757575, 0x271B8F, 0x0000AB, 0x47009F, 0x8F0077, 0xAB0013, 0xA70000, 0x7F0B00,
    0x432F00, 0x004700, 0x005100, 0x003F17, 0x1B3F5F, 0x000000, 0x000000, 0x000000,
    0xBCBCBC, 0x0073EF, 0x233BEF, 0x8300F3, 0xBF00BF, 0xE7005B, 0xDB2B00, 0xCB4F0F,
    0x8B7300, 0x009700, 0x00AB00, 0x00933B, 0x00838B, 0x000000, 0x000000, 0x000000,
    0xFFFFFF, 0x3FBFFF, 0x5F97FF, 0xA78BFD, 0xF77BFF, 0xFF77B7, 0xFF7763, 0xFF9B3B,
    0xF3BF3F, 0x83D313, 0x4FDF4B, 0x58F898, 0x00EBDB, 0x000000, 0x000000, 0x000000,
    0xFFFFFF, 0xABE7FF, 0xC7D7FF, 0xD7CBFF, 0xFFC7FF, 0xFFC7DB, 0xFFBFB3, 0xFFDBAB,
    0xFFE7A3, 0xE3FFA3, 0xABF3BF, 0xB3FFCF, 0x9FFFF3, 0x000000, 0x000000, 0x000000,
];

/// Packed color for a palette RAM value; the top two bits are ignored.
pub fn rgb(index: u8) -> u32 {
    NES_PALETTE_RGB[(index & 0x3F) as usize]
}
