//! Pixel output. The PPU pushes one packed color per visible dot into a [`FrameSurface`].

pub const FRAME_WIDTH: usize = 256;
pub const FRAME_HEIGHT: usize = 240;

/// Anything that can receive PPU pixels: a window, a texture upload, a test recorder.
pub trait FrameSurface {
    /// `x` in 0..256, `y` in 0..240, `rgb` packed 0xRRGGBB.
    fn draw_pixel(&mut self, x: u16, y: u16, rgb: u32);
}

/// 256×240 framebuffer (0xRRGGBB per pixel). Row-major, left-to-right, top-to-bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pub pixels: Vec<u32>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            pixels: vec![0; FRAME_WIDTH * FRAME_HEIGHT],
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * FRAME_WIDTH + x]
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSurface for FrameBuffer {
    fn draw_pixel(&mut self, x: u16, y: u16, rgb: u32) {
        let (x, y) = (x as usize, y as usize);
        if x < FRAME_WIDTH && y < FRAME_HEIGHT {
            self.pixels[y * FRAME_WIDTH + x] = rgb;
        }
    }
}
