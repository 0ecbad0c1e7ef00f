//! Frame buffer storage

use crate::traits::{ColorChannel, SinkError};

/// Panel width in pixels
pub const WIDTH: usize = 64;

/// Panel height in pixels
pub const HEIGHT: usize = 32;

/// Pixels per frame
pub const PIXELS: usize = WIDTH * HEIGHT;

/// Bytes in a decoded RGB888 frame
pub const FRAME_BYTES: usize = PIXELS * 3;

/// Dim grey shown before the first frame arrives
pub const INITIAL_FILL: u32 = 0x0A0A_0A0A;

/// Pack one pixel into the scan-out word layout `0x00BBGGRR`
pub const fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    (b as u32) << 16 | (g as u32) << 8 | r as u32
}

/// One full frame of packed pixel words, row-major
pub struct FrameBuffer {
    index: u8,
    pixels: [u32; PIXELS],
}

impl FrameBuffer {
    pub const fn new(index: u8) -> Self {
        Self {
            index,
            pixels: [INITIAL_FILL; PIXELS],
        }
    }

    /// Identity of this buffer within its pipeline
    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn pixels(&self) -> &[u32; PIXELS] {
        &self.pixels
    }

    /// Pixels of row `y`
    pub fn row(&self, y: usize) -> &[u32] {
        &self.pixels[y * WIDTH..(y + 1) * WIDTH]
    }

    pub fn fill(&mut self, word: u32) {
        self.pixels.fill(word);
    }

    /// Load a decoded RGB888 frame
    ///
    /// A frame of the wrong size is rejected and the buffer left as it was.
    pub fn load_rgb(&mut self, rgb: &[u8]) -> Result<(), SinkError> {
        if rgb.len() != FRAME_BYTES {
            return Err(SinkError::BadLength {
                got: rgb.len(),
                expected: FRAME_BYTES,
            });
        }
        for (px, c) in self.pixels.iter_mut().zip(rgb.chunks_exact(3)) {
            *px = pack_rgb(c[0], c[1], c[2]);
        }
        Ok(())
    }

    /// Black frame with a single full-intensity pixel at `step`
    pub fn show_progress(&mut self, step: usize, channel: ColorChannel) {
        self.pixels.fill(0);
        self.pixels[step % PIXELS] = channel.full();
    }
}
