//! Frame payload decompression
//!
//! Application frames carry zstd-compressed pixel data. The decoder only
//! needs "compressed span in, decompressed size out", so the codec sits
//! behind a trait and tests can substitute a trivial one.

/// Decompression failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecompressError {
    /// Input is not a valid compressed stream, or its output does not fit
    Corrupt,
}

/// Decompresses a complete compressed payload into a destination buffer
pub trait Decompressor {
    /// Decompress `input` into `output`
    ///
    /// Returns the number of bytes written to `output`.
    fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, DecompressError>;
}

/// Zstandard decompressor backed by `ruzstd`
///
/// The decoding context is allocated on first use and reused for every
/// later frame.
#[cfg(feature = "zstd")]
#[derive(Default)]
pub struct ZstdDecompressor {
    ctx: Option<ruzstd::decoding::FrameDecoder>,
}

#[cfg(feature = "zstd")]
impl ZstdDecompressor {
    /// Create a decompressor; no memory is allocated until the first frame
    pub const fn new() -> Self {
        Self { ctx: None }
    }

    /// Whether the decoding context has been created yet
    pub fn is_initialized(&self) -> bool {
        self.ctx.is_some()
    }
}

#[cfg(feature = "zstd")]
impl Decompressor for ZstdDecompressor {
    fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, DecompressError> {
        let ctx = self
            .ctx
            .get_or_insert_with(ruzstd::decoding::FrameDecoder::new);

        ctx.decode_all(input, output)
            .map_err(|_| DecompressError::Corrupt)
    }
}

#[cfg(all(test, feature = "zstd"))]
mod tests {
    use super::*;
    use crate::frame::{encode_frame, FrameDecoder};

    /// 64x32 RGB888 frame
    const FRAME_BYTES: usize = 64 * 32 * 3;

    /// `(i * 7) % 251` for every byte, compressed with the zstd CLI
    const GRADIENT: &[u8] = include_bytes!("../testdata/gradient.rgb.zst");

    /// Every pixel `0x20 0x40 0x80`, compressed with the zstd CLI
    const SOLID: &[u8] = include_bytes!("../testdata/solid.rgb.zst");

    fn gradient() -> std::vec::Vec<u8> {
        (0..FRAME_BYTES).map(|i| (i * 7 % 251) as u8).collect()
    }

    #[test]
    fn test_context_created_lazily() {
        let mut dec = ZstdDecompressor::new();
        assert!(!dec.is_initialized());

        let mut out = [0u8; 16];
        let result = dec.decompress(b"definitely not zstd", &mut out);
        assert!(result.is_err());
        assert!(dec.is_initialized());
    }

    #[test]
    fn test_decompress_full_frame() {
        let mut dec = ZstdDecompressor::new();
        let mut out = std::vec![0u8; FRAME_BYTES];

        let n = dec.decompress(GRADIENT, &mut out).unwrap();
        assert_eq!(n, FRAME_BYTES);
        assert_eq!(out, gradient());
    }

    #[test]
    fn test_context_reused_across_frames() {
        let mut dec = ZstdDecompressor::new();
        let mut out = std::vec![0u8; FRAME_BYTES];

        assert_eq!(dec.decompress(GRADIENT, &mut out).unwrap(), FRAME_BYTES);
        assert_eq!(out, gradient());

        assert_eq!(dec.decompress(SOLID, &mut out).unwrap(), FRAME_BYTES);
        assert!(out.chunks(3).all(|px| px == [0x20, 0x40, 0x80]));

        out.fill(0);
        assert_eq!(dec.decompress(GRADIENT, &mut out).unwrap(), FRAME_BYTES);
        assert_eq!(out, gradient());
    }

    #[test]
    fn test_output_too_small() {
        let mut dec = ZstdDecompressor::new();
        let mut out = [0u8; 64];
        assert_eq!(dec.decompress(GRADIENT, &mut out), Err(DecompressError::Corrupt));
    }

    #[test]
    fn test_compressed_frame_through_decoder() {
        let mut wire = std::vec![0u8; GRADIENT.len() + SOLID.len() + 16];
        let mut len = encode_frame(GRADIENT, &mut wire).unwrap();
        len += encode_frame(SOLID, &mut wire[len..]).unwrap();

        let mut decoder = FrameDecoder::<{ 10 * 1024 }>::new();
        let mut dec = ZstdDecompressor::new();
        let mut frames = std::vec::Vec::new();
        for &b in &wire[..len] {
            if let Some(frame) = decoder.feed(b, &mut dec).unwrap() {
                frames.push(frame.to_vec());
            }
        }

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], gradient());
        assert_eq!(frames[1].len(), FRAME_BYTES);
        assert!(frames[1].chunks(3).all(|px| px == [0x20, 0x40, 0x80]));
    }
}
