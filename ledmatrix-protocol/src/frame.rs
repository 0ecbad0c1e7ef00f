//! Application frame encoding and decoding.
//!
//! Frame format:
//! - MARKER (1 byte): ASCII `S`
//! - LENGTH (1+ bytes): payload length as ASCII decimal digits
//! - SEPARATOR (1 byte): ASCII `:`
//! - PAYLOAD (LENGTH bytes): zstd-compressed data
//!
//! The decoder accumulates the compressed payload into the first half of a
//! fixed scratch buffer and decompresses it into the space behind it.

use heapless::Vec;

use crate::decompress::{DecompressError, Decompressor};

/// Frame marker byte
pub const FRAME_MARKER: u8 = b'S';

/// Separator between length digits and payload
pub const FRAME_SEPARATOR: u8 = b':';

/// Default scratch capacity (raw frame plus decompressed output)
pub const SCRATCH_CAPACITY: usize = 10 * 1024;

/// Errors that can occur while decoding or encoding frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// A byte that is not valid in the current decoder state
    UnexpectedByte(u8),
    /// Declared length is zero
    EmptyFrame,
    /// Declared length does not fit in the compressed half of the scratch buffer
    CapacityExceeded {
        declared: usize,
        capacity: usize,
    },
    /// Payload failed to decompress
    Decompress(DecompressError),
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// Decoder state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeState {
    /// Waiting for the `S` marker
    AwaitingMarker,
    /// Reading length digits
    AwaitingLength,
    /// Reading payload bytes
    AwaitingPayload,
}

/// Byte-fed decoder for `S<len>:<payload>` frames
///
/// State survives across calls, so a frame may be delivered in any number
/// of pieces. `N` is the scratch capacity; at most `N / 2` bytes of
/// compressed payload are accepted per frame.
pub struct FrameDecoder<const N: usize = SCRATCH_CAPACITY> {
    state: DecodeState,
    length: usize,
    offset: usize,
    scratch: [u8; N],
}

impl<const N: usize> Default for FrameDecoder<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FrameDecoder<N> {
    /// Largest accepted compressed payload
    pub const MAX_FRAME_LEN: usize = N / 2;

    /// Create a new decoder waiting for a marker
    pub const fn new() -> Self {
        Self {
            state: DecodeState::AwaitingMarker,
            length: 0,
            offset: 0,
            scratch: [0; N],
        }
    }

    /// Current state
    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Declared length of the frame being read
    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of payload bytes received so far
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Reset the decoder state, discarding any partial frame
    pub fn reset(&mut self) {
        self.state = DecodeState::AwaitingMarker;
        self.length = 0;
        self.offset = 0;
    }

    /// Feed a single byte to the decoder
    ///
    /// Returns `Ok(Some(data))` with the decompressed payload when a frame
    /// completes, `Ok(None)` when more bytes are needed, or `Err` when the
    /// byte was rejected or the frame could not be decompressed. After an
    /// error the decoder is waiting for a marker again, except in
    /// [`DecodeState::AwaitingMarker`] where the byte is simply discarded.
    pub fn feed<D: Decompressor>(
        &mut self,
        byte: u8,
        decompressor: &mut D,
    ) -> Result<Option<&[u8]>, FrameError> {
        match self.state {
            DecodeState::AwaitingMarker => {
                if byte != FRAME_MARKER {
                    return Err(FrameError::UnexpectedByte(byte));
                }
                self.state = DecodeState::AwaitingLength;
                self.length = 0;
                self.offset = 0;
                Ok(None)
            }
            DecodeState::AwaitingLength => match byte {
                b'0'..=b'9' => {
                    // Bounded by MAX_FRAME_LEN, so this can never overflow
                    let length = self.length * 10 + (byte - b'0') as usize;
                    if length > Self::MAX_FRAME_LEN {
                        self.reset();
                        return Err(FrameError::CapacityExceeded {
                            declared: length,
                            capacity: Self::MAX_FRAME_LEN,
                        });
                    }
                    self.length = length;
                    Ok(None)
                }
                FRAME_SEPARATOR => {
                    if self.length == 0 {
                        self.reset();
                        return Err(FrameError::EmptyFrame);
                    }
                    self.state = DecodeState::AwaitingPayload;
                    self.offset = 0;
                    Ok(None)
                }
                _ => {
                    self.reset();
                    Err(FrameError::UnexpectedByte(byte))
                }
            },
            DecodeState::AwaitingPayload => {
                self.scratch[self.offset] = byte;
                self.offset += 1;
                if self.offset < self.length {
                    return Ok(None);
                }

                let length = self.length;
                self.reset();

                let (compressed, output) = self.scratch.split_at_mut(length);
                match decompressor.decompress(compressed, output) {
                    Ok(size) => Ok(Some(&self.scratch[length..length + size])),
                    Err(e) => Err(FrameError::Decompress(e)),
                }
            }
        }
    }
}

/// Encode `payload` as a frame into `buffer`
///
/// Returns the number of bytes written.
pub fn encode_frame(payload: &[u8], buffer: &mut [u8]) -> Result<usize, FrameError> {
    let mut digits = [0u8; 20];
    let mut n = payload.len();
    let mut digit_count = 0;
    loop {
        digits[digit_count] = b'0' + (n % 10) as u8;
        digit_count += 1;
        n /= 10;
        if n == 0 {
            break;
        }
    }

    let frame_len = 1 + digit_count + 1 + payload.len();
    if buffer.len() < frame_len {
        return Err(FrameError::BufferTooSmall);
    }

    buffer[0] = FRAME_MARKER;
    for (i, digit) in digits[..digit_count].iter().rev().enumerate() {
        buffer[1 + i] = *digit;
    }
    buffer[1 + digit_count] = FRAME_SEPARATOR;
    buffer[2 + digit_count..frame_len].copy_from_slice(payload);

    Ok(frame_len)
}

/// Encode `payload` as a frame into a heapless Vec
pub fn encode_frame_to_vec<const CAP: usize>(payload: &[u8]) -> Result<Vec<u8, CAP>, FrameError> {
    let mut vec = Vec::new();
    vec.resize(CAP, 0).map_err(|_| FrameError::BufferTooSmall)?;
    let len = encode_frame(payload, &mut vec)?;
    vec.truncate(len);
    Ok(vec)
}
