//! WiFi modem and pixel-stream protocol
//!
//! This crate defines the two protocols the matrix firmware speaks over a
//! single UART to an ESP-01 style WiFi modem:
//!
//! 1. The modem's line-oriented AT command/response protocol, including the
//!    unsolicited `+IPD,<len>:` notification that carries inbound TCP bytes.
//! 2. The application framing nested inside those TCP bytes:
//!
//! ```text
//! ┌───┬──────────────┬───┬──────────────────────────────┐
//! │ S │ LENGTH       │ : │ PAYLOAD                      │
//! │1B │ ASCII digits │1B │ LENGTH bytes, zstd-compressed│
//! └───┴──────────────┴───┴──────────────────────────────┘
//! ```
//!
//! Frames may be split across any number of `+IPD` chunks, so the decoder
//! is a byte-fed state machine whose state outlives a single response.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod decompress;
pub mod frame;
pub mod response;

pub use command::{Command, CommandError};
pub use decompress::{DecompressError, Decompressor};
#[cfg(feature = "zstd")]
pub use decompress::ZstdDecompressor;
pub use frame::{
    encode_frame, encode_frame_to_vec, DecodeState, FrameDecoder, FrameError, FRAME_MARKER,
    FRAME_SEPARATOR, SCRATCH_CAPACITY,
};
pub use response::{classify_line, Line, Response, Unsolicited, IPD_MARKER};
