//! Board-agnostic core logic for the WiFi LED matrix firmware
//!
//! This crate contains everything between the modem UART and the panel
//! shift registers that does not depend on a specific chip:
//!
//! - Modem response scanning and inbound-data routing
//! - Link supervision (bring-up, reconnection after link loss)
//! - Single-frame-in-flight buffer handoff between the two cores
//! - Bit-plane scan-out sequencing
//! - Configuration types

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod link;
pub mod pipeline;
pub mod scanout;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;
