//! Ledmatrix Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the portable firmware logic is
//! written against. Chip-specific HALs implement them so that the protocol
//! stack and the scan-out loop can run (and be tested) anywhere.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  ledmatrix-core / ledmatrix-firmware    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ledmatrix-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ ledmatrix-hal-│
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::ByteLink`] - Blocking byte channel to the WiFi modem
//! - [`panel::PanelDriver`] - HUB75 shift/latch/output-enable primitives

#![no_std]
#![deny(unsafe_code)]

pub mod panel;
pub mod uart;

pub use panel::PanelDriver;
pub use uart::{ByteLink, DataBits, Parity, StopBits, UartConfig};
