//! RP2040 HAL for the LED matrix firmware
//!
//! Implements the `ledmatrix-hal` traits on RP2040 peripherals:
//!
//! - [`uart::ModemLink`]: the WiFi modem's byte link over a buffered UART
//! - [`hub75::Hub75Pio`]: HUB75 panel output on two PIO state machines

#![no_std]

pub mod hub75;
pub mod uart;

pub use hub75::{Hub75Pins, Hub75Pio};
pub use uart::{ModemLink, SetBaudrate};
