//! Serial link abstractions
//!
//! The WiFi modem hangs off a plain UART. Everything above this trait is
//! byte-at-a-time and blocking, so the trait is deliberately small.

/// Blocking duplex byte channel to the modem
pub trait ByteLink {
    /// Error type for link operations
    type Error;

    /// Read one byte, blocking until it arrives
    fn read_byte(&mut self) -> Result<u8, Self::Error>;

    /// Write all of `data`, blocking until it has been queued
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Wait up to `timeout_us` microseconds for a byte to become readable
    ///
    /// Returns `true` if a subsequent [`read_byte`](Self::read_byte) will
    /// not block.
    fn is_readable_within(&mut self, timeout_us: u32) -> bool;

    /// Check if a byte is readable right now
    fn is_readable(&mut self) -> bool {
        self.is_readable_within(0)
    }

    /// Re-apply line settings after the modem was told to switch baud rate
    fn reconfigure(&mut self, config: &UartConfig) -> Result<(), Self::Error>;

    /// Discard everything currently waiting in the receive path
    fn drain(&mut self) -> Result<(), Self::Error> {
        while self.is_readable() {
            self.read_byte()?;
        }
        Ok(())
    }
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl UartConfig {
    /// 8N1 at the given baud rate
    pub const fn with_baudrate(baudrate: u32) -> Self {
        Self {
            baudrate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}
