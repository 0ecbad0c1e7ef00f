//! Modem UART link

use embassy_rp::uart::BufferedUart;
use embassy_time::{Duration, Instant};
use embedded_io::{Read, ReadReady, Write};
use ledmatrix_hal::{ByteLink, DataBits, Parity, StopBits, UartConfig};

/// Baud rate change on a live UART
pub trait SetBaudrate {
    fn set_baudrate(&mut self, baudrate: u32);
}

impl SetBaudrate for BufferedUart {
    fn set_baudrate(&mut self, baudrate: u32) {
        BufferedUart::set_baudrate(self, baudrate);
    }
}

/// Link errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// UART reported a framing, parity, overrun or break error
    Uart,
    /// Line settings other than 8N1
    Unsupported,
}

/// Blocking byte link to the modem
///
/// Wraps any embedded-io UART. Reads block until a byte arrives; the
/// interrupt-driven receive buffer keeps the line drained meanwhile.
pub struct ModemLink<U> {
    uart: U,
}

impl<U> ModemLink<U>
where
    U: Read + Write + ReadReady + SetBaudrate,
{
    pub fn new(uart: U) -> Self {
        Self { uart }
    }
}

impl<U> ByteLink for ModemLink<U>
where
    U: Read + Write + ReadReady + SetBaudrate,
{
    type Error = LinkError;

    fn read_byte(&mut self) -> Result<u8, LinkError> {
        let mut byte = [0u8; 1];
        loop {
            match self.uart.read(&mut byte) {
                Ok(1) => return Ok(byte[0]),
                Ok(_) => continue,
                Err(_) => return Err(LinkError::Uart),
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<(), LinkError> {
        self.uart.write_all(data).map_err(|_| LinkError::Uart)?;
        self.uart.flush().map_err(|_| LinkError::Uart)
    }

    fn is_readable_within(&mut self, timeout_us: u32) -> bool {
        let deadline = Instant::now() + Duration::from_micros(u64::from(timeout_us));
        loop {
            if self.uart.read_ready().unwrap_or(false) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
        }
    }

    fn reconfigure(&mut self, config: &UartConfig) -> Result<(), LinkError> {
        if config.data_bits != DataBits::Eight
            || config.parity != Parity::None
            || config.stop_bits != StopBits::One
        {
            return Err(LinkError::Unsupported);
        }
        self.uart.set_baudrate(config.baudrate);
        Ok(())
    }
}
