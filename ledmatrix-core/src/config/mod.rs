//! Configuration types
//!
//! Board-agnostic settings for the modem link and the panel. The firmware
//! fills [`LinkConfig`] from an embedded TOML file; everything here has a
//! usable default.

use heapless::String;

pub mod toml;

pub use self::toml::{parse_link_config, ParseError};

/// Maximum SSID length (IEEE 802.11 limit)
pub const MAX_SSID_LEN: usize = 32;

/// Maximum WPA passphrase length
pub const MAX_PASSWORD_LEN: usize = 64;

/// Maximum server host name length
pub const MAX_HOST_LEN: usize = 64;

/// Maximum client identifier length
pub const MAX_CLIENT_ID_LEN: usize = 64;

/// Client identifier announced after every TCP (re)connection
pub const DEFAULT_CLIENT_ID: &str = "SIMPLIFIED-SBC-MQTT-CLIENT-PICO-MATRIX";

/// Modem link settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinkConfig {
    /// Access point SSID
    pub ssid: String<MAX_SSID_LEN>,
    /// Access point passphrase
    pub password: String<MAX_PASSWORD_LEN>,
    /// Frame server host name or address
    pub host: String<MAX_HOST_LEN>,
    /// Frame server TCP port
    pub port: u16,
    /// Identifier sent as the greeting frame
    pub client_id: String<MAX_CLIENT_ID_LEN>,
    /// Modem UART baud rate after bring-up
    pub baudrate: u32,
    /// Delay between failed connection attempts (ms)
    pub retry_delay_ms: u32,
    /// Delay before the first association attempt (ms)
    pub wifi_settle_ms: u32,
    /// Delay after a successful association (ms)
    pub associate_settle_ms: u32,
    /// Delay after modem reset and baud switch (ms)
    pub modem_settle_ms: u32,
    /// Per-byte deadline while reading inbound TCP data (ms)
    pub byte_timeout_ms: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        let mut host = String::new();
        let _ = host.push_str("sauron");
        let mut client_id = String::new();
        let _ = client_id.push_str(DEFAULT_CLIENT_ID);

        Self {
            ssid: String::new(),
            password: String::new(),
            host,
            port: 1883,
            client_id,
            baudrate: 119_200,
            retry_delay_ms: 1000,
            wifi_settle_ms: 2000,
            associate_settle_ms: 1000,
            modem_settle_ms: 500,
            byte_timeout_ms: 100,
        }
    }
}

/// Settings that parse but cannot work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    MissingSsid,
    MissingHost,
    InvalidPort,
    /// Outside what the modem UART accepts
    InvalidBaudrate(u32),
    /// Zero would abandon every inbound chunk
    InvalidByteTimeout,
}

/// Lowest baud rate the modem accepts
pub const MIN_BAUDRATE: u32 = 9600;

/// Highest baud rate the modem accepts
pub const MAX_BAUDRATE: u32 = 4_608_000;

impl LinkConfig {
    /// Inbound byte deadline in microseconds
    pub fn byte_timeout_us(&self) -> u32 {
        self.byte_timeout_ms.saturating_mul(1000)
    }

    /// Check the settings the link cannot come up without
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.is_empty() {
            return Err(ConfigError::MissingSsid);
        }
        if self.host.is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if !(MIN_BAUDRATE..=MAX_BAUDRATE).contains(&self.baudrate) {
            return Err(ConfigError::InvalidBaudrate(self.baudrate));
        }
        if self.byte_timeout_ms == 0 {
            return Err(ConfigError::InvalidByteTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LinkConfig::default();
        assert_eq!(config.host.as_str(), "sauron");
        assert_eq!(config.port, 1883);
        assert_eq!(config.client_id.len(), 38);
        assert_eq!(config.retry_delay_ms, 1000);
        assert_eq!(config.byte_timeout_us(), 100_000);
    }

    #[test]
    fn test_validate() {
        let mut config = LinkConfig::default();
        assert_eq!(config.validate(), Err(ConfigError::MissingSsid));

        config.ssid.push_str("home").unwrap();
        assert_eq!(config.validate(), Ok(()));

        config.port = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidPort));
        config.port = 1883;

        config.baudrate = 300;
        assert_eq!(config.validate(), Err(ConfigError::InvalidBaudrate(300)));
    }
}
