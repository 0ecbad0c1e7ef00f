//! AT command builders
//!
//! Only the subset of the ESP8266 AT command set the firmware issues.
//! Fixed commands are plain constants; parameterised ones are formatted
//! into a fixed-capacity [`Command`] string.

use core::fmt::Write;

use heapless::String;

/// Maximum length of a formatted command, including CR LF
pub const MAX_COMMAND_LEN: usize = 128;

/// A formatted AT command ready to be written to the modem
pub type Command = String<MAX_COMMAND_LEN>;

/// Prompt byte the modem sends when it is ready for `AT+CIPSEND` data
pub const SEND_PROMPT: u8 = b'>';

/// Restore factory defaults (also resets the module)
pub const RESTORE: &str = "AT+RESTORE\r\n";
/// Disable command echo
pub const ECHO_OFF: &str = "ATE0\r\n";
/// Query firmware version
pub const VERSION: &str = "AT+GMR\r\n";
/// Station (client) mode, not persisted
pub const STATION_MODE: &str = "AT+CWMODE_CUR=1\r\n";
/// Enable DHCP in station mode, not persisted
pub const ENABLE_DHCP: &str = "AT+CWDHCP_CUR=1,1\r\n";
/// Disassociate from the current access point
pub const QUIT_AP: &str = "AT+CWQAP\r\n";
/// Close the TCP connection
pub const CLOSE_TCP: &str = "AT+CIPCLOSE\r\n";

/// Text in a `CIPSTART` reply meaning the link was already up
pub const ALREADY_CONNECTED: &[u8] = b"ALREADY CONNECTED";

/// Errors building a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Formatted command does not fit in [`MAX_COMMAND_LEN`]
    TooLong,
}

fn format(args: core::fmt::Arguments<'_>) -> Result<Command, CommandError> {
    let mut cmd = Command::new();
    cmd.write_fmt(args).map_err(|_| CommandError::TooLong)?;
    Ok(cmd)
}

/// Switch the modem UART to `baudrate`, 8N1, no flow control
pub fn set_uart(baudrate: u32) -> Result<Command, CommandError> {
    format(format_args!("AT+UART_CUR={},8,1,0,0\r\n", baudrate))
}

/// Associate with an access point
pub fn join_ap(ssid: &str, password: &str) -> Result<Command, CommandError> {
    format(format_args!("AT+CWJAP_CUR=\"{}\",\"{}\"\r\n", ssid, password))
}

/// Open a TCP connection with a 10 s keep-alive
pub fn start_tcp(host: &str, port: u16) -> Result<Command, CommandError> {
    format(format_args!("AT+CIPSTART=\"TCP\",\"{}\",{},10\r\n", host, port))
}

/// Announce `len` bytes of TCP payload
pub fn send_data(len: usize) -> Result<Command, CommandError> {
    format(format_args!("AT+CIPSEND={}\r\n", len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_tcp() {
        let cmd = start_tcp("sauron", 1883).unwrap();
        assert_eq!(cmd.as_str(), "AT+CIPSTART=\"TCP\",\"sauron\",1883,10\r\n");
    }

    #[test]
    fn test_join_ap() {
        let cmd = join_ap("home", "hunter2").unwrap();
        assert_eq!(cmd.as_str(), "AT+CWJAP_CUR=\"home\",\"hunter2\"\r\n");
    }

    #[test]
    fn test_send_and_uart() {
        assert_eq!(send_data(42).unwrap().as_str(), "AT+CIPSEND=42\r\n");
        assert_eq!(
            set_uart(119200).unwrap().as_str(),
            "AT+UART_CUR=119200,8,1,0,0\r\n"
        );
    }

    #[test]
    fn test_too_long() {
        let ssid = [b'x'; 120];
        let ssid = core::str::from_utf8(&ssid).unwrap();
        assert_eq!(join_ap(ssid, "pw"), Err(CommandError::TooLong));
    }
}
