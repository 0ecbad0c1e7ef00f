//! Minimal parser for `link.toml`
//!
//! Handles the flat subset the link configuration uses: `key = value`
//! lines with quoted strings or integers, blank lines and `#` comments.
//! Section headers, arrays and multi-line strings are rejected or not
//! understood. Keys that are not recognised are skipped.

use heapless::String;

use super::LinkConfig;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Line is neither a comment nor `key = value`
    InvalidLine,
    /// Section headers are not part of the format
    InvalidSection,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// String does not fit its field
    TooLong,
}

/// Parse a link configuration, starting from the defaults
pub fn parse_link_config(input: &str) -> Result<LinkConfig, ParseError> {
    let mut config = LinkConfig::default();

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') {
            return Err(ParseError::InvalidSection);
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidLine)?;
        match key {
            "ssid" => config.ssid = parse_text(value)?,
            "password" => config.password = parse_text(value)?,
            "host" => config.host = parse_text(value)?,
            "port" => config.port = parse_int(value)?,
            "client_id" => config.client_id = parse_text(value)?,
            "baudrate" => config.baudrate = parse_int(value)?,
            "retry_delay_ms" => config.retry_delay_ms = parse_int(value)?,
            "wifi_settle_ms" => config.wifi_settle_ms = parse_int(value)?,
            "associate_settle_ms" => config.associate_settle_ms = parse_int(value)?,
            "modem_settle_ms" => config.modem_settle_ms = parse_int(value)?,
            "byte_timeout_ms" => config.byte_timeout_ms = parse_int(value)?,
            _ => {}
        }
    }

    Ok(config)
}

/// Split `key = value`, dropping a trailing comment outside quotes
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let mut value = line[eq_pos + 1..].trim();

    let mut in_string = false;
    for (i, c) in value.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => {
                value = value[..i].trim_end();
                break;
            }
            _ => {}
        }
    }

    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

fn parse_text<const N: usize>(value: &str) -> Result<String<N>, ParseError> {
    let text = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or(ParseError::InvalidValue)?;
    String::try_from(text).map_err(|_| ParseError::TooLong)
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    // TOML allows `_` between digits
    let mut digits: String<16> = String::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ParseError::InvalidValue)?;
    }
    digits.parse().map_err(|_| ParseError::InvalidValue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let input = r#"
# Access point
ssid = "home"
password = "hunter2 # not a comment"

host = "10.0.0.5"   # frame server
port = 9000
client_id = "PANEL-1"

baudrate = 921_600
retry_delay_ms = 250
byte_timeout_ms = 50
"#;
        let config = parse_link_config(input).unwrap();
        assert_eq!(config.ssid.as_str(), "home");
        assert_eq!(config.password.as_str(), "hunter2 # not a comment");
        assert_eq!(config.host.as_str(), "10.0.0.5");
        assert_eq!(config.port, 9000);
        assert_eq!(config.client_id.as_str(), "PANEL-1");
        assert_eq!(config.baudrate, 921_600);
        assert_eq!(config.retry_delay_ms, 250);
        assert_eq!(config.byte_timeout_ms, 50);
        // Untouched keys keep their defaults
        assert_eq!(config.wifi_settle_ms, 2000);
    }

    #[test]
    fn test_empty_input_is_default() {
        assert_eq!(parse_link_config("").unwrap(), LinkConfig::default());
    }

    #[test]
    fn test_unknown_keys_skipped() {
        let config = parse_link_config("brightness = 3\nssid = \"x\"").unwrap();
        assert_eq!(config.ssid.as_str(), "x");
    }

    #[test]
    fn test_rejects_sections() {
        assert_eq!(
            parse_link_config("[wifi]\nssid = \"x\""),
            Err(ParseError::InvalidSection)
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        assert_eq!(parse_link_config("port = 70000"), Err(ParseError::InvalidValue));
        assert_eq!(parse_link_config("port = \"80\""), Err(ParseError::InvalidValue));
        assert_eq!(parse_link_config("ssid = home"), Err(ParseError::InvalidValue));
        assert_eq!(parse_link_config("just words"), Err(ParseError::InvalidLine));
    }

    #[test]
    fn test_rejects_long_ssid() {
        let input = "ssid = \"0123456789012345678901234567890123\"";
        assert_eq!(parse_link_config(input), Err(ParseError::TooLong));
    }
}
