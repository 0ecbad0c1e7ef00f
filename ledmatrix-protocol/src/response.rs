//! Modem response lines
//!
//! Every AT command ends with exactly one terminal line. Between commands
//! the modem may emit unsolicited lines (link loss) at any point.

/// Prefix of the inbound-data notification, `+IPD,<len>:<bytes>`
pub const IPD_MARKER: &[u8] = b"+IPD,";

/// Terminal response lines that end an AT exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    Ok,
    Fail,
    Error,
    SendOk,
    SendFail,
}

impl Response {
    /// All terminal responses
    pub const ALL: [Response; 5] = [
        Response::Ok,
        Response::Fail,
        Response::Error,
        Response::SendOk,
        Response::SendFail,
    ];

    /// The exact line, including its CR LF terminator
    pub const fn line(self) -> &'static [u8] {
        match self {
            Response::Ok => b"OK\r\n",
            Response::Fail => b"FAIL\r\n",
            Response::Error => b"ERROR\r\n",
            Response::SendOk => b"SEND OK\r\n",
            Response::SendFail => b"SEND FAIL\r\n",
        }
    }

    /// Whether this response reports success
    pub fn is_success(self) -> bool {
        matches!(self, Response::Ok | Response::SendOk)
    }
}

/// Lines the modem emits on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Unsolicited {
    /// `CLOSED`: the TCP connection dropped
    Closed,
    /// `WIFI DISCONNECT`: the access point association dropped
    WifiDisconnect,
}

impl Unsolicited {
    /// The exact line, including its CR LF terminator
    pub const fn line(self) -> &'static [u8] {
        match self {
            Unsolicited::Closed => b"CLOSED\r\n",
            Unsolicited::WifiDisconnect => b"WIFI DISCONNECT\r\n",
        }
    }
}

/// Classification of one complete CR LF terminated line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Line {
    Terminal(Response),
    Unsolicited(Unsolicited),
    Other,
}

/// Classify a complete line (including its trailing `\r\n`) by exact match
pub fn classify_line(line: &[u8]) -> Line {
    if let Some(response) = Response::ALL.iter().find(|r| r.line() == line) {
        return Line::Terminal(*response);
    }

    if line == Unsolicited::Closed.line() {
        Line::Unsolicited(Unsolicited::Closed)
    } else if line == Unsolicited::WifiDisconnect.line() {
        Line::Unsolicited(Unsolicited::WifiDisconnect)
    } else {
        Line::Other
    }
}
