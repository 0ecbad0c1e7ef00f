//! Response scanner
//!
//! Reads modem output byte by byte until a terminal result line. Along the
//! way it feeds `+IPD` payloads into the frame decoder, so data arriving in
//! the middle of a command exchange is never lost. A dispatched link-loss
//! line also ends the scan: after `CLOSED` the modem goes quiet, and the
//! caller has to act before anything else arrives.

use ledmatrix_hal::ByteLink;
use ledmatrix_protocol::{classify_line, Decompressor, Line, Response, Unsolicited};

use super::ConnectionContext;
use crate::traits::LinkHooks;

/// Capacity of the per-call response scratch
pub const SCAN_CAPACITY: usize = 4 * 1024;

/// Result of a single scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Scan {
    /// Bytes copied into the caller's output window
    pub len: usize,
    /// Terminal line that ended the scan
    pub response: Option<Response>,
    /// Dispatched link-loss line that ended the scan
    pub event: Option<Unsolicited>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    NewLine,
    Normal,
    MatchPlus,
    MatchPlusI,
    MatchPlusIP,
    MatchPlusIPD,
    ReadCr,
}

impl ScanState {
    /// Transition for every byte except the two that complete a token
    /// (`\n` after `\r`, `,` after `+IPD`)
    fn next(self, byte: u8) -> Self {
        match (self, byte) {
            (_, b'\r') => Self::ReadCr,
            (Self::NewLine, b'+') => Self::MatchPlus,
            (Self::MatchPlus, b'I') => Self::MatchPlusI,
            (Self::MatchPlusI, b'P') => Self::MatchPlusIP,
            (Self::MatchPlusIP, b'D') => Self::MatchPlusIPD,
            _ => Self::Normal,
        }
    }
}

/// Scan the modem output up to and including the next terminal line, or
/// the next link-loss line that is not suppressed
///
/// The last `out.len()` bytes of the response (including the terminal
/// line) are copied into `out`. Inbound payload bytes never land in the
/// response, only their `+IPD,` header does.
pub fn scan_response<L, D, H, const N: usize>(
    ctx: &mut ConnectionContext<D, N>,
    link: &mut L,
    hooks: &mut H,
    out: &mut [u8],
) -> Result<Scan, L::Error>
where
    L: ByteLink,
    D: Decompressor,
    H: LinkHooks,
{
    let mut buf = [0u8; SCAN_CAPACITY];
    let mut len = 0;
    let mut line_start = 0;
    let mut state = ScanState::NewLine;
    let mut response = None;
    let mut event = None;

    while len < SCAN_CAPACITY {
        let byte = link.read_byte()?;
        buf[len] = byte;
        len += 1;

        match (state, byte) {
            (ScanState::MatchPlusIPD, b',') => {
                read_inbound(ctx, link, hooks)?;
                state = ScanState::Normal;
                line_start = len;
            }
            (ScanState::ReadCr, b'\n') => {
                let line = &buf[line_start..len];
                match classify_line(line) {
                    Line::Terminal(r) => {
                        response = Some(r);
                        break;
                    }
                    Line::Unsolicited(Unsolicited::Closed) => {
                        if ctx.reconnecting_tcp {
                            debug!("CLOSED while reconnecting tcp");
                        } else {
                            hooks.on_link_closed();
                            event = Some(Unsolicited::Closed);
                            break;
                        }
                    }
                    Line::Unsolicited(Unsolicited::WifiDisconnect) => {
                        ctx.wifi_dropped = true;
                        if ctx.reconnecting_wifi {
                            debug!("WIFI DISCONNECT while reconnecting wifi");
                        } else {
                            hooks.on_wifi_lost();
                            event = Some(Unsolicited::WifiDisconnect);
                            break;
                        }
                    }
                    Line::Other => trace!("modem: {=[u8]:a}", line),
                }
                state = ScanState::NewLine;
                line_start = len;
            }
            _ => state = state.next(byte),
        }
    }

    if response.is_none() && event.is_none() {
        warn!("response scratch full after {} bytes, no result line", len);
    }

    let n = len.min(out.len());
    out[..n].copy_from_slice(&buf[len - n..len]);
    Ok(Scan {
        len: n,
        response,
        event,
    })
}

/// Consume one `+IPD,<n>:<payload>` chunk after its comma
fn read_inbound<L, D, H, const N: usize>(
    ctx: &mut ConnectionContext<D, N>,
    link: &mut L,
    hooks: &mut H,
) -> Result<(), L::Error>
where
    L: ByteLink,
    D: Decompressor,
    H: LinkHooks,
{
    let mut declared: usize = 0;
    loop {
        match link.read_byte()? {
            b':' => break,
            b @ b'0'..=b'9' => {
                declared = declared
                    .saturating_mul(10)
                    .saturating_add(usize::from(b - b'0'));
            }
            _ => {}
        }
    }

    for received in 0..declared {
        if !link.is_readable_within(ctx.byte_timeout_us) {
            // Decoder keeps its place; the rest of the frame may still come
            warn!("inbound data stalled after {} of {} bytes", received, declared);
            break;
        }
        let byte = link.read_byte()?;
        match ctx.decoder.feed(byte, &mut ctx.decompressor) {
            Ok(Some(frame)) => hooks.on_frame(frame),
            Ok(None) => {}
            Err(e) => warn!("frame decode: {:?}", e),
        }
    }
    Ok(())
}
