//! Ingestion-side connection state

use ledmatrix_protocol::{FrameDecoder, SCRATCH_CAPACITY};

/// State shared by the scanner and the supervisor
///
/// Owned exclusively by the ingestion context for the whole process
/// lifetime. Holds the frame decoder (whose state must survive across
/// responses, since frames span `+IPD` chunks), the decompression context
/// and the flags that suppress link-loss callbacks while a reconnection is
/// already in progress.
pub struct ConnectionContext<D, const N: usize = SCRATCH_CAPACITY> {
    pub(crate) decoder: FrameDecoder<N>,
    pub(crate) decompressor: D,
    /// Suppresses `CLOSED` dispatch
    pub(crate) reconnecting_tcp: bool,
    /// Suppresses `WIFI DISCONNECT` dispatch
    pub(crate) reconnecting_wifi: bool,
    /// Set by every `WIFI DISCONNECT`, suppressed or not
    pub(crate) wifi_dropped: bool,
    pub(crate) byte_timeout_us: u32,
}

impl<D, const N: usize> ConnectionContext<D, N> {
    /// Create a context with an idle decoder and no suppression
    pub const fn new(decompressor: D, byte_timeout_us: u32) -> Self {
        Self {
            decoder: FrameDecoder::new(),
            decompressor,
            reconnecting_tcp: false,
            reconnecting_wifi: false,
            wifi_dropped: false,
            byte_timeout_us,
        }
    }

    /// Frame decoder state
    pub fn decoder(&self) -> &FrameDecoder<N> {
        &self.decoder
    }

    /// Whether `CLOSED` dispatch is currently suppressed
    pub fn reconnecting_tcp(&self) -> bool {
        self.reconnecting_tcp
    }

    /// Whether `WIFI DISCONNECT` dispatch is currently suppressed
    pub fn reconnecting_wifi(&self) -> bool {
        self.reconnecting_wifi
    }

    /// Whether a `WIFI DISCONNECT` was seen since the last association
    pub fn wifi_dropped(&self) -> bool {
        self.wifi_dropped
    }

    pub fn set_reconnecting_tcp(&mut self, on: bool) {
        self.reconnecting_tcp = on;
    }

    pub fn set_reconnecting_wifi(&mut self, on: bool) {
        self.reconnecting_wifi = on;
    }
}
