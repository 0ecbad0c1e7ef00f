//! Scanner callbacks

/// Receiver for everything the response scanner finds besides the
/// terminal line itself
///
/// Bound once when the link is set up. The link-loss methods are only
/// called while the matching suppression flag in the
/// [`ConnectionContext`](crate::link::ConnectionContext) is clear.
pub trait LinkHooks {
    /// A complete application frame was decoded and decompressed
    fn on_frame(&mut self, data: &[u8]);

    /// The modem reported `CLOSED`
    fn on_link_closed(&mut self);

    /// The modem reported `WIFI DISCONNECT`
    fn on_wifi_lost(&mut self);
}
