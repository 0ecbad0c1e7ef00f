//! HUB75 panel output primitives
//!
//! A HUB75 panel is driven one row pair at a time: two pixel lanes (upper
//! and lower half) are shifted in on a shared clock, the row address is
//! latched, and output-enable is pulsed for the bit-plane's on-time. The
//! wire-level timing lives in the implementation (PIO on the RP2040); the
//! scan-out loop only sequences these calls.

/// Shift/latch/output-enable sequencing for a HUB75 panel
pub trait PanelDriver {
    /// Select which bit of each 8-bit colour channel the next shifts emit
    fn set_bit_plane(&mut self, bit: u8);

    /// Shift one column: a pixel word for the upper lane and one for the lower
    ///
    /// Pixel words are `0x00BBGGRR`.
    fn shift_pair(&mut self, upper: u32, lower: u32);

    /// Block until all shifted data has left the shifter and the previous
    /// output-enable pulse has finished
    fn wait_idle(&mut self);

    /// Latch the shifted row data for `row` and pulse output-enable for
    /// `on_time` units
    fn latch_row(&mut self, row: u8, on_time: u32);
}
