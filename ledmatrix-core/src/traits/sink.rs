//! Frame sink trait

/// Errors a sink can report for a decoded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SinkError {
    /// Decoded frame has the wrong number of bytes
    BadLength { got: usize, expected: usize },
}

/// Colour channel used for single-pixel progress frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorChannel {
    Red = 0,
    Green = 1,
    Blue = 2,
}

impl ColorChannel {
    /// Full-intensity pixel word for this channel (`0x00BBGGRR` layout)
    pub const fn full(self) -> u32 {
        0xFF << (self as u32 * 8)
    }
}

/// Destination for frames produced by the ingestion context
pub trait FrameSink {
    /// Deliver a decoded RGB888 frame
    ///
    /// A rejected frame leaves the display untouched.
    fn on_frame(&mut self, rgb: &[u8]) -> Result<(), SinkError>;

    /// Show an all-black frame
    fn clear(&mut self);

    /// Show connection progress: a single lit pixel at `step`
    fn progress(&mut self, step: usize, channel: ColorChannel);
}
