//! Bit-plane scan-out
//!
//! Binary-coded modulation: each row pair is shifted out once per bit
//! plane, and plane `b` is shown for `ON_TIME_UNIT << b`, so the summed
//! on-time of a pixel is proportional to its 8-bit channel value.

use embassy_sync::blocking_mutex::raw::RawMutex;
use ledmatrix_hal::PanelDriver;

use crate::pipeline::{FrameBuffer, RenderPort, HEIGHT, WIDTH};

/// Bit planes per colour channel
pub const BIT_PLANES: u8 = 8;

/// On-time of the least significant plane, in panel-driver units
pub const ON_TIME_UNIT: u32 = 100;

/// Row pairs addressed per pass
pub const ROW_PAIRS: usize = HEIGHT / 2;

/// Drives the panel from the render end of the pipeline
pub struct ScanoutLoop<P> {
    panel: P,
    upper: [u32; WIDTH],
    lower: [u32; WIDTH],
}

impl<P: PanelDriver> ScanoutLoop<P> {
    pub fn new(panel: P) -> Self {
        Self {
            panel,
            upper: [0; WIDTH],
            lower: [0; WIDTH],
        }
    }

    /// Show `frame` once: every row pair, every bit plane
    pub fn render_pass(&mut self, frame: &FrameBuffer) {
        for row in 0..ROW_PAIRS {
            self.upper.copy_from_slice(frame.row(row));
            self.lower.copy_from_slice(frame.row(row + ROW_PAIRS));

            for bit in 0..BIT_PLANES {
                self.panel.set_bit_plane(bit);
                for (&upper, &lower) in self.upper.iter().zip(self.lower.iter()) {
                    self.panel.shift_pair(upper, lower);
                }
                self.panel.wait_idle();
                self.panel.latch_row(row as u8, ON_TIME_UNIT << bit);
            }
        }
    }

    /// Swap in a new frame if one is waiting, then render a pass
    ///
    /// Returns whether a swap happened.
    pub fn step<M: RawMutex>(&mut self, port: &mut RenderPort<'_, '_, M>) -> bool {
        let swapped = port.poll_swap();
        if let Some(frame) = port.front() {
            self.render_pass(frame);
        }
        swapped
    }

    /// Refresh the panel forever
    pub fn run<M: RawMutex>(&mut self, port: &mut RenderPort<'_, '_, M>) -> ! {
        info!("scan-out running");
        loop {
            self.step(port);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{pack_rgb, FramePipeline, FRAME_BYTES, PIXELS};
    use crate::traits::FrameSink;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Plane(u8),
        Shift(u32, u32),
        Idle,
        Latch(u8, u32),
    }

    #[derive(Default)]
    struct MockPanel {
        calls: Vec<Call>,
    }

    impl PanelDriver for MockPanel {
        fn set_bit_plane(&mut self, bit: u8) {
            self.calls.push(Call::Plane(bit));
        }

        fn shift_pair(&mut self, upper: u32, lower: u32) {
            self.calls.push(Call::Shift(upper, lower));
        }

        fn wait_idle(&mut self) {
            self.calls.push(Call::Idle);
        }

        fn latch_row(&mut self, row: u8, on_time: u32) {
            self.calls.push(Call::Latch(row, on_time));
        }
    }

    fn gradient() -> Vec<u8> {
        (0..FRAME_BYTES).map(|i| (i * 7 % 251) as u8).collect()
    }

    #[test]
    fn test_plane_sequence() {
        let mut scanout = ScanoutLoop::new(MockPanel::default());
        scanout.render_pass(&FrameBuffer::new(0));
        let calls = &scanout.panel.calls;

        // plane select + shifts + idle + latch, per plane per row pair
        assert_eq!(calls.len(), ROW_PAIRS * BIT_PLANES as usize * (WIDTH + 3));

        let block = WIDTH + 3;
        for bit in 0..BIT_PLANES {
            let start = bit as usize * block;
            assert_eq!(calls[start], Call::Plane(bit));
            assert_eq!(calls[start + WIDTH + 1], Call::Idle);
            assert_eq!(calls[start + WIDTH + 2], Call::Latch(0, 100 << bit));
        }
    }

    #[test]
    fn test_on_times_double_per_plane() {
        let mut scanout = ScanoutLoop::new(MockPanel::default());
        scanout.render_pass(&FrameBuffer::new(0));

        let latches: Vec<(u8, u32)> = scanout
            .panel
            .calls
            .iter()
            .filter_map(|c| match *c {
                Call::Latch(row, t) => Some((row, t)),
                _ => None,
            })
            .collect();
        assert_eq!(latches.len(), ROW_PAIRS * BIT_PLANES as usize);
        assert_eq!(
            latches[..8].iter().map(|l| l.1).collect::<Vec<_>>(),
            [100, 200, 400, 800, 1600, 3200, 6400, 12800]
        );
        assert_eq!(latches.last(), Some(&(15, 12800)));
    }

    #[test]
    fn test_shifted_pixels_match_frame() {
        let rgb = gradient();
        let mut frame = FrameBuffer::new(0);
        frame.load_rgb(&rgb).unwrap();

        let mut scanout = ScanoutLoop::new(MockPanel::default());
        scanout.render_pass(&frame);

        // Rebuild the image from the first plane of each row pair
        let mut image = vec![0u32; PIXELS];
        let block = WIDTH + 3;
        for row in 0..ROW_PAIRS {
            let start = row * BIT_PLANES as usize * block + 1;
            for x in 0..WIDTH {
                let Call::Shift(upper, lower) = scanout.panel.calls[start + x] else {
                    panic!("expected a shift");
                };
                image[row * WIDTH + x] = upper;
                image[(row + ROW_PAIRS) * WIDTH + x] = lower;
            }
        }

        for (i, px) in image.iter().enumerate() {
            assert_eq!(*px, pack_rgb(rgb[i * 3], rgb[i * 3 + 1], rgb[i * 3 + 2]));
        }
    }

    #[test]
    fn test_step_renders_current_then_new_frame() {
        let mut front = FrameBuffer::new(0);
        let mut back = FrameBuffer::new(1);
        let pipeline = FramePipeline::<CriticalSectionRawMutex>::new();
        let (mut ingest, mut render) = pipeline.split(&mut back, &mut front);
        let mut scanout = ScanoutLoop::new(MockPanel::default());

        assert!(!scanout.step(&mut render));
        assert_eq!(scanout.panel.calls[1], Call::Shift(0x0A0A_0A0A, 0x0A0A_0A0A));

        std::thread::scope(|s| {
            s.spawn(move || ingest.on_frame(&vec![0x20; FRAME_BYTES]).unwrap());
            while !scanout.step(&mut render) {}
        });

        let last_pass = &scanout.panel.calls[scanout.panel.calls.len() - 3];
        assert_eq!(*last_pass, Call::Shift(0x0020_2020, 0x0020_2020));
        assert_eq!(render.front().unwrap().index(), 1);
    }
}
