//! Scan-out loop (core 0)

use embassy_rp::peripherals::PIO0;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use ledmatrix_core::pipeline::RenderPort;
use ledmatrix_core::scanout::ScanoutLoop;
use ledmatrix_hal_rp2040::Hub75Pio;

pub fn run(
    panel: Hub75Pio<'static, PIO0, 0, 1>,
    render: &mut RenderPort<'static, 'static, CriticalSectionRawMutex>,
) -> ! {
    ScanoutLoop::new(panel).run(render)
}
