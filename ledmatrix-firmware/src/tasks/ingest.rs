//! Ingestion loop (core 1)
//!
//! Owns the modem link and the back buffer. Brings the link up, then
//! scans modem output forever, reconnecting as needed.

use embassy_rp::uart::BufferedUart;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Delay;
use ledmatrix_core::config::LinkConfig;
use ledmatrix_core::link::LinkSupervisor;
use ledmatrix_core::pipeline::IngestPort;
use ledmatrix_hal_rp2040::ModemLink;
use ledmatrix_protocol::ZstdDecompressor;
use static_cell::StaticCell;

type Ingest = LinkSupervisor<
    ModemLink<BufferedUart>,
    Delay,
    ZstdDecompressor,
    IngestPort<'static, 'static, CriticalSectionRawMutex>,
>;

// Holds the decoder scratch once running; see CORE1_STACK_SIZE for the
// construction peak
static SUPERVISOR: StaticCell<Ingest> = StaticCell::new();

pub fn run(
    link: ModemLink<BufferedUart>,
    sink: IngestPort<'static, 'static, CriticalSectionRawMutex>,
    config: LinkConfig,
) -> ! {
    let supervisor = SUPERVISOR
        .init_with(|| LinkSupervisor::new(link, Delay, ZstdDecompressor::new(), sink, config));
    supervisor.run()
}
