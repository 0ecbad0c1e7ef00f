//! WiFi LED matrix firmware
//!
//! Core 1 talks to the ESP8266 modem over UART0 and decodes frames pushed
//! by the frame server. Core 0 refreshes the 64x32 HUB75 panel from PIO0.
//! The two meet only in the frame pipeline, which keeps one frame in
//! flight between them.

#![no_std]
#![no_main]

extern crate alloc;

use defmt::*;
use embassy_rp::bind_interrupts;
use embassy_rp::multicore::{spawn_core1, Stack};
use embassy_rp::peripherals::{PIO0, UART0};
use embassy_rp::pio::Pio;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_alloc::LlffHeap as Heap;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use ledmatrix_core::config::{parse_link_config, LinkConfig};
use ledmatrix_core::pipeline::{FrameBuffer, FramePipeline};
use ledmatrix_hal_rp2040::{Hub75Pins, Hub75Pio, ModemLink};

mod tasks;

// Heap for the zstd decoder's window and tables
#[global_allocator]
static HEAP: Heap = Heap::empty();

const HEAP_SIZE: usize = 64 * 1024;

/// Link configuration compiled into the firmware
/// Edit link.toml and rebuild to change it
const EMBEDDED_CONFIG: &str = include_str!("../link.toml");

// Core 1 peak is building the supervisor: its ~10.5 KiB value (mostly
// the frame decoder scratch) may sit on the stack twice before landing in
// its static cell. Steady state needs the 4 KiB response scratch plus a
// 512 byte version window.
const CORE1_STACK_SIZE: usize = 32 * 1024;

const UART_TX_BUF: usize = 256;
const UART_RX_BUF: usize = 4096;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    PIO0_IRQ_0 => embassy_rp::pio::InterruptHandler<PIO0>;
});

static PIPELINE: FramePipeline<'static, CriticalSectionRawMutex> = FramePipeline::new();

// Buffer 0 starts on the panel, buffer 1 with the ingestion core
static FRONT: StaticCell<FrameBuffer> = StaticCell::new();
static BACK: StaticCell<FrameBuffer> = StaticCell::new();

static CORE1_STACK: StaticCell<Stack<CORE1_STACK_SIZE>> = StaticCell::new();
static TX_BUF: StaticCell<[u8; UART_TX_BUF]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; UART_RX_BUF]> = StaticCell::new();

#[cortex_m_rt::entry]
fn main() -> ! {
    info!("LED matrix firmware starting...");

    init_heap();

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();
    info!(
        "Server {=str}:{}, modem at {} baud",
        config.host.as_str(),
        config.port,
        config.baudrate
    );

    let front = FRONT.init_with(|| FrameBuffer::new(0));
    let back = BACK.init_with(|| FrameBuffer::new(1));
    let (ingest, mut render) = PIPELINE.split(back, front);

    let (uart0, modem_tx, modem_rx) = (p.UART0, p.PIN_16, p.PIN_17);
    spawn_core1(
        p.CORE1,
        CORE1_STACK.init_with(Stack::new),
        move || {
            // Built here so the UART interrupt is serviced by this core
            let mut uart_config = UartConfig::default();
            uart_config.baudrate = config.baudrate;
            let uart = Uart::new_blocking(uart0, modem_tx, modem_rx, uart_config);
            let uart = uart.into_buffered(
                Irqs,
                TX_BUF.init([0; UART_TX_BUF]),
                RX_BUF.init([0; UART_RX_BUF]),
            );
            info!("Modem UART ready on core 1");

            tasks::ingest::run(ModemLink::new(uart), ingest, config)
        },
    );

    let Pio {
        mut common,
        sm0,
        sm1,
        ..
    } = Pio::new(p.PIO0, Irqs);
    let pins = Hub75Pins {
        rgb: [
            common.make_pio_pin(p.PIN_0),
            common.make_pio_pin(p.PIN_1),
            common.make_pio_pin(p.PIN_2),
            common.make_pio_pin(p.PIN_3),
            common.make_pio_pin(p.PIN_4),
            common.make_pio_pin(p.PIN_5),
        ],
        row_select: [
            common.make_pio_pin(p.PIN_6),
            common.make_pio_pin(p.PIN_7),
            common.make_pio_pin(p.PIN_8),
            common.make_pio_pin(p.PIN_9),
            common.make_pio_pin(p.PIN_10),
        ],
        clk: common.make_pio_pin(p.PIN_11),
        latch: common.make_pio_pin(p.PIN_12),
        oe: common.make_pio_pin(p.PIN_13),
    };
    let panel = Hub75Pio::new(&mut common, sm0, sm1, pins);
    info!("HUB75 panel on PIO0");

    tasks::scanout::run(panel, &mut render)
}

/// Initialize the heap allocator
fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_SIZE)
    }
}

/// Parse the embedded link configuration, falling back to defaults
fn load_config() -> LinkConfig {
    match parse_link_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            if let Err(e) = config.validate() {
                warn!("link.toml: {:?}", e);
            }
            config
        }
        Err(e) => {
            error!("Failed to parse link.toml: {:?}, using defaults", e);
            LinkConfig::default()
        }
    }
}
