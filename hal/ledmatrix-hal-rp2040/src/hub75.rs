//! PIO-driven HUB75 output
//!
//! Two state machines share one PIO block:
//!
//! - **data**: takes pixel words for the upper and lower lane in turn,
//!   samples bit 0 of each colour byte onto R0 G0 B0 R1 G1 B1 and clocks
//!   them in on the CLK side-set pin
//! - **row**: takes `row | on_time << 5`, drives the row address, pulses
//!   LATCH and holds output-enable for `on_time + 1` cycles
//!
//! Bit-plane selection pre-shifts each word on the CPU, so the data
//! program never needs patching.

use embassy_rp::pio::{
    Common, Config, Direction, FifoJoin, Instance, Pin, ShiftConfig, ShiftDirection, StateMachine,
};
use fixed::types::U24F8;
use ledmatrix_hal::PanelDriver;

/// Row-address pins on the panel connector
pub const ROW_SELECT_PINS: usize = 5;

/// PIO clock divider for the data shifter
const DATA_CLOCK_DIV: u8 = 2;

/// Pins handed to the PIO block, already claimed with `make_pio_pin`
///
/// `rgb` and `row_select` must each be consecutive GPIOs, as must
/// `latch` and `oe`.
pub struct Hub75Pins<'d, PIO: Instance> {
    /// R0 G0 B0 R1 G1 B1
    pub rgb: [Pin<'d, PIO>; 6],
    /// A B C D E
    pub row_select: [Pin<'d, PIO>; ROW_SELECT_PINS],
    pub clk: Pin<'d, PIO>,
    pub latch: Pin<'d, PIO>,
    pub oe: Pin<'d, PIO>,
}

/// HUB75 panel on a PIO block
pub struct Hub75Pio<'d, PIO: Instance, const DATA: usize, const ROW: usize> {
    data: StateMachine<'d, PIO, DATA>,
    row: StateMachine<'d, PIO, ROW>,
    plane: u8,
}

impl<'d, PIO: Instance, const DATA: usize, const ROW: usize> Hub75Pio<'d, PIO, DATA, ROW> {
    pub fn new(
        common: &mut Common<'d, PIO>,
        mut data: StateMachine<'d, PIO, DATA>,
        mut row: StateMachine<'d, PIO, ROW>,
        pins: Hub75Pins<'d, PIO>,
    ) -> Self {
        let row_prg = pio::pio_asm!(
            ".side_set 2",
            ".wrap_target",
            "out pins, 5 [7]    side 0x2", // OE off, drive row address
            "out x, 27   [7]    side 0x3", // pulse LATCH, fetch on-time
            "pulse:",
            "jmp x-- pulse      side 0x0", // OE on for x + 1 cycles
            ".wrap"
        );

        let data_prg = pio::pio_asm!(
            ".side_set 1",
            ".wrap_target",
            "pull             side 0",
            "in osr, 1        side 0",
            "out null, 8      side 0",
            "in osr, 1        side 0",
            "out null, 8      side 0",
            "in osr, 1        side 0",
            "out null, 32     side 0",
            "pull             side 0",
            "in osr, 1        side 1", // rising edge clocks in the previous column
            "out null, 8      side 1",
            "in osr, 1        side 1",
            "out null, 8      side 1",
            "in osr, 1        side 1",
            "out null, 32     side 1",
            "in null, 26      side 1", // R0 G0 B0 R1 G1 B1 into the low bits, reversed
            "mov pins, ::isr  side 1",
            ".wrap"
        );

        let row_installed = common.load_program(&row_prg.program);
        let data_installed = common.load_program(&data_prg.program);

        let Hub75Pins {
            rgb,
            row_select,
            clk,
            latch,
            oe,
        } = pins;

        let mut row_cfg = Config::default();
        row_cfg.use_program(&row_installed, &[&latch, &oe]);
        row_cfg.set_out_pins(&row_select.each_ref());
        row_cfg.shift_out = ShiftConfig {
            auto_fill: true,
            threshold: 32,
            direction: ShiftDirection::Right,
        };
        row.set_config(&row_cfg);
        row.set_pin_dirs(Direction::Out, &row_select.each_ref());
        row.set_pin_dirs(Direction::Out, &[&latch, &oe]);

        let mut data_cfg = Config::default();
        data_cfg.use_program(&data_installed, &[&clk]);
        data_cfg.set_out_pins(&rgb.each_ref());
        data_cfg.shift_out = ShiftConfig {
            auto_fill: true,
            threshold: 24,
            direction: ShiftDirection::Right,
        };
        data_cfg.shift_in = ShiftConfig {
            auto_fill: false,
            threshold: 32,
            direction: ShiftDirection::Left,
        };
        data_cfg.fifo_join = FifoJoin::TxOnly;
        data_cfg.clock_divider = U24F8::from_num(DATA_CLOCK_DIV);
        data.set_config(&data_cfg);
        data.set_pin_dirs(Direction::Out, &rgb.each_ref());
        data.set_pin_dirs(Direction::Out, &[&clk]);

        data.set_enable(true);
        row.set_enable(true);

        Self {
            data,
            row,
            plane: 0,
        }
    }

    fn push_data(&mut self, word: u32) {
        while !self.data.tx().try_push(word) {}
    }

    fn push_row(&mut self, word: u32) {
        while !self.row.tx().try_push(word) {}
    }
}

impl<'d, PIO: Instance, const DATA: usize, const ROW: usize> PanelDriver
    for Hub75Pio<'d, PIO, DATA, ROW>
{
    fn set_bit_plane(&mut self, bit: u8) {
        self.plane = bit & 7;
    }

    fn shift_pair(&mut self, upper: u32, lower: u32) {
        self.push_data(upper >> self.plane);
        self.push_data(lower >> self.plane);
    }

    fn wait_idle(&mut self) {
        // Stale flag from a gap between shifts
        self.data.tx().stalled();

        // One dummy column flushes the last real one through the clock edge
        self.push_data(0);
        self.push_data(0);
        while !self.data.tx().stalled() {}

        // Previous output-enable pulse
        while !self.row.tx().stalled() {}
    }

    fn latch_row(&mut self, row: u8, on_time: u32) {
        self.push_row(u32::from(row) | on_time << ROW_SELECT_PINS);
    }
}
