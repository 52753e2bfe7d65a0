//! WS2812 matrix driver
//!
//! Pushes the framebuffer to a serpentine-wired WS2812 panel through the
//! RMT peripheral. Even rows run left to right, odd rows right to left.

use esp_hal::xtensa_lx::interrupt;
use esp_hal::{gpio::interconnect::PeripheralOutput, peripherals::RMT, rmt::Rmt, time::Rate};
use esp_hal_smartled::{SmartLedsAdapter, buffer_size, smart_led_buffer};
use matrixclock_display::FrameBuffer;
use smart_leds::{RGB8, SmartLedsWrite};

use crate::config::{MATRIX_HEIGHT, MATRIX_LED_COUNT, MATRIX_WIDTH};
use crate::mk_static;

pub(crate) struct MatrixDriver<'a> {
    adapter: SmartLedsAdapter<'a, { buffer_size(MATRIX_LED_COUNT) }>,
    chain: [RGB8; MATRIX_LED_COUNT],
}

impl<'a> MatrixDriver<'a> {
    pub(crate) fn new<O>(rmt: RMT<'a>, pin: O) -> Self
    where
        O: PeripheralOutput<'a>,
    {
        let rmt = Rmt::new(rmt, Rate::from_mhz(80)).expect("rmt init failed");
        let rmt_buffer = mk_static!(
            [u32; buffer_size(MATRIX_LED_COUNT)],
            smart_led_buffer!(MATRIX_LED_COUNT)
        );
        let adapter = SmartLedsAdapter::new(rmt.channel0, pin, rmt_buffer);

        Self {
            adapter,
            chain: [RGB8::new(0, 0, 0); MATRIX_LED_COUNT],
        }
    }

    /// Map the framebuffer onto the physical chain and push it out.
    pub(crate) fn write_frame(&mut self, frame: &FrameBuffer<MATRIX_WIDTH, MATRIX_HEIGHT>) {
        for (y, row) in frame.rows().iter().enumerate() {
            for (x, pixel) in row.iter().enumerate() {
                self.chain[chain_index(x, y)] = *pixel;
            }
        }
        interrupt::free(|| {
            let _ = self.adapter.write(self.chain.iter().copied());
        });
    }
}

fn chain_index(x: usize, y: usize) -> usize {
    if y % 2 == 0 {
        y * MATRIX_WIDTH + x
    } else {
        y * MATRIX_WIDTH + (MATRIX_WIDTH - 1 - x)
    }
}
