//! Display tick task
//!
//! Once per frame: project the shared context into a `SceneView`, render
//! the scene and push the framebuffer to the matrix. Entity state gates
//! what is drawn; while the link is offline the scene swaps in the
//! reconnect indicator on its own.

use core::sync::atomic::Ordering;

use chrono::{Datelike, Timelike};
use embassy_time::Ticker;
use esp_hal::rng::Rng;
use matrixclock_display::{ClockScene, FrameBuffer, SceneView};
use matrixclock_link::ConnectionState;

use crate::config::{self, MATRIX_HEIGHT, MATRIX_WIDTH};
use crate::context::AppContext;
use crate::controllers::entities;
use crate::infrastructure::drivers::MatrixDriver;

#[embassy_executor::task]
pub(crate) async fn display_task(ctx: &'static AppContext, mut matrix: MatrixDriver<'static>) {
    let mut scene: ClockScene<MATRIX_WIDTH, MATRIX_HEIGHT> = ClockScene::new();
    let mut frame_buffer: FrameBuffer<MATRIX_WIDTH, MATRIX_HEIGHT> = FrameBuffer::new();
    let rng = Rng::new();
    let mut ticker = Ticker::every(config::FRAME_INTERVAL);

    loop {
        ticker.next().await;

        let frame = ctx.frame.fetch_add(1, Ordering::Relaxed);
        let flags = ctx
            .entities
            .lock(|cell| entities::scene_flags(&cell.borrow()));
        let offline = ctx.connectivity.get() == ConnectionState::Offline;

        let now = ctx
            .clock
            .now_local()
            .and_then(|seconds| chrono::DateTime::from_timestamp(seconds, 0));
        let (time_valid, hour, minute, second, day, month) = match now {
            Some(now) => (
                true,
                now.hour() as u8,
                now.minute() as u8,
                now.second() as u8,
                now.day() as u8,
                now.month() as u8,
            ),
            None => (false, 0, 0, 0, 0, 0),
        };

        let view = SceneView {
            hour,
            minute,
            second,
            day,
            month,
            time_valid,
            power_on: flags.power_on,
            show_seconds: flags.show_seconds,
            show_date: flags.show_date,
            date_color: flags.date_color,
            offline,
            frame,
            noise: rng.random(),
        };

        scene.render(&view, &mut frame_buffer);
        matrix.write_frame(&frame_buffer);
    }
}
