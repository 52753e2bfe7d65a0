//! Clock scene
//!
//! Composes the framebuffer for one frame from plain values: wall-clock
//! time, entity-derived visibility flags and the link state. While the
//! link is down the scene substitutes the no-link indicator for normal
//! content; while the power entity is off the matrix stays dark.

use smart_leds::RGB8;

use crate::font;
use crate::frame::FrameBuffer;
use crate::sprite::AnimatedSprite;

const TIME_COLOR: RGB8 = RGB8::new(64, 64, 64);
const INDICATOR_COLOR: RGB8 = RGB8::new(64, 16, 0);
const PET_COLOR: RGB8 = RGB8::new(8, 24, 8);

/// How often the wandering pet picks a new target, in frames.
const PET_RETARGET_FRAMES: u32 = 100;

/// Everything the scene needs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct SceneView {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub day: u8,
    pub month: u8,
    /// False until the first successful time sync.
    pub time_valid: bool,
    /// `power` switch entity state.
    pub power_on: bool,
    /// `seconds` switch entity state.
    pub show_seconds: bool,
    /// `date_rgb` light entity state and color.
    pub show_date: bool,
    pub date_color: RGB8,
    /// Link is known to be down (offline, not merely unknown).
    pub offline: bool,
    pub frame: u32,
    /// Entropy for sprite re-targeting, supplied by the caller.
    pub noise: u32,
}

pub struct ClockScene<const W: usize, const H: usize> {
    pet: AnimatedSprite,
}

impl<const W: usize, const H: usize> Default for ClockScene<W, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const W: usize, const H: usize> ClockScene<W, H> {
    pub const fn new() -> Self {
        Self {
            pet: AnimatedSprite::new(0, H as i32 - 2),
        }
    }

    pub fn render(&mut self, view: &SceneView, frame: &mut FrameBuffer<W, H>) {
        frame.clear();
        if !view.power_on {
            return;
        }
        if view.offline {
            Self::draw_indicator(frame);
            return;
        }
        Self::draw_time_row(view, frame);
        if view.show_date && view.time_valid {
            Self::draw_date_row(view, frame);
        }
        self.tick_pet(view, frame);
    }

    fn draw_indicator(frame: &mut FrameBuffer<W, H>) {
        let x = (W as i32 - i32::from(font::NO_LINK.width)) / 2;
        let y = (H as i32 - font::FONT_HEIGHT as i32) / 2;
        frame.draw_glyph(x, y, &font::NO_LINK, INDICATOR_COLOR);
    }

    fn draw_time_row(view: &SceneView, frame: &mut FrameBuffer<W, H>) {
        if !view.time_valid {
            let glyphs = [&font::DASH, &font::DASH, &font::COLON, &font::DASH, &font::DASH];
            let x = (W as i32 - FrameBuffer::<W, H>::text_width(&glyphs)) / 2;
            frame.draw_text(x, 2, &glyphs, TIME_COLOR);
            return;
        }

        let hour = view.hour % 24;
        let minute = view.minute % 60;
        if view.show_seconds {
            let second = view.second % 60;
            let glyphs = [
                font::digit(hour / 10),
                font::digit(hour % 10),
                &font::COLON,
                font::digit(minute / 10),
                font::digit(minute % 10),
                &font::COLON,
                font::digit(second / 10),
                font::digit(second % 10),
            ];
            let x = (W as i32 - FrameBuffer::<W, H>::text_width(&glyphs)) / 2;
            frame.draw_text(x, 2, &glyphs, TIME_COLOR);
        } else {
            let glyphs = [
                font::digit(hour / 10),
                font::digit(hour % 10),
                &font::COLON,
                font::digit(minute / 10),
                font::digit(minute % 10),
            ];
            let x = (W as i32 - FrameBuffer::<W, H>::text_width(&glyphs)) / 2;
            frame.draw_text(x, 2, &glyphs, TIME_COLOR);
        }
    }

    fn draw_date_row(view: &SceneView, frame: &mut FrameBuffer<W, H>) {
        let day = view.day % 32;
        let month = view.month % 13;
        let glyphs = [
            font::digit(day / 10),
            font::digit(day % 10),
            &font::SLASH,
            font::digit(month / 10),
            font::digit(month % 10),
        ];
        let x = (W as i32 - FrameBuffer::<W, H>::text_width(&glyphs)) / 2;
        frame.draw_text(x, 9, &glyphs, view.date_color);
    }

    fn tick_pet(&mut self, view: &SceneView, frame: &mut FrameBuffer<W, H>) {
        if view.frame % PET_RETARGET_FRAMES == 0 {
            let span = (W as u32).saturating_sub(2).max(1);
            self.pet.set_target_x((view.noise % span) as i32);
        }
        self.pet.tick();
        frame.fill_rect(self.pet.x(), self.pet.y(), 2, 2, PET_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> SceneView {
        SceneView {
            hour: 12,
            minute: 34,
            second: 56,
            day: 8,
            month: 8,
            time_valid: true,
            power_on: true,
            show_seconds: false,
            show_date: true,
            date_color: RGB8::new(0, 255, 0),
            offline: false,
            frame: 1,
            noise: 7,
        }
    }

    fn render(view: &SceneView) -> FrameBuffer<32, 16> {
        let mut scene: ClockScene<32, 16> = ClockScene::new();
        let mut frame = FrameBuffer::new();
        scene.render(view, &mut frame);
        frame
    }

    fn row_lit(frame: &FrameBuffer<32, 16>, ys: core::ops::Range<i32>) -> bool {
        for y in ys {
            for x in 0..32 {
                let pixel = frame.get(x, y as usize);
                if (pixel.r, pixel.g, pixel.b) != (0, 0, 0) {
                    return true;
                }
            }
        }
        false
    }

    #[test]
    fn power_off_blanks_the_matrix() {
        let frame = render(&SceneView {
            power_on: false,
            ..view()
        });
        assert!(frame.is_blank());
    }

    #[test]
    fn offline_substitutes_the_indicator() {
        let frame = render(&SceneView {
            offline: true,
            ..view()
        });
        assert!(!frame.is_blank());
        // Normal content is replaced, so the time row is dark
        assert!(!row_lit(&frame, 2..4));
    }

    #[test]
    fn time_row_renders_when_online() {
        let frame = render(&view());
        assert!(row_lit(&frame, 2..7));
    }

    #[test]
    fn different_minutes_render_differently() {
        let first = render(&view());
        let second = render(&SceneView {
            minute: 35,
            ..view()
        });
        let mut differs = false;
        for y in 0..16 {
            for x in 0..32 {
                if first.get(x, y) != second.get(x, y) {
                    differs = true;
                }
            }
        }
        assert!(differs);
    }

    #[test]
    fn date_row_is_gated_and_tinted() {
        let hidden = render(&SceneView {
            show_date: false,
            ..view()
        });
        assert!(!row_lit(&hidden, 9..14));

        let shown = render(&view());
        let mut found_tint = false;
        for y in 9..14 {
            for x in 0..32 {
                if shown.get(x, y as usize) == RGB8::new(0, 255, 0) {
                    found_tint = true;
                }
            }
        }
        assert!(found_tint);
    }

    #[test]
    fn unsynced_clock_shows_placeholder_not_garbage() {
        let frame = render(&SceneView {
            time_valid: false,
            show_date: true,
            ..view()
        });
        // Dashes on the time row, date row suppressed without a valid date
        assert!(row_lit(&frame, 2..7));
        assert!(!row_lit(&frame, 9..14));
    }
}
