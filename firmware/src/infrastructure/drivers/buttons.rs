//! Front button inputs
//!
//! Two active-low buttons with internal pull-ups, edge-detected by the
//! polling task.

use esp_hal::gpio::interconnect::PeripheralInput;
use esp_hal::gpio::{Input, InputConfig, Pull};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ButtonEvent {
    Up,
    Down,
}

pub(crate) struct Buttons<'a> {
    up: Input<'a>,
    down: Input<'a>,
    up_was_pressed: bool,
    down_was_pressed: bool,
}

impl<'a> Buttons<'a> {
    pub(crate) fn new<U, D>(up_pin: U, down_pin: D) -> Self
    where
        U: PeripheralInput<'a>,
        D: PeripheralInput<'a>,
    {
        Self {
            up: Input::new(up_pin, InputConfig::default().with_pull(Pull::Up)),
            down: Input::new(down_pin, InputConfig::default().with_pull(Pull::Up)),
            up_was_pressed: false,
            down_was_pressed: false,
        }
    }

    /// Report a press edge, if any. Call on a fixed cadence; the poll
    /// interval doubles as the debounce window.
    pub(crate) fn poll(&mut self) -> Option<ButtonEvent> {
        let up_pressed = self.up.is_low();
        let down_pressed = self.down.is_low();

        let event = if up_pressed && !self.up_was_pressed {
            Some(ButtonEvent::Up)
        } else if down_pressed && !self.down_was_pressed {
            Some(ButtonEvent::Down)
        } else {
            None
        };

        self.up_was_pressed = up_pressed;
        self.down_was_pressed = down_pressed;
        event
    }
}
