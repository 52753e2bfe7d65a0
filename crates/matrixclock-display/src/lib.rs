//! Clock scene rendering for the matrixclock firmware
//!
//! Pure pixel pushing: a framebuffer over `smart_leds::RGB8`, a small
//! built-in digit font, target-seeking sprite movement and the clock scene
//! that composes them. Everything renders from plain values (time of day,
//! entity-derived flags), so the whole crate runs on a host toolchain; the
//! firmware maps the framebuffer onto the physical LED chain.

#![no_std]

pub mod font;
pub mod frame;
pub mod scene;
pub mod sprite;

pub use frame::FrameBuffer;
pub use scene::{ClockScene, SceneView};
pub use sprite::AnimatedSprite;
