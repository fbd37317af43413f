//! Toolkit configuration, persisted with postcard

use alloc::vec::Vec;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::pixelcolor::raw::{RawData, RawU16};
use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use crate::geometry::Size as LayoutSize;
use crate::layout_manager::MAX_LAYOUT_PASSES;
use crate::ui::styling::COLOR_BACKGROUND;

/// Settings for the view manager and its frame pump.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiConfig {
    /// Target frame rate of the pump
    pub max_fps: u32,
    /// Raw RGB565 color each frame is cleared with
    pub clear_color: u16,
    /// Inner passes allowed per layout pass
    pub max_layout_passes: u32,
    /// Sleep between checks while rendering is paused
    pub pause_poll_ms: u32,
    pub display_width: u16,
    pub display_height: u16,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            max_fps: 30,
            clear_color: RawU16::from(COLOR_BACKGROUND).into_inner(),
            max_layout_passes: MAX_LAYOUT_PASSES as u32,
            pause_poll_ms: 10,
            display_width: 320,
            display_height: 240,
        }
    }
}

impl UiConfig {
    /// Decode a config written by [`UiConfig::to_vec`].
    pub fn from_bytes(bytes: &[u8]) -> postcard::Result<Self> {
        postcard::from_bytes(bytes)
    }

    pub fn to_vec(&self) -> postcard::Result<Vec<u8>> {
        postcard::to_allocvec(self)
    }

    pub fn clear_color(&self) -> Rgb565 {
        Rgb565::from(RawU16::new(self.clear_color))
    }

    pub fn with_clear_color(mut self, color: Rgb565) -> Self {
        self.clear_color = RawU16::from(color).into_inner();
        self
    }

    /// Time budget of one frame. A zero `max_fps` is treated as 1.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.max_fps.max(1)))
    }

    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(u64::from(self.pause_poll_ms))
    }

    /// Pass cap, never below one.
    pub fn layout_passes(&self) -> usize {
        (self.max_layout_passes as usize).max(1)
    }

    pub fn display_size(&self) -> LayoutSize {
        LayoutSize::new(f32::from(self.display_width), f32::from(self.display_height))
    }
}
