//! Graphics devices: a frame to draw into and a way to present it

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use log::warn;

use crate::error::{DrawError, DrawResult};
use crate::render::framebuffer::PixelBuffer;

/// Something a view can be drawn onto.
pub trait GraphicsDevice {
    /// Frame dimensions in pixels.
    fn size(&self) -> Size;

    /// The frame all drawing goes to.
    fn frame(&mut self) -> &mut PixelBuffer;

    /// Present the frame.
    fn show(&mut self) -> DrawResult<()>;

    /// Fill the frame with `color`.
    fn clear(&mut self, color: Rgb565) -> DrawResult<()> {
        match self.frame().clear(color) {
            Ok(()) => Ok(()),
            Err(never) => match never {},
        }
    }

    /// Off-screen buffer compatible with this device's frame.
    fn create_buffer(&self, width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::new(width, height)
    }
}

/// A RAM frame in front of a display driver.
///
/// Every frame is drawn from scratch into `frame`. On
/// [`show`](GraphicsDevice::show) it is compared against the last frame that
/// was presented and only the bounding box of the differences is sent to the
/// display.
pub struct BufferedDisplay<D> {
    frame: PixelBuffer,
    shown: PixelBuffer,
    display: D,
}

impl<D> BufferedDisplay<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    pub fn new(display: D) -> Self {
        let size = display.bounding_box().size;
        let frame = PixelBuffer::new(size.width, size.height);
        let mut shown = frame.clone();
        // the panel content is unknown until the first full push
        shown.mark_all_dirty();
        Self {
            frame,
            shown,
            display,
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// The last frame sent to the display.
    pub fn shown(&self) -> &PixelBuffer {
        &self.shown
    }

    pub fn into_inner(self) -> D {
        self.display
    }
}

impl<D> GraphicsDevice for BufferedDisplay<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    fn size(&self) -> Size {
        Size::new(self.frame.width(), self.frame.height())
    }

    fn frame(&mut self) -> &mut PixelBuffer {
        &mut self.frame
    }

    fn show(&mut self) -> DrawResult<()> {
        self.shown.copy_from(&self.frame);
        self.shown.flush(&mut self.display).map_err(|_| {
            warn!("Display rejected frame flush");
            DrawError::Target
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::render::{DeviceContext, DrawingContext};

    fn draw_square(device: &mut BufferedDisplay<PixelBuffer>) {
        let mut context = DeviceContext::new(device);
        context.clear(Rgb565::BLACK).unwrap();
        context
            .draw_rectangle(Rect::new(2.0, 2.0, 4.0, 4.0), Rgb565::RED, true)
            .unwrap();
        context.show().unwrap();
    }

    #[test]
    fn show_pushes_drawn_pixels_to_the_display() {
        let mut device = BufferedDisplay::new(PixelBuffer::new(20, 10));
        assert_eq!(device.size(), Size::new(20, 10));

        draw_square(&mut device);
        assert_eq!(device.display().pixel(3, 3), Some(Rgb565::RED));
        assert_eq!(device.display().pixel(10, 3), Some(Rgb565::BLACK));
    }

    #[test]
    fn an_identical_frame_sends_nothing() {
        let mut device = BufferedDisplay::new(PixelBuffer::new(20, 10));
        draw_square(&mut device);
        // forget what the first push touched
        device.display_mut().flush(&mut PixelBuffer::new(20, 10)).unwrap();

        draw_square(&mut device);
        assert_eq!(device.display().dirty_area(), None);
        assert_eq!(device.shown().dirty_area(), None);
    }

    #[test]
    fn clear_fills_the_frame_only() {
        let mut device = BufferedDisplay::new(PixelBuffer::new(4, 4));
        device.clear(Rgb565::BLUE).unwrap();
        assert_eq!(device.frame().pixel(0, 0), Some(Rgb565::BLUE));
        assert_eq!(device.display().pixel(0, 0), Some(Rgb565::BLACK));
    }
}
