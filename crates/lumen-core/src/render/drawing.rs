//! Drawing capability handed to elements during render

use embedded_graphics::Drawable as _;
use embedded_graphics::geometry::Angle;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    Arc, Circle, Line, PrimitiveStyle, Rectangle, RoundedRectangle,
};
use embedded_graphics::text::{Baseline, Text};

use crate::error::DrawResult;
use crate::geometry::{Point, Rect};
use crate::render::device::GraphicsDevice;
use crate::render::framebuffer::PixelBuffer;

/// Primitive drawing operations in view coordinates.
///
/// Elements only ever see this trait; what backs it (a RAM frame buffer, a
/// display driver, a recording double in tests) is up to the device.
pub trait DrawingContext {
    /// Draw `text` with its top left corner at `position`.
    fn draw_text(
        &mut self,
        position: Point,
        text: &str,
        font: &'static MonoFont<'static>,
        color: Rgb565,
    ) -> DrawResult<()>;

    fn draw_rectangle(&mut self, bounds: Rect, color: Rgb565, filled: bool) -> DrawResult<()>;

    fn draw_rounded_rectangle(
        &mut self,
        bounds: Rect,
        corner_radius: u32,
        color: Rgb565,
        filled: bool,
    ) -> DrawResult<()>;

    fn draw_circle(&mut self, center: Point, radius: u32, color: Rgb565, filled: bool) -> DrawResult<()>;

    fn draw_line(&mut self, start: Point, end: Point, color: Rgb565) -> DrawResult<()>;

    /// Arc outline; angles in degrees, 0 pointing right, growing clockwise.
    fn draw_arc(
        &mut self,
        center: Point,
        radius: u32,
        start_degrees: f32,
        sweep_degrees: f32,
        color: Rgb565,
    ) -> DrawResult<()>;

    /// Fill `bounds` blending from `start` on the left to `end` on the right.
    fn draw_horizontal_gradient(&mut self, bounds: Rect, start: Rgb565, end: Rgb565) -> DrawResult<()>;

    /// Fill `bounds` blending from `start` at the top to `end` at the bottom.
    fn draw_vertical_gradient(&mut self, bounds: Rect, start: Rgb565, end: Rgb565) -> DrawResult<()>;

    /// Copy an off-screen buffer, skipping pixels equal to `transparent`.
    fn draw_buffer(
        &mut self,
        position: Point,
        buffer: &PixelBuffer,
        transparent: Option<Rgb565>,
    ) -> DrawResult<()>;

    /// Push the frame to the display.
    fn show(&mut self) -> DrawResult<()>;

    /// Fill the whole frame with `color`.
    fn clear(&mut self, color: Rgb565) -> DrawResult<()>;
}

/// [`DrawingContext`] bound to a device's frame buffer.
pub struct DeviceContext<'a, G: GraphicsDevice + ?Sized> {
    device: &'a mut G,
}

impl<'a, G: GraphicsDevice + ?Sized> DeviceContext<'a, G> {
    pub fn new(device: &'a mut G) -> Self {
        Self { device }
    }

    fn frame(&mut self) -> &mut PixelBuffer {
        self.device.frame()
    }
}

fn stroke_or_fill(color: Rgb565, filled: bool) -> PrimitiveStyle<Rgb565> {
    if filled {
        PrimitiveStyle::with_fill(color)
    } else {
        PrimitiveStyle::with_stroke(color, 1)
    }
}

fn lerp_channel(start: u8, end: u8, step: u32, steps: u32) -> u8 {
    if steps <= 1 {
        return start;
    }
    let start = start as i32;
    let end = end as i32;
    (start + (end - start) * step as i32 / (steps - 1) as i32) as u8
}

/// Color `step` of `steps` on the way from `start` to `end`.
pub(crate) fn blend(start: Rgb565, end: Rgb565, step: u32, steps: u32) -> Rgb565 {
    Rgb565::new(
        lerp_channel(start.r(), end.r(), step, steps),
        lerp_channel(start.g(), end.g(), step, steps),
        lerp_channel(start.b(), end.b(), step, steps),
    )
}

impl<G: GraphicsDevice + ?Sized> DrawingContext for DeviceContext<'_, G> {
    fn draw_text(
        &mut self,
        position: Point,
        text: &str,
        font: &'static MonoFont<'static>,
        color: Rgb565,
    ) -> DrawResult<()> {
        let style = MonoTextStyle::new(font, color);
        Text::with_baseline(text, position.to_pixels(), style, Baseline::Top)
            .draw(self.frame())
            .map(|_| ())
            .into_ok()
    }

    fn draw_rectangle(&mut self, bounds: Rect, color: Rgb565, filled: bool) -> DrawResult<()> {
        bounds
            .to_rectangle()
            .into_styled(stroke_or_fill(color, filled))
            .draw(self.frame())
            .into_ok()
    }

    fn draw_rounded_rectangle(
        &mut self,
        bounds: Rect,
        corner_radius: u32,
        color: Rgb565,
        filled: bool,
    ) -> DrawResult<()> {
        let corners = Size::new(corner_radius, corner_radius);
        RoundedRectangle::with_equal_corners(bounds.to_rectangle(), corners)
            .into_styled(stroke_or_fill(color, filled))
            .draw(self.frame())
            .into_ok()
    }

    fn draw_circle(&mut self, center: Point, radius: u32, color: Rgb565, filled: bool) -> DrawResult<()> {
        Circle::with_center(center.to_pixels(), radius * 2)
            .into_styled(stroke_or_fill(color, filled))
            .draw(self.frame())
            .into_ok()
    }

    fn draw_line(&mut self, start: Point, end: Point, color: Rgb565) -> DrawResult<()> {
        Line::new(start.to_pixels(), end.to_pixels())
            .into_styled(PrimitiveStyle::with_stroke(color, 1))
            .draw(self.frame())
            .into_ok()
    }

    fn draw_arc(
        &mut self,
        center: Point,
        radius: u32,
        start_degrees: f32,
        sweep_degrees: f32,
        color: Rgb565,
    ) -> DrawResult<()> {
        Arc::with_center(
            center.to_pixels(),
            radius * 2,
            Angle::from_degrees(start_degrees),
            Angle::from_degrees(sweep_degrees),
        )
        .into_styled(PrimitiveStyle::with_stroke(color, 1))
        .draw(self.frame())
        .into_ok()
    }

    fn draw_horizontal_gradient(&mut self, bounds: Rect, start: Rgb565, end: Rgb565) -> DrawResult<()> {
        let area = bounds.to_rectangle();
        let steps = area.size.width;
        let frame = self.frame();
        for step in 0..steps {
            let column = Rectangle::new(
                area.top_left + embedded_graphics::prelude::Point::new(step as i32, 0),
                Size::new(1, area.size.height),
            );
            frame.fill_solid(&column, blend(start, end, step, steps)).into_ok()?;
        }
        Ok(())
    }

    fn draw_vertical_gradient(&mut self, bounds: Rect, start: Rgb565, end: Rgb565) -> DrawResult<()> {
        let area = bounds.to_rectangle();
        let steps = area.size.height;
        let frame = self.frame();
        for step in 0..steps {
            let row = Rectangle::new(
                area.top_left + embedded_graphics::prelude::Point::new(0, step as i32),
                Size::new(area.size.width, 1),
            );
            frame.fill_solid(&row, blend(start, end, step, steps)).into_ok()?;
        }
        Ok(())
    }

    fn draw_buffer(
        &mut self,
        position: Point,
        buffer: &PixelBuffer,
        transparent: Option<Rgb565>,
    ) -> DrawResult<()> {
        let origin = position.to_pixels();
        let width = buffer.width() as usize;
        let pixels = buffer
            .pixels()
            .iter()
            .enumerate()
            .filter(|(_, color)| Some(**color) != transparent)
            .map(|(index, &color)| {
                let offset = embedded_graphics::prelude::Point::new(
                    (index % width) as i32,
                    (index / width) as i32,
                );
                Pixel(origin + offset, color)
            });
        self.frame().draw_iter(pixels).into_ok()
    }

    fn show(&mut self) -> DrawResult<()> {
        self.device.show()
    }

    fn clear(&mut self, color: Rgb565) -> DrawResult<()> {
        self.device.clear(color)
    }
}

/// The frame buffer cannot fail; lift its results into [`DrawResult`].
trait IntoDrawResult<T> {
    fn into_ok(self) -> DrawResult<T>;
}

impl<T> IntoDrawResult<T> for Result<T, core::convert::Infallible> {
    fn into_ok(self) -> DrawResult<T> {
        match self {
            Ok(value) => Ok(value),
            Err(never) => match never {},
        }
    }
}
