//! RAM pixel buffer with per-pixel change detection.
//!
//! Views draw into this buffer instead of the display. After a frame is drawn
//! only the rectangular region containing changed pixels is flushed to the
//! hardware display, in a single `fill_contiguous` call.

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

/// Bounding box of pixels that have changed since the last flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DirtyRect {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl DirtyRect {
    fn from_point(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn expand(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn to_rectangle(self) -> Rectangle {
        Rectangle::new(
            Point::new(self.min_x as i32, self.min_y as i32),
            Size::new(
                (self.max_x - self.min_x + 1) as u32,
                (self.max_y - self.min_y + 1) as u32,
            ),
        )
    }
}

/// Heap pixel buffer implementing `DrawTarget<Color = Rgb565>`.
///
/// Used both as a view's frame buffer and as an off-screen buffer for
/// [`DrawingContext::draw_buffer`](crate::render::DrawingContext::draw_buffer).
/// Writes that leave a pixel unchanged do not grow the dirty region.
#[derive(Clone)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgb565>,
    dirty: Option<DirtyRect>,
}

impl PixelBuffer {
    /// Allocate a buffer filled with black pixels.
    pub fn new(width: u32, height: u32) -> Self {
        let width = width as usize;
        let height = height as usize;
        Self {
            width,
            height,
            pixels: vec![Rgb565::BLACK; width * height],
            dirty: None,
        }
    }

    /// Wrap existing pixel data. Returns `None` when the length does not
    /// match the dimensions.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Rgb565>) -> Option<Self> {
        let (width, height) = (width as usize, height as usize);
        (pixels.len() == width * height).then_some(Self {
            width,
            height,
            pixels,
            dirty: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.width as u32
    }

    pub fn height(&self) -> u32 {
        self.height as u32
    }

    /// Row-major pixel data.
    pub fn pixels(&self) -> &[Rgb565] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb565> {
        let (x, y) = (x as usize, y as usize);
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    /// Region changed since the last flush.
    pub fn dirty_area(&self) -> Option<Rectangle> {
        self.dirty.map(DirtyRect::to_rectangle)
    }

    /// Force the next flush to send the whole buffer.
    pub fn mark_all_dirty(&mut self) {
        if self.width > 0 && self.height > 0 {
            self.dirty = Some(DirtyRect {
                min_x: 0,
                min_y: 0,
                max_x: self.width - 1,
                max_y: self.height - 1,
            });
        }
    }

    /// Copy the overlapping region of `source`, tracking changes as usual.
    pub fn copy_from(&mut self, source: &PixelBuffer) {
        let width = self.width.min(source.width);
        let height = self.height.min(source.height);
        for y in 0..height {
            let row = &source.pixels[y * source.width..y * source.width + width];
            for (x, &color) in row.iter().enumerate() {
                self.set_pixel(x, y, color);
            }
        }
    }

    /// Write a single pixel, expanding the dirty rect only if the color changed.
    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb565) {
        let idx = y * self.width + x;
        if self.pixels[idx] != color {
            self.pixels[idx] = color;
            match &mut self.dirty {
                Some(rect) => rect.expand(x, y),
                None => self.dirty = Some(DirtyRect::from_point(x, y)),
            }
        }
    }

    /// Flush the dirty region to a display, then reset the dirty state.
    ///
    /// If nothing changed, this is a no-op.
    pub fn flush<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let Some(rect) = self.dirty.take() else {
            return Ok(());
        };

        let area = rect.to_rectangle();
        let width = area.size.width as usize;
        debug!(
            "Flushing {}x{} dirty region at ({}, {})",
            area.size.width, area.size.height, rect.min_x, rect.min_y
        );

        // shared borrow of the pixels so the iterator does not capture `self`
        let pixels = &self.pixels;
        let stride = self.width;
        let pixel_iter = (rect.min_y..=rect.max_y).flat_map(move |y| {
            let row_start = y * stride + rect.min_x;
            pixels[row_start..row_start + width].iter().copied()
        });

        display.fill_contiguous(&area, pixel_iter)
    }
}

impl core::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl OriginDimensions for PixelBuffer {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for PixelBuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (w, h) = (self.width, self.height);
        for Pixel(coord, color) in pixels {
            let x = coord.x;
            let y = coord.y;
            if x >= 0 && y >= 0 && (x as usize) < w && (y as usize) < h {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let (w, h) = (self.width as i32, self.height as i32);
        let mut colors = colors.into_iter();
        for point in area.points() {
            let Some(color) = colors.next() else {
                break;
            };
            if point.x >= 0 && point.y >= 0 && point.x < w && point.y < h {
                self.set_pixel(point.x as usize, point.y as usize, color);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let clipped = area.intersection(&self.bounding_box());
        let Some(bottom_right) = clipped.bottom_right() else {
            return Ok(());
        };

        for y in clipped.top_left.y..=bottom_right.y {
            for x in clipped.top_left.x..=bottom_right.x {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        for y in 0..self.height {
            for x in 0..self.width {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    #[test]
    fn unchanged_writes_stay_clean() {
        let mut buffer = PixelBuffer::new(8, 8);
        buffer.clear(Rgb565::BLACK).unwrap();
        assert_eq!(buffer.dirty_area(), None);
    }

    #[test]
    fn dirty_area_is_the_bounding_box_of_changes() {
        let mut buffer = PixelBuffer::new(16, 16);
        Pixel(Point::new(2, 3), Rgb565::RED).draw(&mut buffer).unwrap();
        Pixel(Point::new(6, 1), Rgb565::RED).draw(&mut buffer).unwrap();

        assert_eq!(
            buffer.dirty_area(),
            Some(Rectangle::new(Point::new(2, 1), Size::new(5, 3)))
        );
    }

    #[test]
    fn flush_copies_only_the_dirty_region_and_resets() {
        let mut buffer = PixelBuffer::new(10, 10);
        let mut display = PixelBuffer::new(10, 10);
        Rectangle::new(Point::new(4, 4), Size::new(2, 2))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::GREEN))
            .draw(&mut buffer)
            .unwrap();

        buffer.flush(&mut display).unwrap();
        assert_eq!(display.pixel(5, 5), Some(Rgb565::GREEN));
        assert_eq!(display.pixel(3, 3), Some(Rgb565::BLACK));
        assert_eq!(
            display.dirty_area(),
            Some(Rectangle::new(Point::new(4, 4), Size::new(2, 2)))
        );
        assert_eq!(buffer.dirty_area(), None);
    }

    #[test]
    fn copy_from_marks_only_differences() {
        let mut shown = PixelBuffer::new(8, 8);
        let mut frame = PixelBuffer::new(8, 8);
        Pixel(Point::new(7, 7), Rgb565::WHITE).draw(&mut frame).unwrap();

        shown.copy_from(&frame);
        assert_eq!(
            shown.dirty_area(),
            Some(Rectangle::new(Point::new(7, 7), Size::new(1, 1)))
        );
        assert_eq!(shown.pixel(7, 7), Some(Rgb565::WHITE));
    }

    #[test]
    fn fill_solid_clips_to_the_buffer() {
        let mut buffer = PixelBuffer::new(4, 4);
        buffer
            .fill_solid(&Rectangle::new(Point::new(-2, 2), Size::new(10, 10)), Rgb565::BLUE)
            .unwrap();
        assert_eq!(buffer.pixel(0, 3), Some(Rgb565::BLUE));
        assert_eq!(buffer.pixel(0, 1), Some(Rgb565::BLACK));
    }
}
