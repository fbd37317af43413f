//! Layout geometry in floating point device-independent units
//!
//! Layout runs on `f32` so that the stacking axis of a panel can be left
//! unconstrained (`f32::INFINITY`) during measurement. Everything is converted
//! to embedded-graphics pixel space only at the drawing boundary.

use embedded_graphics::prelude::{Point as PixelPoint, Size as PixelSize};
use embedded_graphics::primitives::Rectangle;

// ============================================================================
// Size
// ============================================================================

/// Width and height pair used by measurement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size::new(0.0, 0.0);

    /// Unconstrained on both axes.
    pub const INFINITE: Size = Size::new(f32::INFINITY, f32::INFINITY);

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// A size that may be handed to `measure`: no NaN and no negative axis.
    /// Infinite axes are allowed here.
    pub fn is_valid_constraint(&self) -> bool {
        !self.width.is_nan() && !self.height.is_nan() && self.width >= 0.0 && self.height >= 0.0
    }

    /// A size that may be produced by `measure`: finite and non-negative.
    pub fn is_valid_result(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 0.0 && self.height >= 0.0
    }

    /// Shrink by a thickness, never going below zero.
    pub fn deflate(&self, thickness: Thickness) -> Size {
        Size::new(
            (self.width - thickness.horizontal()).max(0.0),
            (self.height - thickness.vertical()).max(0.0),
        )
    }

    pub fn inflate(&self, thickness: Thickness) -> Size {
        Size::new(
            self.width + thickness.horizontal(),
            self.height + thickness.vertical(),
        )
    }

    /// Component-wise minimum.
    pub fn constrain(&self, other: Size) -> Size {
        Size::new(self.width.min(other.width), self.height.min(other.height))
    }

    /// Component-wise maximum.
    pub fn union(&self, other: Size) -> Size {
        Size::new(self.width.max(other.width), self.height.max(other.height))
    }

    /// Replace infinite axes with zero.
    pub fn finite_or_zero(&self) -> Size {
        let f = |v: f32| if v.is_finite() { v } else { 0.0 };
        Size::new(f(self.width), f(self.height))
    }

    pub fn to_pixels(&self) -> PixelSize {
        PixelSize::new(to_pixel_extent(self.width), to_pixel_extent(self.height))
    }
}

// ============================================================================
// Point
// ============================================================================

/// A position in layout space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn relative_to(&self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }

    pub fn to_pixels(&self) -> PixelPoint {
        PixelPoint::new(round_to_pixel(self.x), round_to_pixel(self.y))
    }
}

impl From<PixelPoint> for Point {
    fn from(point: PixelPoint) -> Self {
        Point::new(point.x as f32, point.y as f32)
    }
}

// ============================================================================
// Rect
// ============================================================================

/// Axis-aligned rectangle, origin at the top left.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Finite coordinates and a non-negative finite size.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.y >= self.y && point.x < self.right() && point.y < self.bottom()
    }

    pub fn translate(&self, offset: Point) -> Rect {
        Rect::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }

    pub fn deflate(&self, thickness: Thickness) -> Rect {
        Rect::new(
            self.x + thickness.left,
            self.y + thickness.top,
            (self.width - thickness.horizontal()).max(0.0),
            (self.height - thickness.vertical()).max(0.0),
        )
    }

    pub fn to_rectangle(&self) -> Rectangle {
        Rectangle::new(
            PixelPoint::new(round_to_pixel(self.x), round_to_pixel(self.y)),
            self.size().to_pixels(),
        )
    }
}

impl From<Rectangle> for Rect {
    fn from(rect: Rectangle) -> Self {
        Rect::new(
            rect.top_left.x as f32,
            rect.top_left.y as f32,
            rect.size.width as f32,
            rect.size.height as f32,
        )
    }
}

// ============================================================================
// Thickness
// ============================================================================

/// Per-edge distances used for margins and padding.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Thickness {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Thickness {
    pub const ZERO: Thickness = Thickness::all(0.0);

    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn all(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    /// Same value left/right and top/bottom.
    pub const fn symmetric(horizontal: f32, vertical: f32) -> Self {
        Self::new(horizontal, vertical, horizontal, vertical)
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

// ============================================================================
// Pixel conversion
// ============================================================================

// core has no f32::round without std; half-away-from-zero is enough here
fn round_to_pixel(value: f32) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    if value >= 0.0 {
        (value + 0.5) as i32
    } else {
        (value - 0.5) as i32
    }
}

fn to_pixel_extent(value: f32) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        0
    } else {
        (value + 0.5) as u32
    }
}
