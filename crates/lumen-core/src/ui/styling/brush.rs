//! Background brushes

use embedded_graphics::pixelcolor::Rgb565;

use crate::error::DrawResult;
use crate::geometry::Rect;
use crate::render::DrawingContext;

/// How an element paints its background.
///
/// # Examples
/// ```ignore
/// base.background().set(Brush::rounded(COLOR_ACCENT, 3, true));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Brush {
    /// Nothing is drawn
    #[default]
    None,
    /// Rectangle covering the bounds; rounded when `corner_radius > 0`
    Rectangle {
        color: Rgb565,
        filled: bool,
        corner_radius: u32,
    },
    /// Circle centered in the bounds
    Circle {
        color: Rgb565,
        filled: bool,
        radius: u32,
    },
}

impl Brush {
    pub const fn filled(color: Rgb565) -> Self {
        Brush::Rectangle {
            color,
            filled: true,
            corner_radius: 0,
        }
    }

    pub const fn outline(color: Rgb565) -> Self {
        Brush::Rectangle {
            color,
            filled: false,
            corner_radius: 0,
        }
    }

    pub const fn rounded(color: Rgb565, corner_radius: u32, filled: bool) -> Self {
        Brush::Rectangle {
            color,
            filled,
            corner_radius,
        }
    }

    pub const fn circle(color: Rgb565, radius: u32, filled: bool) -> Self {
        Brush::Circle {
            color,
            filled,
            radius,
        }
    }

    /// Paint into `bounds` (view coordinates).
    pub fn draw(&self, context: &mut dyn DrawingContext, bounds: Rect) -> DrawResult<()> {
        match *self {
            Brush::None => Ok(()),
            Brush::Rectangle {
                color,
                filled,
                corner_radius: 0,
            } => context.draw_rectangle(bounds, color, filled),
            Brush::Rectangle {
                color,
                filled,
                corner_radius,
            } => context.draw_rounded_rectangle(bounds, corner_radius, color, filled),
            Brush::Circle {
                color,
                filled,
                radius,
            } => context.draw_circle(bounds.center(), radius, color, filled),
        }
    }
}
