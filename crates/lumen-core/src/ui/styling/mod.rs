//! Styling: colors, background brushes and revertible styles
//!
//! - [`colors`] - RGB565 constants and the widget palette
//! - [`brush`] - how an element paints its background
//! - [`style`] - named property setters with apply/revert

pub mod brush;
pub mod colors;
pub mod style;

pub use brush::Brush;
pub use colors::{
    BLACK, COLOR_ACCENT, COLOR_BACKGROUND, COLOR_ERROR, COLOR_STROKE, COLOR_SURFACE, ColorPalette,
    DARK_GRAY, LIGHT_GRAY, WHITE,
};
pub use style::{AppliedStyle, Style};
