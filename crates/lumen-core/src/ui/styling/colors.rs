//! Color constants and palettes
//!
//! Everything is RGB565, the native format of the small SPI panels this
//! toolkit targets. To convert from 8-bit RGB: R>>3, G>>2, B>>3.

use embedded_graphics::pixelcolor::Rgb565;

// ============================================================================
// Base Colors
// ============================================================================

/// Default view background - very dark gray-blue
pub const COLOR_BACKGROUND: Rgb565 = Rgb565::new(18 >> 3, 23 >> 2, 24 >> 3);

/// Surface color for panels and cards
pub const COLOR_SURFACE: Rgb565 = Rgb565::new(26 >> 3, 32 >> 2, 33 >> 3);

/// Border/stroke color - medium gray
pub const COLOR_STROKE: Rgb565 = Rgb565::new(43 >> 3, 55 >> 2, 57 >> 3);

/// Accent used for interactive elements - teal
pub const COLOR_ACCENT: Rgb565 = Rgb565::new(45 >> 3, 212 >> 2, 191 >> 3);

/// Error and alert color - muted red
pub const COLOR_ERROR: Rgb565 = Rgb565::new(190 >> 3, 95 >> 2, 95 >> 3);

// ============================================================================
// Text Colors
// ============================================================================

pub const WHITE: Rgb565 = Rgb565::new(31, 63, 31);

pub const BLACK: Rgb565 = Rgb565::new(0, 0, 0);

/// Light gray - for secondary text
pub const LIGHT_GRAY: Rgb565 = Rgb565::new(21, 42, 21);

/// Dark gray - for subtle text
pub const DARK_GRAY: Rgb565 = Rgb565::new(10, 20, 10);

// ============================================================================
// Color Palette
// ============================================================================

/// Colors shared by the built-in widgets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorPalette {
    /// Accent for focus and interactive outlines
    pub accent: Rgb565,
    /// View clear color
    pub background: Rgb565,
    /// Panels and cards
    pub surface: Rgb565,
    pub error: Rgb565,
    pub text_primary: Rgb565,
    pub text_secondary: Rgb565,
    pub border: Rgb565,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::dark()
    }
}

impl ColorPalette {
    /// Light text on dark backgrounds
    pub const fn dark() -> Self {
        Self {
            accent: COLOR_ACCENT,
            background: COLOR_BACKGROUND,
            surface: COLOR_SURFACE,
            error: COLOR_ERROR,
            text_primary: WHITE,
            text_secondary: LIGHT_GRAY,
            border: COLOR_STROKE,
        }
    }

    /// Dark text on light backgrounds
    pub const fn light() -> Self {
        Self {
            accent: COLOR_ACCENT,
            background: WHITE,
            surface: LIGHT_GRAY,
            error: COLOR_ERROR,
            text_primary: COLOR_BACKGROUND,
            text_secondary: DARK_GRAY,
            border: COLOR_STROKE,
        }
    }
}
