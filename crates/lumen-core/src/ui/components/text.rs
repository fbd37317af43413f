//! Text element sized by its font's glyph metrics

use alloc::string::String;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle, ascii};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::{Point as PixelPoint, RgbColor};
use embedded_graphics::text::Baseline;
use embedded_graphics::text::renderer::TextRenderer;

use crate::binding::ReactiveProperty;
use crate::error::{DrawResult, LayoutResult, PropertyResult};
use crate::geometry::{Rect, Size};
use crate::render::DrawingContext;
use crate::ui::context::LayoutContext;
use crate::ui::element::{Affects, Element, ElementBase};

/// Text size variants
///
/// Provides three preset text sizes with corresponding embedded-graphics fonts:
/// - `Small`: 5x8 font
/// - `Medium`: 6x10 font (default)
/// - `Large`: 10x20 font
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl TextSize {
    pub fn font(&self) -> &'static MonoFont<'static> {
        match self {
            TextSize::Small => &ascii::FONT_5X8,
            TextSize::Medium => &ascii::FONT_6X10,
            TextSize::Large => &ascii::FONT_10X20,
        }
    }
}

/// Extent of `text` drawn in `font`, one line per `\n`.
pub fn measure_text(text: &str, font: &'static MonoFont<'static>) -> Size {
    if text.is_empty() {
        return Size::ZERO;
    }
    let style = MonoTextStyle::new(font, Rgb565::WHITE);
    let mut width = 0u32;
    let mut lines = 0u32;
    for line in text.split('\n') {
        let metrics = style.measure_string(line, PixelPoint::zero(), Baseline::Top);
        width = width.max(metrics.bounding_box.size.width);
        lines += 1;
    }
    Size::new(
        width as f32,
        (lines * font.character_size.height) as f32,
    )
}

/// A run of text in a single mono font and color.
///
/// Desired size is the text extent unless width or height is set
/// explicitly. The text is drawn from the top left of the arranged bounds.
///
/// # Examples
/// ```ignore
/// let title = tree.insert(TextBlock::new("Weather").with_size(TextSize::Large))?;
/// ```
pub struct TextBlock {
    text: ReactiveProperty<String>,
    size: ReactiveProperty<TextSize>,
    color: ReactiveProperty<Rgb565>,
}

impl TextBlock {
    pub fn new(text: &str) -> Self {
        Self {
            text: ReactiveProperty::new("text", String::from(text)),
            size: ReactiveProperty::new("text_size", TextSize::default()),
            color: ReactiveProperty::new("color", Rgb565::WHITE),
        }
    }

    pub fn with_size(self, size: TextSize) -> Self {
        self.size.set(size);
        self
    }

    pub fn with_color(self, color: Rgb565) -> Self {
        self.color.set(color);
        self
    }

    pub fn text(&self) -> &ReactiveProperty<String> {
        &self.text
    }

    pub fn size(&self) -> &ReactiveProperty<TextSize> {
        &self.size
    }

    pub fn color(&self) -> &ReactiveProperty<Rgb565> {
        &self.color
    }
}

impl Element for TextBlock {
    fn bind(&mut self, base: &ElementBase) -> PropertyResult<()> {
        base.register(&self.text, Affects::Measure)?;
        base.register(&self.size, Affects::Measure)?;
        base.register(&self.color, Affects::Render)
    }

    fn measure_override(&mut self, cx: &mut LayoutContext<'_>, _available: Size) -> LayoutResult<Size> {
        let font = self.size.get().font();
        let extent = self.text.with(|text| measure_text(text, font));
        let base = cx.base();
        Ok(Size::new(
            base.width().get().unwrap_or(extent.width),
            base.height().get().unwrap_or(extent.height),
        ))
    }

    fn arrange_override(&mut self, _cx: &mut LayoutContext<'_>, final_size: Size) -> LayoutResult<Size> {
        Ok(final_size)
    }

    fn render(&self, base: &ElementBase, context: &mut dyn DrawingContext, bounds: Rect) -> DrawResult<()> {
        base.background().with(|brush| brush.draw(context, bounds))?;
        let font = self.size.get().font();
        let color = self.color.get();
        self.text
            .with(|text| context.draw_text(bounds.origin(), text, font, color))
    }
}
