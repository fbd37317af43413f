//! Single-child container with padding and content alignment

use crate::binding::ReactiveProperty;
use crate::error::{LayoutResult, PropertyResult};
use crate::geometry::{Point, Rect, Size, Thickness};
use crate::ui::context::LayoutContext;
use crate::ui::core::Alignment;
use crate::ui::element::{Affects, ChildSlot, Element, ElementBase, ElementId};
use crate::ui::tree::align_offset;

/// Hosts at most one child, inset by `padding`.
///
/// The content is placed with the control's *content* alignment, which is
/// independent of the alignment the control itself has inside its parent.
/// Every view root is a content control.
pub struct ContentControl {
    content: Option<ElementId>,
    padding: ReactiveProperty<Thickness>,
    horizontal_content_alignment: ReactiveProperty<Alignment>,
    vertical_content_alignment: ReactiveProperty<Alignment>,
}

impl Default for ContentControl {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentControl {
    pub fn new() -> Self {
        Self {
            content: None,
            padding: ReactiveProperty::new("padding", Thickness::ZERO),
            horizontal_content_alignment: ReactiveProperty::new(
                "horizontal_content_alignment",
                Alignment::Stretch,
            ),
            vertical_content_alignment: ReactiveProperty::new(
                "vertical_content_alignment",
                Alignment::Stretch,
            ),
        }
    }

    pub fn with_padding(self, padding: Thickness) -> Self {
        self.padding.set(padding);
        self
    }

    pub fn with_content_alignment(self, horizontal: Alignment, vertical: Alignment) -> Self {
        self.horizontal_content_alignment.set(horizontal);
        self.vertical_content_alignment.set(vertical);
        self
    }

    pub fn content(&self) -> Option<ElementId> {
        self.content
    }

    pub fn padding(&self) -> &ReactiveProperty<Thickness> {
        &self.padding
    }

    pub fn horizontal_content_alignment(&self) -> &ReactiveProperty<Alignment> {
        &self.horizontal_content_alignment
    }

    pub fn vertical_content_alignment(&self) -> &ReactiveProperty<Alignment> {
        &self.vertical_content_alignment
    }

    /// Register the content properties on `base`. Shared with widgets that
    /// embed a content control.
    pub(crate) fn bind_properties(&self, base: &ElementBase) -> PropertyResult<()> {
        base.register(&self.padding, Affects::Measure)?;
        base.register(&self.horizontal_content_alignment, Affects::Arrange)?;
        base.register(&self.vertical_content_alignment, Affects::Arrange)
    }

    pub(crate) fn slot(&mut self) -> ChildSlot<'_> {
        ChildSlot::Single(&mut self.content)
    }

    pub(crate) fn measure_content(
        &self,
        cx: &mut LayoutContext<'_>,
        available: Size,
    ) -> LayoutResult<Size> {
        let Some(content) = self.content else {
            return Ok(cx.natural_size(available));
        };

        let padding = self.padding.get();
        cx.measure(content, available.deflate(padding))?;
        let desired = cx.desired_size(content).inflate(padding);

        let base = cx.base();
        Ok(Size::new(
            base.width().get().unwrap_or(0.0).max(desired.width),
            base.height().get().unwrap_or(0.0).max(desired.height),
        ))
    }

    pub(crate) fn arrange_content(
        &self,
        cx: &mut LayoutContext<'_>,
        final_size: Size,
    ) -> LayoutResult<Size> {
        let Some(content) = self.content else {
            return Ok(final_size);
        };

        let padding = self.padding.get();
        let inner = Rect::from_size(final_size).deflate(padding);
        let desired = cx.desired_size(content);
        let horizontal = self.horizontal_content_alignment.get();
        let vertical = self.vertical_content_alignment.get();

        let mut size = inner.size();
        if horizontal != Alignment::Stretch {
            size.width = size.width.min(desired.width);
        }
        if vertical != Alignment::Stretch {
            size.height = size.height.min(desired.height);
        }

        let origin = Point::new(
            inner.x + align_offset(horizontal, inner.width, size.width),
            inner.y + align_offset(vertical, inner.height, size.height),
        );
        cx.arrange(content, Rect::from_origin_size(origin, size))?;
        Ok(final_size)
    }
}

impl Element for ContentControl {
    fn bind(&mut self, base: &ElementBase) -> PropertyResult<()> {
        self.bind_properties(base)
    }

    fn child_count(&self) -> usize {
        usize::from(self.content.is_some())
    }

    fn child_at(&self, index: usize) -> Option<ElementId> {
        if index == 0 { self.content } else { None }
    }

    fn child_slot(&mut self) -> Option<ChildSlot<'_>> {
        Some(self.slot())
    }

    fn measure_override(&mut self, cx: &mut LayoutContext<'_>, available: Size) -> LayoutResult<Size> {
        self.measure_content(cx, available)
    }

    fn arrange_override(&mut self, cx: &mut LayoutContext<'_>, final_size: Size) -> LayoutResult<Size> {
        self.arrange_content(cx, final_size)
    }
}
