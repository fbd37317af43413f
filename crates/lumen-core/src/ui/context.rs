//! Access to the tree from inside a measure or arrange override

use alloc::rc::Rc;

use crate::error::LayoutResult;
use crate::geometry::{Rect, Size};
use crate::ui::core::Alignment;
use crate::ui::element::{ElementBase, ElementId};
use crate::ui::tree::ElementTree;

/// Handed to [`Element::measure_override`](crate::ui::Element::measure_override)
/// and [`Element::arrange_override`](crate::ui::Element::arrange_override).
///
/// Exposes the element's own base plus measure/arrange of its children.
/// Structural edits are deliberately not reachable from here.
pub struct LayoutContext<'a> {
    tree: &'a mut ElementTree,
    base: Rc<ElementBase>,
}

impl<'a> LayoutContext<'a> {
    pub(crate) fn new(tree: &'a mut ElementTree, base: Rc<ElementBase>) -> Self {
        Self { tree, base }
    }

    /// The element being laid out.
    pub fn base(&self) -> &ElementBase {
        &self.base
    }

    pub fn id(&self) -> ElementId {
        self.base.id()
    }

    pub fn measure(&mut self, child: ElementId, available: Size) -> LayoutResult<()> {
        self.tree.measure(child, available)
    }

    pub fn arrange(&mut self, child: ElementId, rect: Rect) -> LayoutResult<()> {
        self.tree.arrange(child, rect)
    }

    /// Desired size of a child after its measure. Zero for unknown handles.
    pub fn desired_size(&self, child: ElementId) -> Size {
        self.tree
            .base(child)
            .map(|b| b.desired_size())
            .unwrap_or(Size::ZERO)
    }

    pub fn is_visible(&self, child: ElementId) -> bool {
        self.tree.base(child).is_some_and(|b| b.is_visible())
    }

    /// Base of a child, for reading attached properties.
    pub fn child(&self, child: ElementId) -> Option<&ElementBase> {
        self.tree.base(child)
    }

    /// Size an element with no opinion of its own asks for: the explicit
    /// size where set, the full space on stretched finite axes, zero
    /// otherwise.
    pub fn natural_size(&self, available: Size) -> Size {
        let finite = available.finite_or_zero();
        let width = self.base.width().get().unwrap_or(
            match self.base.horizontal_alignment().get() {
                Alignment::Stretch => finite.width,
                _ => 0.0,
            },
        );
        let height = self.base.height().get().unwrap_or(
            match self.base.vertical_alignment().get() {
                Alignment::Stretch => finite.height,
                _ => 0.0,
            },
        );
        Size::new(width, height)
    }

    /// Default measure: the natural size grown to fit every child measured
    /// against the same space.
    pub fn measure_default(&mut self, children: &[ElementId], available: Size) -> LayoutResult<Size> {
        let mut size = self.natural_size(available);
        for &child in children {
            self.measure(child, available)?;
            size = size.union(self.desired_size(child));
        }
        Ok(size)
    }

    /// Default arrange: every child gets the whole area.
    pub fn arrange_default(&mut self, children: &[ElementId], final_size: Size) -> LayoutResult<Size> {
        let rect = Rect::from_size(final_size);
        for &child in children {
            self.arrange(child, rect)?;
        }
        Ok(final_size)
    }
}
