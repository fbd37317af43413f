//! Absolute positioning through attached coordinates

use alloc::vec::Vec;

use crate::error::{LayoutResult, PropertyResult};
use crate::geometry::{Point, Rect, Size};
use crate::ui::context::LayoutContext;
use crate::ui::element::{ChildSlot, Element, ElementBase, ElementId};

pub const X_PROPERTY: &str = "Canvas.X";
pub const Y_PROPERTY: &str = "Canvas.Y";

/// Places children at explicit coordinates.
///
/// A child with both `X` and `Y` set is arranged at that point with its
/// desired size; any other child gets the whole canvas.
#[derive(Debug, Default)]
pub struct Canvas {
    children: Vec<ElementId>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position of `element` on its canvas, when both coordinates are set.
    pub fn position(element: &ElementBase) -> PropertyResult<Option<Point>> {
        let x = element.attached_value::<Option<f32>>(X_PROPERTY, None)?;
        let y = element.attached_value::<Option<f32>>(Y_PROPERTY, None)?;
        Ok(x.zip(y).map(|(x, y)| Point::new(x, y)))
    }

    pub fn set_position(element: &ElementBase, x: f32, y: f32) -> PropertyResult<()> {
        element.set_attached(X_PROPERTY, Some(x))?;
        element.set_attached(Y_PROPERTY, Some(y))
    }

    pub fn clear_position(element: &ElementBase) -> PropertyResult<()> {
        element.set_attached::<Option<f32>>(X_PROPERTY, None)?;
        element.set_attached::<Option<f32>>(Y_PROPERTY, None)
    }
}

impl Element for Canvas {
    fn child_count(&self) -> usize {
        self.children.len()
    }

    fn child_at(&self, index: usize) -> Option<ElementId> {
        self.children.get(index).copied()
    }

    fn child_slot(&mut self) -> Option<ChildSlot<'_>> {
        Some(ChildSlot::Many(&mut self.children))
    }

    fn arrange_override(&mut self, cx: &mut LayoutContext<'_>, final_size: Size) -> LayoutResult<Size> {
        for &child in &self.children {
            let position = match cx.child(child) {
                Some(base) => Self::position(base)?,
                None => None,
            };
            let rect = match position {
                Some(origin) => Rect::from_origin_size(origin, cx.desired_size(child)),
                None => Rect::from_size(final_size),
            };
            cx.arrange(child, rect)?;
        }
        Ok(final_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_manager::{LayoutManager, MAX_LAYOUT_PASSES};
    use crate::ui::ElementTree;
    use crate::ui::layouts::Panel;

    #[test]
    fn positioned_children_keep_desired_size() {
        let mut tree = ElementTree::new();
        let root = tree.insert(Canvas::new()).unwrap();
        let placed = tree.insert(Panel::new()).unwrap();
        let free = tree.insert(Panel::new()).unwrap();
        {
            let base = tree.base(placed).unwrap();
            base.width().set(Some(10.0));
            base.height().set(Some(5.0));
            Canvas::set_position(base, 30.0, 40.0).unwrap();
        }
        tree.set_children(root, alloc::vec![placed, free]).unwrap();
        LayoutManager::new(&mut tree, root, MAX_LAYOUT_PASSES).unwrap();

        tree.arrange(root, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        assert_eq!(tree.base(placed).unwrap().bounds(), Rect::new(30.0, 40.0, 10.0, 5.0));
        assert_eq!(tree.base(free).unwrap().bounds(), Rect::new(0.0, 0.0, 100.0, 100.0));

        Canvas::clear_position(tree.base(placed).unwrap()).unwrap();
        assert!(!tree.base(root).unwrap().is_measure_valid());
    }
}
