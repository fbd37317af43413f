//! Edge docking layout

use alloc::vec::Vec;

use crate::binding::ReactiveProperty;
use crate::error::{LayoutResult, PropertyResult};
use crate::geometry::{Rect, Size};
use crate::ui::context::LayoutContext;
use crate::ui::element::{Affects, ChildSlot, Element, ElementBase, ElementId};

/// Name of the attached property holding a child's [`Dock`].
pub const DOCK_PROPERTY: &str = "DockPanel.Dock";

/// Edge a child of a [`DockPanel`] is docked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dock {
    Left,
    Bottom,
    Right,
    #[default]
    Top,
}

/// Docks children against its edges in child order.
///
/// Each child is measured against the space the previous children left.
/// Left/Right children consume width, Top/Bottom children consume height.
/// With `last_child_fill` (the default) the final child gets whatever
/// rectangle remains.
///
/// # Examples
/// ```ignore
/// let dock = tree.insert(DockPanel::new())?;
/// DockPanel::set_dock(tree.base(header).unwrap(), Dock::Top)?;
/// tree.set_children(dock, vec![header, content])?;
/// ```
pub struct DockPanel {
    children: Vec<ElementId>,
    last_child_fill: ReactiveProperty<bool>,
}

impl Default for DockPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl DockPanel {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            last_child_fill: ReactiveProperty::new("last_child_fill", true),
        }
    }

    pub fn with_last_child_fill(self, fill: bool) -> Self {
        self.last_child_fill.set(fill);
        self
    }

    pub fn last_child_fill(&self) -> &ReactiveProperty<bool> {
        &self.last_child_fill
    }

    /// Edge the element is docked to, `Top` when never set.
    pub fn dock(element: &ElementBase) -> PropertyResult<Dock> {
        element.attached_value(DOCK_PROPERTY, Dock::Top)
    }

    pub fn set_dock(element: &ElementBase, dock: Dock) -> PropertyResult<()> {
        element.set_attached(DOCK_PROPERTY, dock)
    }

    fn child_dock(cx: &LayoutContext<'_>, child: ElementId) -> LayoutResult<Dock> {
        match cx.child(child) {
            Some(base) => Ok(Self::dock(base)?),
            None => Ok(Dock::default()),
        }
    }
}

impl Element for DockPanel {
    fn bind(&mut self, base: &ElementBase) -> PropertyResult<()> {
        base.register(&self.last_child_fill, Affects::Arrange)
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }

    fn child_at(&self, index: usize) -> Option<ElementId> {
        self.children.get(index).copied()
    }

    fn child_slot(&mut self) -> Option<ChildSlot<'_>> {
        Some(ChildSlot::Many(&mut self.children))
    }

    fn measure_override(&mut self, cx: &mut LayoutContext<'_>, available: Size) -> LayoutResult<Size> {
        // parent_* is the size implied by children so far, accumulated_* the
        // size they consumed. Left/Right imply a height without consuming it.
        let mut parent_width = 0.0f32;
        let mut parent_height = 0.0f32;
        let mut accumulated_width = 0.0f32;
        let mut accumulated_height = 0.0f32;

        for &child in &self.children {
            let remaining = Size::new(
                (available.width - accumulated_width).max(0.0),
                (available.height - accumulated_height).max(0.0),
            );
            cx.measure(child, remaining)?;
            let desired = cx.desired_size(child);

            match Self::child_dock(cx, child)? {
                Dock::Left | Dock::Right => {
                    parent_height = parent_height.max(accumulated_height + desired.height);
                    accumulated_width += desired.width;
                }
                Dock::Top | Dock::Bottom => {
                    parent_width = parent_width.max(accumulated_width + desired.width);
                    accumulated_height += desired.height;
                }
            }
        }

        Ok(Size::new(
            parent_width.max(accumulated_width),
            parent_height.max(accumulated_height),
        ))
    }

    fn arrange_override(&mut self, cx: &mut LayoutContext<'_>, final_size: Size) -> LayoutResult<Size> {
        let count = self.children.len();
        let docked = if self.last_child_fill.get() {
            count.saturating_sub(1)
        } else {
            count
        };

        let mut left = 0.0f32;
        let mut top = 0.0f32;
        let mut right = 0.0f32;
        let mut bottom = 0.0f32;

        for (index, &child) in self.children.iter().enumerate() {
            let desired = cx.desired_size(child);
            let mut rect = Rect::new(
                left,
                top,
                (final_size.width - (left + right)).max(0.0),
                (final_size.height - (top + bottom)).max(0.0),
            );

            if index < docked {
                match Self::child_dock(cx, child)? {
                    Dock::Left => {
                        left += desired.width;
                        rect.width = desired.width;
                    }
                    Dock::Right => {
                        right += desired.width;
                        rect.x = (final_size.width - right).max(0.0);
                        rect.width = desired.width;
                    }
                    Dock::Top => {
                        top += desired.height;
                        rect.height = desired.height;
                    }
                    Dock::Bottom => {
                        bottom += desired.height;
                        rect.y = (final_size.height - bottom).max(0.0);
                        rect.height = desired.height;
                    }
                }
            }

            cx.arrange(child, rect)?;
        }

        Ok(final_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LayoutError, PropertyError};
    use crate::layout_manager::{LayoutManager, MAX_LAYOUT_PASSES};
    use crate::ui::ElementTree;
    use crate::ui::layouts::Panel;

    fn sized(tree: &mut ElementTree, width: Option<f32>, height: Option<f32>, dock: Dock) -> ElementId {
        let id = tree.insert(Panel::new()).unwrap();
        let base = tree.base(id).unwrap();
        base.width().set(width);
        base.height().set(height);
        DockPanel::set_dock(base, dock).unwrap();
        id
    }

    fn rooted(children: Vec<ElementId>, tree: &mut ElementTree) -> ElementId {
        let root = tree.insert(DockPanel::new()).unwrap();
        tree.set_children(root, children).unwrap();
        LayoutManager::new(tree, root, MAX_LAYOUT_PASSES).unwrap();
        root
    }

    #[test]
    fn dock_defaults_to_top() {
        let mut tree = ElementTree::new();
        let id = tree.insert(Panel::new()).unwrap();
        assert_eq!(DockPanel::dock(tree.base(id).unwrap()), Ok(Dock::Top));
    }

    #[test]
    fn dock_bound_to_another_type_fails_layout() {
        let mut tree = ElementTree::new();
        let child = tree.insert(Panel::new()).unwrap();
        tree.base(child)
            .unwrap()
            .set_attached(DOCK_PROPERTY, 3u8)
            .unwrap();
        let root = rooted(vec![child], &mut tree);

        let name = DOCK_PROPERTY;
        assert_eq!(
            DockPanel::dock(tree.base(child).unwrap()),
            Err(PropertyError::TypeMismatch { name })
        );
        assert_eq!(
            tree.measure(root, Size::new(100.0, 100.0)),
            Err(LayoutError::Property(PropertyError::TypeMismatch { name }))
        );
    }

    #[test]
    fn left_child_implies_height_without_consuming_it() {
        let mut tree = ElementTree::new();
        let side = sized(&mut tree, Some(30.0), Some(50.0), Dock::Left);
        let top = sized(&mut tree, Some(40.0), Some(10.0), Dock::Top);
        let root = rooted(vec![side, top], &mut tree);
        tree.get_mut::<DockPanel>(root)
            .unwrap()
            .last_child_fill()
            .set(false);

        tree.measure(root, Size::new(f32::INFINITY, f32::INFINITY)).unwrap();
        // width: side 30 + top 40, height: the side's 50 beats the top's 10
        assert_eq!(tree.base(root).unwrap().desired_size(), Size::new(70.0, 50.0));
    }

    #[test]
    fn edges_consume_space_in_order() {
        let mut tree = ElementTree::new();
        let left = sized(&mut tree, Some(20.0), None, Dock::Left);
        let right = sized(&mut tree, Some(30.0), None, Dock::Right);
        let bottom = sized(&mut tree, None, Some(10.0), Dock::Bottom);
        let fill = sized(&mut tree, None, None, Dock::Top);
        let root = rooted(vec![left, right, bottom, fill], &mut tree);

        tree.arrange(root, Rect::new(0.0, 0.0, 200.0, 100.0)).unwrap();

        assert_eq!(tree.base(left).unwrap().bounds(), Rect::new(0.0, 0.0, 20.0, 100.0));
        assert_eq!(tree.base(right).unwrap().bounds(), Rect::new(170.0, 0.0, 30.0, 100.0));
        assert_eq!(tree.base(bottom).unwrap().bounds(), Rect::new(20.0, 90.0, 150.0, 10.0));
        assert_eq!(tree.base(fill).unwrap().bounds(), Rect::new(20.0, 0.0, 150.0, 90.0));
    }

    #[test]
    fn changing_dock_relayouts_parent() {
        let mut tree = ElementTree::new();
        let child = sized(&mut tree, Some(20.0), Some(20.0), Dock::Top);
        let fill = sized(&mut tree, None, None, Dock::Top);
        let root = rooted(vec![child, fill], &mut tree);
        tree.arrange(root, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        assert!(tree.base(root).unwrap().is_measure_valid());

        DockPanel::set_dock(tree.base(child).unwrap(), Dock::Left).unwrap();
        assert!(!tree.base(root).unwrap().is_measure_valid());

        tree.arrange(root, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        assert_eq!(tree.base(fill).unwrap().bounds(), Rect::new(20.0, 0.0, 80.0, 100.0));
    }
}
