//! Sequential layout along one axis

use alloc::vec::Vec;

use crate::binding::ReactiveProperty;
use crate::error::{LayoutResult, PropertyResult};
use crate::geometry::{Rect, Size};
use crate::ui::context::LayoutContext;
use crate::ui::core::Orientation;
use crate::ui::element::{Affects, ChildSlot, Element, ElementBase, ElementId};

/// Stacks children one after another.
///
/// During measure the stacking axis is unconstrained and the cross axis gets
/// the full available extent. Hidden children take no space and no spacing.
///
/// # Examples
/// ```ignore
/// let row = tree.insert(
///     StackPanel::new()
///         .with_orientation(Orientation::Horizontal)
///         .with_spacing(4.0),
/// )?;
/// tree.set_children(row, vec![icon, label])?;
/// ```
pub struct StackPanel {
    children: Vec<ElementId>,
    orientation: ReactiveProperty<Orientation>,
    spacing: ReactiveProperty<f32>,
}

impl Default for StackPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl StackPanel {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            orientation: ReactiveProperty::new("orientation", Orientation::Vertical),
            spacing: ReactiveProperty::new("spacing", 0.0),
        }
    }

    pub fn with_orientation(self, orientation: Orientation) -> Self {
        self.orientation.set(orientation);
        self
    }

    pub fn with_spacing(self, spacing: f32) -> Self {
        self.spacing.set(spacing);
        self
    }

    pub fn orientation(&self) -> &ReactiveProperty<Orientation> {
        &self.orientation
    }

    /// Gap inserted between consecutive visible children.
    pub fn spacing(&self) -> &ReactiveProperty<f32> {
        &self.spacing
    }
}

impl Element for StackPanel {
    fn bind(&mut self, base: &ElementBase) -> PropertyResult<()> {
        base.register(&self.orientation, Affects::Measure)?;
        base.register(&self.spacing, Affects::Measure)
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
        let horizontal = self.orientation.get() == Orientation::Horizontal;
        let spacing = self.spacing.get();
        let slot = if horizontal {
            Size::new(f32::INFINITY, available.height)
        } else {
            Size::new(available.width, f32::INFINITY)
        };

        let mut stacked = 0.0f32;
        let mut cross = 0.0f32;
        let mut visible = 0usize;
        for &child in &self.children {
            cx.measure(child, slot)?;
            if !cx.is_visible(child) {
                continue;
            }
            let desired = cx.desired_size(child);
            visible += 1;
            if horizontal {
                stacked += desired.width;
                cross = cross.max(desired.height);
            } else {
                stacked += desired.height;
                cross = cross.max(desired.width);
            }
        }
        if visible > 1 {
            stacked += spacing * (visible - 1) as f32;
        }

        Ok(if horizontal {
            Size::new(stacked, cross)
        } else {
            Size::new(cross, stacked)
        })
    }

    fn arrange_override(&mut self, cx: &mut LayoutContext<'_>, final_size: Size) -> LayoutResult<Size> {
        let horizontal = self.orientation.get() == Orientation::Horizontal;
        let spacing = self.spacing.get();

        let mut offset = 0.0f32;
        for &child in &self.children {
            if !cx.is_visible(child) {
                continue;
            }
            let desired = cx.desired_size(child);
            let rect = if horizontal {
                Rect::new(offset, 0.0, desired.width, final_size.height.max(desired.height))
            } else {
                Rect::new(0.0, offset, final_size.width.max(desired.width), desired.height)
            };
            cx.arrange(child, rect)?;
            offset += if horizontal { desired.width } else { desired.height } + spacing;
        }
        Ok(final_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LayoutError;
    use crate::layout_manager::{LayoutManager, MAX_LAYOUT_PASSES};
    use crate::ui::ElementTree;
    use crate::ui::layouts::Panel;

    fn fixed(tree: &mut ElementTree, width: f32, height: f32) -> ElementId {
        let id = tree.insert(Panel::new()).unwrap();
        let base = tree.base(id).unwrap();
        base.width().set(Some(width));
        base.height().set(Some(height));
        id
    }

    fn rooted(panel: StackPanel, children: &[(f32, f32)]) -> (ElementTree, ElementId, Vec<ElementId>) {
        let mut tree = ElementTree::new();
        let root = tree.insert(panel).unwrap();
        let ids: Vec<_> = children
            .iter()
            .map(|&(w, h)| fixed(&mut tree, w, h))
            .collect();
        tree.set_children(root, ids.clone()).unwrap();
        LayoutManager::new(&mut tree, root, MAX_LAYOUT_PASSES).unwrap();
        (tree, root, ids)
    }

    #[test]
    fn vertical_desired_size_sums_heights_and_spacing() {
        let (mut tree, root, _) = rooted(
            StackPanel::new().with_spacing(5.0),
            &[(10.0, 20.0), (30.0, 10.0), (5.0, 5.0)],
        );
        tree.measure(root, Size::new(100.0, 100.0)).unwrap();
        assert_eq!(tree.base(root).unwrap().desired_size(), Size::new(30.0, 45.0));
    }

    #[test]
    fn empty_panel_has_no_spacing() {
        let (mut tree, root, _) = rooted(StackPanel::new().with_spacing(5.0), &[]);
        tree.measure(root, Size::new(100.0, 100.0)).unwrap();
        assert_eq!(tree.base(root).unwrap().desired_size(), Size::ZERO);
    }

    #[test]
    fn horizontal_arrange_places_children_in_sequence() {
        let (mut tree, root, ids) = rooted(
            StackPanel::new()
                .with_orientation(Orientation::Horizontal)
                .with_spacing(2.0),
            &[(10.0, 20.0), (30.0, 10.0)],
        );
        tree.arrange(root, Rect::new(0.0, 0.0, 100.0, 40.0)).unwrap();

        assert_eq!(tree.base(ids[0]).unwrap().bounds(), Rect::new(0.0, 0.0, 10.0, 40.0));
        assert_eq!(tree.base(ids[1]).unwrap().bounds(), Rect::new(12.0, 0.0, 30.0, 40.0));
    }

    #[test]
    fn hidden_children_take_no_space_or_spacing() {
        let (mut tree, root, ids) = rooted(
            StackPanel::new().with_spacing(4.0),
            &[(10.0, 10.0), (10.0, 10.0), (10.0, 10.0)],
        );
        tree.base(ids[1]).unwrap().visible().set(false);
        tree.arrange(root, Rect::new(0.0, 0.0, 50.0, 100.0)).unwrap();

        assert_eq!(tree.base(root).unwrap().desired_size().height, 24.0);
        assert_eq!(tree.base(ids[2]).unwrap().bounds().y, 14.0);
    }

    #[test]
    fn child_with_unbounded_size_surfaces_an_error() {
        struct Greedy;
        impl Element for Greedy {
            fn measure_override(
                &mut self,
                _cx: &mut LayoutContext<'_>,
                available: Size,
            ) -> LayoutResult<Size> {
                Ok(available)
            }
        }

        let mut tree = ElementTree::new();
        let root = tree.insert(StackPanel::new()).unwrap();
        let greedy = tree.insert(Greedy).unwrap();
        tree.add_child(root, greedy).unwrap();

        let err = tree.measure(root, Size::new(100.0, 100.0)).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidMeasure { element, .. } if element == greedy));
    }

    #[test]
    fn spacing_change_invalidates_measure() {
        let (mut tree, root, _) = rooted(StackPanel::new(), &[(10.0, 10.0), (10.0, 10.0)]);
        tree.measure(root, Size::new(100.0, 100.0)).unwrap();
        assert!(tree.base(root).unwrap().is_measure_valid());

        tree.get::<StackPanel>(root).unwrap().spacing().set(6.0);
        assert!(!tree.base(root).unwrap().is_measure_valid());

        tree.measure(root, Size::new(100.0, 100.0)).unwrap();
        assert_eq!(tree.base(root).unwrap().desired_size().height, 26.0);
    }
}
