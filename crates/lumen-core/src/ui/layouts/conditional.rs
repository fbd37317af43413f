//! Element that shows one of two children depending on a flag

use alloc::vec::Vec;

use crate::binding::ReactiveProperty;
use crate::error::{LayoutResult, PropertyResult, UiResult};
use crate::geometry::{Rect, Size};
use crate::ui::context::LayoutContext;
use crate::ui::element::{Affects, Element, ElementBase, ElementId};
use crate::ui::tree::ElementTree;

/// Switches between a `when_true` and a `when_false` child.
///
/// Both branches stay attached (so their bindings keep working while hidden)
/// but only the active one is enumerated, measured, drawn and hit tested.
///
/// # Examples
/// ```ignore
/// let status = Conditional::insert(&mut tree, Some(online), Some(offline))?;
/// tree.get::<Conditional>(status).unwrap().condition().bind_from(&connected, |c| *c);
/// ```
pub struct Conditional {
    condition: ReactiveProperty<bool>,
    when_true: Option<ElementId>,
    when_false: Option<ElementId>,
}

impl Conditional {
    /// Insert a conditional element into `tree` and attach both branches.
    pub fn insert(
        tree: &mut ElementTree,
        when_true: Option<ElementId>,
        when_false: Option<ElementId>,
    ) -> UiResult<ElementId> {
        let id = tree.insert(Self {
            condition: ReactiveProperty::new("condition", false),
            when_true,
            when_false,
        })?;
        for branch in [when_true, when_false].into_iter().flatten() {
            tree.adopt(id, branch)?;
        }
        Ok(id)
    }

    pub fn condition(&self) -> &ReactiveProperty<bool> {
        &self.condition
    }

    /// The branch currently shown.
    pub fn active(&self) -> Option<ElementId> {
        if self.condition.get() {
            self.when_true
        } else {
            self.when_false
        }
    }
}

impl Element for Conditional {
    fn bind(&mut self, base: &ElementBase) -> PropertyResult<()> {
        base.register(&self.condition, Affects::Measure)
    }

    fn child_count(&self) -> usize {
        usize::from(self.active().is_some())
    }

    fn child_at(&self, index: usize) -> Option<ElementId> {
        if index == 0 { self.active() } else { None }
    }

    fn attached_children(&self) -> Vec<ElementId> {
        [self.when_true, self.when_false].into_iter().flatten().collect()
    }

    fn measure_override(&mut self, cx: &mut LayoutContext<'_>, available: Size) -> LayoutResult<Size> {
        match self.active() {
            Some(child) => {
                cx.measure(child, available)?;
                Ok(cx.desired_size(child))
            }
            None => Ok(Size::ZERO),
        }
    }

    fn arrange_override(&mut self, cx: &mut LayoutContext<'_>, final_size: Size) -> LayoutResult<Size> {
        if let Some(child) = self.active() {
            cx.arrange(child, Rect::from_size(final_size))?;
        }
        Ok(final_size)
    }
}
