//! Plain container: every child gets the panel's full area

use alloc::vec::Vec;

use crate::ui::element::{ChildSlot, Element, ElementId};

/// Ordered child collection with the default measure and arrange.
///
/// Children overlap; later children draw on top of and win hit tests over
/// earlier ones.
#[derive(Debug, Default)]
pub struct Panel {
    children: Vec<ElementId>,
}

impl Panel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }
}

impl Element for Panel {
    fn child_count(&self) -> usize {
        self.children.len()
    }

    fn child_at(&self, index: usize) -> Option<ElementId> {
        self.children.get(index).copied()
    }

    fn child_slot(&mut self) -> Option<ChildSlot<'_>> {
        Some(ChildSlot::Many(&mut self.children))
    }
}
