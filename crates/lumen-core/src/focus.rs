//! Keyboard-style focus traversal over the focusable elements of a view

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use log::{debug, warn};

use crate::ui::{ElementId, ElementTree};

/// Longest element name the focus manager can index.
pub const MAX_FOCUS_NAME_LEN: usize = 32;

type FocusName = heapless::String<MAX_FOCUS_NAME_LEN>;

/// Tab-ordered list of focusable elements with a cursor.
///
/// Built once from a loaded view and rebuilt when the next view loads.
/// Elements with equal tab indices are moved to the next free index in
/// discovery order.
#[derive(Debug, Default)]
pub struct FocusManager {
    order: Vec<ElementId>,
    names: Vec<(FocusName, ElementId)>,
    current: usize,
}

impl FocusManager {
    /// Discover every focusable element under `root` (pre-order) and focus
    /// the first one in tab order.
    pub fn build(tree: &mut ElementTree, root: ElementId) -> Self {
        let mut by_index: BTreeMap<i32, ElementId> = BTreeMap::new();
        let mut names = Vec::new();

        for id in tree.descendants(root) {
            let Some(Some(tab_index)) = tree.with_element_mut(id, |element, _| {
                element.as_focusable().map(|focusable| focusable.tab_index())
            }) else {
                continue;
            };

            let mut slot = tab_index;
            while by_index.contains_key(&slot) {
                match slot.checked_add(1) {
                    Some(next) => slot = next,
                    None => break,
                }
            }
            if by_index.contains_key(&slot) {
                warn!("No free tab index for {:?}, skipping", id);
                continue;
            }
            by_index.insert(slot, id);

            if let Some(name) = tree.base(id).and_then(|base| base.name()) {
                let mut key = FocusName::new();
                if key.push_str(name).is_ok() {
                    names.push((key, id));
                } else {
                    warn!("Focus name `{}` is longer than {} bytes", name, MAX_FOCUS_NAME_LEN);
                }
            }
        }

        let manager = Self {
            order: by_index.into_values().collect(),
            names,
            current: 0,
        };
        debug!("Focus order built with {} elements", manager.order.len());
        if let Some(first) = manager.current() {
            set_focused(tree, first, true);
        }
        manager
    }

    /// The focused element, if any element is focusable.
    pub fn current(&self) -> Option<ElementId> {
        self.order.get(self.current).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Elements in tab order.
    pub fn order(&self) -> &[ElementId] {
        &self.order
    }

    /// Move focus forward, wrapping from the last element to the first.
    pub fn next(&mut self, tree: &mut ElementTree) {
        if self.order.is_empty() {
            return;
        }
        self.move_to(tree, (self.current + 1) % self.order.len());
    }

    /// Move focus backward, wrapping from the first element to the last.
    pub fn previous(&mut self, tree: &mut ElementTree) {
        if self.order.is_empty() {
            return;
        }
        let len = self.order.len();
        self.move_to(tree, (self.current + len - 1) % len);
    }

    /// Focus the element registered under `name`. Returns false when no
    /// focusable element has that name.
    pub fn focus_by_name(&mut self, tree: &mut ElementTree, name: &str) -> bool {
        let Some(id) = self
            .names
            .iter()
            .find(|(key, _)| key.as_str() == name)
            .map(|(_, id)| *id)
        else {
            return false;
        };
        self.focus_element(tree, id)
    }

    /// Focus `id` if it is part of the focus order.
    pub fn focus_element(&mut self, tree: &mut ElementTree, id: ElementId) -> bool {
        let Some(position) = self.order.iter().position(|candidate| *candidate == id) else {
            return false;
        };
        self.move_to(tree, position);
        true
    }

    /// Unfocus the current element, leaving the order intact.
    pub fn release(&mut self, tree: &mut ElementTree) {
        if let Some(current) = self.current() {
            set_focused(tree, current, false);
        }
    }

    fn move_to(&mut self, tree: &mut ElementTree, position: usize) {
        if let Some(current) = self.current() {
            set_focused(tree, current, false);
        }
        self.current = position;
        if let Some(next) = self.current() {
            set_focused(tree, next, true);
        }
    }
}

fn set_focused(tree: &mut ElementTree, id: ElementId, focused: bool) {
    tree.with_element_mut(id, |element, base| {
        if let Some(focusable) = element.as_focusable() {
            if focused {
                focusable.focus(base);
            } else {
                focusable.unfocus(base);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{Button, Focusable, StackPanel};

    fn is_focused(tree: &ElementTree, id: ElementId) -> bool {
        tree.get::<Button>(id).is_some_and(|b| b.is_focused())
    }

    /// Buttons with tab indices 5, 0, 0 in tree order.
    fn view() -> (ElementTree, ElementId, [ElementId; 3]) {
        let mut tree = ElementTree::new();
        let root = tree.insert(StackPanel::new()).unwrap();
        let last = Button::new("c")
            .with_tab_index(5)
            .insert_named(&mut tree, "last")
            .unwrap();
        let first = Button::new("a").insert_named(&mut tree, "first").unwrap();
        let second = Button::new("b").insert(&mut tree).unwrap();
        tree.set_children(root, alloc::vec![last, first, second]).unwrap();
        (tree, root, [first, second, last])
    }

    #[test]
    fn colliding_tab_indices_probe_forward() {
        let (mut tree, root, [first, second, last]) = view();
        let focus = FocusManager::build(&mut tree, root);

        assert_eq!(focus.order(), &[first, second, last]);
        assert_eq!(focus.current(), Some(first));
        assert!(is_focused(&tree, first));
    }

    #[test]
    fn next_and_previous_wrap() {
        let (mut tree, root, [first, second, last]) = view();
        let mut focus = FocusManager::build(&mut tree, root);

        focus.next(&mut tree);
        assert_eq!(focus.current(), Some(second));
        assert!(!is_focused(&tree, first));
        assert!(is_focused(&tree, second));

        focus.next(&mut tree);
        focus.next(&mut tree);
        assert_eq!(focus.current(), Some(first));

        focus.previous(&mut tree);
        assert_eq!(focus.current(), Some(last));
        assert!(is_focused(&tree, last));
    }

    #[test]
    fn empty_focus_set_is_a_no_op() {
        let mut tree = ElementTree::new();
        let root = tree.insert(StackPanel::new()).unwrap();
        let mut focus = FocusManager::build(&mut tree, root);

        focus.next(&mut tree);
        focus.previous(&mut tree);
        assert!(focus.is_empty());
        assert_eq!(focus.current(), None);
    }

    #[test]
    fn focus_by_name_jumps_directly() {
        let (mut tree, root, [first, _, last]) = view();
        let mut focus = FocusManager::build(&mut tree, root);

        assert!(focus.focus_by_name(&mut tree, "last"));
        assert_eq!(focus.current(), Some(last));
        assert!(!is_focused(&tree, first));

        assert!(!focus.focus_by_name(&mut tree, "missing"));
        assert_eq!(focus.current(), Some(last));
    }
}
