//! Arena of element nodes with parent links and the measure/arrange core
//!
//! Nodes are addressed by [`ElementId`]. Parents own the ordering of their
//! children (inside their [`Element`] behavior); every node keeps a
//! non-owning back reference to its parent in its [`ElementBase`].
//!
//! During a node's measure or arrange its behavior is moved out of the arena
//! so the override can recurse into children through a [`LayoutContext`].

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;

use crate::error::{LayoutError, LayoutResult, PropertyResult};
use crate::geometry::{Point, Rect, Size};
use crate::layout_manager::LayoutQueue;
use crate::ui::context::LayoutContext;
use crate::ui::core::Alignment;
use crate::ui::element::{ChildSlot, Element, ElementBase, ElementId, child_ids};

struct Node {
    base: Rc<ElementBase>,
    behavior: Option<Box<dyn Element>>,
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Owner of every element of one view.
#[derive(Default)]
pub struct ElementTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: Option<ElementId>,
    queue: Option<Rc<LayoutQueue>>,
}

impl ElementTree {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Creation and lookup
    // ========================================================================

    /// Add a detached element.
    pub fn insert<E: Element>(&mut self, element: E) -> PropertyResult<ElementId> {
        self.insert_boxed(Box::new(element), None)
    }

    /// Add a detached element that can be found by name.
    pub fn insert_named<E: Element>(&mut self, name: &str, element: E) -> PropertyResult<ElementId> {
        self.insert_boxed(Box::new(element), Some(String::from(name)))
    }

    pub fn insert_boxed(
        &mut self,
        mut behavior: Box<dyn Element>,
        name: Option<String>,
    ) -> PropertyResult<ElementId> {
        let id = self.allocate();
        let base = Rc::new(ElementBase::new(id, name));
        if let Err(e) = behavior.bind(&base) {
            self.release(id);
            return Err(e);
        }
        self.slots[id.index as usize].node = Some(Node {
            base,
            behavior: Some(behavior),
        });
        Ok(id)
    }

    /// Remove an element and its whole subtree, detaching it from its parent
    /// first.
    pub fn remove(&mut self, id: ElementId) -> LayoutResult<()> {
        if let Some(parent) = self.node(id)?.base.parent() {
            match self.remove_child(parent, id) {
                Ok(true) => {}
                // held outside the parent's child slot, see `adopt`
                Ok(false) | Err(LayoutError::NotAContainer(_)) => {
                    self.detach_from_parent(id);
                    self.invalidate_structure(parent);
                }
                Err(e) => return Err(e),
            }
        } else {
            self.propagate_detach(id, false);
        }
        for descendant in self.attached_descendants(id) {
            self.release(descendant);
        }
        if self.root == Some(id) {
            self.root = None;
        }
        Ok(())
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.node(id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn base(&self, id: ElementId) -> Option<&ElementBase> {
        self.node(id).ok().map(|n| &*n.base)
    }

    /// Typed access to an element's behavior.
    pub fn get<E: Element>(&self, id: ElementId) -> Option<&E> {
        let behavior: &dyn Any = self.node(id).ok()?.behavior.as_deref()?;
        behavior.downcast_ref::<E>()
    }

    pub fn get_mut<E: Element>(&mut self, id: ElementId) -> Option<&mut E> {
        let behavior: &mut dyn Any = self.node_mut(id).ok()?.behavior.as_deref_mut()?;
        behavior.downcast_mut::<E>()
    }

    pub fn with_element<R>(
        &self,
        id: ElementId,
        f: impl FnOnce(&dyn Element, &ElementBase) -> R,
    ) -> Option<R> {
        let node = self.node(id).ok()?;
        let behavior = node.behavior.as_deref()?;
        Some(f(behavior, &node.base))
    }

    /// Run `f` with an element's behavior and base.
    pub fn with_element_mut<R>(
        &mut self,
        id: ElementId,
        f: impl FnOnce(&mut dyn Element, &ElementBase) -> R,
    ) -> Option<R> {
        let node = self.node_mut(id).ok()?;
        let base = Rc::clone(&node.base);
        let behavior = node.behavior.as_deref_mut()?;
        Some(f(behavior, &base))
    }

    /// The view root, once one has been installed.
    pub fn root(&self) -> Option<ElementId> {
        self.root
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.base(id)?.parent()
    }

    pub fn child_count(&self, id: ElementId) -> usize {
        self.behavior(id).map_or(0, |b| b.child_count())
    }

    pub fn child_at(&self, id: ElementId, index: usize) -> Option<ElementId> {
        self.behavior(id)?.child_at(index)
    }

    pub fn children(&self, id: ElementId) -> Vec<ElementId> {
        self.behavior(id).map(child_ids).unwrap_or_default()
    }

    fn attached_children(&self, id: ElementId) -> Vec<ElementId> {
        self.behavior(id)
            .map(|b| b.attached_children())
            .unwrap_or_default()
    }

    fn attached_descendants(&self, start: ElementId) -> Vec<ElementId> {
        let mut out = Vec::from([start]);
        let mut index = 0;
        while let Some(&id) = out.get(index) {
            out.extend(self.attached_children(id));
            index += 1;
        }
        out
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Install `root` as the view root, attaching its subtree to `queue`.
    pub(crate) fn set_root(&mut self, root: ElementId, queue: Rc<LayoutQueue>) -> LayoutResult<()> {
        let base = Rc::clone(&self.node(root)?.base);
        if base.parent().is_some() {
            return Err(LayoutError::AlreadyParented(root));
        }
        if let Some(previous) = self.root.replace(root)
            && previous != root
        {
            self.propagate_detach(previous, false);
        }
        self.queue = Some(queue);
        self.propagate_attach(root, None, Some(root));
        Ok(())
    }

    /// Append `child` to a panel.
    pub fn add_child(&mut self, parent: ElementId, child: ElementId) -> LayoutResult<()> {
        let index = self.child_count(parent);
        self.insert_child(parent, index, child)
    }

    /// Insert `child` into a panel at `index` (clamped to the child count).
    pub fn insert_child(
        &mut self,
        parent: ElementId,
        index: usize,
        child: ElementId,
    ) -> LayoutResult<()> {
        self.check_adoptable(parent, child)?;
        match self.behavior_mut(parent)?.child_slot() {
            Some(ChildSlot::Many(children)) => {
                let index = index.min(children.len());
                children.insert(index, child);
            }
            _ => return Err(LayoutError::NotAContainer(parent)),
        }
        self.attach_under(parent, child)?;
        self.invalidate_structure(parent);
        Ok(())
    }

    /// Remove `child` from `parent`, detaching its subtree. Returns whether
    /// the child was found.
    pub fn remove_child(&mut self, parent: ElementId, child: ElementId) -> LayoutResult<bool> {
        let removed = match self.behavior_mut(parent)?.child_slot() {
            Some(ChildSlot::Many(children)) => {
                let before = children.len();
                children.retain(|c| *c != child);
                before != children.len()
            }
            Some(ChildSlot::Single(content)) if *content == Some(child) => {
                *content = None;
                true
            }
            Some(ChildSlot::Single(_)) => false,
            None => return Err(LayoutError::NotAContainer(parent)),
        };
        if removed {
            self.detach_from_parent(child);
            self.invalidate_structure(parent);
        }
        Ok(removed)
    }

    /// Replace every child of a panel.
    pub fn set_children(&mut self, parent: ElementId, children: Vec<ElementId>) -> LayoutResult<()> {
        for &child in &children {
            if self.base(child).and_then(|b| b.parent()) != Some(parent) {
                self.check_adoptable(parent, child)?;
            }
        }
        let previous = match self.behavior_mut(parent)?.child_slot() {
            Some(ChildSlot::Many(current)) => core::mem::replace(current, children.clone()),
            _ => return Err(LayoutError::NotAContainer(parent)),
        };
        for child in previous {
            self.detach_from_parent(child);
        }
        for child in children {
            self.attach_under(parent, child)?;
        }
        self.invalidate_structure(parent);
        Ok(())
    }

    /// Set the single child of a content control, returning the previous one
    /// (now detached).
    pub fn set_content(
        &mut self,
        parent: ElementId,
        content: Option<ElementId>,
    ) -> LayoutResult<Option<ElementId>> {
        if let Some(child) = content
            && self.base(child).and_then(|b| b.parent()) != Some(parent)
        {
            self.check_adoptable(parent, child)?;
        }
        let previous = match self.behavior_mut(parent)?.child_slot() {
            Some(ChildSlot::Single(slot)) => core::mem::replace(slot, content),
            _ => return Err(LayoutError::NotAContainer(parent)),
        };
        if let Some(old) = previous {
            self.detach_from_parent(old);
        }
        if let Some(child) = content {
            self.attach_under(parent, child)?;
        }
        self.invalidate_structure(parent);
        Ok(previous)
    }

    /// Attach a child that a behavior holds outside of its [`ChildSlot`],
    /// such as the inactive branch of a conditional element.
    pub fn adopt(&mut self, parent: ElementId, child: ElementId) -> LayoutResult<()> {
        self.check_adoptable(parent, child)?;
        self.attach_under(parent, child)?;
        self.invalidate_structure(parent);
        Ok(())
    }

    fn check_adoptable(&self, parent: ElementId, child: ElementId) -> LayoutResult<()> {
        let child_base = self.node(child)?.base.as_ref();
        self.node(parent)?;
        if child_base.parent().is_some() || self.root == Some(child) {
            return Err(LayoutError::AlreadyParented(child));
        }
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(LayoutError::Cycle(child));
            }
            cursor = self.parent(id);
        }
        Ok(())
    }

    fn attach_under(&mut self, parent: ElementId, child: ElementId) -> LayoutResult<()> {
        let parent_base = Rc::clone(&self.node(parent)?.base);
        self.node(child)?.base.set_parent(Some(parent));
        self.propagate_attach(child, Some(parent_base.as_ref()), parent_base.root());
        Ok(())
    }

    fn propagate_attach(&self, id: ElementId, parent: Option<&ElementBase>, root: Option<ElementId>) {
        let Ok(node) = self.node(id) else {
            return;
        };
        let base = Rc::clone(&node.base);
        base.set_root(root);
        let parent_layout = parent.map(|p| p.layout());
        match (root, &self.queue) {
            (Some(_), Some(queue)) => base.layout().attach(parent_layout, queue),
            _ => base.layout().set_parent_only(parent_layout),
        }
        for child in self.attached_children(id) {
            self.propagate_attach(child, Some(&*base), root);
        }
    }

    fn detach_from_parent(&mut self, child: ElementId) {
        if let Some(base) = self.base(child) {
            base.set_parent(None);
        }
        self.propagate_detach(child, false);
    }

    /// Clear root and layout attachment of a subtree and release the
    /// external subscribers of every node in it. Safe to repeat.
    fn propagate_detach(&self, id: ElementId, keep_parent: bool) {
        let Some(base) = self.base(id) else {
            return;
        };
        base.set_root(None);
        base.layout().detach(keep_parent);
        base.object().unsubscribe_property_subscribers();
        for child in self.attached_children(id) {
            self.propagate_detach(child, true);
        }
    }

    fn invalidate_structure(&self, parent: ElementId) {
        if let Some(base) = self.base(parent) {
            base.invalidate_measure();
        }
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Pre-order walk starting at (and including) `start`.
    pub fn visit(&self, start: ElementId, f: &mut impl FnMut(ElementId, &ElementBase)) {
        let Some(base) = self.base(start) else {
            return;
        };
        f(start, base);
        for child in self.children(start) {
            self.visit(child, f);
        }
    }

    /// Pre-order list of `start` and everything below it.
    pub fn descendants(&self, start: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.visit(start, &mut |id, _| out.push(id));
        out
    }

    /// Walk from `start` up through its ancestors and return the first node
    /// for which `predicate` holds.
    pub fn find_reverse(
        &mut self,
        start: ElementId,
        mut predicate: impl FnMut(&mut dyn Element, &ElementBase) -> bool,
    ) -> Option<ElementId> {
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            if self.with_element_mut(id, &mut predicate) == Some(true) {
                return Some(id);
            }
            cursor = self.parent(id);
        }
        None
    }

    pub fn find_by_name(&self, start: ElementId, name: &str) -> Option<ElementId> {
        let mut found = None;
        self.visit(start, &mut |id, base| {
            if found.is_none() && base.name() == Some(name) {
                found = Some(id);
            }
        });
        found
    }

    pub(crate) fn load_subtree(&mut self, start: ElementId) {
        for id in self.descendants(start) {
            self.with_element_mut(id, |behavior, base| behavior.on_load(base));
        }
    }

    pub(crate) fn unload_subtree(&mut self, start: ElementId) {
        for id in self.descendants(start) {
            self.with_element_mut(id, |behavior, base| behavior.on_unload(base));
        }
    }

    // ========================================================================
    // Measure
    // ========================================================================

    /// Measure `id` against `available`. A no-op when the node is already
    /// measure-valid for the same available size.
    pub fn measure(&mut self, id: ElementId, available: Size) -> LayoutResult<()> {
        let base = Rc::clone(&self.node(id)?.base);
        let layout = base.layout();

        if !available.is_valid_constraint() {
            return Err(LayoutError::InvalidConstraint {
                element: id,
                available,
            });
        }
        if layout.is_measure_valid() && layout.previous_measure() == Some(available) {
            return Ok(());
        }

        let result = {
            let _measuring = layout.begin_measure();
            self.measure_core(&base, available)
        };

        let desired = match result {
            Ok(size) if size.is_valid_result() => size,
            Ok(size) => {
                layout.fail_measure();
                return Err(LayoutError::InvalidMeasure { element: id, size });
            }
            Err(e) => {
                layout.fail_measure();
                return Err(e);
            }
        };

        layout.finish_measure(available, desired);
        Ok(())
    }

    fn measure_core(&mut self, base: &Rc<ElementBase>, available: Size) -> LayoutResult<Size> {
        if !base.is_visible() {
            return Ok(Size::ZERO);
        }

        let margin = base.margin().get();
        let measured = self.with_behavior(base, |behavior, cx| {
            behavior.measure_override(cx, available.deflate(margin))
        })?;

        if !measured.is_valid_result() {
            return Err(LayoutError::InvalidMeasure {
                element: base.id(),
                size: measured,
            });
        }

        let width = measured
            .width
            .min(base.max_width().get())
            .max(base.min_width().get())
            .min(available.width);
        let height = measured
            .height
            .min(base.max_height().get())
            .max(base.min_height().get())
            .min(available.height);

        Ok(Size::new(width, height).inflate(margin))
    }

    // ========================================================================
    // Arrange
    // ========================================================================

    /// Position `id` within `rect` (relative to its parent). Re-measures
    /// first when needed; a no-op when already arranged to the same rect.
    pub fn arrange(&mut self, id: ElementId, rect: Rect) -> LayoutResult<()> {
        let base = Rc::clone(&self.node(id)?.base);
        let layout = base.layout();

        if !rect.is_valid() {
            return Err(LayoutError::InvalidArrange { element: id, rect });
        }
        if base.root().is_none() {
            return Err(LayoutError::Detached(id));
        }
        if !layout.is_measure_valid() {
            self.measure(id, layout.previous_measure().unwrap_or(rect.size()))?;
        }
        if layout.is_arrange_valid() && layout.previous_arrange() == Some(rect) {
            return Ok(());
        }

        layout.begin_arrange();
        match self.arrange_core(&base, rect) {
            Ok(bounds) => {
                layout.finish_arrange(rect, bounds);
                Ok(())
            }
            Err(e) => {
                layout.fail_arrange();
                Err(e)
            }
        }
    }

    /// Returns the new bounds, or `None` for an invisible node whose bounds
    /// are left untouched.
    fn arrange_core(&mut self, base: &Rc<ElementBase>, rect: Rect) -> LayoutResult<Option<Rect>> {
        if !base.is_visible() {
            return Ok(None);
        }

        let margin = base.margin().get();
        let slot = rect.deflate(margin);
        let desired = base.desired_size().deflate(margin);
        let horizontal = base.horizontal_alignment().get();
        let vertical = base.vertical_alignment().get();

        let mut size = slot.size();
        if horizontal != Alignment::Stretch {
            size.width = size.width.min(desired.width);
        }
        if vertical != Alignment::Stretch {
            size.height = size.height.min(desired.height);
        }

        let used = self.with_behavior(base, |behavior, cx| behavior.arrange_override(cx, size))?;
        let size = used.constrain(size);

        let origin = Point::new(
            slot.x + align_offset(horizontal, slot.width, size.width),
            slot.y + align_offset(vertical, slot.height, size.height),
        );
        Ok(Some(Rect::from_origin_size(origin, size)))
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn with_behavior<R>(
        &mut self,
        base: &Rc<ElementBase>,
        f: impl FnOnce(&mut dyn Element, &mut LayoutContext<'_>) -> LayoutResult<R>,
    ) -> LayoutResult<R> {
        let id = base.id();
        let mut behavior = self
            .node_mut(id)?
            .behavior
            .take()
            .ok_or(LayoutError::UnknownElement(id))?;

        let result = {
            let mut cx = LayoutContext::new(self, Rc::clone(base));
            f(behavior.as_mut(), &mut cx)
        };

        if let Ok(node) = self.node_mut(id) {
            node.behavior = Some(behavior);
        }
        result
    }

    fn allocate(&mut self) -> ElementId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            return ElementId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: None,
        });
        ElementId::new(index, 0)
    }

    fn release(&mut self, id: ElementId) {
        if let Some(slot) = self.slots.get_mut(id.index as usize)
            && slot.generation == id.generation
        {
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
        }
    }

    fn node(&self, id: ElementId) -> LayoutResult<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
            .ok_or(LayoutError::UnknownElement(id))
    }

    fn node_mut(&mut self, id: ElementId) -> LayoutResult<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
            .ok_or(LayoutError::UnknownElement(id))
    }

    fn behavior(&self, id: ElementId) -> Option<&dyn Element> {
        self.node(id).ok()?.behavior.as_deref()
    }

    fn behavior_mut(&mut self, id: ElementId) -> LayoutResult<&mut (dyn Element + 'static)> {
        self.node_mut(id)?
            .behavior
            .as_deref_mut()
            .ok_or(LayoutError::UnknownElement(id))
    }

    pub(crate) fn base_rc(&self, id: ElementId) -> Option<Rc<ElementBase>> {
        self.node(id).ok().map(|n| Rc::clone(&n.base))
    }
}

/// Offset of a `used` extent inside an `available` one.
pub(crate) fn align_offset(alignment: Alignment, available: f32, used: f32) -> f32 {
    match alignment {
        Alignment::Start => 0.0,
        Alignment::Center | Alignment::Stretch => (available - used) / 2.0,
        Alignment::End => available - used,
    }
}
