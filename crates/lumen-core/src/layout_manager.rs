//! Layout queues and bounded measure/arrange passes for one view
//!
//! Invalidations land in two queues (measure, arrange) as they happen. A
//! layout pass drains them a bounded number of times per frame; whatever is
//! still queued at the cap is left for the next frame.

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use log::debug;

use crate::error::{LayoutError, LayoutResult};
use crate::geometry::{Rect, Size};
use crate::ui::element::LayoutState;
use crate::ui::{ElementId, ElementTree};

/// Default cap on inner passes per frame.
pub const MAX_LAYOUT_PASSES: usize = 10;

/// Where the layout manager is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    /// Nothing queued
    Idle,
    /// Invalidations waiting for the next pass
    Queued,
    /// A pass is executing
    Running,
}

/// Pending invalidations, shared with every attached node's layout state.
pub(crate) struct LayoutQueue {
    measure: RefCell<VecDeque<ElementId>>,
    arrange: RefCell<VecDeque<ElementId>>,
    state: Cell<PassState>,
}

impl LayoutQueue {
    pub(crate) fn new() -> Self {
        Self {
            measure: RefCell::new(VecDeque::new()),
            arrange: RefCell::new(VecDeque::new()),
            state: Cell::new(PassState::Idle),
        }
    }

    pub(crate) fn push_measure(&self, id: ElementId) {
        self.measure.borrow_mut().push_back(id);
        self.mark_queued();
    }

    pub(crate) fn push_arrange(&self, id: ElementId) {
        self.arrange.borrow_mut().push_back(id);
        self.mark_queued();
    }

    fn mark_queued(&self) {
        if self.state.get() == PassState::Idle {
            self.state.set(PassState::Queued);
        }
    }

    fn pop_measure(&self) -> Option<ElementId> {
        self.measure.borrow_mut().pop_front()
    }

    fn pop_arrange(&self) -> Option<ElementId> {
        self.arrange.borrow_mut().pop_front()
    }

    fn pending(&self) -> (usize, usize) {
        (self.measure.borrow().len(), self.arrange.borrow().len())
    }
}

/// Outcome of arranging one queued node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrangeResult {
    Arranged,
    NotVisible,
    AncestorMeasureInvalid,
}

/// Drives measure and arrange for the tree rooted at one view root.
pub struct LayoutManager {
    queue: Rc<LayoutQueue>,
    root: ElementId,
    root_layout: Rc<LayoutState>,
    allocated: Size,
    max_passes: usize,
}

impl LayoutManager {
    /// Install `root` as the view root of `tree` and take over its layout.
    pub fn new(tree: &mut ElementTree, root: ElementId, max_passes: usize) -> LayoutResult<Self> {
        let queue = Rc::new(LayoutQueue::new());
        tree.set_root(root, Rc::clone(&queue))?;
        let root_layout = tree
            .base_rc(root)
            .map(|base| Rc::clone(base.layout()))
            .ok_or(LayoutError::UnknownElement(root))?;
        Ok(Self {
            queue,
            root,
            root_layout,
            allocated: Size::ZERO,
            max_passes: max_passes.max(1),
        })
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn state(&self) -> PassState {
        self.queue.state.get()
    }

    pub fn allocated_size(&self) -> Size {
        self.allocated
    }

    /// Size the root is measured and arranged against.
    pub fn set_allocated_size(&mut self, size: Size) {
        if self.allocated != size {
            self.allocated = size;
            self.root_layout.invalidate_measure();
        }
    }

    /// Number of queued `(measure, arrange)` entries.
    pub fn pending(&self) -> (usize, usize) {
        self.queue.pending()
    }

    /// Queue a node for re-measure.
    ///
    /// Invalidating a node that is not under this view's root is a usage
    /// error: it asserts in debug builds and is ignored otherwise.
    pub fn invalidate_measure(&self, tree: &ElementTree, id: ElementId) {
        match tree.base(id) {
            Some(base) if base.root() == Some(self.root) => base.invalidate_measure(),
            _ => debug_assert!(false, "invalidate_measure on detached element {id:?}"),
        }
    }

    /// Queue a node for re-arrange. Same detached-node policy as
    /// [`LayoutManager::invalidate_measure`].
    pub fn invalidate_arrange(&self, tree: &ElementTree, id: ElementId) {
        match tree.base(id) {
            Some(base) if base.root() == Some(self.root) => base.invalidate_arrange(),
            _ => debug_assert!(false, "invalidate_arrange on detached element {id:?}"),
        }
    }

    /// Lay out the root against the allocated size, then settle whatever
    /// that invalidated with one ordinary pass.
    pub fn execute_initial_layout_pass(&mut self, tree: &mut ElementTree) -> LayoutResult<()> {
        self.root_layout.invalidate_measure();
        tree.measure(self.root, self.allocated)?;
        tree.arrange(self.root, Rect::from_size(self.allocated))?;
        self.execute_layout_pass(tree)
    }

    /// Drain the queues, up to the pass cap.
    pub fn execute_layout_pass(&mut self, tree: &mut ElementTree) -> LayoutResult<()> {
        if self.queue.state.get() == PassState::Running {
            return Ok(());
        }
        self.queue.state.set(PassState::Running);
        let result = self.run_passes(tree);

        let (measure, arrange) = self.queue.pending();
        self.queue.state.set(if measure == 0 && arrange == 0 {
            PassState::Idle
        } else {
            PassState::Queued
        });
        result
    }

    fn run_passes(&mut self, tree: &mut ElementTree) -> LayoutResult<()> {
        for _ in 0..self.max_passes {
            self.drain_measure(tree)?;
            self.drain_arrange(tree)?;

            if self.queue.pending().0 == 0 {
                return Ok(());
            }
        }
        let (measure, arrange) = self.queue.pending();
        debug!(
            "Layout pass cap of {} reached, deferring {} measure / {} arrange",
            self.max_passes, measure, arrange
        );
        Ok(())
    }

    fn drain_measure(&self, tree: &mut ElementTree) -> LayoutResult<()> {
        while let Some(id) = self.queue.pop_measure() {
            let Some(base) = tree.base_rc(id) else {
                continue;
            };
            base.layout().take_queued_measure();
            if base.root() != Some(self.root) {
                continue;
            }
            self.measure_node(tree, id)?;
        }
        Ok(())
    }

    fn drain_arrange(&self, tree: &mut ElementTree) -> LayoutResult<()> {
        // re-queued only after the drain, so the next inner pass measures
        // them before they are arranged again
        let mut deferred = Vec::new();
        while let Some(id) = self.queue.pop_arrange() {
            let Some(base) = tree.base_rc(id) else {
                continue;
            };
            base.layout().take_queued_arrange();
            if base.root() != Some(self.root) {
                continue;
            }
            if self.arrange_node(tree, id)? == ArrangeResult::AncestorMeasureInvalid {
                deferred.push(base);
            }
        }
        for base in deferred {
            base.layout().requeue_measure();
            base.invalidate_arrange();
        }
        Ok(())
    }

    /// Measure ancestors first, then the node itself. Returns false if the
    /// node or an ancestor is hidden, or its parent does not show it.
    fn measure_node(&self, tree: &mut ElementTree, id: ElementId) -> LayoutResult<bool> {
        let Some(base) = tree.base_rc(id) else {
            return Ok(false);
        };
        if !base.is_visible() {
            return Ok(false);
        }
        let parent = base.parent();
        if let Some(parent) = parent
            && !self.measure_node(tree, parent)?
        {
            return Ok(false);
        }

        // an ancestor's measure may already have handled this node
        if base.is_measure_valid() {
            return Ok(true);
        }
        if id == self.root {
            tree.measure(id, self.allocated)?;
            return Ok(true);
        }
        if let Some(previous) = base.layout().previous_measure() {
            tree.measure(id, previous)?;
            return Ok(true);
        }

        // no constraint of its own: the parent measures it again
        let Some(parent) = parent else {
            return Ok(false);
        };
        if !shows(tree, parent, id) {
            return Ok(false);
        }
        let Some(parent_base) = tree.base_rc(parent) else {
            return Ok(false);
        };
        let constraint = if parent == self.root {
            Some(self.allocated)
        } else {
            parent_base.layout().previous_measure()
        };
        let Some(constraint) = constraint else {
            return Ok(false);
        };
        parent_base.layout().expire_measure();
        tree.measure(parent, constraint)?;
        Ok(true)
    }

    fn arrange_node(&self, tree: &mut ElementTree, id: ElementId) -> LayoutResult<ArrangeResult> {
        let Some(base) = tree.base_rc(id) else {
            return Ok(ArrangeResult::NotVisible);
        };
        if !base.is_visible() {
            return Ok(ArrangeResult::NotVisible);
        }
        let parent = base.parent();
        if let Some(parent) = parent {
            let parent_result = self.arrange_node(tree, parent)?;
            if parent_result != ArrangeResult::Arranged {
                return Ok(parent_result);
            }
        }
        if !base.is_measure_valid() {
            // a branch its parent does not currently show is never measured
            if let Some(parent) = parent
                && !shows(tree, parent, id)
            {
                return Ok(ArrangeResult::NotVisible);
            }
            return Ok(ArrangeResult::AncestorMeasureInvalid);
        }
        if base.is_arrange_valid() {
            return Ok(ArrangeResult::Arranged);
        }

        if id == self.root {
            tree.arrange(id, Rect::from_size(self.allocated))?;
        } else if let Some(previous) = base.layout().previous_arrange() {
            tree.arrange(id, previous)?;
        } else if let Some(parent) = parent
            && let Some(parent_base) = tree.base_rc(parent)
        {
            // the parent hands out the rect
            let rect = if parent == self.root {
                Some(Rect::from_size(self.allocated))
            } else {
                parent_base.layout().previous_arrange()
            };
            if let Some(rect) = rect {
                parent_base.layout().expire_arrange();
                tree.arrange(parent, rect)?;
            }
        }
        Ok(ArrangeResult::Arranged)
    }
}

/// Whether `parent` currently enumerates `child`.
fn shows(tree: &ElementTree, parent: ElementId, child: ElementId) -> bool {
    (0..tree.child_count(parent)).any(|index| tree.child_at(parent, index) == Some(child))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::layouts::{ContentControl, Panel, StackPanel};
    use crate::ui::{Element, LayoutContext};

    /// Reports a NaN size from its next measure when `fail_next` is set.
    struct Flaky {
        fail_next: Rc<Cell<bool>>,
    }

    impl Element for Flaky {
        fn measure_override(&mut self, _cx: &mut LayoutContext<'_>, _available: Size) -> LayoutResult<Size> {
            if self.fail_next.replace(false) {
                Ok(Size::new(f32::NAN, 0.0))
            } else {
                Ok(Size::new(10.0, 10.0))
            }
        }
    }

    /// Invalidates itself from every arrange, so layout never settles.
    struct Restless {
        arranges: Rc<Cell<u32>>,
    }

    impl Element for Restless {
        fn arrange_override(&mut self, cx: &mut LayoutContext<'_>, final_size: Size) -> LayoutResult<Size> {
            self.arranges.set(self.arranges.get() + 1);
            cx.base().invalidate_measure();
            Ok(final_size)
        }
    }

    /// Sets its own width while being measured.
    struct SelfSizing;

    impl Element for SelfSizing {
        fn measure_override(&mut self, cx: &mut LayoutContext<'_>, available: Size) -> LayoutResult<Size> {
            cx.base().width().set(Some(30.0));
            Ok(cx.natural_size(available))
        }
    }

    fn view(size: Size) -> (ElementTree, LayoutManager, ElementId) {
        let mut tree = ElementTree::new();
        let root = tree.insert(ContentControl::new()).unwrap();
        let mut manager = LayoutManager::new(&mut tree, root, MAX_LAYOUT_PASSES).unwrap();
        manager.set_allocated_size(size);
        (tree, manager, root)
    }

    fn fixed(tree: &mut ElementTree, width: f32, height: f32) -> ElementId {
        let id = tree.insert(Panel::new()).unwrap();
        let base = tree.base(id).unwrap();
        base.width().set(Some(width));
        base.height().set(Some(height));
        id
    }

    #[test]
    fn initial_pass_lays_out_and_goes_idle() {
        let (mut tree, mut manager, root) = view(Size::new(240.0, 320.0));
        let panel = tree.insert(StackPanel::new()).unwrap();
        tree.set_content(root, Some(panel)).unwrap();

        manager.execute_initial_layout_pass(&mut tree).unwrap();

        let base = tree.base(panel).unwrap();
        assert!(base.is_measure_valid());
        assert!(base.is_arrange_valid());
        assert_eq!(base.bounds(), Rect::new(0.0, 0.0, 240.0, 320.0));
        assert_eq!(manager.state(), PassState::Idle);
        assert_eq!(manager.pending(), (0, 0));
    }

    #[test]
    fn replacing_children_invalidates_until_next_pass() {
        let (mut tree, mut manager, root) = view(Size::new(240.0, 320.0));
        let panel = tree.insert(StackPanel::new()).unwrap();
        tree.set_content(root, Some(panel)).unwrap();
        let a = fixed(&mut tree, 10.0, 10.0);
        tree.set_children(panel, vec![a]).unwrap();
        manager.execute_initial_layout_pass(&mut tree).unwrap();

        let b = fixed(&mut tree, 10.0, 30.0);
        tree.set_children(panel, vec![b]).unwrap();
        {
            let base = tree.base(panel).unwrap();
            assert!(!base.is_measure_valid());
            assert!(!base.is_arrange_valid());
        }
        assert_eq!(manager.state(), PassState::Queued);
        assert_eq!(tree.base(a).unwrap().parent(), None);

        manager.execute_layout_pass(&mut tree).unwrap();
        let base = tree.base(panel).unwrap();
        assert!(base.is_measure_valid());
        assert!(base.is_arrange_valid());
        assert_eq!(tree.base(b).unwrap().bounds(), Rect::new(0.0, 0.0, 240.0, 30.0));
    }

    #[test]
    fn property_change_relayouts_the_node() {
        let (mut tree, mut manager, root) = view(Size::new(100.0, 100.0));
        let panel = tree.insert(StackPanel::new()).unwrap();
        tree.set_content(root, Some(panel)).unwrap();
        let a = fixed(&mut tree, 10.0, 10.0);
        let b = fixed(&mut tree, 10.0, 10.0);
        tree.set_children(panel, vec![a, b]).unwrap();
        manager.execute_initial_layout_pass(&mut tree).unwrap();
        assert_eq!(tree.base(b).unwrap().bounds().y, 10.0);

        tree.base(a).unwrap().height().set(Some(25.0));
        manager.execute_layout_pass(&mut tree).unwrap();

        assert_eq!(tree.base(a).unwrap().bounds().height, 25.0);
        assert_eq!(tree.base(b).unwrap().bounds().y, 25.0);
        assert_eq!(manager.state(), PassState::Idle);
    }

    #[test]
    fn hidden_child_gives_up_its_space() {
        let (mut tree, mut manager, root) = view(Size::new(100.0, 100.0));
        let panel = tree.insert(StackPanel::new()).unwrap();
        tree.set_content(root, Some(panel)).unwrap();
        let a = fixed(&mut tree, 10.0, 10.0);
        let b = fixed(&mut tree, 10.0, 10.0);
        tree.set_children(panel, vec![a, b]).unwrap();
        manager.execute_initial_layout_pass(&mut tree).unwrap();

        tree.base(a).unwrap().visible().set(false);
        manager.execute_layout_pass(&mut tree).unwrap();

        assert_eq!(tree.base(b).unwrap().bounds().y, 0.0);
    }

    #[test]
    fn detached_nodes_are_never_queued() {
        let (mut tree, manager, _root) = view(Size::new(100.0, 100.0));
        let loose = fixed(&mut tree, 10.0, 10.0);
        tree.base(loose).unwrap().width().set(Some(20.0));
        assert_eq!(manager.pending(), (1, 1));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "detached")]
    fn invalidating_a_detached_node_asserts_in_debug() {
        let (mut tree, manager, _root) = view(Size::new(100.0, 100.0));
        let loose = fixed(&mut tree, 10.0, 10.0);
        manager.invalidate_measure(&tree, loose);
    }

    #[test]
    fn failed_measure_recovers_on_the_next_pass() {
        let (mut tree, mut manager, root) = view(Size::new(100.0, 100.0));
        let fail_next = Rc::new(Cell::new(false));
        let flaky = tree
            .insert(Flaky {
                fail_next: Rc::clone(&fail_next),
            })
            .unwrap();
        tree.set_content(root, Some(flaky)).unwrap();
        manager.execute_initial_layout_pass(&mut tree).unwrap();

        fail_next.set(true);
        tree.base(flaky).unwrap().invalidate_measure();
        assert!(matches!(
            manager.execute_layout_pass(&mut tree),
            Err(LayoutError::InvalidMeasure { element, .. }) if element == flaky
        ));
        assert_eq!(manager.state(), PassState::Queued);

        manager.execute_layout_pass(&mut tree).unwrap();
        let base = tree.base(flaky).unwrap();
        assert!(base.is_measure_valid());
        assert!(base.is_arrange_valid());
        assert_eq!(base.bounds(), Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(manager.state(), PassState::Idle);
    }

    #[test]
    fn endless_invalidation_stops_at_the_pass_cap() {
        let mut tree = ElementTree::new();
        let arranges = Rc::new(Cell::new(0));
        let root = tree
            .insert(Restless {
                arranges: Rc::clone(&arranges),
            })
            .unwrap();
        let mut manager = LayoutManager::new(&mut tree, root, 2).unwrap();
        manager.set_allocated_size(Size::new(50.0, 50.0));

        // one direct arrange, then one per inner pass
        manager.execute_initial_layout_pass(&mut tree).unwrap();
        assert_eq!(arranges.get(), 3);
        assert_eq!(manager.state(), PassState::Queued);
        assert_eq!(manager.pending(), (1, 1));

        // the leftovers carry over to the next frame
        manager.execute_layout_pass(&mut tree).unwrap();
        assert_eq!(arranges.get(), 5);
        assert_eq!(manager.state(), PassState::Queued);
    }

    #[test]
    fn self_invalidation_inside_measure_is_ignored() {
        let mut tree = ElementTree::new();
        let root = tree.insert(SelfSizing).unwrap();
        let mut manager = LayoutManager::new(&mut tree, root, MAX_LAYOUT_PASSES).unwrap();
        manager.set_allocated_size(Size::new(100.0, 100.0));

        manager.execute_initial_layout_pass(&mut tree).unwrap();

        let base = tree.base(root).unwrap();
        assert!(base.is_measure_valid());
        assert_eq!(base.desired_size(), Size::new(30.0, 100.0));
        assert_eq!(manager.state(), PassState::Idle);
        assert_eq!(manager.pending(), (0, 0));
    }

    #[test]
    fn invalidated_child_is_measured_through_its_parent() {
        let (mut tree, mut manager, root) = view(Size::new(100.0, 100.0));
        let panel = tree.insert(StackPanel::new()).unwrap();
        tree.set_content(root, Some(panel)).unwrap();
        let a = fixed(&mut tree, 10.0, 10.0);
        tree.set_children(panel, vec![a]).unwrap();
        manager.execute_initial_layout_pass(&mut tree).unwrap();

        tree.base(a).unwrap().invalidate_measure();
        assert_eq!(tree.base(a).unwrap().desired_size(), Size::ZERO);

        manager.execute_layout_pass(&mut tree).unwrap();
        let base = tree.base(a).unwrap();
        assert!(base.is_measure_valid());
        assert!(base.is_arrange_valid());
        assert_eq!(base.desired_size(), Size::new(10.0, 10.0));
        assert_eq!(base.bounds(), Rect::new(0.0, 0.0, 100.0, 10.0));
    }
}
