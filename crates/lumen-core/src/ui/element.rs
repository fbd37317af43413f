//! Element nodes: shared geometry state and the overridable element behavior
//!
//! Every node in an [`ElementTree`](crate::ui::ElementTree) is split in two:
//! an [`ElementBase`] holding the geometry properties and layout flags common
//! to all elements, and a boxed [`Element`] with the behavior that differs per
//! kind (how children are enumerated, measured, arranged and drawn).

use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;
use core::cell::{Cell, RefCell};

use crate::binding::{ObservableObject, ReactiveProperty};
use crate::error::{DrawResult, LayoutResult, PropertyResult};
use crate::geometry::{Rect, Size, Thickness};
use crate::layout_manager::LayoutQueue;
use crate::render::DrawingContext;
use crate::ui::context::LayoutContext;
use crate::ui::core::{Alignment, Clickable, Focusable};
use crate::ui::styling::Brush;

// ============================================================================
// Identity
// ============================================================================

/// Handle to a node in an element tree. Stale handles are detected through the
/// generation counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl ElementId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// What a property change invalidates on the element that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affects {
    Nothing,
    Render,
    Arrange,
    Measure,
    /// Attached properties: the parent reads the value during its own layout.
    ParentMeasure,
}

// ============================================================================
// Layout state
// ============================================================================

/// Validity flags and memoized layout inputs of one node.
///
/// Shared behind an `Rc` so property links can invalidate synchronously from
/// inside a setter without holding a reference to the tree.
pub(crate) struct LayoutState {
    id: ElementId,
    measure_valid: Cell<bool>,
    arrange_valid: Cell<bool>,
    dirty: Cell<bool>,
    measuring: Cell<bool>,
    desired_size: Cell<Size>,
    reported_size: Cell<Size>,
    previous_measure: Cell<Option<Size>>,
    previous_arrange: Cell<Option<Rect>>,
    bounds: Cell<Rect>,
    queued_measure: Cell<bool>,
    queued_arrange: Cell<bool>,
    parent: RefCell<Weak<LayoutState>>,
    queue: RefCell<Weak<LayoutQueue>>,
}

impl LayoutState {
    fn new(id: ElementId) -> Self {
        Self {
            id,
            measure_valid: Cell::new(false),
            arrange_valid: Cell::new(false),
            dirty: Cell::new(true),
            measuring: Cell::new(false),
            desired_size: Cell::new(Size::ZERO),
            reported_size: Cell::new(Size::ZERO),
            previous_measure: Cell::new(None),
            previous_arrange: Cell::new(None),
            bounds: Cell::new(Rect::default()),
            queued_measure: Cell::new(false),
            queued_arrange: Cell::new(false),
            parent: RefCell::new(Weak::new()),
            queue: RefCell::new(Weak::new()),
        }
    }

    pub(crate) fn is_measure_valid(&self) -> bool {
        self.measure_valid.get()
    }

    pub(crate) fn is_arrange_valid(&self) -> bool {
        self.arrange_valid.get()
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub(crate) fn desired_size(&self) -> Size {
        self.desired_size.get()
    }

    pub(crate) fn previous_measure(&self) -> Option<Size> {
        self.previous_measure.get()
    }

    pub(crate) fn previous_arrange(&self) -> Option<Rect> {
        self.previous_arrange.get()
    }

    pub(crate) fn bounds(&self) -> Rect {
        self.bounds.get()
    }

    /// Clear measure validity, the desired size and the memoized available
    /// size, then invalidate arrange. Ignored while this node is inside its
    /// own measure.
    pub(crate) fn invalidate_measure(&self) {
        if self.measuring.get() {
            return;
        }
        self.measure_valid.set(false);
        self.desired_size.set(Size::ZERO);
        self.previous_measure.set(None);
        self.enqueue_measure();
        self.invalidate_arrange();
    }

    pub(crate) fn invalidate_arrange(&self) {
        self.arrange_valid.set(false);
        self.previous_arrange.set(None);
        self.dirty.set(true);
        self.enqueue_arrange();
    }

    pub(crate) fn invalidate_render(&self) {
        self.dirty.set(true);
    }

    pub(crate) fn mark_clean(&self) {
        self.dirty.set(false);
    }

    pub(crate) fn apply(&self, affects: Affects) {
        match affects {
            Affects::Nothing => {}
            Affects::Render => self.invalidate_render(),
            Affects::Arrange => self.invalidate_arrange(),
            Affects::Measure => self.invalidate_measure(),
            Affects::ParentMeasure => {
                if let Some(parent) = self.parent.borrow().upgrade() {
                    parent.invalidate_measure();
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Measure / arrange bookkeeping, driven by the tree
    // ------------------------------------------------------------------------

    /// Enter this node's measure. The returned guard clears the flag on drop,
    /// including when the measure step returns early with an error.
    pub(crate) fn begin_measure(&self) -> MeasureGuard<'_> {
        self.measure_valid.set(true);
        self.measuring.set(true);
        MeasureGuard { state: self }
    }

    pub(crate) fn finish_measure(&self, available: Size, desired: Size) {
        self.desired_size.set(desired);
        self.previous_measure.set(Some(available));

        let reported = self.reported_size.replace(desired);
        if reported != desired {
            // the parent may already be mid-measure, in which case this is ignored
            if let Some(parent) = self.parent.borrow().upgrade() {
                parent.invalidate_measure();
            }
        }
    }

    /// Roll back after a failed measure. The old arrangement no longer
    /// matches anything, so arrange is dropped as well.
    pub(crate) fn fail_measure(&self) {
        self.measure_valid.set(false);
        self.arrange_valid.set(false);
    }

    pub(crate) fn begin_arrange(&self) {
        self.arrange_valid.set(true);
    }

    pub(crate) fn finish_arrange(&self, rect: Rect, bounds: Option<Rect>) {
        self.previous_arrange.set(Some(rect));
        if let Some(bounds) = bounds
            && self.bounds.replace(bounds) != bounds
        {
            self.dirty.set(true);
        }
    }

    pub(crate) fn fail_arrange(&self) {
        self.arrange_valid.set(false);
    }

    // ------------------------------------------------------------------------
    // Attachment
    // ------------------------------------------------------------------------

    pub(crate) fn attach(&self, parent: Option<&Rc<LayoutState>>, queue: &Rc<LayoutQueue>) {
        *self.parent.borrow_mut() = parent.map(Rc::downgrade).unwrap_or_default();
        *self.queue.borrow_mut() = Rc::downgrade(queue);
        self.queued_measure.set(false);
        self.queued_arrange.set(false);
        self.invalidate_measure();
    }

    pub(crate) fn set_parent_only(&self, parent: Option<&Rc<LayoutState>>) {
        *self.parent.borrow_mut() = parent.map(Rc::downgrade).unwrap_or_default();
    }

    /// Leave the rooted tree. Descendants of the removed node keep the link
    /// to their own parent, which is still their parent.
    pub(crate) fn detach(&self, keep_parent: bool) {
        if !keep_parent {
            *self.parent.borrow_mut() = Weak::new();
        }
        *self.queue.borrow_mut() = Weak::new();
        self.queued_measure.set(false);
        self.queued_arrange.set(false);
        self.measure_valid.set(false);
        self.arrange_valid.set(false);
        self.previous_measure.set(None);
        self.previous_arrange.set(None);
        self.desired_size.set(Size::ZERO);
        self.reported_size.set(Size::ZERO);
    }

    /// Put the node back on the measure queue without touching its flags.
    pub(crate) fn requeue_measure(&self) {
        self.enqueue_measure();
    }

    /// Mark measure stale but keep the memoized available size, so the next
    /// measure with that same size runs the override again. Not queued.
    pub(crate) fn expire_measure(&self) {
        self.measure_valid.set(false);
    }

    /// Arrange counterpart of [`LayoutState::expire_measure`].
    pub(crate) fn expire_arrange(&self) {
        self.arrange_valid.set(false);
    }

    pub(crate) fn take_queued_measure(&self) {
        self.queued_measure.set(false);
    }

    pub(crate) fn take_queued_arrange(&self) {
        self.queued_arrange.set(false);
    }

    fn enqueue_measure(&self) {
        if self.queued_measure.get() {
            return;
        }
        if let Some(queue) = self.queue.borrow().upgrade() {
            queue.push_measure(self.id);
            self.queued_measure.set(true);
        }
    }

    fn enqueue_arrange(&self) {
        if self.queued_arrange.get() {
            return;
        }
        if let Some(queue) = self.queue.borrow().upgrade() {
            queue.push_arrange(self.id);
            self.queued_arrange.set(true);
        }
    }
}

/// Scope of a node's measure; see [`LayoutState::begin_measure`].
pub(crate) struct MeasureGuard<'a> {
    state: &'a LayoutState,
}

impl Drop for MeasureGuard<'_> {
    fn drop(&mut self) {
        self.state.measuring.set(false);
    }
}

// ============================================================================
// ElementBase
// ============================================================================

/// Geometry, visibility and layout state shared by every element.
///
/// All layout inputs are reactive properties linked to this node's
/// invalidation, so setting e.g. `margin` is enough to get the element
/// re-laid out on the next pass.
pub struct ElementBase {
    id: ElementId,
    name: Option<String>,
    parent: Cell<Option<ElementId>>,
    root: Cell<Option<ElementId>>,
    object: ObservableObject,
    layout: Rc<LayoutState>,
    width: ReactiveProperty<Option<f32>>,
    height: ReactiveProperty<Option<f32>>,
    min_width: ReactiveProperty<f32>,
    max_width: ReactiveProperty<f32>,
    min_height: ReactiveProperty<f32>,
    max_height: ReactiveProperty<f32>,
    margin: ReactiveProperty<Thickness>,
    horizontal_alignment: ReactiveProperty<Alignment>,
    vertical_alignment: ReactiveProperty<Alignment>,
    visible: ReactiveProperty<bool>,
    background: ReactiveProperty<Brush>,
}

impl ElementBase {
    pub(crate) fn new(id: ElementId, name: Option<String>) -> Self {
        let layout = Rc::new(LayoutState::new(id));
        let object = ObservableObject::new();

        let base = Self {
            id,
            name,
            parent: Cell::new(None),
            root: Cell::new(None),
            width: ReactiveProperty::new("width", None),
            height: ReactiveProperty::new("height", None),
            min_width: ReactiveProperty::new("min_width", 0.0),
            max_width: ReactiveProperty::new("max_width", f32::INFINITY),
            min_height: ReactiveProperty::new("min_height", 0.0),
            max_height: ReactiveProperty::new("max_height", f32::INFINITY),
            margin: ReactiveProperty::new("margin", Thickness::ZERO),
            horizontal_alignment: ReactiveProperty::new("horizontal_alignment", Alignment::Stretch),
            vertical_alignment: ReactiveProperty::new("vertical_alignment", Alignment::Stretch),
            visible: ReactiveProperty::new("visible", true),
            background: ReactiveProperty::new("background", Brush::None),
            object,
            layout,
        };
        base.install_own_properties();
        base
    }

    // names are unique within a fresh bag, adoption cannot collide here
    fn install_own_properties(&self) {
        let _ = self.register(&self.width, Affects::Measure);
        let _ = self.register(&self.height, Affects::Measure);
        let _ = self.register(&self.min_width, Affects::Measure);
        let _ = self.register(&self.max_width, Affects::Measure);
        let _ = self.register(&self.min_height, Affects::Measure);
        let _ = self.register(&self.max_height, Affects::Measure);
        let _ = self.register(&self.margin, Affects::Measure);
        let _ = self.register(&self.horizontal_alignment, Affects::Arrange);
        let _ = self.register(&self.vertical_alignment, Affects::Arrange);
        let _ = self.register(&self.visible, Affects::Measure);
        let _ = self.register(&self.background, Affects::Render);

        // an element that appears or disappears changes its parent's layout
        let layout = Rc::downgrade(&self.layout);
        self.visible.link(move |_| {
            if let Some(state) = layout.upgrade() {
                state.apply(Affects::ParentMeasure);
            }
        });
    }

    /// Add a kind-specific property to this element's bag and link it to the
    /// given invalidation.
    pub fn register<T: Clone + 'static>(
        &self,
        property: &ReactiveProperty<T>,
        affects: Affects,
    ) -> PropertyResult<()> {
        self.object.adopt(property)?;
        self.link(property, affects);
        Ok(())
    }

    /// Link an arbitrary property (not necessarily owned by this element) to
    /// this element's invalidation.
    pub fn link<T: Clone + 'static>(&self, property: &ReactiveProperty<T>, affects: Affects) {
        if affects == Affects::Nothing {
            return;
        }
        let layout = Rc::downgrade(&self.layout);
        property.link(move |_| {
            if let Some(state) = layout.upgrade() {
                state.apply(affects);
            }
        });
    }

    /// Get or create an attached property: a value stored on this element but
    /// read by its parent during layout. Changing it invalidates the parent's
    /// measure.
    pub fn attached<T: Clone + 'static>(
        &self,
        name: &'static str,
        default: T,
    ) -> PropertyResult<ReactiveProperty<T>> {
        if let Some(existing) = self.object.get_property::<T>(name)? {
            return Ok(existing);
        }
        let property = self.object.property(name, default)?;
        self.link(&property, Affects::ParentMeasure);
        Ok(property)
    }

    /// Set an attached property, creating it if needed.
    pub fn set_attached<T: Clone + 'static>(
        &self,
        name: &'static str,
        value: T,
    ) -> PropertyResult<()> {
        let property = self.attached(name, value.clone())?;
        property.set(value);
        Ok(())
    }

    /// Read an attached property, falling back to `default` when unset.
    /// A property bound under `name` with another type is an error.
    pub fn attached_value<T: Clone + 'static>(
        &self,
        name: &'static str,
        default: T,
    ) -> PropertyResult<T> {
        Ok(self
            .object
            .get_property::<T>(name)?
            .map_or(default, |property| property.get()))
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent.get()
    }

    /// The view root this element is attached under, if any.
    pub fn root(&self) -> Option<ElementId> {
        self.root.get()
    }

    pub fn object(&self) -> &ObservableObject {
        &self.object
    }

    pub fn width(&self) -> &ReactiveProperty<Option<f32>> {
        &self.width
    }

    pub fn height(&self) -> &ReactiveProperty<Option<f32>> {
        &self.height
    }

    pub fn min_width(&self) -> &ReactiveProperty<f32> {
        &self.min_width
    }

    pub fn max_width(&self) -> &ReactiveProperty<f32> {
        &self.max_width
    }

    pub fn min_height(&self) -> &ReactiveProperty<f32> {
        &self.min_height
    }

    pub fn max_height(&self) -> &ReactiveProperty<f32> {
        &self.max_height
    }

    pub fn margin(&self) -> &ReactiveProperty<Thickness> {
        &self.margin
    }

    pub fn horizontal_alignment(&self) -> &ReactiveProperty<Alignment> {
        &self.horizontal_alignment
    }

    pub fn vertical_alignment(&self) -> &ReactiveProperty<Alignment> {
        &self.vertical_alignment
    }

    pub fn visible(&self) -> &ReactiveProperty<bool> {
        &self.visible
    }

    pub fn background(&self) -> &ReactiveProperty<Brush> {
        &self.background
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    /// Position and size relative to the parent, as of the last arrange.
    pub fn bounds(&self) -> Rect {
        self.layout.bounds()
    }

    pub fn desired_size(&self) -> Size {
        self.layout.desired_size()
    }

    pub fn is_measure_valid(&self) -> bool {
        self.layout.is_measure_valid()
    }

    pub fn is_arrange_valid(&self) -> bool {
        self.layout.is_arrange_valid()
    }

    pub fn is_dirty(&self) -> bool {
        self.layout.is_dirty()
    }

    pub fn invalidate_measure(&self) {
        self.layout.invalidate_measure();
    }

    pub fn invalidate_arrange(&self) {
        self.layout.invalidate_arrange();
    }

    pub fn invalidate_render(&self) {
        self.layout.invalidate_render();
    }

    pub(crate) fn layout(&self) -> &Rc<LayoutState> {
        &self.layout
    }

    pub(crate) fn set_parent(&self, parent: Option<ElementId>) {
        self.parent.set(parent);
    }

    pub(crate) fn set_root(&self, root: Option<ElementId>) {
        self.root.set(root);
    }
}

// ============================================================================
// Element behavior
// ============================================================================

/// Mutable access to the child storage of a container, used by the tree to
/// attach and detach children.
pub enum ChildSlot<'a> {
    /// Ordered collection (panels)
    Many(&'a mut Vec<ElementId>),
    /// Single optional child (content controls)
    Single(&'a mut Option<ElementId>),
}

/// Per-kind element behavior.
///
/// Children are enumerated through `child_count`/`child_at`; render, hit
/// testing, focus discovery and detachment all rely on that one contract.
pub trait Element: Any {
    /// Register kind-specific properties on the element's bag. Called once
    /// when the element is inserted into a tree.
    fn bind(&mut self, _base: &ElementBase) -> PropertyResult<()> {
        Ok(())
    }

    fn child_count(&self) -> usize {
        0
    }

    fn child_at(&self, _index: usize) -> Option<ElementId> {
        None
    }

    /// Every child this element keeps attached, including ones it does not
    /// currently enumerate. Attach, detach and removal walk this list.
    fn attached_children(&self) -> Vec<ElementId> {
        child_ids(self)
    }

    /// Child storage for structural edits. `None` for leaf elements.
    fn child_slot(&mut self) -> Option<ChildSlot<'_>> {
        None
    }

    /// Compute the desired size for the given space (margins already
    /// removed). The default honours explicit width/height, stretches on
    /// finite axes, and grows to fit every child.
    fn measure_override(
        &mut self,
        cx: &mut LayoutContext<'_>,
        available: Size,
    ) -> LayoutResult<Size> {
        let children = child_ids(self);
        cx.measure_default(&children, available)
    }

    /// Position children within `final_size` and return the size used. The
    /// default gives every child the full area.
    fn arrange_override(
        &mut self,
        cx: &mut LayoutContext<'_>,
        final_size: Size,
    ) -> LayoutResult<Size> {
        let children = child_ids(self);
        cx.arrange_default(&children, final_size)
    }

    /// Draw this element (not its children) into `bounds`, which is already
    /// translated into view coordinates.
    fn render(
        &self,
        base: &ElementBase,
        context: &mut dyn DrawingContext,
        bounds: Rect,
    ) -> DrawResult<()> {
        base.background().with(|brush| brush.draw(context, bounds))
    }

    /// The element's view was loaded.
    fn on_load(&mut self, _base: &ElementBase) {}

    /// The element's view was unloaded.
    fn on_unload(&mut self, _base: &ElementBase) {}

    fn as_focusable(&mut self) -> Option<&mut dyn Focusable> {
        None
    }

    fn as_clickable(&mut self) -> Option<&mut dyn Clickable> {
        None
    }
}

/// Snapshot of an element's children in order.
pub fn child_ids<E: Element + ?Sized>(element: &E) -> Vec<ElementId> {
    (0..element.child_count())
        .filter_map(|i| element.child_at(i))
        .collect()
}
