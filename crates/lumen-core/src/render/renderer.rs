//! Drawing a laid-out element tree and finding elements under a point

use alloc::vec::Vec;
use embedded_graphics::pixelcolor::Rgb565;

use crate::error::DrawResult;
use crate::geometry::{Point, Rect};
use crate::render::device::GraphicsDevice;
use crate::render::drawing::{DeviceContext, DrawingContext};
use crate::ui::{ElementId, ElementTree, HitTestResult};

/// Walks element trees onto a [`GraphicsDevice`].
///
/// Element bounds are stored relative to the parent; the renderer
/// accumulates parent origins on the way down so every element draws in view
/// coordinates.
pub struct Renderer<G> {
    device: G,
}

impl<G: GraphicsDevice> Renderer<G> {
    pub fn new(device: G) -> Self {
        Self { device }
    }

    /// The whole device as a rectangle.
    pub fn device_bounds(&self) -> Rect {
        let size = self.device.size();
        Rect::new(0.0, 0.0, size.width as f32, size.height as f32)
    }

    pub fn device(&self) -> &G {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut G {
        &mut self.device
    }

    pub fn into_inner(self) -> G {
        self.device
    }

    /// Draw `root` and its visible descendants, parents before children.
    pub fn render(&mut self, tree: &ElementTree, root: ElementId) -> DrawResult<()> {
        let mut context = DeviceContext::new(&mut self.device);
        render_element(tree, root, Point::ZERO, &mut context)
    }

    /// Innermost element under `point`, later siblings winning over earlier
    /// ones. `None` when the point is outside `root`.
    pub fn hit_test(&self, tree: &ElementTree, root: ElementId, point: Point) -> Option<HitTestResult> {
        let mut hits = Vec::new();
        collect_hits(tree, root, point, Point::ZERO, &mut hits);

        hits.pop().map(|(element, bounds)| HitTestResult {
            element,
            point,
            local_point: point.relative_to(bounds.origin()),
        })
    }

    pub fn clear(&mut self, color: Rgb565) -> DrawResult<()> {
        self.device.clear(color)
    }

    pub fn show(&mut self) -> DrawResult<()> {
        self.device.show()
    }
}

fn render_element(
    tree: &ElementTree,
    id: ElementId,
    origin: Point,
    context: &mut dyn DrawingContext,
) -> DrawResult<()> {
    let Some(base) = tree.base(id) else {
        return Ok(());
    };
    if !base.is_visible() {
        return Ok(());
    }

    let bounds = base.bounds().translate(origin);
    tree.with_element(id, |element, base| element.render(base, context, bounds))
        .unwrap_or(Ok(()))?;
    base.layout().mark_clean();

    for child in tree.children(id) {
        render_element(tree, child, bounds.origin(), context)?;
    }
    Ok(())
}

fn collect_hits(
    tree: &ElementTree,
    id: ElementId,
    point: Point,
    origin: Point,
    hits: &mut Vec<(ElementId, Rect)>,
) {
    let Some(base) = tree.base(id) else {
        return;
    };
    if !base.is_visible() {
        return;
    }

    let bounds = base.bounds().translate(origin);
    if !bounds.contains(point) {
        return;
    }
    hits.push((id, bounds));

    for child in tree.children(id) {
        collect_hits(tree, child, point, bounds.origin(), hits);
    }
}
