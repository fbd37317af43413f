//! One view's element tree together with its layout and focus state

use alloc::boxed::Box;
use log::debug;

use crate::error::{DrawResult, LayoutResult, UiResult};
use crate::focus::FocusManager;
use crate::geometry::Size;
use crate::layout_manager::LayoutManager;
use crate::render::{GraphicsDevice, Renderer};
use crate::ui::{ContentControl, ElementId, ElementTree};
use crate::view::{View, ViewKey};

/// A constructed view.
///
/// The root of every view is a [`ContentControl`] holding the element the
/// view built. The host survives unload so navigating back does not rebuild
/// the tree.
pub struct ViewHost {
    key: ViewKey,
    view: Box<dyn View>,
    tree: ElementTree,
    root: ElementId,
    content: ElementId,
    layout: LayoutManager,
    focus: FocusManager,
    loaded: bool,
}

impl ViewHost {
    /// Build `view` into a fresh tree.
    pub fn new(key: ViewKey, mut view: Box<dyn View>, max_layout_passes: usize) -> UiResult<Self> {
        let mut tree = ElementTree::new();
        let root = tree.insert_named("root", ContentControl::new())?;
        let layout = LayoutManager::new(&mut tree, root, max_layout_passes)?;
        let content = view.build(&mut tree)?;
        tree.set_content(root, Some(content))?;
        debug!("Built view {} with {} elements", key.name(), tree.len());

        Ok(Self {
            key,
            view,
            tree,
            root,
            content,
            layout,
            focus: FocusManager::default(),
            loaded: false,
        })
    }

    pub fn key(&self) -> ViewKey {
        self.key
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ElementTree {
        &mut self.tree
    }

    /// The view root (a content control).
    pub fn root(&self) -> ElementId {
        self.root
    }

    /// The element the view built.
    pub fn content(&self) -> ElementId {
        self.content
    }

    pub fn layout(&self) -> &LayoutManager {
        &self.layout
    }

    pub fn focus(&self) -> &FocusManager {
        &self.focus
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// The size the view is laid out against.
    pub fn allocated_size(&self) -> Size {
        self.layout.allocated_size()
    }

    /// Lay the view out at `allocated`, run load hooks, rebuild the focus
    /// order and tell the view it is loaded.
    pub fn load(&mut self, allocated: Size) -> LayoutResult<()> {
        self.layout.set_allocated_size(allocated);
        self.tree.load_subtree(self.root);
        self.layout.execute_initial_layout_pass(&mut self.tree)?;
        self.focus = FocusManager::build(&mut self.tree, self.root);
        self.loaded = true;
        self.view.loaded(&mut self.tree, self.content);
        Ok(())
    }

    /// Run unload hooks. The tree and its state are kept.
    pub fn unload(&mut self) {
        if !self.loaded {
            return;
        }
        self.focus.release(&mut self.tree);
        self.tree.unload_subtree(self.root);
        self.view.unloaded(&mut self.tree);
        self.loaded = false;
    }

    /// Settle pending layout.
    pub fn update_layout(&mut self) -> LayoutResult<()> {
        self.layout.execute_layout_pass(&mut self.tree)
    }

    /// Draw the view's tree.
    pub fn render<G: GraphicsDevice>(&self, renderer: &mut Renderer<G>) -> DrawResult<()> {
        renderer.render(&self.tree, self.root)
    }

    pub fn focus_next(&mut self) {
        self.focus.next(&mut self.tree);
    }

    pub fn focus_previous(&mut self) {
        self.focus.previous(&mut self.tree);
    }

    pub fn focus_by_name(&mut self, name: &str) -> bool {
        self.focus.focus_by_name(&mut self.tree, name)
    }

    pub fn focus_element(&mut self, id: ElementId) -> bool {
        self.focus.focus_element(&mut self.tree, id)
    }
}

impl core::fmt::Debug for ViewHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ViewHost")
            .field("view", &self.key.name())
            .field("elements", &self.tree.len())
            .field("loaded", &self.loaded)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::ui::{Dock, DockPanel, Panel};

    /// Header docked to the top above a filling content area.
    struct Docked;

    impl View for Docked {
        fn build(&mut self, tree: &mut ElementTree) -> UiResult<ElementId> {
            let dock = tree.insert(DockPanel::new())?;
            let header = tree.insert_named("header", Panel::new())?;
            let body = tree.insert_named("body", Panel::new())?;
            if let Some(base) = tree.base(header) {
                base.height().set(Some(20.0));
                DockPanel::set_dock(base, Dock::Top)?;
            }
            tree.set_children(dock, alloc::vec![header, body])?;
            Ok(dock)
        }
    }

    #[test]
    fn load_lays_the_view_out_at_the_allocated_size() {
        let mut host = ViewHost::new(ViewKey::of::<Docked>(), Box::new(Docked), 10).unwrap();
        host.load(Size::new(240.0, 320.0)).unwrap();

        let tree = host.tree();
        let header = tree.find_by_name(host.root(), "header").unwrap();
        let body = tree.find_by_name(host.root(), "body").unwrap();
        assert_eq!(tree.base(header).unwrap().bounds(), Rect::new(0.0, 0.0, 240.0, 20.0));
        assert_eq!(tree.base(body).unwrap().bounds(), Rect::new(0.0, 20.0, 240.0, 300.0));
        assert!(host.is_loaded());
    }

    #[test]
    fn unload_keeps_the_tree() {
        let mut host = ViewHost::new(ViewKey::of::<Docked>(), Box::new(Docked), 10).unwrap();
        host.load(Size::new(100.0, 100.0)).unwrap();
        let elements = host.tree().len();

        host.unload();
        assert!(!host.is_loaded());
        assert_eq!(host.tree().len(), elements);
        assert_eq!(host.tree().base(host.content()).unwrap().root(), Some(host.root()));
    }
}
