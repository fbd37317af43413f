//! Views, the registry they are created from, and the manager that shows them
//!
//! - [`host`] - one view's element tree with its layout and focus state
//! - [`manager`] - navigation stack, input dispatch and the frame pump

pub mod host;
pub mod manager;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{TypeId, type_name};

use crate::error::UiResult;
use crate::ui::{ElementId, ElementTree};

pub use host::ViewHost;
pub use manager::{
    RenderControl, UI_CHANNEL, UI_CHANNEL_CAPACITY, UiReceiver, UiRequest, UiSender, ViewManager,
    ui_receiver, ui_sender,
};

/// A screen of the application.
///
/// The view builds its element tree once, when it is first navigated to.
/// It can keep handles to the reactive properties it created and update them
/// at any time; the layout manager picks the changes up on the next frame.
pub trait View: 'static {
    /// Create the view's elements and return the content element. The
    /// content is placed inside the view's root content control.
    fn build(&mut self, tree: &mut ElementTree) -> UiResult<ElementId>;

    /// The view was loaded and laid out.
    fn loaded(&mut self, _tree: &mut ElementTree, _content: ElementId) {}

    /// The view is no longer current.
    fn unloaded(&mut self, _tree: &mut ElementTree) {}
}

/// Identity of a view type, used for navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewKey {
    type_id: TypeId,
    name: &'static str,
}

impl ViewKey {
    pub fn of<V: View>() -> Self {
        Self {
            type_id: TypeId::of::<V>(),
            name: type_name::<V>(),
        }
    }

    /// Type name of the view, for logging.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

type Factory = Box<dyn Fn() -> Box<dyn View>>;

/// Factories for the views an application can navigate to.
///
/// # Examples
/// ```ignore
/// let mut views = ViewRegistry::new();
/// views.register(HomeView::default);
/// views.register(|| SettingsView::new(config));
/// let mut manager = ViewManager::new(device, views, UiConfig::default());
/// manager.navigate::<HomeView>()?;
/// ```
#[derive(Default)]
pub struct ViewRegistry {
    factories: Vec<(ViewKey, Factory)>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the factory for `V`.
    pub fn register<V: View>(&mut self, factory: impl Fn() -> V + 'static) -> &mut Self {
        let key = ViewKey::of::<V>();
        let factory: Factory = Box::new(move || Box::new(factory()) as Box<dyn View>);
        match self.factories.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = factory,
            None => self.factories.push((key, factory)),
        }
        self
    }

    pub fn contains(&self, key: ViewKey) -> bool {
        self.factories.iter().any(|(k, _)| *k == key)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Construct a fresh instance of the view registered under `key`.
    pub fn create(&self, key: ViewKey) -> Option<Box<dyn View>> {
        self.factories
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, factory)| factory())
    }
}

impl core::fmt::Debug for ViewRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.factories.iter().map(|(key, _)| key.name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::Panel;

    #[derive(Default)]
    struct First;

    impl View for First {
        fn build(&mut self, tree: &mut ElementTree) -> UiResult<ElementId> {
            Ok(tree.insert(Panel::new())?)
        }
    }

    struct Second;

    impl View for Second {
        fn build(&mut self, tree: &mut ElementTree) -> UiResult<ElementId> {
            Ok(tree.insert(Panel::new())?)
        }
    }

    #[test]
    fn keys_distinguish_view_types() {
        assert_eq!(ViewKey::of::<First>(), ViewKey::of::<First>());
        assert_ne!(ViewKey::of::<First>(), ViewKey::of::<Second>());
        assert!(ViewKey::of::<Second>().name().ends_with("Second"));
    }

    #[test]
    fn registry_creates_registered_views_only() {
        let mut views = ViewRegistry::new();
        views.register(First::default).register(First::default);
        assert_eq!(views.len(), 1);
        assert!(views.create(ViewKey::of::<First>()).is_some());
        assert!(views.create(ViewKey::of::<Second>()).is_none());
    }
}
