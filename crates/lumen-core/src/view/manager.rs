//! View manager for navigation, input dispatch and the frame pump
//!
//! This module provides the task that owns the display:
//! - Keeps one [`ViewHost`] per view ever shown and a bounded back stack
//! - Hit-tests touch input and dispatches it to clickable elements
//! - Draws the current view at a fixed frame rate
//! - Receives navigation and input requests through [`UI_CHANNEL`]

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use log::{debug, error, info};

use crate::binding::ReactiveProperty;
use crate::config::UiConfig;
use crate::error::{UiResult, ViewError};
use crate::render::{GraphicsDevice, Renderer};
use crate::ui::{Action, TouchEvent};
use crate::view::{View, ViewHost, ViewKey, ViewRegistry};

/// Channel capacity for UI requests
pub const UI_CHANNEL_CAPACITY: usize = 4;

/// Deepest navigation history kept
pub const MAX_VIEW_STACK: usize = 8;

/// Request for the frame pump, sent from input drivers and other tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiRequest {
    /// Navigate to the view registered under this key
    Navigate(ViewKey),
    /// Return to the previous view
    GoBack,
    /// Touch input in display coordinates
    Touch(TouchEvent),
    FocusNext,
    FocusPrevious,
    /// Stop presenting frames until `Resume`
    Pause,
    Resume,
}

/// Global channel for UI requests
pub static UI_CHANNEL: Channel<CriticalSectionRawMutex, UiRequest, UI_CHANNEL_CAPACITY> =
    Channel::new();

pub type UiSender<'a> = Sender<'a, CriticalSectionRawMutex, UiRequest, UI_CHANNEL_CAPACITY>;
pub type UiReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, UiRequest, UI_CHANNEL_CAPACITY>;

/// Helper to get a UI request sender
pub fn ui_sender() -> UiSender<'static> {
    UI_CHANNEL.sender()
}

/// Helper to get a UI request receiver
pub fn ui_receiver() -> UiReceiver<'static> {
    UI_CHANNEL.receiver()
}

/// Pause switch for frame presentation.
///
/// Shared with whoever needs to hold the display still (a view switch, a
/// firmware task borrowing the bus). While paused the pump keeps handling
/// requests but draws nothing.
#[derive(Debug, Default)]
pub struct RenderControl {
    paused: Cell<bool>,
}

impl RenderControl {
    pub fn pause(&self) {
        self.paused.set(true);
    }

    pub fn resume(&self) {
        self.paused.set(false);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.get()
    }
}

/// Owns the renderer and every view, and drives them.
pub struct ViewManager<G> {
    renderer: Renderer<G>,
    registry: ViewRegistry,
    hosts: Vec<ViewHost>,
    /// Indices into `hosts`, current view last
    stack: heapless::Vec<usize, MAX_VIEW_STACK>,
    config: UiConfig,
    control: Rc<RenderControl>,
    fps: ReactiveProperty<u32>,
}

impl<G: GraphicsDevice> ViewManager<G> {
    /// Create a manager drawing to `device`. No view is loaded until the
    /// first navigation.
    pub fn new(device: G, registry: ViewRegistry, config: UiConfig) -> Self {
        Self {
            renderer: Renderer::new(device),
            registry,
            hosts: Vec::new(),
            stack: heapless::Vec::new(),
            config,
            control: Rc::new(RenderControl::default()),
            fps: ReactiveProperty::new("fps", 0),
        }
    }

    /// Frames drawn during the last full second of [`ViewManager::run`].
    pub fn fps(&self) -> &ReactiveProperty<u32> {
        &self.fps
    }

    pub fn render_control(&self) -> Rc<RenderControl> {
        Rc::clone(&self.control)
    }

    pub fn config(&self) -> &UiConfig {
        &self.config
    }

    pub fn renderer(&self) -> &Renderer<G> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer<G> {
        &mut self.renderer
    }

    pub fn current_view(&self) -> Option<&ViewHost> {
        self.stack.last().map(|&index| &self.hosts[index])
    }

    pub fn current_view_mut(&mut self) -> Option<&mut ViewHost> {
        self.stack.last().map(|&index| &mut self.hosts[index])
    }

    /// Number of views in the back stack, current one included.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn current_host(&mut self) -> UiResult<&mut ViewHost> {
        Ok(self.current_view_mut().ok_or(ViewError::NoCurrentView)?)
    }

    /// Navigate to `V`, creating it from the registry on first use.
    pub fn navigate<V: View>(&mut self) -> UiResult<()> {
        self.navigate_to(ViewKey::of::<V>())
    }

    /// Navigate to the view registered under `key`.
    ///
    /// A view already on the back stack is returned to and everything above
    /// it is dropped from the history.
    pub fn navigate_to(&mut self, key: ViewKey) -> UiResult<()> {
        let index = self.host_index(key)?;
        if self.stack.last() == Some(&index) {
            debug!("{} is already current", key.name());
            return Ok(());
        }

        let position = self.stack.iter().position(|&i| i == index);
        if position.is_none() && self.stack.is_full() {
            return Err(ViewError::StackFull.into());
        }

        self.while_paused(|manager| {
            if let Some(&current) = manager.stack.last() {
                manager.hosts[current].unload();
            }
            match position {
                Some(position) => manager.stack.truncate(position + 1),
                None => manager
                    .stack
                    .push(index)
                    .map_err(|_| ViewError::StackFull)?,
            }
            let size = manager.renderer.device_bounds().size();
            manager.hosts[index].load(size)?;
            Ok(())
        })?;

        info!("Navigated to {}", key.name());
        Ok(())
    }

    /// Return to the previous view. `false` when there is nothing to go
    /// back to.
    pub fn go_back(&mut self) -> UiResult<bool> {
        if self.stack.len() < 2 {
            debug!("Back requested on the first view");
            return Ok(false);
        }

        self.while_paused(|manager| {
            if let Some(current) = manager.stack.pop() {
                manager.hosts[current].unload();
            }
            let size = manager.renderer.device_bounds().size();
            manager.current_host()?.load(size)?;
            Ok(())
        })?;

        if let Some(view) = self.current_view() {
            info!("Went back to {}", view.key().name());
        }
        Ok(true)
    }

    /// Run `switch` with presentation paused, restoring the previous pause
    /// state afterwards even on error.
    fn while_paused(&mut self, switch: impl FnOnce(&mut Self) -> UiResult<()>) -> UiResult<()> {
        let was_paused = self.control.is_paused();
        self.control.pause();
        let result = switch(self);
        if !was_paused {
            self.control.resume();
        }
        result
    }

    fn host_index(&mut self, key: ViewKey) -> UiResult<usize> {
        if let Some(index) = self.hosts.iter().position(|host| host.key() == key) {
            return Ok(index);
        }

        let view = self
            .registry
            .create(key)
            .ok_or(ViewError::NotRegistered(key.name()))?;
        let host = ViewHost::new(key, view, self.config.layout_passes())?;
        self.hosts.push(host);
        Ok(self.hosts.len() - 1)
    }

    /// Draw one frame: settle layout, clear, render the current view and
    /// present it.
    pub fn draw(&mut self) -> UiResult<()> {
        let index = *self.stack.last().ok_or(ViewError::NoCurrentView)?;
        let host = &mut self.hosts[index];
        host.update_layout()?;

        self.renderer.clear(self.config.clear_color())?;
        host.render(&mut self.renderer)?;
        self.renderer.show()?;
        Ok(())
    }

    /// Dispatch touch input to the current view.
    ///
    /// Only presses act: the innermost element under the point is found and
    /// the nearest clickable element at or above it is focused and clicked.
    /// The action it returns has already been performed when this returns.
    pub fn handle_touch(&mut self, event: TouchEvent) -> UiResult<Option<Action>> {
        let TouchEvent::Press(point) = event else {
            return Ok(None);
        };

        let index = *self.stack.last().ok_or(ViewError::NoCurrentView)?;
        let host = &mut self.hosts[index];
        let Some(hit) = self
            .renderer
            .hit_test(host.tree(), host.root(), point.to_point())
        else {
            debug!("Touch at {:?} missed the view", point);
            return Ok(None);
        };

        let Some(target) = host
            .tree_mut()
            .find_reverse(hit.element, |element, _| element.as_clickable().is_some())
        else {
            debug!("Touch on {:?} has no clickable target", hit.element);
            return Ok(None);
        };

        host.focus_element(target);
        let action = host
            .tree_mut()
            .with_element_mut(target, |element, base| {
                element
                    .as_clickable()
                    .and_then(|clickable| clickable.click(base, &hit))
            })
            .flatten();

        if let Some(action) = action {
            debug!("Touch resulted in action: {:?}", action);
            self.perform(action)?;
        }
        Ok(action)
    }

    /// Carry out an action handed back by a clickable element.
    pub fn perform(&mut self, action: Action) -> UiResult<()> {
        match action {
            Action::Navigate(key) => self.navigate_to(key),
            Action::GoBack => self.go_back().map(|_| ()),
            Action::FocusNext => {
                self.current_host()?.focus_next();
                Ok(())
            }
            Action::FocusPrevious => {
                self.current_host()?.focus_previous();
                Ok(())
            }
            Action::Custom(id) => {
                debug!("Custom action {} left to the view", id);
                Ok(())
            }
        }
    }

    /// Process a request received from [`UI_CHANNEL`].
    pub fn process_request(&mut self, request: UiRequest) -> UiResult<()> {
        debug!("Processing request: {:?}", request);
        match request {
            UiRequest::Navigate(key) => self.navigate_to(key),
            UiRequest::GoBack => self.go_back().map(|_| ()),
            UiRequest::Touch(event) => self.handle_touch(event).map(|_| ()),
            UiRequest::FocusNext => self.perform(Action::FocusNext),
            UiRequest::FocusPrevious => self.perform(Action::FocusPrevious),
            UiRequest::Pause => {
                self.control.pause();
                Ok(())
            }
            UiRequest::Resume => {
                self.control.resume();
                Ok(())
            }
        }
    }

    /// Run the frame pump until `cancel` is signalled.
    ///
    /// Every iteration drains pending requests, then draws a frame and sleeps
    /// until the next frame is due. A late frame moves the schedule forward
    /// instead of drawing back-to-back frames to catch up. Frame errors are
    /// logged and the pump carries on.
    pub async fn run(
        &mut self,
        receiver: UiReceiver<'_>,
        cancel: &Signal<CriticalSectionRawMutex, ()>,
    ) {
        info!("Frame pump started at {} fps", self.config.max_fps);
        let frame_time = self.config.frame_duration();
        let mut next_frame = Instant::now();
        let mut window_start = next_frame;
        let mut frames: u32 = 0;

        loop {
            if cancel.try_take().is_some() {
                break;
            }

            while let Ok(request) = receiver.try_receive() {
                if let Err(e) = self.process_request(request) {
                    error!("Error processing request {:?}: {}", request, e);
                }
            }

            if self.control.is_paused() {
                Timer::after(self.config.pause_poll()).await;
                next_frame = Instant::now();
                continue;
            }

            match self.draw() {
                Ok(()) => frames += 1,
                Err(e) => error!("Frame failed: {}", e),
            }

            let now = Instant::now();
            if now.duration_since(window_start) >= Duration::from_secs(1) {
                self.fps.set(frames);
                frames = 0;
                window_start = now;
            }

            next_frame += frame_time;
            if next_frame < now {
                debug!("Frame over budget by {} ms", (now - next_frame).as_millis());
                next_frame = now;
            }
            Timer::at(next_frame).await;
        }

        info!("Frame pump stopped");
    }
}

impl<G> core::fmt::Debug for ViewManager<G> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ViewManager")
            .field("views", &self.hosts)
            .field("stack", &self.stack)
            .field("config", &self.config)
            .field("paused", &self.control.is_paused())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UiError;
    use crate::render::{BufferedDisplay, PixelBuffer};
    use crate::ui::{Brush, Button, ElementId, ElementTree, Panel, TouchPoint};
    use embassy_futures::block_on;
    use embassy_futures::join::join;
    use embedded_graphics::pixelcolor::Rgb565;
    use embedded_graphics::prelude::RgbColor;

    type TestManager = ViewManager<BufferedDisplay<PixelBuffer>>;

    /// A panel filling the view in one color.
    fn filled(tree: &mut ElementTree, color: Rgb565) -> UiResult<ElementId> {
        let panel = tree.insert(Panel::new())?;
        if let Some(base) = tree.base(panel) {
            base.background().set(Brush::filled(color));
        }
        Ok(panel)
    }

    #[derive(Default)]
    struct Red;

    impl View for Red {
        fn build(&mut self, tree: &mut ElementTree) -> UiResult<ElementId> {
            filled(tree, Rgb565::RED)
        }
    }

    #[derive(Default)]
    struct Blue;

    impl View for Blue {
        fn build(&mut self, tree: &mut ElementTree) -> UiResult<ElementId> {
            filled(tree, Rgb565::BLUE)
        }
    }

    /// One button filling the view that navigates to [`Blue`].
    #[derive(Default)]
    struct Menu;

    impl View for Menu {
        fn build(&mut self, tree: &mut ElementTree) -> UiResult<ElementId> {
            Button::new("Next")
                .with_action(Action::Navigate(ViewKey::of::<Blue>()))
                .insert_named(tree, "next")
        }
    }

    fn manager() -> TestManager {
        let mut views = ViewRegistry::new();
        views
            .register(Red::default)
            .register(Blue::default)
            .register(Menu::default);
        let config = UiConfig::default().with_clear_color(Rgb565::BLACK);
        ViewManager::new(BufferedDisplay::new(PixelBuffer::new(100, 100)), views, config)
    }

    fn shown_pixel(manager: &TestManager, x: u32, y: u32) -> Option<Rgb565> {
        manager.renderer().device().display().pixel(x, y)
    }

    fn key<V: View>() -> ViewKey {
        ViewKey::of::<V>()
    }

    #[test]
    fn draw_without_a_view_fails() {
        let mut manager = manager();
        assert_eq!(
            manager.draw(),
            Err(UiError::View(ViewError::NoCurrentView))
        );
    }

    #[test]
    fn navigate_loads_and_draw_presents_the_view() {
        let mut manager = manager();
        manager.navigate::<Red>().unwrap();

        let view = manager.current_view().unwrap();
        assert!(view.is_loaded());
        assert_eq!(view.key(), key::<Red>());

        manager.draw().unwrap();
        assert_eq!(shown_pixel(&manager, 50, 50), Some(Rgb565::RED));
        assert!(!manager.render_control().is_paused());
    }

    #[test]
    fn unregistered_views_are_rejected() {
        struct Unknown;
        impl View for Unknown {
            fn build(&mut self, tree: &mut ElementTree) -> UiResult<ElementId> {
                Ok(tree.insert(Panel::new())?)
            }
        }

        let mut manager = manager();
        let err = manager.navigate::<Unknown>().unwrap_err();
        assert!(matches!(err, UiError::View(ViewError::NotRegistered(_))));
        assert!(manager.current_view().is_none());
    }

    #[test]
    fn back_stack_pops_and_truncates() {
        let mut manager = manager();
        assert!(!manager.go_back().unwrap());

        manager.navigate::<Red>().unwrap();
        manager.navigate::<Blue>().unwrap();
        manager.navigate::<Menu>().unwrap();
        assert_eq!(manager.depth(), 3);

        assert!(manager.go_back().unwrap());
        assert_eq!(manager.current_view().unwrap().key(), key::<Blue>());
        manager.draw().unwrap();
        assert_eq!(shown_pixel(&manager, 50, 50), Some(Rgb565::BLUE));

        // returning to a view further down drops the views above it
        manager.navigate::<Menu>().unwrap();
        manager.navigate::<Red>().unwrap();
        assert_eq!(manager.depth(), 1);
        assert_eq!(manager.current_view().unwrap().key(), key::<Red>());
    }

    #[test]
    fn views_are_created_once() {
        let mut manager = manager();
        manager.navigate::<Red>().unwrap();
        manager.navigate::<Blue>().unwrap();
        manager.go_back().unwrap();
        manager.navigate::<Blue>().unwrap();
        assert_eq!(manager.hosts.len(), 2);
        assert!(!manager.hosts[0].is_loaded());
        assert!(manager.hosts[1].is_loaded());
    }

    #[test]
    fn press_clicks_the_button_under_the_point() {
        let mut manager = manager();
        manager.navigate::<Menu>().unwrap();
        manager.draw().unwrap();

        let release = manager
            .handle_touch(TouchEvent::Release(TouchPoint::new(50, 50)))
            .unwrap();
        assert_eq!(release, None);
        assert_eq!(manager.current_view().unwrap().key(), key::<Menu>());

        let action = manager
            .handle_touch(TouchEvent::Press(TouchPoint::new(50, 50)))
            .unwrap();
        assert_eq!(action, Some(Action::Navigate(key::<Blue>())));
        assert_eq!(manager.current_view().unwrap().key(), key::<Blue>());
        assert_eq!(manager.depth(), 2);
    }

    #[test]
    fn press_outside_the_display_does_nothing() {
        let mut manager = manager();
        manager.navigate::<Menu>().unwrap();
        let action = manager
            .handle_touch(TouchEvent::Press(TouchPoint::new(300, 300)))
            .unwrap();
        assert_eq!(action, None);
        assert_eq!(manager.depth(), 1);
    }

    #[test]
    fn pause_requests_toggle_the_render_control() {
        let mut manager = manager();
        let control = manager.render_control();
        manager.process_request(UiRequest::Pause).unwrap();
        assert!(control.is_paused());

        // a view switch keeps an outside pause in place
        manager.process_request(UiRequest::Navigate(key::<Red>())).unwrap();
        assert!(control.is_paused());

        manager.process_request(UiRequest::Resume).unwrap();
        assert!(!control.is_paused());
    }

    #[test]
    fn pump_handles_requests_and_draws_until_cancelled() {
        let channel: Channel<CriticalSectionRawMutex, UiRequest, UI_CHANNEL_CAPACITY> =
            Channel::new();
        let cancel = Signal::<CriticalSectionRawMutex, ()>::new();
        channel
            .try_send(UiRequest::Navigate(key::<Blue>()))
            .unwrap();

        let mut manager = manager();
        block_on(join(manager.run(channel.receiver(), &cancel), async {
            Timer::after_millis(100).await;
            cancel.signal(());
        }));

        assert_eq!(manager.current_view().unwrap().key(), key::<Blue>());
        assert_eq!(shown_pixel(&manager, 10, 10), Some(Rgb565::BLUE));
    }

    #[test]
    fn paused_pump_draws_nothing() {
        let channel: Channel<CriticalSectionRawMutex, UiRequest, UI_CHANNEL_CAPACITY> =
            Channel::new();
        let cancel = Signal::<CriticalSectionRawMutex, ()>::new();

        let mut manager = manager();
        manager.navigate::<Red>().unwrap();
        manager.render_control().pause();

        block_on(join(manager.run(channel.receiver(), &cancel), async {
            Timer::after_millis(50).await;
            cancel.signal(());
        }));

        assert_eq!(shown_pixel(&manager, 50, 50), Some(Rgb565::BLACK));
    }
}
