//! Desktop simulator for the lumen UI toolkit.
//!
//! Builds two demo views, drives the view manager through a scripted session
//! (taps, focus moves, navigation) and writes a PNG of the display after
//! every step.
//!
//! ```text
//! RUST_LOG=debug cargo run -p lumen-simulator -- target/snapshots
//! ```

use std::path::{Path, PathBuf};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay};
use log::{error, info, warn};

use lumen_core::binding::ReactiveProperty;
use lumen_core::geometry::{Point, Thickness};
use lumen_core::render::BufferedDisplay;
use lumen_core::ui::styling::{COLOR_ACCENT, COLOR_ERROR, COLOR_SURFACE};
use lumen_core::ui::{
    Action, Alignment, Brush, Button, Canvas, Conditional, Dock, DockPanel, ElementId,
    ElementTree, Orientation, Panel, StackPanel, TextBlock, TextSize, TouchEvent, TouchPoint,
    UniformGrid,
};
use lumen_core::view::{UiRequest, ui_receiver, ui_sender};
use lumen_core::{UiConfig, UiResult, View, ViewKey, ViewManager, ViewRegistry};

type Manager = ViewManager<BufferedDisplay<SimulatorDisplay<Rgb565>>>;

/// Pixel scale factor for the snapshots.
const SNAPSHOT_SCALE: u32 = 2;

const DEFAULT_OUTPUT_DIR: &str = "target/lumen-snapshots";

// ---------------------------------------------------------------------------
// Demo views
// ---------------------------------------------------------------------------

/// Title bar, a 2x2 grid of buttons and a status line.
struct HomeView {
    taps: ReactiveProperty<u32>,
}

impl Default for HomeView {
    fn default() -> Self {
        Self {
            taps: ReactiveProperty::new("taps", 0),
        }
    }
}

impl View for HomeView {
    fn build(&mut self, tree: &mut ElementTree) -> UiResult<ElementId> {
        let dock = tree.insert(DockPanel::new())?;

        let title = tree.insert(TextBlock::new("lumen").with_size(TextSize::Large))?;
        if let Some(base) = tree.base(title) {
            base.margin().set(Thickness::all(4.0));
            DockPanel::set_dock(base, Dock::Top)?;
        }

        let status = self.status_line(tree)?;
        if let Some(base) = tree.base(status) {
            DockPanel::set_dock(base, Dock::Bottom)?;
        }

        let grid = tree.insert(UniformGrid::new().with_columns(2))?;
        let taps = self.taps.clone();
        let buttons = [
            Button::new("Tap")
                .with_command(move || taps.set(taps.get() + 1))
                .with_tab_index(1)
                .insert_named(tree, "tap")?,
            Button::new("Settings")
                .with_action(Action::Navigate(ViewKey::of::<SettingsView>()))
                .with_tab_index(2)
                .insert_named(tree, "settings")?,
            Button::new("Prev")
                .with_action(Action::FocusPrevious)
                .insert_named(tree, "prev")?,
            Button::new("Next")
                .with_action(Action::FocusNext)
                .insert_named(tree, "next")?,
        ];
        for &button in &buttons {
            if let Some(base) = tree.base(button) {
                base.margin().set(Thickness::all(6.0));
            }
        }
        tree.set_children(grid, buttons.to_vec())?;

        tree.set_children(dock, vec![title, status, grid])?;
        Ok(dock)
    }

    fn loaded(&mut self, _tree: &mut ElementTree, _content: ElementId) {
        info!("Home loaded after {} taps", self.taps.get());
    }
}

impl HomeView {
    /// "Taps: n" followed by an even/odd marker.
    fn status_line(&self, tree: &mut ElementTree) -> UiResult<ElementId> {
        let row = tree.insert(
            StackPanel::new()
                .with_orientation(Orientation::Horizontal)
                .with_spacing(8.0),
        )?;

        let count = tree.insert(TextBlock::new(""))?;
        if let Some(block) = tree.get::<TextBlock>(count) {
            block
                .text()
                .bind_from(&self.taps, |taps| format!("Taps: {taps}"));
        }

        let even = tree.insert(TextBlock::new("even").with_color(COLOR_ACCENT))?;
        let odd = tree.insert(TextBlock::new("odd").with_color(COLOR_ERROR))?;
        let parity = Conditional::insert(tree, Some(even), Some(odd))?;
        if let Some(conditional) = tree.get::<Conditional>(parity) {
            conditional
                .condition()
                .bind_from(&self.taps, |taps| taps % 2 == 0);
        }

        tree.set_children(row, vec![count, parity])?;
        if let Some(base) = tree.base(row) {
            base.margin().set(Thickness::all(4.0));
        }
        Ok(row)
    }
}

/// A few shapes placed on a canvas and a back button.
#[derive(Default)]
struct SettingsView;

impl View for SettingsView {
    fn build(&mut self, tree: &mut ElementTree) -> UiResult<ElementId> {
        let column = tree.insert(StackPanel::new().with_spacing(4.0))?;

        let heading = tree.insert(TextBlock::new("Settings").with_size(TextSize::Large))?;
        let hint =
            tree.insert(TextBlock::new("Shapes placed on a canvas").with_size(TextSize::Small))?;

        let canvas = tree.insert(Canvas::new())?;
        if let Some(base) = tree.base(canvas) {
            base.height().set(Some(120.0));
            base.background().set(Brush::filled(COLOR_SURFACE));
        }
        let mut shapes = Vec::new();
        for (i, color) in [Rgb565::RED, Rgb565::GREEN, Rgb565::BLUE].into_iter().enumerate() {
            let shape = tree.insert(Panel::new())?;
            if let Some(base) = tree.base(shape) {
                base.width().set(Some(40.0));
                base.height().set(Some(40.0));
                base.background().set(Brush::circle(color, 20, true));
                Canvas::set_position(base, 20.0 + 60.0 * i as f32, 20.0 + 20.0 * i as f32)?;
            }
            shapes.push(shape);
        }
        tree.set_children(canvas, shapes)?;

        let back = Button::new("Back")
            .with_action(Action::GoBack)
            .insert_named(tree, "back")?;
        if let Some(base) = tree.base(back) {
            base.horizontal_alignment().set(Alignment::Start);
            base.margin().set(Thickness::all(4.0));
        }

        tree.set_children(column, vec![heading, hint, canvas, back])?;
        Ok(column)
    }
}

// ---------------------------------------------------------------------------
// Session helpers
// ---------------------------------------------------------------------------

/// Display-space center of the element named `name` in the current view.
fn center_of(manager: &Manager, name: &str) -> Option<TouchPoint> {
    let view = manager.current_view()?;
    let tree = view.tree();
    let id = tree.find_by_name(view.root(), name)?;

    let mut origin = Point::ZERO;
    let mut cursor = Some(id);
    while let Some(node) = cursor {
        origin = origin.offset(tree.base(node)?.bounds().origin());
        cursor = tree.parent(node);
    }
    let size = tree.base(id)?.bounds().size();
    Some(TouchPoint::new(
        (origin.x + size.width / 2.0) as u16,
        (origin.y + size.height / 2.0) as u16,
    ))
}

fn send(request: UiRequest) {
    if ui_sender().try_send(request).is_err() {
        warn!("UI channel full, dropped {:?}", request);
    }
}

fn tap(manager: &Manager, name: &str) {
    match center_of(manager, name) {
        Some(point) => send(UiRequest::Touch(TouchEvent::Press(point))),
        None => warn!("No element named {name} in the current view"),
    }
}

/// Hand queued requests to the manager, as the frame pump would.
fn drain(manager: &mut Manager) -> UiResult<()> {
    let receiver = ui_receiver();
    while let Ok(request) = receiver.try_receive() {
        manager.process_request(request)?;
    }
    Ok(())
}

/// Draw a frame and write it to `dir/name.png`.
fn snapshot(manager: &mut Manager, dir: &Path, name: &str) -> UiResult<()> {
    manager.draw()?;

    let settings = OutputSettingsBuilder::new().scale(SNAPSHOT_SCALE).build();
    let path = dir.join(format!("{name}.png"));
    let image = manager
        .renderer()
        .device()
        .display()
        .to_rgb_output_image(&settings);
    match image.save_png(&path) {
        Ok(()) => info!("Wrote {}", path.display()),
        Err(e) => error!("Could not write {}: {}", path.display(), e),
    }
    Ok(())
}

fn run_session(manager: &mut Manager, dir: &Path) -> UiResult<()> {
    manager.navigate::<HomeView>()?;
    snapshot(manager, dir, "01-home")?;

    tap(manager, "tap");
    tap(manager, "tap");
    tap(manager, "tap");
    drain(manager)?;
    snapshot(manager, dir, "02-three-taps")?;

    tap(manager, "next");
    drain(manager)?;
    send(UiRequest::FocusNext);
    drain(manager)?;
    snapshot(manager, dir, "03-focus-moved")?;

    tap(manager, "settings");
    drain(manager)?;
    snapshot(manager, dir, "04-settings")?;

    tap(manager, "back");
    drain(manager)?;
    snapshot(manager, dir, "05-home-again")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();

    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    if let Err(e) = std::fs::create_dir_all(&dir) {
        error!("Could not create {}: {}", dir.display(), e);
        std::process::exit(1);
    }

    let config = UiConfig::default();
    info!("Starting lumen simulator");
    info!(
        "Display: {}×{} (scale {}×)",
        config.display_width, config.display_height, SNAPSHOT_SCALE
    );

    let display = SimulatorDisplay::<Rgb565>::new(Size::new(
        u32::from(config.display_width),
        u32::from(config.display_height),
    ));

    let mut views = ViewRegistry::new();
    views
        .register(HomeView::default)
        .register(SettingsView::default);

    let mut manager = ViewManager::new(BufferedDisplay::new(display), views, config);
    if let Err(e) = run_session(&mut manager, &dir) {
        error!("Session failed: {}", e);
        std::process::exit(1);
    }

    info!("Simulator exiting");
}
