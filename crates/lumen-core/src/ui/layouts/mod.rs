// crates/lumen-core/src/ui/layouts/mod.rs
//! Layout containers for arranging elements

pub mod canvas;
pub mod conditional;
pub mod content_control;
pub mod dock_panel;
pub mod panel;
pub mod stack_panel;
pub mod uniform_grid;

pub use canvas::Canvas;
pub use conditional::Conditional;
pub use content_control::ContentControl;
pub use dock_panel::{Dock, DockPanel};
pub use panel::Panel;
pub use stack_panel::StackPanel;
pub use uniform_grid::UniformGrid;
