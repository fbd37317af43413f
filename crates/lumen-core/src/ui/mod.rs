//! Lumen element model - retained element trees laid out in two passes
//!
//! This module provides:
//! - Element nodes with reactive geometry and dirty tracking
//! - The arena tree that owns them and runs measure/arrange
//! - Layout containers (stack, dock, uniform grid, canvas, content, conditional)
//! - Styling (colors, brushes, revertible styles)
//! - Built-in widgets (text, button)

pub mod components;
pub mod context;
pub mod core;
pub mod element;
pub mod layouts;
pub mod styling;
pub mod tree;

// Re-export commonly used items
pub use components::{Button, TextBlock, TextSize};
pub use context::LayoutContext;
pub use self::core::{
    Action, Alignment, Clickable, Focusable, HitTestResult, Orientation, TouchEvent, TouchPoint,
};
pub use element::{Affects, ChildSlot, Element, ElementBase, ElementId, child_ids};
pub use layouts::{
    Canvas, Conditional, ContentControl, Dock, DockPanel, Panel, StackPanel, UniformGrid,
};
pub use styling::{AppliedStyle, Brush, ColorPalette, Style};
pub use tree::ElementTree;
