//! Hardware-independent retained-mode UI toolkit for small displays
//!
//! This crate contains everything between a view's element tree and the
//! panel: reactive properties, two-pass layout, focus handling, rendering
//! with hit testing, and the view manager that pumps frames. Display drivers
//! plug in through [`render::GraphicsDevice`] (or any `embedded-graphics`
//! `DrawTarget` wrapped in [`render::BufferedDisplay`]).
//!
//! It is `no_std` with `extern crate alloc` so it compiles on both embedded
//! targets and desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod binding;
pub mod config;
pub mod error;
pub mod focus;
pub mod geometry;
pub mod layout_manager;
pub mod render;
pub mod ui;
pub mod view;

pub use config::UiConfig;
pub use error::{UiError, UiResult};
pub use layout_manager::LayoutManager;
pub use view::{View, ViewKey, ViewManager, ViewRegistry};
