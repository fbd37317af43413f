//! Built-in widgets

pub mod button;
pub mod text;

pub use button::Button;
pub use text::{TextBlock, TextSize, measure_text};
