//! Rendering: pixel buffers, graphics devices and the tree renderer
//!
//! - [`framebuffer`] - RAM buffer that flushes only changed pixels
//! - [`device`] - the frame/present abstraction views draw onto
//! - [`drawing`] - primitive drawing operations handed to elements
//! - [`renderer`] - pre-order tree drawing and hit testing

pub mod device;
pub mod drawing;
pub mod framebuffer;
pub mod renderer;

pub use device::{BufferedDisplay, GraphicsDevice};
pub use drawing::{DeviceContext, DrawingContext};
pub use framebuffer::PixelBuffer;
pub use renderer::Renderer;
