//! Snapcrop Render - GPU preview of the image being edited
//!
//! Draws the current image letterboxed into the viewport and, while the
//! crop tool is active, the dimmed overlay with border, grid and corner
//! handles. All GPU work happens on a dedicated render thread; other
//! threads talk to it through a [`PreviewHandle`].

pub mod config;
pub mod context;
pub mod error;
pub mod overlay;
pub mod pending;
pub mod projection;
pub mod renderer;
mod shaders;
pub mod target;
mod texture;
pub mod thread;

pub use config::{OverlayStyle, RenderConfig, TextureFilter};
pub use context::GpuContext;
pub use error::RenderError;
pub use renderer::{PreviewRenderer, RenderStats};
pub use target::{OffscreenTarget, OFFSCREEN_FORMAT};
pub use thread::{PreviewHandle, RenderThread};
