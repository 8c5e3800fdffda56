//! Renderer module
//!
//! The GPU-facing command interface driven by the render manager, the
//! capability flags a backend reports, and frame buffer targets.

mod caps;
mod renderer;

#[cfg(test)]
pub(crate) mod mock_renderer;

pub use caps::{Caps, ShaderLanguage};
pub use renderer::{Renderer, RendererStats, FrameBuffer, TextureHandle};
