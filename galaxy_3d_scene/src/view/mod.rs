//! View module - viewports, scene processors and the render manager.

mod view_port;
mod scene_processor;
mod render_manager;

pub use view_port::{ViewPort, ViewPortKey, ClearFlags};
pub use scene_processor::{SceneProcessor, ProcessorContext};
pub use render_manager::{RenderManager, RenderManagerConfig};
