/// Scene processors - per-viewport hooks around queue rendering.
///
/// Used for shadow maps, post-processing filters and similar passes that
/// need to run before, between or after the viewport's buckets.

use std::sync::Arc;
use crate::camera::Camera;
use crate::error::Result;
use crate::queue::RenderQueue;
use crate::renderer::{FrameBuffer, Renderer};

/// What a processor sees of its viewport during initialization and reshape.
pub struct ProcessorContext<'a> {
    pub renderer: &'a mut dyn Renderer,
    pub view_port_name: &'a str,
    pub camera: &'a Camera,
    pub output_frame_buffer: Option<&'a Arc<dyn FrameBuffer>>,
}

/// Frame-level hooks, called in this order for each viewport:
/// `pre_frame`, `post_queue`, `post_frame`.
pub trait SceneProcessor: Send {
    /// Called once before the first frame the processor takes part in
    fn initialize(&mut self, ctx: &mut ProcessorContext<'_>) -> Result<()>;

    fn is_initialized(&self) -> bool;

    /// The render surface changed size
    fn reshape(&mut self, _ctx: &mut ProcessorContext<'_>, _width: u32, _height: u32) {}

    /// Before the viewport's scenes are queued
    fn pre_frame(&mut self, _tpf: f32) {}

    /// After queueing, before the buckets are drawn; the queue may be edited
    fn post_queue(&mut self, _queue: &mut RenderQueue) {}

    /// After the opaque, sky, transparent and GUI buckets are drawn
    fn post_frame(
        &mut self,
        renderer: &mut dyn Renderer,
        output: Option<&Arc<dyn FrameBuffer>>,
    ) -> Result<()>;

    /// The processor was removed or the viewport destroyed
    fn cleanup(&mut self) {}
}
