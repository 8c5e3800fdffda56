/// ViewPort - one camera rendering a set of scenes into a target.
///
/// The render manager owns viewports and draws them in three ordered
/// groups (pre, main, post). Each viewport keeps its own render queue so
/// a scene can be queued from several cameras in the same frame.

use std::sync::Arc;
use bitflags::bitflags;
use glam::Vec4;
use slotmap::new_key_type;
use crate::camera::Camera;
use crate::engine_debug;
use crate::queue::RenderQueue;
use crate::renderer::FrameBuffer;
use crate::scene::SpatialKey;
use crate::view::SceneProcessor;

new_key_type! {
    /// Stable key of a viewport in its render manager
    pub struct ViewPortKey;
}

bitflags! {
    /// Buffers cleared before a viewport is drawn.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClearFlags: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

pub struct ViewPort {
    pub(crate) name: String,
    pub(crate) camera: Camera,
    /// Root spatials, drawn in reverse attachment order
    pub(crate) scenes: Vec<SpatialKey>,
    /// `None` renders into the main frame buffer
    pub(crate) output_frame_buffer: Option<Arc<dyn FrameBuffer>>,
    pub(crate) queue: RenderQueue,
    pub(crate) clear_flags: ClearFlags,
    pub(crate) background_color: Vec4,
    pub(crate) processors: Vec<Box<dyn SceneProcessor>>,
    pub(crate) enabled: bool,
}

impl ViewPort {
    pub fn new(name: impl Into<String>, camera: Camera) -> Self {
        Self {
            name: name.into(),
            camera,
            scenes: Vec::new(),
            output_frame_buffer: None,
            queue: RenderQueue::new(),
            clear_flags: ClearFlags::empty(),
            background_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            processors: Vec::new(),
            enabled: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    // ===== SCENES =====

    pub fn attach_scene(&mut self, root: SpatialKey) {
        self.scenes.push(root);
    }

    /// Returns false when the scene was not attached
    pub fn detach_scene(&mut self, root: SpatialKey) -> bool {
        let before = self.scenes.len();
        self.scenes.retain(|&s| s != root);
        self.scenes.len() != before
    }

    pub fn clear_scenes(&mut self) {
        self.scenes.clear();
    }

    pub fn scenes(&self) -> &[SpatialKey] {
        &self.scenes
    }

    // ===== TARGET =====

    pub fn output_frame_buffer(&self) -> Option<&Arc<dyn FrameBuffer>> {
        self.output_frame_buffer.as_ref()
    }

    pub fn set_output_frame_buffer(&mut self, frame_buffer: Option<Arc<dyn FrameBuffer>>) {
        self.output_frame_buffer = frame_buffer;
    }

    pub fn queue(&self) -> &RenderQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut RenderQueue {
        &mut self.queue
    }

    // ===== CLEARING =====

    pub fn clear_flags(&self) -> ClearFlags {
        self.clear_flags
    }

    pub fn set_clear_flags(&mut self, color: bool, depth: bool, stencil: bool) {
        self.clear_flags.set(ClearFlags::COLOR, color);
        self.clear_flags.set(ClearFlags::DEPTH, depth);
        self.clear_flags.set(ClearFlags::STENCIL, stencil);
    }

    pub fn background_color(&self) -> Vec4 {
        self.background_color
    }

    pub fn set_background_color(&mut self, color: Vec4) {
        self.background_color = color;
    }

    // ===== PROCESSORS =====

    /// Append a processor; it is initialized before its first frame
    pub fn add_processor(&mut self, processor: Box<dyn SceneProcessor>) {
        self.processors.push(processor);
    }

    /// Remove and clean up the processor at `index`
    pub fn remove_processor(&mut self, index: usize) -> Option<Box<dyn SceneProcessor>> {
        if index >= self.processors.len() {
            return None;
        }
        let mut processor = self.processors.remove(index);
        processor.cleanup();
        Some(processor)
    }

    pub fn clear_processors(&mut self) {
        for processor in &mut self.processors {
            processor.cleanup();
        }
        self.processors.clear();
        engine_debug!("galaxy3d::ViewPort", "Cleared processors of '{}'", self.name);
    }

    pub fn num_processors(&self) -> usize {
        self.processors.len()
    }

    // ===== ENABLING =====

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabled viewports are skipped entirely, processors included
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
