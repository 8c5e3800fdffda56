/// Renderer trait - the GPU-facing side of the scene core
///
/// The render manager never talks to a graphics API directly. It drives a
/// `Renderer` through viewport/depth-range/clear commands, camera and world
/// matrices, render state and draw calls. Backends (GL, Vulkan, a test
/// recorder) implement this trait.

use std::fmt;
use std::sync::Arc;
use glam::{Mat4, Vec4};
use crate::error::Result;
use crate::material::{Material, RenderState, TechniqueDef};
use crate::renderer::Caps;
use crate::scene::{Mesh, MeshId};

// ============================================================================
// Common types
// ============================================================================

/// Backend handle of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Off-screen render target.
///
/// `None` wherever a frame buffer is optional stands for the main
/// (window) frame buffer.
pub trait FrameBuffer: Send + Sync + fmt::Debug {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Number of samples per pixel
    fn samples(&self) -> u32 {
        1
    }
}

/// Renderer statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererStats {
    /// Number of draw calls since the last reset
    pub draw_calls: u32,
    /// Number of triangles drawn since the last reset
    pub triangles: u32,
    /// Number of shader binds since the last reset
    pub shader_switches: u32,
}

// ============================================================================
// Renderer trait
// ============================================================================

/// GPU command interface used by the render manager.
pub trait Renderer: Send {
    /// Features supported by the backend
    fn caps(&self) -> Caps;

    /// Set the viewport rectangle, in pixels
    fn set_view_port(&mut self, x: i32, y: i32, width: i32, height: i32);

    /// Set the scissor rectangle, in pixels
    fn set_clip_rect(&mut self, x: i32, y: i32, width: i32, height: i32);

    /// Set the depth range written by subsequent draws
    ///
    /// `(0, 1)` is the normal range; `(1, 1)` pins geometry to the far
    /// plane and `(0, 0)` to the near plane.
    fn set_depth_range(&mut self, start: f32, end: f32);

    /// Clear the selected buffers of the current frame buffer
    fn clear_buffers(&mut self, color: bool, depth: bool, stencil: bool);

    /// Color used by the next color clear
    fn set_background_color(&mut self, color: Vec4);

    /// Redirect rendering; `None` targets the main frame buffer
    fn set_frame_buffer(&mut self, frame_buffer: Option<&Arc<dyn FrameBuffer>>);

    /// Bind a texture to a texture unit
    fn set_texture(&mut self, unit: u32, texture: TextureHandle);

    /// Upload camera matrices for subsequent draws
    fn set_view_projection(&mut self, view: &Mat4, projection: &Mat4, view_projection: &Mat4);

    /// Upload the world matrix of the next draw
    fn set_world_matrix(&mut self, world: &Mat4);

    /// Apply fixed-function state
    fn apply_render_state(&mut self, state: &RenderState);

    /// Bind the shader of a material technique and upload its parameters
    fn set_shader(&mut self, material: &Material, technique: &TechniqueDef) -> Result<()>;

    /// Draw a mesh at a level of detail
    fn render_mesh(&mut self, mesh: &Mesh, lod: usize, instance_count: u32) -> Result<()>;

    /// Compile the shader and upload the mesh ahead of the first draw
    ///
    /// Fails when the shader cannot be built for the current parameters.
    fn preload(&mut self, material: &Material, mesh: &Mesh) -> Result<()>;

    /// Free the GPU buffers of a mesh
    fn release_mesh(&mut self, mesh: MeshId);

    /// Statistics since the last `reset_stats`
    fn stats(&self) -> RendererStats;

    fn reset_stats(&mut self);
}
