/// Mock Renderer for unit tests (no GPU required)
///
/// Records every command it receives into a shared list, so tests can
/// hand the renderer to a `RenderManager` and still inspect the command
/// stream afterwards.

use std::sync::{Arc, Mutex, MutexGuard};
use glam::{Mat4, Vec4};
use crate::error::Result;
use crate::engine_bail;
use crate::material::{Material, RenderState, TechniqueDef};
use crate::renderer::{Caps, FrameBuffer, Renderer, RendererStats, TextureHandle};
use crate::scene::{Mesh, MeshId};

// ============================================================================
// Recorded commands
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum MockCommand {
    SetViewPort(i32, i32, i32, i32),
    SetClipRect(i32, i32, i32, i32),
    SetDepthRange(f32, f32),
    ClearBuffers { color: bool, depth: bool, stencil: bool },
    SetBackgroundColor(Vec4),
    /// Size of the target, `None` for the main frame buffer
    SetFrameBuffer(Option<(u32, u32)>),
    SetTexture(u32, TextureHandle),
    SetViewProjection { view: Mat4, projection: Mat4 },
    SetWorldMatrix(Mat4),
    ApplyRenderState(RenderState),
    SetShader { material: String, technique: String },
    RenderMesh { mesh: String, lod: usize },
    Preload { material: String, mesh: String },
    ReleaseMesh(MeshId),
}

/// Shared handle on the recorded commands
#[derive(Debug, Clone, Default)]
pub struct MockCommandLog {
    commands: Arc<Mutex<Vec<MockCommand>>>,
}

impl MockCommandLog {
    fn push(&self, command: MockCommand) {
        self.lock().push(command);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<MockCommand>> {
        self.commands.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn commands(&self) -> Vec<MockCommand> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Names of the meshes drawn, in draw order
    pub fn drawn_meshes(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|c| match c {
                MockCommand::RenderMesh { mesh, .. } => Some(mesh.clone()),
                _ => None,
            })
            .collect()
    }

    /// Depth ranges set, in order
    pub fn depth_ranges(&self) -> Vec<(f32, f32)> {
        self.lock()
            .iter()
            .filter_map(|c| match c {
                MockCommand::SetDepthRange(start, end) => Some((*start, *end)),
                _ => None,
            })
            .collect()
    }
}

// ============================================================================
// Mock Frame Buffer
// ============================================================================

#[derive(Debug)]
pub struct MockFrameBuffer {
    pub width: u32,
    pub height: u32,
}

impl FrameBuffer for MockFrameBuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

// ============================================================================
// Mock Renderer
// ============================================================================

pub struct MockRenderer {
    pub caps: Caps,
    /// Make `preload` fail, as a backend does when a shader does not compile
    pub fail_preload: bool,
    log: MockCommandLog,
    stats: RendererStats,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self {
            caps: Caps::ALL_GLSL | Caps::FRAME_BUFFER,
            fail_preload: false,
            log: MockCommandLog::default(),
            stats: RendererStats::default(),
        }
    }

    pub fn with_caps(caps: Caps) -> Self {
        Self { caps, ..Self::new() }
    }

    pub fn log(&self) -> MockCommandLog {
        self.log.clone()
    }
}

impl Default for MockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for MockRenderer {
    fn caps(&self) -> Caps {
        self.caps
    }

    fn set_view_port(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.log.push(MockCommand::SetViewPort(x, y, width, height));
    }

    fn set_clip_rect(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.log.push(MockCommand::SetClipRect(x, y, width, height));
    }

    fn set_depth_range(&mut self, start: f32, end: f32) {
        self.log.push(MockCommand::SetDepthRange(start, end));
    }

    fn clear_buffers(&mut self, color: bool, depth: bool, stencil: bool) {
        self.log.push(MockCommand::ClearBuffers { color, depth, stencil });
    }

    fn set_background_color(&mut self, color: Vec4) {
        self.log.push(MockCommand::SetBackgroundColor(color));
    }

    fn set_frame_buffer(&mut self, frame_buffer: Option<&Arc<dyn FrameBuffer>>) {
        let size = frame_buffer.map(|fb| (fb.width(), fb.height()));
        self.log.push(MockCommand::SetFrameBuffer(size));
    }

    fn set_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.log.push(MockCommand::SetTexture(unit, texture));
    }

    fn set_view_projection(&mut self, view: &Mat4, projection: &Mat4, _view_projection: &Mat4) {
        self.log.push(MockCommand::SetViewProjection { view: *view, projection: *projection });
    }

    fn set_world_matrix(&mut self, world: &Mat4) {
        self.log.push(MockCommand::SetWorldMatrix(*world));
    }

    fn apply_render_state(&mut self, state: &RenderState) {
        self.log.push(MockCommand::ApplyRenderState(*state));
    }

    fn set_shader(&mut self, material: &Material, technique: &TechniqueDef) -> Result<()> {
        self.stats.shader_switches += 1;
        self.log.push(MockCommand::SetShader {
            material: material.name().to_string(),
            technique: technique.name().to_string(),
        });
        Ok(())
    }

    fn render_mesh(&mut self, mesh: &Mesh, lod: usize, _instance_count: u32) -> Result<()> {
        self.stats.draw_calls += 1;
        self.stats.triangles += mesh.triangle_count(lod) as u32;
        self.log.push(MockCommand::RenderMesh { mesh: mesh.name().to_string(), lod });
        Ok(())
    }

    fn preload(&mut self, material: &Material, mesh: &Mesh) -> Result<()> {
        self.log.push(MockCommand::Preload {
            material: material.name().to_string(),
            mesh: mesh.name().to_string(),
        });
        if self.fail_preload {
            engine_bail!("galaxy3d::MockRenderer", "Shader for '{}' failed to compile", material.name());
        }
        Ok(())
    }

    fn release_mesh(&mut self, mesh: MeshId) {
        self.log.push(MockCommand::ReleaseMesh(mesh));
    }

    fn stats(&self) -> RendererStats {
        self.stats
    }

    fn reset_stats(&mut self) {
        self.stats = RendererStats::default();
    }
}

#[cfg(test)]
#[path = "mock_renderer_tests.rs"]
mod tests;
