/// Controls - behaviour attached to a spatial.
///
/// A control is updated once per frame with the elapsed time and its
/// spatial's local transform, then given a
/// chance to act on the scene right before its spatial is queued for a
/// viewport (skinning uses that hook to deform meshes only when they are
/// actually visible).

use std::any::Any;
use crate::camera::Camera;
use crate::error::Result;
use crate::math::Transform;
use crate::renderer::Renderer;
use crate::scene::{SceneGraph, SpatialKey};

/// What a control can reach while it is updated.
pub struct ControlUpdateContext<'a> {
    /// Seconds since the last frame
    pub tpf: f32,
    /// Local transform of the spatial the control is attached to
    pub local_transform: &'a mut Transform,
}

/// What a control can reach while its spatial is being rendered.
pub struct ControlRenderContext<'a> {
    pub scene: &'a mut SceneGraph,
    /// Spatial the control is attached to
    pub spatial: SpatialKey,
    pub renderer: &'a mut dyn Renderer,
    pub camera: &'a Camera,
}

pub trait Control: Send + Any {
    /// Advance by `ctx.tpf` seconds
    fn update(&mut self, ctx: &mut ControlUpdateContext<'_>) -> Result<()>;

    /// Called for every viewport that is about to queue the spatial
    fn render(&mut self, ctx: &mut ControlRenderContext<'_>) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
