//! Scene graph module
//!
//! Spatials (nodes and geometries) stored in an arena, the meshes they
//! draw, and the controls attached to them.

mod mesh;
mod spatial;
mod control;
mod scene_graph;

pub use mesh::{Mesh, MeshId, MeshMode, BindPose, SkinningBuffers, MAX_WEIGHTS_PER_VERTEX};
pub use spatial::{Spatial, SpatialKey, SpatialKind, Geometry, CullHint};
pub use control::{Control, ControlRenderContext, ControlUpdateContext};
pub use scene_graph::SceneGraph;
