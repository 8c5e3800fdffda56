//! Math support - transforms, planes and bounding volumes.
//!
//! Vector, quaternion and matrix types come from `glam`; this module adds
//! the scene-level types built on top of them.

mod transform;
mod plane;
mod bounding;

pub use transform::Transform;
pub use plane::{Plane, PlaneSide};
pub use bounding::{BoundingVolume, BoundingSphere, BoundingBox};
