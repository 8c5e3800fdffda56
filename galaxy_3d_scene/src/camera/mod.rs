//! Camera module - view/projection derivation and frustum culling.
//!
//! One camera drives one viewport. Cameras are owned by their viewport
//! and mutated freely by the application between frames.

mod camera;
mod frustum;

pub use camera::Camera;
pub use frustum::{
    Frustum, FrustumIntersect, PlaneState, FRUSTUM_PLANES,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
