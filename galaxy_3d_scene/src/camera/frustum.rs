/// Frustum - six world-space clipping planes for visibility culling.
///
/// Each plane is in Hessian normal form with the normal pointing toward
/// the inside of the frustum: a point P is inside a plane when
/// `normal · P - constant >= 0`.
///
/// The camera builds its frustum from precomputed plane coefficients.
/// `from_view_projection()` is an independent extraction from a
/// view-projection matrix, useful when only the matrices are known.

use bitflags::bitflags;
use glam::{Mat4, Vec4};
use crate::math::{BoundingVolume, Plane, PlaneSide};

/// Result of a frustum containment test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumIntersect {
    /// Entirely outside at least one plane
    Outside,
    /// Entirely inside all planes
    Inside,
    /// Straddles at least one plane, outside none
    Intersects,
}

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Number of frustum planes
pub const FRUSTUM_PLANES: usize = 6;

bitflags! {
    /// Planes an ancestor volume was found entirely inside of.
    ///
    /// A child volume is enclosed by its parent's, so these planes need not
    /// be tested again further down the same traversal. The value is copied
    /// into each recursion frame, so siblings never see each other's bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PlaneState: u8 {
        const LEFT = 1 << PLANE_LEFT;
        const RIGHT = 1 << PLANE_RIGHT;
        const BOTTOM = 1 << PLANE_BOTTOM;
        const TOP = 1 << PLANE_TOP;
        const NEAR = 1 << PLANE_NEAR;
        const FAR = 1 << PLANE_FAR;
    }
}

impl PlaneState {
    /// Bit for the plane at `index`
    pub fn plane(index: usize) -> PlaneState {
        PlaneState::from_bits_truncate(1 << index)
    }
}

/// Six frustum planes: left, right, bottom, top, near, far.
#[derive(Debug, Clone, Copy, Default)]
pub struct Frustum {
    pub planes: [Plane; FRUSTUM_PLANES],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix.
    ///
    /// Gribb & Hartmann method for a projection mapping depth to [-1, 1].
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let row = |i: usize| vp.row(i);
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        let raw: [Vec4; FRUSTUM_PLANES] = [
            r3 + r0, // left
            r3 - r0, // right
            r3 + r1, // bottom
            r3 - r1, // top
            r3 + r2, // near
            r3 - r2, // far
        ];

        let mut planes = [Plane::default(); FRUSTUM_PLANES];
        for (plane, v) in planes.iter_mut().zip(raw) {
            let normal_len = v.truncate().length();
            let v = if normal_len > 0.0 { v / normal_len } else { v };
            *plane = Plane::from_vec4(v);
        }

        Self { planes }
    }

    pub fn plane(&self, index: usize) -> &Plane {
        &self.planes[index]
    }

    /// Classify a volume against every plane, without any caching.
    pub fn classify(&self, bound: &BoundingVolume) -> FrustumIntersect {
        let mut result = FrustumIntersect::Inside;
        for plane in &self.planes {
            match bound.which_side(plane) {
                PlaneSide::Negative => return FrustumIntersect::Outside,
                PlaneSide::None => result = FrustumIntersect::Intersects,
                PlaneSide::Positive => {}
            }
        }
        result
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
