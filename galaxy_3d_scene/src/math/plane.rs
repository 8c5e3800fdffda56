/// Plane in Hessian normal form.
///
/// A point P lies on the plane when `normal · P == constant`. The side the
/// normal points to is the positive side.

use glam::{Vec3, Vec4};

/// Classification of a point or volume against a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// Straddling or lying on the plane
    None,
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub constant: f32,
}

impl Default for Plane {
    fn default() -> Self {
        Self { normal: Vec3::Y, constant: 0.0 }
    }
}

impl Plane {
    pub fn new(normal: Vec3, constant: f32) -> Self {
        Self { normal, constant }
    }

    /// Plane through `origin` with the given normal
    pub fn from_origin_normal(origin: Vec3, normal: Vec3) -> Self {
        Self { normal, constant: normal.dot(origin) }
    }

    /// Convert from the `(A, B, C, D)` form where `Ax + By + Cz + D = 0`.
    pub fn from_vec4(plane: Vec4) -> Self {
        Self { normal: plane.truncate(), constant: -plane.w }
    }

    /// Signed distance when the normal is unit length, otherwise scaled by its length.
    pub fn pseudo_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.constant
    }

    pub fn which_side(&self, point: Vec3) -> PlaneSide {
        let dis = self.pseudo_distance(point);
        if dis < 0.0 {
            PlaneSide::Negative
        } else if dis > 0.0 {
            PlaneSide::Positive
        } else {
            PlaneSide::None
        }
    }
}
