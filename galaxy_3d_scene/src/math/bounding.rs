/// Bounding volumes used for frustum culling and queue sorting.
///
/// Each volume remembers the index of the last frustum plane that rejected
/// it (`check_plane`). The camera tests that plane first on the next query,
/// since a static or slowly moving object usually fails against it again.

use glam::{Mat3, Vec3};
use super::plane::{Plane, PlaneSide};
use super::transform::Transform;

// ===== SPHERE =====

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
    check_plane: usize,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius, check_plane: 0 }
    }

    /// Smallest sphere centered on the points' box center that holds every point
    pub fn from_points(points: &[Vec3]) -> Self {
        let center = BoundingBox::from_points(points).center;
        let radius = points
            .iter()
            .map(|p| p.distance(center))
            .fold(0.0_f32, f32::max);
        Self::new(center, radius)
    }

    pub fn which_side(&self, plane: &Plane) -> PlaneSide {
        let distance = plane.pseudo_distance(self.center);
        if distance <= -self.radius {
            PlaneSide::Negative
        } else if distance >= self.radius {
            PlaneSide::Positive
        } else {
            PlaneSide::None
        }
    }

    pub fn transform(&self, transform: &Transform) -> BoundingSphere {
        let scale = transform.scale.abs().max_element();
        BoundingSphere {
            center: transform.transform_vector(self.center),
            radius: self.radius * scale,
            check_plane: self.check_plane,
        }
    }

    /// Smallest sphere enclosing both spheres
    pub fn merge(&self, other: &BoundingSphere) -> BoundingSphere {
        let diff = other.center - self.center;
        let length_squared = diff.length_squared();
        let radius_diff = other.radius - self.radius;

        if radius_diff * radius_diff >= length_squared {
            // One sphere already contains the other
            return if radius_diff <= 0.0 { *self } else { *other };
        }

        let length = length_squared.sqrt();
        let mut center = self.center;
        if length > f32::EPSILON {
            let coeff = (length + radius_diff) / (2.0 * length);
            center += diff * coeff;
        }

        BoundingSphere {
            center,
            radius: 0.5 * (length + self.radius + other.radius),
            check_plane: self.check_plane,
        }
    }
}

// ===== BOX =====

/// Axis-aligned box stored as center and half extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub center: Vec3,
    pub extent: Vec3,
    check_plane: usize,
}

impl BoundingBox {
    pub fn new(center: Vec3, extent: Vec3) -> Self {
        Self { center, extent, check_plane: 0 }
    }

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self::new((min + max) * 0.5, (max - min) * 0.5)
    }

    pub fn from_points(points: &[Vec3]) -> Self {
        if points.is_empty() {
            return Self::new(Vec3::ZERO, Vec3::ZERO);
        }
        let (min, max) = points.iter().fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(min, max), p| (min.min(*p), max.max(*p)),
        );
        Self::from_min_max(min, max)
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.extent
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.extent
    }

    pub fn which_side(&self, plane: &Plane) -> PlaneSide {
        // Projected half-size of the box onto the plane normal
        let radius = (self.extent * plane.normal).abs().element_sum();
        let distance = plane.pseudo_distance(self.center);
        if distance < -radius {
            PlaneSide::Negative
        } else if distance > radius {
            PlaneSide::Positive
        } else {
            PlaneSide::None
        }
    }

    /// Transform the box, returning the axis-aligned box enclosing the result.
    pub fn transform(&self, transform: &Transform) -> BoundingBox {
        let rotation = Mat3::from_quat(transform.rotation);
        let scaled = self.extent * transform.scale.abs();
        let extent = Vec3::new(
            rotation.row(0).abs().dot(scaled),
            rotation.row(1).abs().dot(scaled),
            rotation.row(2).abs().dot(scaled),
        );
        BoundingBox {
            center: transform.transform_vector(self.center),
            extent,
            check_plane: self.check_plane,
        }
    }

    pub fn merge(&self, other: &BoundingBox) -> BoundingBox {
        let mut merged = BoundingBox::from_min_max(self.min().min(other.min()), self.max().max(other.max()));
        merged.check_plane = self.check_plane;
        merged
    }

    pub fn intersects_box(&self, other: &BoundingBox) -> bool {
        let delta = (self.center - other.center).abs();
        let reach = self.extent + other.extent;
        delta.cmple(reach).all()
    }
}

// ===== VOLUME =====

/// Bounding volume attached to a spatial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundingVolume {
    Sphere(BoundingSphere),
    Box(BoundingBox),
}

impl BoundingVolume {
    pub fn center(&self) -> Vec3 {
        match self {
            BoundingVolume::Sphere(s) => s.center,
            BoundingVolume::Box(b) => b.center,
        }
    }

    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.center().distance(point)
    }

    /// Index of the frustum plane tested first on the next culling query
    pub fn check_plane(&self) -> usize {
        match self {
            BoundingVolume::Sphere(s) => s.check_plane,
            BoundingVolume::Box(b) => b.check_plane,
        }
    }

    pub fn set_check_plane(&mut self, plane: usize) {
        match self {
            BoundingVolume::Sphere(s) => s.check_plane = plane,
            BoundingVolume::Box(b) => b.check_plane = plane,
        }
    }

    pub fn which_side(&self, plane: &Plane) -> PlaneSide {
        match self {
            BoundingVolume::Sphere(s) => s.which_side(plane),
            BoundingVolume::Box(b) => b.which_side(plane),
        }
    }

    pub fn transform(&self, transform: &Transform) -> BoundingVolume {
        match self {
            BoundingVolume::Sphere(s) => BoundingVolume::Sphere(s.transform(transform)),
            BoundingVolume::Box(b) => BoundingVolume::Box(b.transform(transform)),
        }
    }

    /// Merge two volumes. The result keeps the type of `self`.
    pub fn merge(&self, other: &BoundingVolume) -> BoundingVolume {
        match (self, other) {
            (BoundingVolume::Sphere(a), BoundingVolume::Sphere(b)) => BoundingVolume::Sphere(a.merge(b)),
            (BoundingVolume::Box(a), BoundingVolume::Box(b)) => BoundingVolume::Box(a.merge(b)),
            (BoundingVolume::Sphere(a), BoundingVolume::Box(b)) => {
                let as_sphere = BoundingSphere::new(b.center, b.extent.length());
                BoundingVolume::Sphere(a.merge(&as_sphere))
            }
            (BoundingVolume::Box(a), BoundingVolume::Sphere(b)) => {
                let as_box = BoundingBox::new(b.center, Vec3::splat(b.radius));
                BoundingVolume::Box(a.merge(&as_box))
            }
        }
    }

    pub fn intersects(&self, other: &BoundingVolume) -> bool {
        match (self, other) {
            (BoundingVolume::Sphere(a), BoundingVolume::Sphere(b)) => {
                let reach = a.radius + b.radius;
                a.center.distance_squared(b.center) <= reach * reach
            }
            (BoundingVolume::Box(a), BoundingVolume::Box(b)) => a.intersects_box(b),
            (BoundingVolume::Sphere(s), BoundingVolume::Box(b))
            | (BoundingVolume::Box(b), BoundingVolume::Sphere(s)) => {
                let closest = s.center.clamp(b.min(), b.max());
                closest.distance_squared(s.center) <= s.radius * s.radius
            }
        }
    }
}

impl From<BoundingSphere> for BoundingVolume {
    fn from(sphere: BoundingSphere) -> Self {
        BoundingVolume::Sphere(sphere)
    }
}

impl From<BoundingBox> for BoundingVolume {
    fn from(bbox: BoundingBox) -> Self {
        BoundingVolume::Box(bbox)
    }
}

#[cfg(test)]
#[path = "bounding_tests.rs"]
mod tests;
