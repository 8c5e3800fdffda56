/// Geometry sort strategies used by the render queue buckets.
///
/// A comparator turns each queued geometry into a `SortKey` once per sort;
/// lists are then ordered by ascending key with a stable sort, so equal
/// keys keep their insertion order.

use std::cmp::Ordering;
use glam::Vec3;
use crate::camera::Camera;
use crate::scene::{SceneGraph, SpatialKey};

/// Ordering key of a queued geometry, ascending
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SortKey {
    pub primary: f32,
    /// Tie breaker
    pub secondary: u32,
}

impl SortKey {
    pub fn compare(&self, other: &SortKey) -> Ordering {
        self.primary
            .total_cmp(&other.primary)
            .then(self.secondary.cmp(&other.secondary))
    }
}

pub trait GeometryComparator: Send {
    fn sort_key(&self, scene: &SceneGraph, geometry: SpatialKey, camera: &Camera) -> SortKey;
}

/// World position used for distance sorting: bound center, else origin of the transform
fn sort_position(scene: &SceneGraph, geometry: SpatialKey) -> Vec3 {
    scene.get(geometry).map_or(Vec3::ZERO, |spatial| {
        spatial
            .world_bound()
            .map_or(spatial.world_transform().translation, |bound| bound.center())
    })
}

/// Front to back by squared distance to the camera, then by shader.
#[derive(Debug, Default)]
pub struct OpaqueComparator;

impl GeometryComparator for OpaqueComparator {
    fn sort_key(&self, scene: &SceneGraph, geometry: SpatialKey, camera: &Camera) -> SortKey {
        let distance = sort_position(scene, geometry).distance_squared(camera.location());
        let sort_id = scene
            .get(geometry)
            .and_then(|s| s.geometry())
            .and_then(|g| g.material())
            .map_or(0, |m| m.sort_id());
        SortKey { primary: distance, secondary: sort_id }
    }
}

/// Back to front by distance to the near plane.
#[derive(Debug, Default)]
pub struct TransparentComparator;

impl GeometryComparator for TransparentComparator {
    fn sort_key(&self, scene: &SceneGraph, geometry: SpatialKey, camera: &Camera) -> SortKey {
        let distance = camera.distance_to_near_plane(sort_position(scene, geometry));
        SortKey { primary: -distance, secondary: 0 }
    }
}

/// Ascending world z, so higher layers draw on top.
#[derive(Debug, Default)]
pub struct GuiComparator;

impl GeometryComparator for GuiComparator {
    fn sort_key(&self, scene: &SceneGraph, geometry: SpatialKey, _camera: &Camera) -> SortKey {
        let z = scene.get(geometry).map_or(0.0, |s| s.world_transform().translation.z);
        SortKey { primary: z, secondary: 0 }
    }
}

/// Keeps insertion order.
#[derive(Debug, Default)]
pub struct NullComparator;

impl GeometryComparator for NullComparator {
    fn sort_key(&self, _scene: &SceneGraph, _geometry: SpatialKey, _camera: &Camera) -> SortKey {
        SortKey::default()
    }
}
