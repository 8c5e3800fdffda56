/// Spatial - a node or geometry of the scene graph.
///
/// Spatials live in the `SceneGraph` arena and refer to each other through
/// `SpatialKey`s. Nodes group children; geometries carry a mesh and the
/// material it is drawn with.

use slotmap::new_key_type;
use crate::camera::FrustumIntersect;
use crate::material::Material;
use crate::math::{BoundingVolume, Transform};
use crate::queue::Bucket;
use crate::scene::{Control, Mesh};

new_key_type! {
    /// Stable key of a spatial in its scene graph
    pub struct SpatialKey;
}

/// Frustum culling behaviour of a spatial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullHint {
    /// Use the parent's hint (`Dynamic` at the root)
    #[default]
    Inherit,
    /// Cull against the camera frustum
    Dynamic,
    /// Never drawn; children are skipped too
    Always,
    /// Always drawn, the frustum is not tested
    Never,
}

/// Drawable leaf of the scene graph
#[derive(Debug)]
pub struct Geometry {
    mesh: Mesh,
    material: Option<Material>,
    lod_level: usize,
}

impl Geometry {
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }

    pub fn material(&self) -> Option<&Material> {
        self.material.as_ref()
    }

    pub fn material_mut(&mut self) -> Option<&mut Material> {
        self.material.as_mut()
    }

    pub fn set_material(&mut self, material: Option<Material>) {
        self.material = material;
    }

    pub fn lod_level(&self) -> usize {
        self.lod_level
    }

    /// Select the index buffer drawn; clamped to the mesh's levels
    pub fn set_lod_level(&mut self, lod_level: usize) {
        self.lod_level = lod_level.min(self.mesh.num_lod_levels() - 1);
    }
}

#[derive(Debug)]
pub enum SpatialKind {
    Node { children: Vec<SpatialKey> },
    Geometry(Geometry),
}

pub struct Spatial {
    pub(crate) name: String,
    pub(crate) parent: Option<SpatialKey>,
    pub(crate) kind: SpatialKind,
    pub(crate) local_transform: Transform,
    pub(crate) world_transform: Transform,
    pub(crate) world_bound: Option<BoundingVolume>,
    pub(crate) cull_hint: CullHint,
    pub(crate) queue_bucket: Bucket,
    /// Draw with an identity world matrix (screen-space geometry)
    pub(crate) ignore_transform: bool,
    /// Result of the last frustum test of this spatial
    pub(crate) frustum_intersects: FrustumIntersect,
    pub(crate) controls: Vec<Box<dyn Control>>,
}

impl Spatial {
    pub(crate) fn new(name: String, kind: SpatialKind) -> Self {
        Self {
            name,
            parent: None,
            kind,
            local_transform: Transform::IDENTITY,
            world_transform: Transform::IDENTITY,
            world_bound: None,
            cull_hint: CullHint::Inherit,
            queue_bucket: Bucket::Inherit,
            ignore_transform: false,
            frustum_intersects: FrustumIntersect::Intersects,
            controls: Vec::new(),
        }
    }

    pub(crate) fn new_geometry(name: String, mesh: Mesh, material: Option<Material>) -> Self {
        Self::new(name, SpatialKind::Geometry(Geometry { mesh, material, lod_level: 0 }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<SpatialKey> {
        self.parent
    }

    pub fn kind(&self) -> &SpatialKind {
        &self.kind
    }

    pub fn is_node(&self) -> bool {
        matches!(self.kind, SpatialKind::Node { .. })
    }

    pub fn children(&self) -> &[SpatialKey] {
        match &self.kind {
            SpatialKind::Node { children } => children,
            SpatialKind::Geometry(_) => &[],
        }
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        match &self.kind {
            SpatialKind::Geometry(geometry) => Some(geometry),
            SpatialKind::Node { .. } => None,
        }
    }

    pub fn geometry_mut(&mut self) -> Option<&mut Geometry> {
        match &mut self.kind {
            SpatialKind::Geometry(geometry) => Some(geometry),
            SpatialKind::Node { .. } => None,
        }
    }

    // ===== TRANSFORMS & BOUNDS =====

    pub fn local_transform(&self) -> &Transform {
        &self.local_transform
    }

    /// Takes effect at the next geometric state update
    pub fn set_local_transform(&mut self, transform: Transform) {
        self.local_transform = transform;
    }

    pub fn world_transform(&self) -> &Transform {
        &self.world_transform
    }

    /// World-space bound, `None` for an empty node
    pub fn world_bound(&self) -> Option<&BoundingVolume> {
        self.world_bound.as_ref()
    }

    pub fn is_ignore_transform(&self) -> bool {
        self.ignore_transform
    }

    pub fn set_ignore_transform(&mut self, ignore: bool) {
        self.ignore_transform = ignore;
    }

    // ===== RENDERING HINTS =====

    pub fn cull_hint(&self) -> CullHint {
        self.cull_hint
    }

    pub fn set_cull_hint(&mut self, hint: CullHint) {
        self.cull_hint = hint;
    }

    pub fn queue_bucket(&self) -> Bucket {
        self.queue_bucket
    }

    pub fn set_queue_bucket(&mut self, bucket: Bucket) {
        self.queue_bucket = bucket;
    }

    /// Result of the last frustum test
    pub fn last_frustum_intersection(&self) -> FrustumIntersect {
        self.frustum_intersects
    }

    pub fn num_controls(&self) -> usize {
        self.controls.len()
    }
}
