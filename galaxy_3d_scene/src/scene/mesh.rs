/// Mesh - CPU-side vertex data of a geometry.
///
/// Positions are mandatory; normals, tangents, index buffers and the
/// skinning attributes are optional. An animated mesh carries up to four
/// bone influences per vertex, and once prepared for software skinning it
/// also keeps an untouched copy of the bind pose so every frame can start
/// from it.

use std::sync::atomic::{AtomicU64, Ordering};
use glam::{Vec3, Vec4};
use crate::error::Result;
use crate::engine_bail;
use crate::math::{BoundingBox, BoundingVolume};

/// Maximum bone influences per vertex
pub const MAX_WEIGHTS_PER_VERTEX: usize = 4;

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a mesh's GPU-side resources.
///
/// Every mesh (including clones) gets a fresh id, so the renderer never
/// confuses two meshes that happen to hold the same data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

impl MeshId {
    fn next() -> Self {
        MeshId(NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeshMode {
    #[default]
    Triangles,
    TriangleStrip,
    Lines,
    Points,
}

/// Untouched vertex data used as the starting point of software skinning.
#[derive(Debug, Clone, Default)]
pub struct BindPose {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec4>,
}

/// Mutable view over the buffers touched by software skinning.
pub struct SkinningBuffers<'a> {
    pub positions: &'a mut [Vec3],
    pub normals: &'a mut [Vec3],
    pub tangents: &'a mut [Vec4],
    pub bone_indices: &'a [[u8; MAX_WEIGHTS_PER_VERTEX]],
    pub bone_weights: &'a [[f32; MAX_WEIGHTS_PER_VERTEX]],
    pub max_num_weights: usize,
}

#[derive(Debug)]
pub struct Mesh {
    id: MeshId,
    name: String,
    mode: MeshMode,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    /// xyz tangent, w handedness
    tangents: Vec<Vec4>,
    /// One index buffer per level of detail, level 0 first
    lod_levels: Vec<Vec<u32>>,
    bone_indices: Vec<[u8; MAX_WEIGHTS_PER_VERTEX]>,
    bone_weights: Vec<[f32; MAX_WEIGHTS_PER_VERTEX]>,
    max_num_weights: usize,
    bind_pose: Option<BindPose>,
    bound: BoundingVolume,
    /// Bumped whenever vertex data changes, so the renderer re-uploads it
    version: u64,
}

impl Clone for Mesh {
    fn clone(&self) -> Self {
        Self {
            id: MeshId::next(),
            name: self.name.clone(),
            mode: self.mode,
            positions: self.positions.clone(),
            normals: self.normals.clone(),
            tangents: self.tangents.clone(),
            lod_levels: self.lod_levels.clone(),
            bone_indices: self.bone_indices.clone(),
            bone_weights: self.bone_weights.clone(),
            max_num_weights: self.max_num_weights,
            bind_pose: self.bind_pose.clone(),
            bound: self.bound,
            version: self.version,
        }
    }
}

impl Mesh {
    /// Create a mesh from vertex positions.
    ///
    /// The model bound is the axis-aligned box of the positions.
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>) -> Self {
        let bound = BoundingBox::from_points(&positions).into();
        Self {
            id: MeshId::next(),
            name: name.into(),
            mode: MeshMode::Triangles,
            positions,
            normals: Vec::new(),
            tangents: Vec::new(),
            lod_levels: Vec::new(),
            bone_indices: Vec::new(),
            bone_weights: Vec::new(),
            max_num_weights: 0,
            bind_pose: None,
            bound,
            version: 0,
        }
    }

    pub fn with_mode(mut self, mode: MeshMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Result<Self> {
        self.check_vertex_count("normals", normals.len())?;
        self.normals = normals;
        Ok(self)
    }

    pub fn with_tangents(mut self, tangents: Vec<Vec4>) -> Result<Self> {
        self.check_vertex_count("tangents", tangents.len())?;
        self.tangents = tangents;
        Ok(self)
    }

    pub fn with_indices(mut self, indices: Vec<u32>) -> Result<Self> {
        self.set_lod_levels(vec![indices])?;
        Ok(self)
    }

    /// Attach per-vertex bone influences.
    ///
    /// `max_num_weights` is the number of meaningful slots per vertex (1..=4).
    pub fn with_bone_data(
        mut self,
        bone_indices: Vec<[u8; MAX_WEIGHTS_PER_VERTEX]>,
        bone_weights: Vec<[f32; MAX_WEIGHTS_PER_VERTEX]>,
        max_num_weights: usize,
    ) -> Result<Self> {
        self.check_vertex_count("bone indices", bone_indices.len())?;
        self.check_vertex_count("bone weights", bone_weights.len())?;
        if max_num_weights > MAX_WEIGHTS_PER_VERTEX {
            engine_bail!("galaxy3d::Mesh", InvalidResource =>
                "Mesh '{}': {} weights per vertex exceeds the maximum of {}",
                self.name, max_num_weights, MAX_WEIGHTS_PER_VERTEX);
        }
        self.bone_indices = bone_indices;
        self.bone_weights = bone_weights;
        self.max_num_weights = max_num_weights;
        Ok(self)
    }

    fn check_vertex_count(&self, what: &str, count: usize) -> Result<()> {
        if count != self.positions.len() {
            engine_bail!("galaxy3d::Mesh", InvalidResource =>
                "Mesh '{}': {} {} for {} vertices", self.name, count, what, self.positions.len());
        }
        Ok(())
    }

    // ===== ACCESSORS =====

    pub fn id(&self) -> MeshId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> MeshMode {
        self.mode
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn tangents(&self) -> &[Vec4] {
        &self.tangents
    }

    pub fn has_tangents(&self) -> bool {
        !self.tangents.is_empty()
    }

    pub fn bone_indices(&self) -> &[[u8; MAX_WEIGHTS_PER_VERTEX]] {
        &self.bone_indices
    }

    pub fn bone_weights(&self) -> &[[f32; MAX_WEIGHTS_PER_VERTEX]] {
        &self.bone_weights
    }

    pub fn max_num_weights(&self) -> usize {
        self.max_num_weights
    }

    pub fn set_max_num_weights(&mut self, max_num_weights: usize) {
        self.max_num_weights = max_num_weights.min(MAX_WEIGHTS_PER_VERTEX);
    }

    /// True when the mesh carries bone influences
    pub fn is_animated(&self) -> bool {
        !self.bone_weights.is_empty()
    }

    pub fn bind_pose(&self) -> Option<&BindPose> {
        self.bind_pose.as_ref()
    }

    pub fn bound(&self) -> &BoundingVolume {
        &self.bound
    }

    pub fn set_bound(&mut self, bound: BoundingVolume) {
        self.bound = bound;
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    // ===== LEVELS OF DETAIL =====

    /// Replace every index buffer. Indices must reference existing vertices.
    pub fn set_lod_levels(&mut self, levels: Vec<Vec<u32>>) -> Result<()> {
        let vertex_count = self.positions.len() as u32;
        for (level, indices) in levels.iter().enumerate() {
            if let Some(bad) = indices.iter().find(|&&i| i >= vertex_count) {
                engine_bail!("galaxy3d::Mesh", InvalidResource =>
                    "Mesh '{}' LOD {}: index {} out of range ({} vertices)",
                    self.name, level, bad, vertex_count);
            }
        }
        self.lod_levels = levels;
        Ok(())
    }

    pub fn num_lod_levels(&self) -> usize {
        self.lod_levels.len().max(1)
    }

    /// Index buffer of a level, `None` for non-indexed meshes
    pub fn indices(&self, lod: usize) -> Option<&[u32]> {
        self.lod_levels.get(lod).map(Vec::as_slice)
    }

    /// Number of primitives drawn at a level of detail
    pub fn triangle_count(&self, lod: usize) -> usize {
        let elements = self.indices(lod).map_or(self.positions.len(), <[u32]>::len);
        match self.mode {
            MeshMode::Triangles => elements / 3,
            MeshMode::TriangleStrip => elements.saturating_sub(2),
            MeshMode::Lines => elements / 2,
            MeshMode::Points => elements,
        }
    }

    // ===== RAW BYTES (GPU upload) =====

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    pub fn tangent_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.tangents)
    }

    pub fn bone_index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.bone_indices)
    }

    pub fn bone_weight_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.bone_weights)
    }

    pub fn index_bytes(&self, lod: usize) -> &[u8] {
        match self.indices(lod) {
            Some(indices) => bytemuck::cast_slice(indices),
            None => &[],
        }
    }

    // ===== ANIMATION =====

    /// Prepare the vertex buffers for the selected skinning path.
    ///
    /// Software skinning needs a bind-pose copy of positions, normals and
    /// tangents; it is created once and kept. Hardware skinning deforms on
    /// the GPU, so the live buffers are restored to the bind pose.
    pub fn prepare_for_anim(&mut self, software: bool) {
        if software {
            if self.bind_pose.is_none() {
                self.bind_pose = Some(BindPose {
                    positions: self.positions.clone(),
                    normals: self.normals.clone(),
                    tangents: self.tangents.clone(),
                });
            }
        } else if self.bind_pose.is_some() {
            self.reset_to_bind();
        }
    }

    /// Copy the bind pose back into the live buffers.
    ///
    /// Does nothing for a mesh that was never prepared for software skinning.
    pub fn reset_to_bind(&mut self) {
        let Some(bind) = &self.bind_pose else {
            return;
        };
        self.positions.copy_from_slice(&bind.positions);
        self.normals.copy_from_slice(&bind.normals);
        self.tangents.copy_from_slice(&bind.tangents);
        self.version += 1;
    }

    /// Borrow the live buffers for in-place skinning.
    pub fn skinning_buffers(&mut self) -> SkinningBuffers<'_> {
        self.version += 1;
        SkinningBuffers {
            positions: &mut self.positions,
            normals: &mut self.normals,
            tangents: &mut self.tangents,
            bone_indices: &self.bone_indices,
            bone_weights: &self.bone_weights,
            max_num_weights: self.max_num_weights,
        }
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
