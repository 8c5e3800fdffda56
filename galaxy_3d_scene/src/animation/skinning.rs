/// Software (CPU) vertex skinning.
///
/// Every vertex is rebuilt from its bind-pose value as the weighted sum of
/// the offset matrices of up to four bones. Callers reset the mesh to its
/// bind pose first; skinning an already deformed buffer deforms it twice.
///
/// Positions use the full matrix, normals and tangents only its 3x3 part.

use glam::{Mat4, Vec3, Vec4};
use crate::engine_bail;
use crate::error::Result;
use crate::scene::{SkinningBuffers, MAX_WEIGHTS_PER_VERTEX};

fn check_weights(buffers: &SkinningBuffers<'_>) -> Result<()> {
    if buffers.max_num_weights == 0 || buffers.max_num_weights > MAX_WEIGHTS_PER_VERTEX {
        engine_bail!("galaxy3d::Skinning", InvalidResource =>
            "Max weights per vertex is incorrectly set ({})", buffers.max_num_weights);
    }
    Ok(())
}

fn check_bone_data(buffers: &SkinningBuffers<'_>) -> Result<()> {
    let vertices = buffers.positions.len();
    if buffers.bone_weights.len() < vertices || buffers.bone_indices.len() < vertices {
        engine_bail!("galaxy3d::Skinning", InvalidResource =>
            "Bone data covers {} weights and {} indices for {} vertices",
            buffers.bone_weights.len(), buffers.bone_indices.len(), vertices);
    }
    Ok(())
}

fn offset<'a>(offsets: &'a [Mat4], bone: u8) -> Result<&'a Mat4> {
    match offsets.get(bone as usize) {
        Some(matrix) => Ok(matrix),
        None => engine_bail!("galaxy3d::Skinning", InvalidResource =>
            "Bone index {} out of range ({} skinning matrices)", bone, offsets.len()),
    }
}

/// Skin positions and normals in place.
pub fn apply_skinning(buffers: SkinningBuffers<'_>, offsets: &[Mat4]) -> Result<()> {
    check_weights(&buffers)?;
    check_bone_data(&buffers)?;
    let max_weights = buffers.max_num_weights;

    for (vertex, position) in buffers.positions.iter_mut().enumerate() {
        let weights = &buffers.bone_weights[vertex];
        let indices = &buffers.bone_indices[vertex];
        // Unweighted vertices keep their bind pose
        if weights[0] == 0.0 {
            continue;
        }

        let bind_position = *position;
        let bind_normal = buffers.normals.get(vertex).copied();
        let mut skinned_position = Vec3::ZERO;
        let mut skinned_normal = Vec3::ZERO;

        for w in 0..max_weights {
            let weight = weights[w];
            if weight == 0.0 {
                continue;
            }
            let matrix = offset(offsets, indices[w])?;
            skinned_position += matrix.transform_point3(bind_position) * weight;
            if let Some(normal) = bind_normal {
                skinned_normal += matrix.transform_vector3(normal) * weight;
            }
        }

        *position = skinned_position;
        if let Some(normal) = buffers.normals.get_mut(vertex) {
            *normal = skinned_normal;
        }
    }
    Ok(())
}

/// Skin positions, normals and tangents in place.
///
/// The tangent w component (handedness) is kept.
pub fn apply_skinning_tangents(buffers: SkinningBuffers<'_>, offsets: &[Mat4]) -> Result<()> {
    check_weights(&buffers)?;
    check_bone_data(&buffers)?;
    let max_weights = buffers.max_num_weights;

    for (vertex, position) in buffers.positions.iter_mut().enumerate() {
        let weights = &buffers.bone_weights[vertex];
        let indices = &buffers.bone_indices[vertex];
        if weights[0] == 0.0 {
            continue;
        }

        let bind_position = *position;
        let bind_normal = buffers.normals.get(vertex).copied();
        let bind_tangent = buffers.tangents.get(vertex).copied();
        let mut skinned_position = Vec3::ZERO;
        let mut skinned_normal = Vec3::ZERO;
        let mut skinned_tangent = Vec3::ZERO;

        for w in 0..max_weights {
            let weight = weights[w];
            if weight == 0.0 {
                continue;
            }
            let matrix = offset(offsets, indices[w])?;
            skinned_position += matrix.transform_point3(bind_position) * weight;
            if let Some(normal) = bind_normal {
                skinned_normal += matrix.transform_vector3(normal) * weight;
            }
            if let Some(tangent) = bind_tangent {
                skinned_tangent += matrix.transform_vector3(tangent.truncate()) * weight;
            }
        }

        *position = skinned_position;
        if let Some(normal) = buffers.normals.get_mut(vertex) {
            *normal = skinned_normal;
        }
        if let Some(tangent) = buffers.tangents.get_mut(vertex) {
            *tangent = Vec4::new(skinned_tangent.x, skinned_tangent.y, skinned_tangent.z, tangent.w);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "skinning_tests.rs"]
mod tests;
