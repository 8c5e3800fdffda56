/// Skeleton - a flat, index-addressed array of bones.
///
/// Mesh vertex data refers to bones by index, so bone indices never change
/// for the lifetime of the skeleton. Parents and children are links inside
/// the array; the roots (bones without parent) are found by scanning.

use glam::Mat4;
use rustc_hash::FxHashMap;
use crate::animation::Bone;
use crate::engine_bail;
use crate::error::Result;
use crate::math::Transform;

#[derive(Debug, Clone)]
pub struct Skeleton {
    bones: Vec<Bone>,
    roots: Vec<usize>,
    bone_names: FxHashMap<String, usize>,
    /// Scratch storage reused by `compute_skinning_matrices`
    skinning_matrices: Vec<Mat4>,
}

impl Skeleton {
    /// Build a skeleton from `(bone, parent index)` pairs.
    ///
    /// Fails on a parent index out of range, a parent cycle or a duplicate
    /// bone name. Model poses are computed once before returning.
    pub fn new(bones: Vec<(Bone, Option<usize>)>) -> Result<Self> {
        let count = bones.len();
        let mut list: Vec<Bone> = Vec::with_capacity(count);
        let mut bone_names = FxHashMap::default();

        for (index, (mut bone, parent)) in bones.into_iter().enumerate() {
            if let Some(p) = parent {
                if p >= count {
                    engine_bail!("galaxy3d::Skeleton", InvalidResource =>
                        "Bone '{}' has parent index {} out of range ({} bones)", bone.name(), p, count);
                }
                if p == index {
                    engine_bail!("galaxy3d::Skeleton", InvalidResource =>
                        "Bone '{}' is its own parent", bone.name());
                }
            }
            if bone_names.insert(bone.name().to_string(), index).is_some() {
                engine_bail!("galaxy3d::Skeleton", InvalidResource =>
                    "Duplicate bone name '{}'", bone.name());
            }
            bone.parent = parent;
            bone.children.clear();
            list.push(bone);
        }

        for index in 0..count {
            if let Some(p) = list[index].parent {
                list[p].children.push(index);
            }
        }

        let roots: Vec<usize> = (0..count).filter(|&i| list[i].parent.is_none()).collect();

        let mut skeleton = Self {
            bones: list,
            roots,
            bone_names,
            skinning_matrices: vec![Mat4::IDENTITY; count],
        };

        // Every bone must hang below a root; anything else sits on a cycle
        let mut reached = vec![false; count];
        let mut stack = skeleton.roots.clone();
        while let Some(i) = stack.pop() {
            reached[i] = true;
            stack.extend_from_slice(&skeleton.bones[i].children);
        }
        if let Some(orphan) = reached.iter().position(|r| !r) {
            engine_bail!("galaxy3d::Skeleton", InvalidResource =>
                "Bone '{}' is part of a parent cycle", skeleton.bones[orphan].name());
        }

        skeleton.update();
        Ok(skeleton)
    }

    // ===== ACCESS =====

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    pub fn bone_mut(&mut self, index: usize) -> Option<&mut Bone> {
        self.bones.get_mut(index)
    }

    pub fn bone_by_name(&self, name: &str) -> Option<&Bone> {
        self.bone_index(name).and_then(|i| self.bones.get(i))
    }

    pub fn bone_by_name_mut(&mut self, name: &str) -> Option<&mut Bone> {
        let index = self.bone_index(name)?;
        self.bones.get_mut(index)
    }

    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bone_names.get(name).copied()
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Indices of the bones without parent
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    // ===== POSE =====

    /// Recompute every model-space pose, parents before children.
    pub fn update(&mut self) {
        for i in 0..self.roots.len() {
            let root = self.roots[i];
            self.update_bone(root, None);
        }
    }

    fn update_bone(&mut self, index: usize, parent_model: Option<Transform>) {
        self.bones[index].update_model_transforms(parent_model.as_ref());
        let model = *self.bones[index].model_transform();
        for i in (0..self.bones[index].children.len()).rev() {
            let child = self.bones[index].children[i];
            self.update_bone(child, Some(model));
        }
    }

    /// Make the current pose the rest pose of every bone.
    ///
    /// Updates the model poses first so the inverse bind poses are current.
    pub fn set_binding_pose(&mut self) {
        self.update();
        for bone in &mut self.bones {
            bone.set_binding_pose();
        }
    }

    /// Put every bone not under user control back in its bind pose
    pub fn reset(&mut self) {
        for bone in &mut self.bones {
            bone.reset();
        }
    }

    pub fn reset_and_update(&mut self) {
        self.reset();
        self.update();
    }

    /// One offset matrix per bone, in bone index order.
    pub fn compute_skinning_matrices(&mut self) -> &[Mat4] {
        for (matrix, bone) in self.skinning_matrices.iter_mut().zip(&self.bones) {
            *matrix = bone.offset_transform();
        }
        &self.skinning_matrices
    }
}

#[cfg(test)]
#[path = "skeleton_tests.rs"]
mod tests;
