/// Bone - one joint of a skeleton.
///
/// A bone keeps three poses:
/// - the bind pose (rest pose, local to the parent),
/// - the local pose written by animation or user code each frame,
/// - the model-space pose derived from the parent chain by `Skeleton::update`.
///
/// The inverse of the model-space bind pose is stored in component form
/// (translation, rotation, scale) and combined with the current model pose
/// to produce the skinning offset matrix.
///
/// Bones do not own each other: the skeleton stores them in a flat array
/// and links parents and children by index.

use glam::{Mat4, Quat, Vec3};
use crate::engine_bail;
use crate::error::Result;
use crate::math::Transform;

/// Weight accumulator value meaning "no animation blended this frame"
const NO_WEIGHT: f32 = -1.0;

#[derive(Debug, Clone)]
pub struct Bone {
    name: String,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
    user_control: bool,

    bind: Transform,
    /// Inverse model-space bind pose, component form
    model_bind_inverse: Transform,

    local: Transform,
    model: Transform,

    /// Sum of the animation weights blended since the last model update
    current_weight_sum: f32,
}

impl Bone {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            user_control: false,
            bind: Transform::IDENTITY,
            model_bind_inverse: Transform::IDENTITY,
            local: Transform::IDENTITY,
            model: Transform::IDENTITY,
            current_weight_sum: NO_WEIGHT,
        }
    }

    /// Builder: set the bind (and current local) transform
    pub fn with_bind_transforms(mut self, translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        self.set_bind_transforms(translation, rotation, Some(scale));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index of the parent bone in its skeleton
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    // ===== POSES =====

    pub fn bind_transform(&self) -> &Transform {
        &self.bind
    }

    pub fn local_transform(&self) -> &Transform {
        &self.local
    }

    pub fn model_transform(&self) -> &Transform {
        &self.model
    }

    pub fn model_bind_inverse_transform(&self) -> &Transform {
        &self.model_bind_inverse
    }

    /// Set the rest pose. The local pose is reset to it as well.
    pub fn set_bind_transforms(&mut self, translation: Vec3, rotation: Quat, scale: Option<Vec3>) {
        self.bind.translation = translation;
        self.bind.rotation = rotation;
        self.local.translation = translation;
        self.local.rotation = rotation;
        if let Some(scale) = scale {
            self.bind.scale = scale;
            self.local.scale = scale;
        }
    }

    // ===== USER CONTROL =====

    pub fn is_user_control(&self) -> bool {
        self.user_control
    }

    /// With user control on, animation no longer writes the local pose
    pub fn set_user_control(&mut self, enable: bool) {
        self.user_control = enable;
    }

    /// Set the local pose as an offset from the bind pose.
    pub fn set_user_transforms(&mut self, translation: Vec3, rotation: Quat, scale: Vec3) -> Result<()> {
        if !self.user_control {
            engine_bail!("galaxy3d::Bone", InvalidState =>
                "Bone '{}': user control must be enabled to set user transforms", self.name);
        }
        self.local.translation = self.bind.translation + translation;
        self.local.rotation = self.bind.rotation * rotation;
        self.local.scale = self.bind.scale * scale;
        Ok(())
    }

    /// Overwrite the model-space pose directly.
    ///
    /// The next `Skeleton::update` recomputes it from the local pose again.
    pub fn set_user_transforms_in_model_space(&mut self, translation: Vec3, rotation: Quat) -> Result<()> {
        if !self.user_control {
            engine_bail!("galaxy3d::Bone", InvalidState =>
                "Bone '{}': user control must be enabled to set model space transforms", self.name);
        }
        self.model.translation = translation;
        self.model.rotation = rotation;
        Ok(())
    }

    // ===== ANIMATION =====

    /// Replace the local pose with bind pose + offset. Ignored under user control.
    pub fn set_anim_transforms(&mut self, translation: Vec3, rotation: Quat, scale: Option<Vec3>) {
        if self.user_control {
            return;
        }
        self.local.translation = self.bind.translation + translation;
        self.local.rotation = self.bind.rotation * rotation;
        if let Some(scale) = scale {
            self.local.scale = self.bind.scale * scale;
        }
    }

    /// Blend an animated offset into the local pose.
    ///
    /// The first contribution of a frame is written as is and its weight
    /// recorded. A second contribution is interpolated in by its weight and
    /// saturates the accumulator; later ones are ignored until the next
    /// model update. A weight of 0 does nothing.
    pub fn blend_anim_transforms(&mut self, translation: Vec3, rotation: Quat, scale: Option<Vec3>, weight: f32) {
        if self.user_control || weight == 0.0 {
            return;
        }

        if self.current_weight_sum == 1.0 {
            // Fully weighted already
        } else if self.current_weight_sum == NO_WEIGHT || self.current_weight_sum == 0.0 {
            self.set_anim_transforms(translation, rotation, scale);
            self.current_weight_sum = weight;
        } else {
            let target_translation = self.bind.translation + translation;
            let target_rotation = self.bind.rotation * rotation;
            self.local.translation = self.local.translation.lerp(target_translation, weight);
            self.local.rotation = self.local.rotation.lerp(target_rotation, weight);
            if let Some(scale) = scale {
                let target_scale = self.bind.scale * scale;
                self.local.scale = self.local.scale.lerp(target_scale, weight);
            }
            self.current_weight_sum = 1.0;
        }
    }

    /// Resolve the blended weight, then derive the model-space pose from
    /// `parent_model` (None for a root bone).
    ///
    /// A partial weight sum leaves the remainder to the bind pose.
    pub fn update_model_transforms(&mut self, parent_model: Option<&Transform>) {
        if self.current_weight_sum != 1.0 && self.current_weight_sum != NO_WEIGHT {
            if self.current_weight_sum == 0.0 {
                self.local = self.bind;
            } else {
                let inv_weight_sum = 1.0 - self.current_weight_sum;
                self.local = Transform::interpolate(&self.local, &self.bind, inv_weight_sum);
            }
        }
        self.current_weight_sum = NO_WEIGHT;

        self.model = match parent_model {
            Some(parent) => self.local.combine_with_parent(parent),
            None => self.local,
        };
    }

    /// Restore the bind pose, unless user controlled
    pub fn reset(&mut self) {
        if !self.user_control {
            self.local = self.bind;
        }
    }

    /// Make the current pose the rest pose.
    ///
    /// Requires an up-to-date model pose (`Skeleton::update` first).
    pub fn set_binding_pose(&mut self) {
        self.bind = self.local;
        self.model_bind_inverse = Transform {
            translation: -self.model.translation,
            rotation: self.model.rotation.inverse(),
            scale: Vec3::ONE / self.model.scale,
        };
    }

    /// Skinning matrix: current model pose applied after the inverse bind pose.
    pub fn offset_transform(&self) -> Mat4 {
        let scale = self.model.scale * self.model_bind_inverse.scale;
        let rotation = self.model.rotation * self.model_bind_inverse.rotation;
        let translation = self.model.translation
            + rotation * (scale * self.model_bind_inverse.translation);
        Mat4::from_scale_rotation_translation(scale, rotation, translation)
    }
}

#[cfg(test)]
#[path = "bone_tests.rs"]
mod tests;
