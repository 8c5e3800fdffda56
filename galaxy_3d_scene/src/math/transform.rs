/// Transform - translation, rotation and non-uniform scale.
///
/// Used for spatial local/world transforms and bone transforms.

use glam::{Mat4, Quat, Vec3};

/// Scale-rotate-translate transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { translation, rotation, scale }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self { translation, ..Self::IDENTITY }
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        Self { rotation, ..Self::IDENTITY }
    }

    /// Express this (child-local) transform in the parent's space.
    ///
    /// The child translation is scaled and rotated by the parent before
    /// the parent translation is added.
    pub fn combine_with_parent(&self, parent: &Transform) -> Transform {
        Transform {
            translation: parent.rotation * (self.translation * parent.scale) + parent.translation,
            rotation: parent.rotation * self.rotation,
            scale: parent.scale * self.scale,
        }
    }

    /// Apply scale, rotation then translation to a point.
    pub fn transform_vector(&self, point: Vec3) -> Vec3 {
        self.rotation * (point * self.scale) + self.translation
    }

    /// Blend between two transforms: linear for translation and scale,
    /// normalized-linear for rotation.
    pub fn interpolate(a: &Transform, b: &Transform, t: f32) -> Transform {
        Transform {
            translation: a.translation.lerp(b.translation, t),
            rotation: a.rotation.lerp(b.rotation, t),
            scale: a.scale.lerp(b.scale, t),
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
