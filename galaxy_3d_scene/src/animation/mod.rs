//! Skeletal animation module
//!
//! Bones and skeletons, keyframed bone and spatial tracks played through
//! animation channels, CPU skinning, and the control that picks GPU or
//! CPU skinning for the meshes below a spatial.

mod bone;
mod skeleton;
mod skinning;
mod track;
mod animation;
mod anim_control;
mod skinning_control;

pub use bone::Bone;
pub use skeleton::Skeleton;
pub use skinning::{apply_skinning, apply_skinning_tangents};
pub use track::{Track, AnimContext, BoneTrack, SpatialTrack};
pub use animation::Animation;
pub use anim_control::{AnimControl, AnimChannel, AnimEventListener, LoopMode, clamp_wrap_time};
pub use skinning_control::{
    SkinningControl, SkinningMode, NUMBER_OF_BONES_PARAM, BONE_MATRICES_PARAM,
};
