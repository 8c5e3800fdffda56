/// Animation tracks - keyframed data applied at a time.
///
/// Bone tracks pose one bone of the skeleton; spatial tracks move the
/// animated spatial itself.

use glam::{Quat, Vec3};
use crate::animation::Skeleton;
use crate::engine_bail;
use crate::error::Result;
use crate::math::Transform;

/// What the tracks of a playing animation write to.
pub struct AnimContext<'a> {
    pub skeleton: &'a mut Skeleton,
    /// Local transform of the animated spatial; spatial tracks are
    /// skipped without one
    pub spatial: Option<&'a mut Transform>,
}

impl<'a> AnimContext<'a> {
    pub fn new(skeleton: &'a mut Skeleton) -> Self {
        Self { skeleton, spatial: None }
    }

    pub fn with_spatial(mut self, transform: &'a mut Transform) -> Self {
        self.spatial = Some(transform);
        self
    }
}

/// Something an animation drives over time.
pub trait Track: Send + Sync {
    /// Apply the track's state at `time`, blended in with `weight`
    fn set_time(&self, time: f32, weight: f32, ctx: &mut AnimContext<'_>);

    /// Time of the last keyframe
    fn length(&self) -> f32;
}

// ============================================================================
// Keyframes
// ============================================================================

/// Translation/rotation/scale keyframes on one timeline
#[derive(Debug, Clone)]
struct TransformKeys {
    times: Vec<f32>,
    translations: Vec<Vec3>,
    rotations: Vec<Quat>,
    scales: Option<Vec<Vec3>>,
}

impl TransformKeys {
    fn new(
        owner: &str,
        times: Vec<f32>,
        translations: Vec<Vec3>,
        rotations: Vec<Quat>,
        scales: Option<Vec<Vec3>>,
    ) -> Result<Self> {
        if times.is_empty() {
            engine_bail!("galaxy3d::Track", InvalidResource =>
                "Track for {} has no keyframes", owner);
        }
        let count = times.len();
        if translations.len() != count
            || rotations.len() != count
            || scales.as_ref().is_some_and(|s| s.len() != count)
        {
            engine_bail!("galaxy3d::Track", InvalidResource =>
                "Track for {}: keyframe arrays differ in length", owner);
        }
        if times.windows(2).any(|w| w[1] < w[0]) {
            engine_bail!("galaxy3d::Track", InvalidResource =>
                "Track for {}: keyframe times must not decrease", owner);
        }
        Ok(Self { times, translations, rotations, scales })
    }

    fn sample(&self, time: f32) -> (Vec3, Quat, Option<Vec3>) {
        let last = self.times.len() - 1;
        if time < 0.0 || last == 0 || time <= self.times[0] {
            return self.keyframe(0);
        }
        if time >= self.times[last] {
            return self.keyframe(last);
        }

        let end = self.times.partition_point(|&t| t < time).max(1);
        let start = end - 1;
        let span = self.times[end] - self.times[start];
        let blend = if span > 0.0 { (time - self.times[start]) / span } else { 0.0 };

        let translation = self.translations[start].lerp(self.translations[end], blend);
        let rotation = self.rotations[start].lerp(self.rotations[end], blend);
        let scale = self.scales.as_ref().map(|s| s[start].lerp(s[end], blend));
        (translation, rotation, scale)
    }

    fn keyframe(&self, index: usize) -> (Vec3, Quat, Option<Vec3>) {
        (
            self.translations[index],
            self.rotations[index],
            self.scales.as_ref().map(|s| s[index]),
        )
    }

    fn length(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }
}

// ============================================================================
// BoneTrack
// ============================================================================

/// Keyframed offsets from one bone's bind pose.
#[derive(Debug, Clone)]
pub struct BoneTrack {
    bone: usize,
    keys: TransformKeys,
}

impl BoneTrack {
    /// Fails on empty or mismatched keyframe arrays and on decreasing times.
    pub fn new(
        bone: usize,
        times: Vec<f32>,
        translations: Vec<Vec3>,
        rotations: Vec<Quat>,
        scales: Option<Vec<Vec3>>,
    ) -> Result<Self> {
        let keys = TransformKeys::new(&format!("bone {}", bone), times, translations, rotations, scales)?;
        Ok(Self { bone, keys })
    }

    pub fn bone_index(&self) -> usize {
        self.bone
    }

    pub fn times(&self) -> &[f32] {
        &self.keys.times
    }

    /// Interpolated (translation, rotation, scale) at `time`.
    ///
    /// Clamped to the first and last keyframes.
    pub fn sample(&self, time: f32) -> (Vec3, Quat, Option<Vec3>) {
        self.keys.sample(time)
    }
}

impl Track for BoneTrack {
    fn set_time(&self, time: f32, weight: f32, ctx: &mut AnimContext<'_>) {
        let (translation, rotation, scale) = self.keys.sample(time);
        if let Some(bone) = ctx.skeleton.bone_mut(self.bone) {
            bone.blend_anim_transforms(translation, rotation, scale, weight);
        }
    }

    fn length(&self) -> f32 {
        self.keys.length()
    }
}

// ============================================================================
// SpatialTrack
// ============================================================================

/// Keyframed local transform of the animated spatial.
///
/// Keyframes are absolute, not offsets: at full weight the spatial takes
/// the sampled transform. Without scale keys the spatial keeps its scale.
#[derive(Debug, Clone)]
pub struct SpatialTrack {
    keys: TransformKeys,
}

impl SpatialTrack {
    /// Fails on empty or mismatched keyframe arrays and on decreasing times.
    pub fn new(
        times: Vec<f32>,
        translations: Vec<Vec3>,
        rotations: Vec<Quat>,
        scales: Option<Vec<Vec3>>,
    ) -> Result<Self> {
        let keys = TransformKeys::new("spatial", times, translations, rotations, scales)?;
        Ok(Self { keys })
    }

    pub fn times(&self) -> &[f32] {
        &self.keys.times
    }

    /// Transform of `current` at `time`, before any blending
    pub fn sample(&self, time: f32, current: &Transform) -> Transform {
        let (translation, rotation, scale) = self.keys.sample(time);
        Transform::new(translation, rotation, scale.unwrap_or(current.scale))
    }
}

impl Track for SpatialTrack {
    fn set_time(&self, time: f32, weight: f32, ctx: &mut AnimContext<'_>) {
        let Some(transform) = ctx.spatial.as_deref_mut() else {
            return;
        };
        let sampled = self.sample(time, transform);
        *transform = if weight >= 1.0 {
            sampled
        } else {
            Transform::interpolate(transform, &sampled, weight.max(0.0))
        };
    }

    fn length(&self) -> f32 {
        self.keys.length()
    }
}

#[cfg(test)]
#[path = "track_tests.rs"]
mod tests;
