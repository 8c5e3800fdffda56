/// SkinningControl - deforms the animated meshes below a spatial.
///
/// The control owns the skeleton (and optionally the `AnimControl`
/// animating it). Each frame `update` poses the skeleton, and moves the
/// spatial when the animations carry spatial tracks; the first
/// `render` of the frame then deforms the meshes, either:
///
/// - on the GPU: bone matrices are handed to the materials as the
///   `BoneMatrices` parameter and `NumberOfBones` selects the shader
///   variant,
/// - on the CPU: meshes are reset to their bind pose and skinned in place.
///
/// Which path is used is decided once, the first time the control renders
/// with hardware skinning preferred, by testing the renderer.

use glam::Mat4;
use crate::animation::{apply_skinning, apply_skinning_tangents, AnimContext, AnimControl, Skeleton};
use crate::error::Result;
use crate::{engine_debug, engine_info, engine_warn};
use crate::material::MatParam;
use crate::renderer::Renderer;
use crate::scene::{Control, ControlRenderContext, ControlUpdateContext, SceneGraph, SpatialKey};

/// Material parameter selecting the skinning shader variant
pub const NUMBER_OF_BONES_PARAM: &str = "NumberOfBones";
/// Material parameter holding the bone offset matrices
pub const BONE_MATRICES_PARAM: &str = "BoneMatrices";

/// Largest skeleton the skinning shaders index (bone indices are bytes)
const MAX_HARDWARE_BONES: usize = 255;

/// Skinning path state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkinningMode {
    /// Hardware skinning never tested
    #[default]
    Untested,
    /// Hardware test in progress
    Testing,
    Hardware,
    /// CPU skinning; `hardware_supported` tells whether the hardware test passed,
    /// so switching back to hardware does not need a new test.
    Software { hardware_supported: bool },
}

pub struct SkinningControl {
    skeleton: Skeleton,
    anim: Option<AnimControl>,
    mode: SkinningMode,
    hardware_preferred: bool,
    /// Meshes are deformed at most once per frame, whatever the viewport count
    was_mesh_updated: bool,
    /// Animated geometries found below the spatial on the last render
    targets: Vec<SpatialKey>,
    /// Targets whose material carries the skinning shader variant and whose
    /// shader was preloaded
    hardware_ready: Vec<SpatialKey>,
}

impl SkinningControl {
    pub fn new(skeleton: Skeleton) -> Self {
        Self {
            skeleton,
            anim: None,
            mode: SkinningMode::Untested,
            hardware_preferred: true,
            was_mesh_updated: false,
            targets: Vec::new(),
            hardware_ready: Vec::new(),
        }
    }

    pub fn with_anim_control(mut self, anim: AnimControl) -> Self {
        self.anim = Some(anim);
        self
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn skeleton_mut(&mut self) -> &mut Skeleton {
        &mut self.skeleton
    }

    pub fn anim_control(&self) -> Option<&AnimControl> {
        self.anim.as_ref()
    }

    pub fn anim_control_mut(&mut self) -> Option<&mut AnimControl> {
        self.anim.as_mut()
    }

    pub fn mode(&self) -> SkinningMode {
        self.mode
    }

    pub fn is_hardware_skinning_used(&self) -> bool {
        self.mode == SkinningMode::Hardware
    }

    pub fn is_hardware_skinning_preferred(&self) -> bool {
        self.hardware_preferred
    }

    /// Takes effect on the next render
    pub fn set_hardware_skinning_preferred(&mut self, preferred: bool) {
        self.hardware_preferred = preferred;
    }

    pub fn targets(&self) -> &[SpatialKey] {
        &self.targets
    }

    // ===== MODE SWITCHING =====

    fn find_targets(&mut self, scene: &SceneGraph, root: SpatialKey) {
        self.targets = scene
            .collect_geometries(root)
            .into_iter()
            .filter(|&k| scene.geometry(k).is_some_and(|g| g.mesh().is_animated()))
            .collect();
        let targets = &self.targets;
        self.hardware_ready.retain(|k| targets.contains(k));
    }

    /// Skeleton and renderer limits; the targets are checked separately.
    fn hardware_capable(&self, renderer: &dyn Renderer) -> bool {
        if self.skeleton.bone_count() > MAX_HARDWARE_BONES {
            engine_warn!("galaxy3d::SkinningControl",
                "Not using hardware skinning: {} bones exceed the limit of {}",
                self.skeleton.bone_count(), MAX_HARDWARE_BONES);
            return false;
        }
        if !renderer.caps().supports_shaders() {
            engine_warn!("galaxy3d::SkinningControl",
                "Not using hardware skinning: the renderer has no shader support");
            return false;
        }
        true
    }

    fn has_pending_targets(&self) -> bool {
        self.targets.iter().any(|k| !self.hardware_ready.contains(k))
    }

    /// Set up the targets not yet prepared for the GPU path and preload
    /// their shaders.
    ///
    /// Returns false when one of them cannot be skinned on the GPU.
    fn prepare_pending_targets(&mut self, scene: &mut SceneGraph, renderer: &mut dyn Renderer) -> Result<bool> {
        let pending: Vec<SpatialKey> = self
            .targets
            .iter()
            .copied()
            .filter(|k| !self.hardware_ready.contains(k))
            .collect();
        if pending.is_empty() {
            return Ok(true);
        }

        for &key in &pending {
            let Some(geometry) = scene.geometry(key) else {
                continue;
            };
            let Some(material) = geometry.material() else {
                engine_warn!("galaxy3d::SkinningControl",
                    "Not using hardware skinning: geometry '{}' has no material", geometry.mesh().name());
                return Ok(false);
            };
            let def = material.def();
            if !def.has_param(NUMBER_OF_BONES_PARAM) || !def.has_param(BONE_MATRICES_PARAM) {
                engine_warn!("galaxy3d::SkinningControl",
                    "Not using hardware skinning: material '{}' doesn't support it", def.name());
                return Ok(false);
            }
        }

        self.switch_to_hardware(scene, &pending)?;

        for &key in &pending {
            let Some(geometry) = scene.geometry(key) else {
                continue;
            };
            let Some(material) = geometry.material() else {
                continue;
            };
            if let Err(err) = renderer.preload(material, geometry.mesh()) {
                engine_warn!("galaxy3d::SkinningControl",
                    "Could not enable hardware skinning due to shader compile error: {}", err);
                return Ok(false);
            }
        }
        self.hardware_ready.extend(pending);
        Ok(true)
    }

    /// Move every target to the GPU path, or settle on software skinning
    /// when one of them can't follow.
    ///
    /// `restore_ready` re-applies the shader variant to targets prepared
    /// earlier, after a stretch of software skinning cleared it.
    fn engage_hardware(
        &mut self,
        scene: &mut SceneGraph,
        renderer: &mut dyn Renderer,
        restore_ready: bool,
    ) -> Result<()> {
        let restored = if restore_ready {
            let ready = self.hardware_ready.clone();
            self.switch_to_hardware(scene, &ready)
        } else {
            Ok(())
        };
        let prepared = match restored {
            Ok(()) => self.prepare_pending_targets(scene, renderer),
            Err(err) => Err(err),
        };

        match prepared {
            Ok(true) => {
                self.mode = SkinningMode::Hardware;
                Ok(())
            }
            Ok(false) => {
                self.switch_to_software(scene);
                self.mode = SkinningMode::Software { hardware_supported: false };
                Ok(())
            }
            Err(err) => {
                self.switch_to_software(scene);
                self.mode = SkinningMode::Software { hardware_supported: false };
                Err(err)
            }
        }
    }

    fn switch_to_hardware(&self, scene: &mut SceneGraph, keys: &[SpatialKey]) -> Result<()> {
        // Round up so small skeleton changes reuse the same shader variant
        let num_bones = ((self.skeleton.bone_count() / 10) + 1) * 10;
        for &key in keys {
            let Some(geometry) = scene.geometry_mut(key) else {
                continue;
            };
            if let Some(material) = geometry.material_mut() {
                material.set_param(NUMBER_OF_BONES_PARAM, MatParam::Int(num_bones as i32))?;
            }
            geometry.mesh_mut().prepare_for_anim(false);
        }
        Ok(())
    }

    fn switch_to_software(&self, scene: &mut SceneGraph) {
        for &key in &self.targets {
            let Some(geometry) = scene.geometry_mut(key) else {
                continue;
            };
            if let Some(material) = geometry.material_mut() {
                material.clear_param(NUMBER_OF_BONES_PARAM);
                material.clear_param(BONE_MATRICES_PARAM);
            }
            geometry.mesh_mut().prepare_for_anim(true);
        }
    }

    // ===== SKINNING =====

    fn render_hardware(&mut self, scene: &mut SceneGraph) -> Result<()> {
        let matrices: Vec<Mat4> = self.skeleton.compute_skinning_matrices().to_vec();
        for &key in &self.targets {
            if let Some(material) = scene.geometry_mut(key).and_then(|g| g.material_mut()) {
                material.set_param(BONE_MATRICES_PARAM, MatParam::Mat4Array(matrices.clone()))?;
            }
        }
        Ok(())
    }

    fn render_software(&mut self, scene: &mut SceneGraph) -> Result<()> {
        let offsets = self.skeleton.compute_skinning_matrices();
        for &key in &self.targets {
            let Some(geometry) = scene.geometry_mut(key) else {
                continue;
            };
            let mesh = geometry.mesh_mut();
            mesh.prepare_for_anim(true);
            mesh.reset_to_bind();
            if mesh.has_tangents() {
                apply_skinning_tangents(mesh.skinning_buffers(), offsets)?;
            } else {
                apply_skinning(mesh.skinning_buffers(), offsets)?;
            }
        }
        Ok(())
    }
}

impl Control for SkinningControl {
    fn update(&mut self, ctx: &mut ControlUpdateContext<'_>) -> Result<()> {
        self.was_mesh_updated = false;
        match &mut self.anim {
            Some(anim) => {
                let mut anim_ctx = AnimContext::new(&mut self.skeleton).with_spatial(ctx.local_transform);
                anim.update(ctx.tpf, &mut anim_ctx);
            }
            None => self.skeleton.update(),
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut ControlRenderContext<'_>) -> Result<()> {
        if self.was_mesh_updated {
            return Ok(());
        }
        self.find_targets(ctx.scene, ctx.spatial);

        match self.mode {
            SkinningMode::Untested if self.hardware_preferred => {
                self.mode = SkinningMode::Testing;
                if self.hardware_capable(ctx.renderer) {
                    self.engage_hardware(ctx.scene, ctx.renderer, false)?;
                } else {
                    self.switch_to_software(ctx.scene);
                    self.mode = SkinningMode::Software { hardware_supported: false };
                }
                if self.mode == SkinningMode::Hardware {
                    engine_info!("galaxy3d::SkinningControl",
                        "Hardware skinning engaged for {} mesh(es)", self.targets.len());
                }
            }
            SkinningMode::Software { hardware_supported: true } if self.hardware_preferred => {
                self.engage_hardware(ctx.scene, ctx.renderer, true)?;
                if self.mode == SkinningMode::Hardware {
                    engine_debug!("galaxy3d::SkinningControl", "Switched back to hardware skinning");
                }
            }
            SkinningMode::Hardware if !self.hardware_preferred => {
                self.switch_to_software(ctx.scene);
                self.mode = SkinningMode::Software { hardware_supported: true };
                engine_debug!("galaxy3d::SkinningControl", "Switched to software skinning");
            }
            // Geometries attached below the spatial since the last frame
            SkinningMode::Hardware if self.has_pending_targets() => {
                self.engage_hardware(ctx.scene, ctx.renderer, false)?;
            }
            _ => {}
        }

        if self.mode == SkinningMode::Hardware {
            self.render_hardware(ctx.scene)?;
        } else {
            self.render_software(ctx.scene)?;
        }
        self.was_mesh_updated = true;
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[cfg(test)]
#[path = "skinning_control_tests.rs"]
mod tests;
