//! Integration tests for skeletal animation and skinning
//!
//! Skeleton posing, CPU skinning, and the SkinningControl driven by a
//! RenderManager frame. No GPU required.
//!
//! Run with: cargo test --test skinning_integration_tests


use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;
use galaxy_3d_scene::galaxy3d::RenderManager;
use galaxy_3d_scene::galaxy3d::animation::{
    apply_skinning, AnimControl, Animation, Bone, BoneTrack, Skeleton, SkinningControl, SkinningMode,
    BONE_MATRICES_PARAM, NUMBER_OF_BONES_PARAM,
};
use galaxy_3d_scene::galaxy3d::render::{MatParam, Material, MaterialDef, ShaderLanguage, TechniqueDef};
use galaxy_3d_scene::galaxy3d::scene::{Mesh, SceneGraph, SpatialKey};
use galaxy_3d_scene::glam::{Mat4, Quat, Vec3};
use render_test_utils::{perspective_camera, RecordingRenderer};

fn approx_vec(a: Vec3, b: Vec3, eps: f32) -> bool {
    (a - b).length() < eps
}

// ============================================================================
// SKELETON
// ============================================================================

#[test]
fn test_integration_rotated_root_moves_child() {
    let mut skeleton = Skeleton::new(vec![
        (Bone::new("root"), None),
        (Bone::new("child").with_bind_transforms(Vec3::X, Quat::IDENTITY, Vec3::ONE), Some(0)),
    ])
    .unwrap();
    skeleton.set_binding_pose();

    let root = skeleton.bone_mut(0).unwrap();
    root.set_user_control(true);
    root.set_user_transforms(Vec3::ZERO, Quat::from_rotation_y(FRAC_PI_2), Vec3::ONE).unwrap();
    skeleton.update();

    let child = skeleton.bone(1).unwrap();
    assert!(approx_vec(child.model_transform().translation, Vec3::new(0.0, 0.0, -1.0), 1e-5));
}

/// Five-bone tree with rotations, scales and offsets at every level
fn posed_tree() -> Skeleton {
    let bone = |name: &str, t: Vec3, angle: f32, s: f32| {
        Bone::new(name).with_bind_transforms(t, Quat::from_rotation_z(angle), Vec3::splat(s))
    };
    Skeleton::new(vec![
        (bone("pelvis", Vec3::new(0.0, 1.0, 0.0), 0.0, 1.0), None),
        (bone("spine", Vec3::new(0.0, 0.5, 0.0), 0.2, 1.0), Some(0)),
        (bone("neck", Vec3::new(0.0, 0.4, 0.1), -0.3, 0.5), Some(1)),
        (bone("thigh", Vec3::new(0.2, -0.1, 0.0), 1.2, 2.0), Some(0)),
        (bone("shin", Vec3::new(0.0, -0.5, 0.0), -0.4, 1.0), Some(3)),
    ])
    .unwrap()
}

#[test]
fn test_integration_children_reflect_current_parent_pose() {
    let mut skeleton = posed_tree();
    skeleton.set_binding_pose();

    // Move every bone, then update once
    for (i, angle) in [0.3_f32, -0.5, 0.9, 0.1, -1.1].into_iter().enumerate() {
        skeleton
            .bone_mut(i)
            .unwrap()
            .set_anim_transforms(Vec3::new(0.1 * i as f32, 0.0, 0.0), Quat::from_rotation_x(angle), None);
    }
    skeleton.update();

    for bone in skeleton.bones() {
        let Some(parent) = bone.parent() else {
            continue;
        };
        let parent = skeleton.bone(parent).unwrap().model_transform();
        let local = bone.local_transform();
        let expected = parent.rotation * (local.translation * parent.scale) + parent.translation;
        assert!(
            approx_vec(bone.model_transform().translation, expected, 1e-5),
            "bone '{}' is stale",
            bone.name()
        );
    }
}

#[test]
fn test_integration_bind_pose_offsets_are_identity() {
    let mut skeleton = posed_tree();
    skeleton.set_binding_pose();

    for (i, matrix) in skeleton.compute_skinning_matrices().iter().enumerate() {
        assert!(matrix.abs_diff_eq(Mat4::IDENTITY, 1e-4), "bone {} offset {:?}", i, matrix);
    }
}

// ============================================================================
// CPU SKINNING
// ============================================================================

#[test]
fn test_integration_identity_offsets_keep_bind_positions_exactly() {
    let positions = vec![
        Vec3::new(1.0, 2.0, 3.0),
        Vec3::new(-0.5, 0.25, 8.0),
        Vec3::new(4.0, -2.0, 0.125),
    ];
    let mut mesh = Mesh::new("blob", positions.clone())
        .with_normals(vec![Vec3::Y; 3])
        .unwrap()
        .with_bone_data(
            vec![[0, 1, 2, 3], [1, 2, 0, 0], [3, 0, 0, 0]],
            vec![[0.25, 0.25, 0.25, 0.25], [0.5, 0.5, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]],
            4,
        )
        .unwrap();

    apply_skinning(mesh.skinning_buffers(), &[Mat4::IDENTITY; 4]).unwrap();

    assert_eq!(mesh.positions(), positions.as_slice());
}

// ============================================================================
// SKINNING CONTROL
// ============================================================================

fn skinned_material(with_params: bool) -> Material {
    let mut def = MaterialDef::new("Skinned")
        .with_technique(TechniqueDef::new("Default", ShaderLanguage::Glsl150))
        .unwrap();
    if with_params {
        def = def.with_param(NUMBER_OF_BONES_PARAM).with_param(BONE_MATRICES_PARAM);
    }
    Material::new(Arc::new(def))
}

/// Leg mesh in front of the camera, four vertices split between two bones
fn leg_mesh() -> Mesh {
    Mesh::new(
        "leg",
        vec![
            Vec3::new(0.0, 0.0, -10.0),
            Vec3::new(0.0, 1.0, -10.0),
            Vec3::new(0.0, 2.0, -10.0),
            Vec3::new(0.5, 1.5, -10.0),
        ],
    )
    .with_normals(vec![Vec3::Z; 4])
    .unwrap()
    .with_bone_data(
        vec![[0, 0, 0, 0], [0, 1, 0, 0], [1, 0, 0, 0], [1, 0, 0, 0]],
        vec![[1.0, 0.0, 0.0, 0.0], [0.5, 0.5, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]],
        2,
    )
    .unwrap()
}

fn leg_control() -> SkinningControl {
    let mut skeleton = Skeleton::new(vec![
        (Bone::new("hip").with_bind_transforms(Vec3::new(0.0, 0.0, -10.0), Quat::IDENTITY, Vec3::ONE), None),
        (Bone::new("knee").with_bind_transforms(Vec3::Y, Quat::IDENTITY, Vec3::ONE), Some(0)),
    ])
    .unwrap();
    skeleton.set_binding_pose();

    let kick = BoneTrack::new(
        1,
        vec![0.0, 1.0],
        vec![Vec3::ZERO; 2],
        vec![Quat::IDENTITY, Quat::from_rotation_x(1.0)],
        None,
    )
    .unwrap();
    let mut anim = AnimControl::new();
    anim.add_animation(Animation::new("kick", 1.0).with_track(Box::new(kick)));
    let channel = anim.create_channel();
    anim.set_anim(channel, "kick", 0.0).unwrap();

    SkinningControl::new(skeleton).with_anim_control(anim)
}

fn leg_scene(material: Material) -> (SceneGraph, SpatialKey, SpatialKey) {
    let mut scene = SceneGraph::new();
    let root = scene.create_node("character");
    let leg = scene.create_geometry("leg", leg_mesh(), Some(material));
    scene.attach_child(root, leg).unwrap();
    scene.add_control(root, Box::new(leg_control())).unwrap();
    scene.update_geometric_state(root);
    (scene, root, leg)
}

/// Run `frames` frames of 0.25s through a RenderManager
fn run_frames(scene: &mut SceneGraph, root: SpatialKey, rm: &mut RenderManager, frames: usize) {
    for _ in 0..frames {
        scene.update_logical_state(root, 0.25).unwrap();
        scene.update_geometric_state(root);
        rm.render(scene, 0.25, true).unwrap();
    }
}

#[test]
fn test_integration_hardware_skinning_through_frame() {
    let (renderer, log) = RecordingRenderer::new();
    let mut rm = RenderManager::new(Box::new(renderer));
    let (mut scene, root, leg) = leg_scene(skinned_material(true));
    let view = rm.create_main_view("main", perspective_camera());
    rm.view_port_mut(view).unwrap().attach_scene(root);

    run_frames(&mut scene, root, &mut rm, 2);

    let control = scene.control::<SkinningControl>(root).unwrap();
    assert_eq!(control.mode(), SkinningMode::Hardware);
    assert_eq!(log.draws(), vec!["leg", "leg"]);

    let material = scene.geometry(leg).unwrap().material().unwrap();
    assert_eq!(material.param(NUMBER_OF_BONES_PARAM), Some(&MatParam::Int(10)));
    assert!(matches!(material.param(BONE_MATRICES_PARAM), Some(MatParam::Mat4Array(m)) if m.len() == 2));
}

#[test]
fn test_integration_hardware_and_software_agree() {
    // Software path
    let (renderer, _) = RecordingRenderer::new();
    let mut rm = RenderManager::new(Box::new(renderer));
    let (mut soft_scene, soft_root, soft_leg) = leg_scene(skinned_material(false));
    let view = rm.create_main_view("main", perspective_camera());
    rm.view_port_mut(view).unwrap().attach_scene(soft_root);
    run_frames(&mut soft_scene, soft_root, &mut rm, 3);
    assert_eq!(
        soft_scene.control::<SkinningControl>(soft_root).unwrap().mode(),
        SkinningMode::Software { hardware_supported: false }
    );

    // Hardware path: apply the uploaded matrices to a bind-pose copy
    let (renderer, _) = RecordingRenderer::new();
    let mut rm = RenderManager::new(Box::new(renderer));
    let (mut hard_scene, hard_root, hard_leg) = leg_scene(skinned_material(true));
    let view = rm.create_main_view("main", perspective_camera());
    rm.view_port_mut(view).unwrap().attach_scene(hard_root);
    run_frames(&mut hard_scene, hard_root, &mut rm, 3);

    let hard_geometry = hard_scene.geometry(hard_leg).unwrap();
    let Some(MatParam::Mat4Array(matrices)) = hard_geometry.material().unwrap().param(BONE_MATRICES_PARAM) else {
        panic!("Bone matrices were not uploaded");
    };
    let mut gpu_mesh = hard_geometry.mesh().clone();
    apply_skinning(gpu_mesh.skinning_buffers(), matrices).unwrap();

    let soft_positions = soft_scene.geometry(soft_leg).unwrap().mesh().positions();
    assert_ne!(soft_positions, leg_mesh().positions(), "the knee should have moved");
    for (soft, hard) in soft_positions.iter().zip(gpu_mesh.positions()) {
        assert!(approx_vec(*soft, *hard, 1e-4), "{:?} vs {:?}", soft, hard);
    }
}

#[test]
fn test_integration_culled_character_is_not_skinned() {
    let (renderer, log) = RecordingRenderer::new();
    let mut rm = RenderManager::new(Box::new(renderer));
    let (mut scene, root, leg) = leg_scene(skinned_material(false));
    let view = rm.create_main_view("main", perspective_camera());
    rm.view_port_mut(view).unwrap().attach_scene(root);

    // Behind the camera
    let mut transform = *scene.get(root).unwrap().local_transform();
    transform.translation = Vec3::new(0.0, 0.0, 30.0);
    scene.get_mut(root).unwrap().set_local_transform(transform);

    run_frames(&mut scene, root, &mut rm, 2);

    assert!(log.draws().is_empty());
    assert_eq!(scene.control::<SkinningControl>(root).unwrap().mode(), SkinningMode::Untested);
    assert_eq!(scene.geometry(leg).unwrap().mesh().positions(), leg_mesh().positions());
}
