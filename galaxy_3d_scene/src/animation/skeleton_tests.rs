use glam::{Mat4, Quat, Vec3};
use crate::error::Error;
use super::*;

fn approx_vec(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-5
}

/// root -> spine -> head, root -> leg, each one unit above its parent
fn build_chain() -> Skeleton {
    let up = |name: &str| Bone::new(name).with_bind_transforms(Vec3::Y, Quat::IDENTITY, Vec3::ONE);
    Skeleton::new(vec![
        (Bone::new("root"), None),
        (up("spine"), Some(0)),
        (up("head"), Some(1)),
        (up("leg"), Some(0)),
    ])
    .unwrap()
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_new_links_parents_and_children() {
    let skeleton = build_chain();

    assert_eq!(skeleton.bone_count(), 4);
    assert_eq!(skeleton.roots(), &[0]);
    assert_eq!(skeleton.bone(0).unwrap().children(), &[1, 3]);
    assert_eq!(skeleton.bone(2).unwrap().parent(), Some(1));
    assert_eq!(skeleton.bone_index("leg"), Some(3));
    assert_eq!(skeleton.bone_by_name("head").unwrap().name(), "head");
    assert!(skeleton.bone_by_name("tail").is_none());
}

#[test]
fn test_new_computes_model_poses() {
    let skeleton = build_chain();
    let head = skeleton.bone_by_name("head").unwrap();
    assert!(approx_vec(head.model_transform().translation, Vec3::new(0.0, 2.0, 0.0)));
}

#[test]
fn test_new_supports_several_roots() {
    let skeleton = Skeleton::new(vec![
        (Bone::new("a"), None),
        (Bone::new("b"), None),
        (Bone::new("c"), Some(1)),
    ])
    .unwrap();
    assert_eq!(skeleton.roots(), &[0, 1]);
}

#[test]
fn test_new_empty_skeleton() {
    let mut skeleton = Skeleton::new(Vec::new()).unwrap();
    assert_eq!(skeleton.bone_count(), 0);
    assert!(skeleton.compute_skinning_matrices().is_empty());
}

#[test]
fn test_new_rejects_parent_out_of_range() {
    let result = Skeleton::new(vec![(Bone::new("a"), Some(5))]);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_new_rejects_self_parent() {
    let result = Skeleton::new(vec![(Bone::new("a"), Some(0))]);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_new_rejects_cycle() {
    let result = Skeleton::new(vec![
        (Bone::new("root"), None),
        (Bone::new("a"), Some(2)),
        (Bone::new("b"), Some(1)),
    ]);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_new_rejects_duplicate_names() {
    let result = Skeleton::new(vec![
        (Bone::new("bone"), None),
        (Bone::new("bone"), Some(0)),
    ]);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

// ============================================================================
// Pose update
// ============================================================================

#[test]
fn test_update_parents_before_children() {
    let mut skeleton = build_chain();
    skeleton.set_binding_pose();

    skeleton.bone_mut(0).unwrap().set_anim_transforms(Vec3::new(5.0, 0.0, 0.0), Quat::IDENTITY, None);
    skeleton.update();

    // The head sees the moved root in the same update
    let head = skeleton.bone_by_name("head").unwrap();
    assert!(approx_vec(head.model_transform().translation, Vec3::new(5.0, 2.0, 0.0)));
}

#[test]
fn test_update_propagates_rotation() {
    let mut skeleton = build_chain();
    skeleton.set_binding_pose();

    let quarter = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
    skeleton.bone_by_name_mut("root").unwrap().set_anim_transforms(Vec3::ZERO, quarter, None);
    skeleton.update();

    // +Y rotated a quarter turn about Z points to -X
    let head = skeleton.bone_by_name("head").unwrap();
    assert!(approx_vec(head.model_transform().translation, Vec3::new(-2.0, 0.0, 0.0)));
}

#[test]
fn test_reset_and_update_restores_bind_pose() {
    let mut skeleton = build_chain();
    skeleton.set_binding_pose();

    skeleton.bone_mut(1).unwrap().set_anim_transforms(Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY, None);
    skeleton.update();
    skeleton.reset_and_update();

    let head = skeleton.bone_by_name("head").unwrap();
    assert!(approx_vec(head.model_transform().translation, Vec3::new(0.0, 2.0, 0.0)));
}

#[test]
fn test_reset_keeps_user_controlled_bones() {
    let mut skeleton = build_chain();
    let spine = skeleton.bone_by_name_mut("spine").unwrap();
    spine.set_user_control(true);
    spine.set_user_transforms(Vec3::X, Quat::IDENTITY, Vec3::ONE).unwrap();

    skeleton.reset_and_update();

    let spine = skeleton.bone_by_name("spine").unwrap();
    assert!(approx_vec(spine.local_transform().translation, Vec3::new(1.0, 1.0, 0.0)));
}

// ============================================================================
// Skinning matrices
// ============================================================================

#[test]
fn test_skinning_matrices_identity_at_bind_pose() {
    let mut skeleton = build_chain();
    skeleton.set_binding_pose();

    let matrices = skeleton.compute_skinning_matrices();
    assert_eq!(matrices.len(), 4);
    for matrix in matrices {
        assert!(matrix.abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }
}

#[test]
fn test_skinning_matrices_follow_bone_index_order() {
    let mut skeleton = build_chain();
    skeleton.set_binding_pose();

    skeleton.bone_mut(3).unwrap().set_anim_transforms(Vec3::new(0.0, 0.0, 2.0), Quat::IDENTITY, None);
    skeleton.update();

    let matrices = skeleton.compute_skinning_matrices();
    assert!(matrices[0].abs_diff_eq(Mat4::IDENTITY, 1e-5));
    assert!(matrices[2].abs_diff_eq(Mat4::IDENTITY, 1e-5));
    let moved = matrices[3].transform_point3(Vec3::ZERO);
    assert!(approx_vec(moved, Vec3::new(0.0, 0.0, 2.0)));
}

#[test]
fn test_child_offset_includes_parent_motion() {
    let mut skeleton = build_chain();
    skeleton.set_binding_pose();

    skeleton.bone_mut(0).unwrap().set_anim_transforms(Vec3::new(3.0, 0.0, 0.0), Quat::IDENTITY, None);
    skeleton.update();

    let matrices = skeleton.compute_skinning_matrices();
    // A vertex bound to the head moves with the root
    let vertex = matrices[2].transform_point3(Vec3::new(0.0, 2.0, 0.0));
    assert!(approx_vec(vertex, Vec3::new(3.0, 2.0, 0.0)));
}
