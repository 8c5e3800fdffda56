use glam::{Quat, Vec3};
use super::*;

const EPS: f32 = 1e-5;

// ============================================================================
// Transform::combine_with_parent
// ============================================================================

#[test]
fn test_combine_identity_parent_is_noop() {
    let child = Transform::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_z(0.3), Vec3::splat(2.0));
    let combined = child.combine_with_parent(&Transform::IDENTITY);
    assert!(combined.translation.abs_diff_eq(child.translation, EPS));
    assert!(combined.rotation.abs_diff_eq(child.rotation, EPS));
    assert!(combined.scale.abs_diff_eq(child.scale, EPS));
}

#[test]
fn test_combine_rotates_and_scales_child_translation() {
    let parent = Transform::new(
        Vec3::new(10.0, 0.0, 0.0),
        Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        Vec3::splat(2.0),
    );
    let child = Transform::from_translation(Vec3::X);

    let combined = child.combine_with_parent(&parent);

    // (1,0,0) scaled by 2 then rotated 90° about Y → (0,0,-2), plus parent translation
    assert!(combined.translation.abs_diff_eq(Vec3::new(10.0, 0.0, -2.0), EPS));
    assert!(combined.scale.abs_diff_eq(Vec3::splat(2.0), EPS));
}

#[test]
fn test_combine_matches_matrix_product() {
    let parent = Transform::new(Vec3::new(1.0, -2.0, 0.5), Quat::from_rotation_x(0.7), Vec3::splat(1.5));
    let child = Transform::new(Vec3::new(0.2, 0.4, -1.0), Quat::from_rotation_z(-0.4), Vec3::splat(0.5));

    let combined = child.combine_with_parent(&parent).to_matrix();
    let product = parent.to_matrix() * child.to_matrix();

    assert!(combined.abs_diff_eq(product, 1e-4));
}

// ============================================================================
// Transform::transform_vector / interpolate
// ============================================================================

#[test]
fn test_transform_vector_matches_matrix() {
    let t = Transform::new(Vec3::new(3.0, 0.0, 1.0), Quat::from_rotation_y(1.1), Vec3::new(1.0, 2.0, 3.0));
    let p = Vec3::new(0.5, -1.0, 2.0);
    assert!(t.transform_vector(p).abs_diff_eq(t.to_matrix().transform_point3(p), 1e-4));
}

#[test]
fn test_interpolate_endpoints_and_midpoint() {
    let a = Transform::IDENTITY;
    let b = Transform::new(Vec3::new(2.0, 0.0, 0.0), Quat::from_rotation_y(1.0), Vec3::splat(3.0));

    let start = Transform::interpolate(&a, &b, 0.0);
    let end = Transform::interpolate(&a, &b, 1.0);
    let mid = Transform::interpolate(&a, &b, 0.5);

    assert!(start.translation.abs_diff_eq(a.translation, EPS));
    assert!(end.rotation.abs_diff_eq(b.rotation, EPS));
    assert!(mid.translation.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), EPS));
    assert!(mid.scale.abs_diff_eq(Vec3::splat(2.0), EPS));
    assert!((mid.rotation.length() - 1.0).abs() < EPS);
}
