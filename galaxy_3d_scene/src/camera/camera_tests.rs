use glam::{Mat4, Quat, Vec2, Vec3};
use crate::math::{BoundingBox, BoundingSphere, BoundingVolume};
use super::*;
use super::super::frustum::{Frustum, FrustumIntersect, PlaneState, PLANE_NEAR, PLANE_FAR, PLANE_LEFT};

const EPS: f32 = 1e-4;

/// Camera at the origin looking down -Z with a 90° field of view
fn create_test_camera() -> Camera {
    let mut camera = Camera::new(800, 600);
    camera.set_frustum_perspective(90.0, 1.0, 1.0, 100.0);
    camera.look_at_direction(-Vec3::Z, Vec3::Y);
    camera
}

fn sphere(center: Vec3, radius: f32) -> BoundingVolume {
    BoundingSphere::new(center, radius).into()
}

fn assert_planes_match(a: &Frustum, b: &Frustum) {
    for (i, (pa, pb)) in a.planes.iter().zip(b.planes.iter()).enumerate() {
        let na = pa.normal.normalize();
        let ca = pa.constant / pa.normal.length();
        assert!(na.abs_diff_eq(pb.normal, EPS), "plane {} normal {:?} vs {:?}", i, na, pb.normal);
        assert!((ca - pb.constant).abs() < 1e-3, "plane {} constant {} vs {}", i, ca, pb.constant);
    }
}

// ============================================================================
// Construction & frustum setup
// ============================================================================

#[test]
fn test_camera_defaults() {
    let camera = Camera::new(640, 480);

    assert_eq!(camera.width(), 640);
    assert_eq!(camera.height(), 480);
    assert_eq!(camera.frustum_near(), 1.0);
    assert_eq!(camera.frustum_far(), 2.0);
    assert_eq!(camera.frustum_left(), -0.5);
    assert_eq!(camera.frustum_top(), 0.5);
    assert_eq!(camera.view_port_right(), 1.0);
    assert!(camera.direction().abs_diff_eq(Vec3::Z, EPS));
    assert!(camera.is_viewport_changed());
}

#[test]
fn test_set_frustum_perspective_extents() {
    let mut camera = Camera::new(800, 600);
    camera.set_frustum_perspective(90.0, 2.0, 1.0, 50.0);

    assert!((camera.frustum_top() - 1.0).abs() < EPS);
    assert!((camera.frustum_bottom() + 1.0).abs() < EPS);
    assert!((camera.frustum_right() - 2.0).abs() < EPS);
    assert!((camera.frustum_left() + 2.0).abs() < EPS);
    assert_eq!(camera.frustum_far(), 50.0);
    assert!(!camera.is_parallel_projection());
}

#[test]
fn test_set_frustum_perspective_rejects_non_finite_aspect() {
    let mut camera = create_test_camera();
    let before = *camera.projection_matrix();

    camera.set_frustum_perspective(60.0, f32::NAN, 0.5, 10.0);
    camera.set_frustum_perspective(60.0, f32::INFINITY, 0.5, 10.0);

    assert_eq!(camera.frustum_near(), 1.0);
    assert_eq!(camera.frustum_far(), 100.0);
    assert_eq!(*camera.projection_matrix(), before);
}

#[test]
fn test_look_at_direction_axes() {
    let camera = create_test_camera();

    assert!(camera.direction().abs_diff_eq(-Vec3::Z, EPS));
    assert!(camera.up().abs_diff_eq(Vec3::Y, EPS));
    assert!(camera.left().abs_diff_eq(-Vec3::X, EPS));
}

#[test]
fn test_projection_matches_glam_perspective() {
    let camera = create_test_camera();
    let expected = Mat4::perspective_rh_gl(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 100.0);
    assert!(camera.projection_matrix().abs_diff_eq(expected, EPS));
}

#[test]
fn test_view_matrix_follows_location() {
    let mut camera = create_test_camera();
    camera.set_location(Vec3::new(1.0, 2.0, 3.0));

    let eye = camera.view_matrix().transform_point3(Vec3::new(1.0, 2.0, 3.0));
    assert!(eye.abs_diff_eq(Vec3::ZERO, EPS));

    let ahead = camera.view_matrix().transform_point3(Vec3::new(1.0, 2.0, -7.0));
    assert!(ahead.abs_diff_eq(Vec3::new(0.0, 0.0, -10.0), EPS));
}

// ============================================================================
// World planes
// ============================================================================

#[test]
fn test_world_planes_match_view_projection_extraction() {
    let mut camera = Camera::new(800, 600);
    camera.set_frustum(0.5, 40.0, -0.3, 0.7, 0.4, -0.2);
    camera.set_frame(Vec3::new(3.0, -1.0, 2.0), Quat::from_rotation_y(0.8) * Quat::from_rotation_x(-0.3));

    let extracted = Frustum::from_view_projection(camera.view_projection_matrix());
    assert_planes_match(camera.frustum(), &extracted);
}

#[test]
fn test_parallel_world_planes_match_view_projection_extraction() {
    let mut camera = Camera::new(800, 600);
    camera.set_frustum(1.0, 20.0, -4.0, 2.0, 3.0, -1.0);
    camera.set_parallel_projection(true);
    camera.set_frame(Vec3::new(0.0, 5.0, 0.0), Quat::from_rotation_z(0.4));

    let extracted = Frustum::from_view_projection(camera.view_projection_matrix());
    assert_planes_match(camera.frustum(), &extracted);
}

#[test]
fn test_near_and_far_planes() {
    let camera = create_test_camera();

    let near = camera.world_plane(PLANE_NEAR);
    assert!(near.normal.abs_diff_eq(-Vec3::Z, EPS));
    assert!((near.constant - 1.0).abs() < EPS);

    let far = camera.world_plane(PLANE_FAR);
    assert!(far.normal.abs_diff_eq(Vec3::Z, EPS));
    assert!((far.constant + 100.0).abs() < EPS);
}

// ============================================================================
// contains
// ============================================================================

#[test]
fn test_contains_sphere_in_front_and_behind() {
    let camera = create_test_camera();

    let mut front = sphere(Vec3::new(0.0, 0.0, -10.0), 1.0);
    let mut state = PlaneState::empty();
    assert_eq!(camera.contains(Some(&mut front), &mut state), FrustumIntersect::Inside);
    assert_eq!(state, PlaneState::all());

    let mut behind = sphere(Vec3::new(0.0, 0.0, 10.0), 1.0);
    let mut state = PlaneState::empty();
    assert_eq!(camera.contains(Some(&mut behind), &mut state), FrustumIntersect::Outside);
}

#[test]
fn test_contains_without_bound_is_inside() {
    let camera = create_test_camera();
    let mut state = PlaneState::empty();
    assert_eq!(camera.contains(None, &mut state), FrustumIntersect::Inside);
    assert!(state.is_empty());
}

#[test]
fn test_contains_straddling_volume_intersects() {
    let camera = create_test_camera();

    // Crosses the near plane at z = -1
    let mut volume = sphere(Vec3::new(0.0, 0.0, -1.0), 0.5);
    let mut state = PlaneState::empty();
    assert_eq!(camera.contains(Some(&mut volume), &mut state), FrustumIntersect::Intersects);
    assert!(!state.contains(PlaneState::NEAR));
    assert!(state.contains(PlaneState::FAR));
}

#[test]
fn test_contains_records_rejecting_plane() {
    let camera = create_test_camera();

    // Far to the left of the view (-X), in front of the near plane
    let mut volume = sphere(Vec3::new(-50.0, 0.0, -10.0), 1.0);
    let mut state = PlaneState::empty();

    assert_eq!(camera.contains(Some(&mut volume), &mut state), FrustumIntersect::Outside);
    assert_eq!(volume.check_plane(), PLANE_LEFT);

    // Rejected again, by the cached plane
    let mut state = PlaneState::empty();
    assert_eq!(camera.contains(Some(&mut volume), &mut state), FrustumIntersect::Outside);
    assert_eq!(volume.check_plane(), PLANE_LEFT);
}

#[test]
fn test_contains_skips_planes_set_in_state() {
    let camera = create_test_camera();

    // Behind the camera, but the caller claims every plane already passed
    let mut volume = sphere(Vec3::new(0.0, 0.0, 10.0), 1.0);
    let mut state = PlaneState::all();
    assert_eq!(camera.contains(Some(&mut volume), &mut state), FrustumIntersect::Inside);
}

#[test]
fn test_plane_state_coherence_matches_full_test() {
    let camera = create_test_camera();

    // Entirely past the near plane and before the far plane, straddling the sides
    let mut parent = sphere(Vec3::new(0.0, 0.0, -20.0), 18.0);
    let mut parent_state = PlaneState::empty();
    assert_eq!(camera.contains(Some(&mut parent), &mut parent_state), FrustumIntersect::Intersects);
    assert_eq!(parent_state, PlaneState::NEAR | PlaneState::FAR);

    // Every child lies inside the parent volume
    let children = [
        BoundingVolume::from(BoundingSphere::new(Vec3::new(0.0, 0.0, -20.0), 1.0)),
        BoundingVolume::from(BoundingSphere::new(Vec3::new(3.0, 2.0, -18.0), 1.5)),
        BoundingVolume::from(BoundingBox::new(Vec3::new(-2.0, 0.0, -22.0), Vec3::splat(1.0))),
        BoundingVolume::from(BoundingSphere::new(Vec3::new(15.0, 0.0, -15.0), 1.0)),
        BoundingVolume::from(BoundingSphere::new(Vec3::new(14.0, 0.0, -11.0), 0.5)),
    ];
    let expected = [
        FrustumIntersect::Inside,
        FrustumIntersect::Inside,
        FrustumIntersect::Inside,
        FrustumIntersect::Intersects,
        FrustumIntersect::Outside,
    ];

    for (child, expected) in children.into_iter().zip(expected) {
        let mut cached_child = child;
        let mut state = parent_state;
        let cached = camera.contains(Some(&mut cached_child), &mut state);
        assert_eq!(cached, camera.frustum().classify(&child));
        assert_eq!(cached, expected);
    }
}

#[test]
fn test_contains_box() {
    let camera = create_test_camera();

    let mut inside = BoundingVolume::from(BoundingBox::new(Vec3::new(0.0, 0.0, -10.0), Vec3::ONE));
    let mut outside = BoundingVolume::from(BoundingBox::new(Vec3::new(0.0, 0.0, -200.0), Vec3::ONE));

    assert_eq!(camera.contains(Some(&mut inside), &mut PlaneState::empty()), FrustumIntersect::Inside);
    assert_eq!(camera.contains(Some(&mut outside), &mut PlaneState::empty()), FrustumIntersect::Outside);
    assert_eq!(outside.check_plane(), PLANE_FAR);
}

#[test]
fn test_distance_to_near_plane() {
    let camera = create_test_camera();
    assert!((camera.distance_to_near_plane(Vec3::new(0.0, 0.0, -10.0)) - 9.0).abs() < EPS);
    assert!(camera.distance_to_near_plane(Vec3::new(0.0, 0.0, 5.0)) < 0.0);
}

// ============================================================================
// Viewport & Gui
// ============================================================================

#[test]
fn test_resize_fixes_aspect() {
    let mut camera = create_test_camera();
    camera.clear_viewport_changed();

    camera.resize(1200, 600, true);

    assert!(camera.is_viewport_changed());
    assert!((camera.frustum_right() - 2.0).abs() < EPS);
    assert!((camera.frustum_left() + 2.0).abs() < EPS);
}

#[test]
fn test_resize_without_fix_keeps_extents() {
    let mut camera = create_test_camera();
    camera.resize(1200, 600, false);
    assert!((camera.frustum_right() - 1.0).abs() < EPS);
}

#[test]
fn test_contains_gui() {
    let mut camera = Camera::new(800, 600);
    camera.set_view_port(0.0, 0.5, 0.0, 1.0);

    let on_screen = BoundingVolume::from(BoundingBox::new(Vec3::new(100.0, 100.0, 0.0), Vec3::splat(10.0)));
    let right_half = BoundingVolume::from(BoundingBox::new(Vec3::new(700.0, 100.0, 0.0), Vec3::splat(10.0)));

    assert!(camera.contains_gui(Some(&on_screen)));
    assert!(!camera.contains_gui(Some(&right_half)));
    assert!(camera.contains_gui(None));
}

// ============================================================================
// Projection round trip
// ============================================================================

#[test]
fn test_screen_world_round_trip() {
    let mut camera = create_test_camera();
    camera.set_location(Vec3::new(2.0, 1.0, 5.0));
    camera.set_view_port(0.25, 0.75, 0.1, 0.9);

    for (x, y, z) in [(210.0, 80.0, 0.0), (400.0, 300.0, 0.5), (590.0, 530.0, 0.97)] {
        let world = camera.get_world_coordinates(Vec2::new(x, y), z);
        let screen = camera.get_screen_coordinates(world);
        assert!((screen.x - x).abs() < 1e-2, "x {} vs {}", screen.x, x);
        assert!((screen.y - y).abs() < 1e-2, "y {} vs {}", screen.y, y);
        assert!((screen.z - z).abs() < 1e-3, "z {} vs {}", screen.z, z);
    }
}

#[test]
fn test_world_coordinates_on_near_plane() {
    let camera = create_test_camera();
    let center = camera.get_world_coordinates(Vec2::new(400.0, 300.0), 0.0);
    assert!(center.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-3));
}

#[test]
fn test_projection_override() {
    let mut camera = create_test_camera();
    let ortho = Mat4::orthographic_rh_gl(-1.0, 1.0, -1.0, 1.0, 0.0, 10.0);

    camera.set_projection_matrix(Some(ortho));
    assert_eq!(*camera.projection_matrix(), ortho);
    assert!(camera.view_projection_matrix().abs_diff_eq(ortho * *camera.view_matrix(), EPS));

    camera.set_projection_matrix(None);
    let expected = Mat4::perspective_rh_gl(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 100.0);
    assert!(camera.projection_matrix().abs_diff_eq(expected, EPS));
}
