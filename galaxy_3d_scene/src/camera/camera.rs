/// Camera - view and projection derivation plus frustum culling.
///
/// The camera owns its location, orientation, frustum extents and viewport
/// rectangle. Every mutator immediately rebuilds whatever depends on it
/// (projection, view, world planes), so cull queries never see stale
/// state.
///
/// Orientation follows the axis convention of the rotation matrix columns:
/// column 0 is the camera's left, column 1 its up and column 2 its viewing
/// direction. An identity rotation looks down +Z.

use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
use crate::engine_warn;
use crate::math::{BoundingBox, BoundingVolume, Plane, PlaneSide};
use super::frustum::{
    Frustum, FrustumIntersect, PlaneState, FRUSTUM_PLANES,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};

#[derive(Debug, Clone)]
pub struct Camera {
    name: String,

    location: Vec3,
    rotation: Quat,

    frustum_near: f32,
    frustum_far: f32,
    frustum_left: f32,
    frustum_right: f32,
    frustum_top: f32,
    frustum_bottom: f32,

    // Side-plane normal factors: [axis, direction]
    coeff_left: [f32; 2],
    coeff_right: [f32; 2],
    coeff_bottom: [f32; 2],
    coeff_top: [f32; 2],

    view_port_left: f32,
    view_port_right: f32,
    view_port_top: f32,
    view_port_bottom: f32,

    width: u32,
    height: u32,

    parallel_projection: bool,

    view_matrix: Mat4,
    projection_matrix: Mat4,
    projection_matrix_override: Option<Mat4>,
    view_projection_matrix: Mat4,

    /// World-space culling planes
    frustum: Frustum,

    view_port_changed: bool,

    /// Screen-space box of the viewport, for Gui culling
    gui_bounding: BoundingVolume,
}

impl Camera {
    /// Create a camera for a render surface of `width` x `height` pixels.
    ///
    /// Defaults: frustum near 1, far 2, left/right -0.5/0.5,
    /// bottom/top -0.5/0.5, full viewport, located at the origin
    /// looking down +Z.
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Self {
            name: String::new(),
            location: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            frustum_near: 1.0,
            frustum_far: 2.0,
            frustum_left: -0.5,
            frustum_right: 0.5,
            frustum_top: 0.5,
            frustum_bottom: -0.5,
            coeff_left: [0.0; 2],
            coeff_right: [0.0; 2],
            coeff_bottom: [0.0; 2],
            coeff_top: [0.0; 2],
            view_port_left: 0.0,
            view_port_right: 1.0,
            view_port_top: 1.0,
            view_port_bottom: 0.0,
            width,
            height,
            parallel_projection: false,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            projection_matrix_override: None,
            view_projection_matrix: Mat4::IDENTITY,
            frustum: Frustum::default(),
            view_port_changed: true,
            gui_bounding: BoundingBox::new(Vec3::ZERO, Vec3::ZERO).into(),
        };
        camera.update();
        camera
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // ===== FRAME =====

    pub fn location(&self) -> Vec3 {
        self.location
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Camera's left axis (rotation column 0)
    pub fn left(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Camera's up axis (rotation column 1)
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Viewing direction (rotation column 2)
    pub fn direction(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    pub fn set_location(&mut self, location: Vec3) {
        self.location = location;
        self.on_frame_change();
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.on_frame_change();
    }

    pub fn set_frame(&mut self, location: Vec3, rotation: Quat) {
        self.location = location;
        self.rotation = rotation;
        self.on_frame_change();
    }

    /// Set the orientation from explicit left, up and direction axes.
    pub fn set_axes(&mut self, left: Vec3, up: Vec3, direction: Vec3) {
        self.rotation = Quat::from_mat3(&Mat3::from_cols(left, up, direction));
        self.on_frame_change();
    }

    /// Orient the camera along `direction`, keeping `world_up` as close to
    /// the camera's up as possible.
    pub fn look_at_direction(&mut self, direction: Vec3, world_up: Vec3) {
        let direction = direction.normalize();
        let left = world_up.cross(direction).normalize();
        let up = direction.cross(left).normalize();
        self.set_axes(left, up, direction);
    }

    /// Orient the camera toward a world position.
    pub fn look_at(&mut self, position: Vec3, world_up: Vec3) {
        self.look_at_direction(position - self.location, world_up);
    }

    /// Re-orthonormalize the rotation after accumulated drift.
    pub fn normalize(&mut self) {
        self.rotation = self.rotation.normalize();
        self.on_frame_change();
    }

    // ===== FRUSTUM =====

    pub fn frustum_near(&self) -> f32 { self.frustum_near }
    pub fn frustum_far(&self) -> f32 { self.frustum_far }
    pub fn frustum_left(&self) -> f32 { self.frustum_left }
    pub fn frustum_right(&self) -> f32 { self.frustum_right }
    pub fn frustum_top(&self) -> f32 { self.frustum_top }
    pub fn frustum_bottom(&self) -> f32 { self.frustum_bottom }

    pub fn set_frustum_near(&mut self, near: f32) {
        self.frustum_near = near;
        self.on_frustum_change();
    }

    pub fn set_frustum_far(&mut self, far: f32) {
        self.frustum_far = far;
        self.on_frustum_change();
    }

    pub fn set_frustum_left(&mut self, left: f32) {
        self.frustum_left = left;
        self.on_frustum_change();
    }

    pub fn set_frustum_right(&mut self, right: f32) {
        self.frustum_right = right;
        self.on_frustum_change();
    }

    pub fn set_frustum_top(&mut self, top: f32) {
        self.frustum_top = top;
        self.on_frustum_change();
    }

    pub fn set_frustum_bottom(&mut self, bottom: f32) {
        self.frustum_bottom = bottom;
        self.on_frustum_change();
    }

    /// Set all six frustum extents at once.
    pub fn set_frustum(&mut self, near: f32, far: f32, left: f32, right: f32, top: f32, bottom: f32) {
        self.frustum_near = near;
        self.frustum_far = far;
        self.frustum_left = left;
        self.frustum_right = right;
        self.frustum_top = top;
        self.frustum_bottom = bottom;
        self.on_frustum_change();
    }

    /// Perspective frustum from a vertical field of view in degrees.
    ///
    /// A non-finite aspect ratio (typically from a zero-sized resize) is
    /// logged and ignored; the previous frustum stays in place.
    pub fn set_frustum_perspective(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) {
        if !aspect.is_finite() {
            engine_warn!("galaxy3d::Camera",
                "Invalid aspect given to set_frustum_perspective: {}", aspect);
            return;
        }

        let h = (fov_y.to_radians() * 0.5).tan() * near;
        let w = h * aspect;
        self.frustum_left = -w;
        self.frustum_right = w;
        self.frustum_bottom = -h;
        self.frustum_top = h;
        self.frustum_near = near;
        self.frustum_far = far;
        self.parallel_projection = false;
        self.on_frustum_change();
    }

    pub fn is_parallel_projection(&self) -> bool {
        self.parallel_projection
    }

    /// Switch between orthographic and perspective projection.
    pub fn set_parallel_projection(&mut self, value: bool) {
        self.parallel_projection = value;
        self.on_frustum_change();
    }

    // ===== VIEWPORT =====

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Resize the render surface.
    ///
    /// With `fix_aspect`, the horizontal extents are recomputed from the
    /// top extent so the image is not stretched.
    pub fn resize(&mut self, width: u32, height: u32, fix_aspect: bool) {
        self.width = width;
        self.height = height;
        self.on_view_port_change();

        if fix_aspect && height > 0 {
            self.frustum_right = self.frustum_top * (width as f32 / height as f32);
            self.frustum_left = -self.frustum_right;
            self.on_frustum_change();
        }
    }

    pub fn view_port_left(&self) -> f32 { self.view_port_left }
    pub fn view_port_right(&self) -> f32 { self.view_port_right }
    pub fn view_port_top(&self) -> f32 { self.view_port_top }
    pub fn view_port_bottom(&self) -> f32 { self.view_port_bottom }

    pub fn set_view_port_left(&mut self, left: f32) {
        self.view_port_left = left;
        self.on_view_port_change();
    }

    pub fn set_view_port_right(&mut self, right: f32) {
        self.view_port_right = right;
        self.on_view_port_change();
    }

    pub fn set_view_port_top(&mut self, top: f32) {
        self.view_port_top = top;
        self.on_view_port_change();
    }

    pub fn set_view_port_bottom(&mut self, bottom: f32) {
        self.view_port_bottom = bottom;
        self.on_view_port_change();
    }

    /// Set the viewport rectangle in normalized [0, 1] surface coordinates.
    pub fn set_view_port(&mut self, left: f32, right: f32, bottom: f32, top: f32) {
        self.view_port_left = left;
        self.view_port_right = right;
        self.view_port_bottom = bottom;
        self.view_port_top = top;
        self.on_view_port_change();
    }

    /// True once the viewport or surface size changed since the last
    /// `clear_viewport_changed()`.
    pub fn is_viewport_changed(&self) -> bool {
        self.view_port_changed
    }

    pub fn clear_viewport_changed(&mut self) {
        self.view_port_changed = false;
    }

    // ===== MATRICES =====

    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Projection in use: the override when set, the derived one otherwise.
    pub fn projection_matrix(&self) -> &Mat4 {
        self.projection_matrix_override.as_ref().unwrap_or(&self.projection_matrix)
    }

    pub fn view_projection_matrix(&self) -> &Mat4 {
        &self.view_projection_matrix
    }

    /// Replace the derived projection matrix (None restores it).
    ///
    /// Culling planes keep following the frustum extents.
    pub fn set_projection_matrix(&mut self, projection: Option<Mat4>) {
        self.projection_matrix_override = projection;
        self.update_view_projection();
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    pub fn world_plane(&self, index: usize) -> &Plane {
        self.frustum.plane(index)
    }

    // ===== DERIVED STATE =====

    /// Rebuild everything derived from the camera's parameters.
    pub fn update(&mut self) {
        self.on_frustum_change();
        self.on_view_port_change();
    }

    /// Recompute side-plane coefficients and the projection matrix, then
    /// the world planes.
    pub fn on_frustum_change(&mut self) {
        if self.parallel_projection {
            self.coeff_left = [-1.0, 0.0];
            self.coeff_right = [1.0, 0.0];
            self.coeff_bottom = [1.0, 0.0];
            self.coeff_top = [-1.0, 0.0];
        } else {
            let near = self.frustum_near;
            let near_squared = near * near;

            let inverse_length = inv_sqrt(near_squared + self.frustum_left * self.frustum_left);
            self.coeff_left = [-near * inverse_length, -self.frustum_left * inverse_length];

            let inverse_length = inv_sqrt(near_squared + self.frustum_right * self.frustum_right);
            self.coeff_right = [near * inverse_length, self.frustum_right * inverse_length];

            let inverse_length = inv_sqrt(near_squared + self.frustum_bottom * self.frustum_bottom);
            self.coeff_bottom = [near * inverse_length, -self.frustum_bottom * inverse_length];

            let inverse_length = inv_sqrt(near_squared + self.frustum_top * self.frustum_top);
            self.coeff_top = [-near * inverse_length, self.frustum_top * inverse_length];
        }

        self.projection_matrix = frustum_matrix(
            self.frustum_near,
            self.frustum_far,
            self.frustum_left,
            self.frustum_right,
            self.frustum_top,
            self.frustum_bottom,
            self.parallel_projection,
        );

        self.on_frame_change();
    }

    /// Rebuild the world planes and view matrix from location and axes.
    pub fn on_frame_change(&mut self) {
        let left = self.left();
        let up = self.up();
        let direction = self.direction();
        let location = self.location;
        let dir_dot_location = direction.dot(location);

        let side = |axis: Vec3, coeff: [f32; 2]| {
            let normal = axis * coeff[0] + direction * coeff[1];
            Plane::new(normal, location.dot(normal))
        };

        let planes = &mut self.frustum.planes;
        planes[PLANE_LEFT] = side(left, self.coeff_left);
        planes[PLANE_RIGHT] = side(left, self.coeff_right);
        planes[PLANE_BOTTOM] = side(up, self.coeff_bottom);
        planes[PLANE_TOP] = side(up, self.coeff_top);

        if self.parallel_projection {
            planes[PLANE_LEFT].constant += self.frustum_left;
            planes[PLANE_RIGHT].constant -= self.frustum_right;
            planes[PLANE_TOP].constant -= self.frustum_top;
            planes[PLANE_BOTTOM].constant += self.frustum_bottom;
        }

        planes[PLANE_FAR] = Plane::new(-direction, -(dir_dot_location + self.frustum_far));
        planes[PLANE_NEAR] = Plane::new(direction, dir_dot_location + self.frustum_near);

        self.view_matrix = Mat4::look_to_rh(location, direction, up);
        self.update_view_projection();
    }

    /// Flag the viewport as changed and refresh the Gui culling box.
    pub fn on_view_port_change(&mut self) {
        self.view_port_changed = true;

        let width = self.width as f32;
        let height = self.height as f32;
        let sx = width * self.view_port_left;
        let ex = width * self.view_port_right;
        let sy = height * self.view_port_bottom;
        let ey = height * self.view_port_top;
        let x_extent = ((ex - sx) / 2.0).max(0.0);
        let y_extent = ((ey - sy) / 2.0).max(0.0);

        self.gui_bounding = BoundingBox::new(
            Vec3::new(sx + x_extent, sy + y_extent, 0.0),
            Vec3::new(x_extent, y_extent, f32::MAX),
        ).into();
    }

    fn update_view_projection(&mut self) {
        self.view_projection_matrix = *self.projection_matrix() * self.view_matrix;
    }

    // ===== CULLING =====

    /// Test a bounding volume against the frustum.
    ///
    /// Planes already set in `plane_state` are skipped; planes the volume
    /// is entirely inside of are added to it. The plane that last rejected
    /// the volume is tested first and recorded on the volume when it
    /// rejects it again. A missing volume is always inside.
    pub fn contains(
        &self,
        bound: Option<&mut BoundingVolume>,
        plane_state: &mut PlaneState,
    ) -> FrustumIntersect {
        let Some(bound) = bound else {
            return FrustumIntersect::Inside;
        };

        let check_plane = bound.check_plane();
        let mut result = FrustumIntersect::Inside;

        // Counter value FRUSTUM_PLANES stands for the cached check plane
        for plane_counter in (0..=FRUSTUM_PLANES).rev() {
            if plane_counter == check_plane {
                continue;
            }
            let plane_id = if plane_counter == FRUSTUM_PLANES { check_plane } else { plane_counter };

            let bit = PlaneState::plane(plane_id);
            if plane_state.contains(bit) {
                continue;
            }

            match bound.which_side(self.frustum.plane(plane_id)) {
                PlaneSide::Negative => {
                    bound.set_check_plane(plane_id);
                    return FrustumIntersect::Outside;
                }
                PlaneSide::Positive => plane_state.insert(bit),
                PlaneSide::None => result = FrustumIntersect::Intersects,
            }
        }

        result
    }

    /// Test a screen-space volume against the viewport rectangle.
    pub fn contains_gui(&self, bound: Option<&BoundingVolume>) -> bool {
        match bound {
            Some(bound) => self.gui_bounding.intersects(bound),
            None => true,
        }
    }

    /// Distance from the near plane, positive in front of the camera.
    pub fn distance_to_near_plane(&self, position: Vec3) -> f32 {
        self.frustum.plane(PLANE_NEAR).pseudo_distance(position)
    }

    // ===== PROJECTION =====

    /// Unproject a pixel position with a depth in [0, 1] into world space.
    pub fn get_world_coordinates(&self, screen_position: Vec2, projection_z: f32) -> Vec3 {
        let inverse = self.view_projection_matrix.inverse();
        let ndc = Vec4::new(
            (screen_position.x / self.width as f32 - self.view_port_left)
                / (self.view_port_right - self.view_port_left) * 2.0 - 1.0,
            (screen_position.y / self.height as f32 - self.view_port_bottom)
                / (self.view_port_top - self.view_port_bottom) * 2.0 - 1.0,
            projection_z * 2.0 - 1.0,
            1.0,
        );
        let world = inverse * ndc;
        world.truncate() / world.w
    }

    /// Project a world position to pixel coordinates; z is the depth in [0, 1].
    pub fn get_screen_coordinates(&self, world_position: Vec3) -> Vec3 {
        let clip = self.view_projection_matrix * world_position.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        Vec3::new(
            ((ndc.x + 1.0) * (self.view_port_right - self.view_port_left) / 2.0 + self.view_port_left)
                * self.width as f32,
            ((ndc.y + 1.0) * (self.view_port_top - self.view_port_bottom) / 2.0 + self.view_port_bottom)
                * self.height as f32,
            (ndc.z + 1.0) / 2.0,
        )
    }
}

fn inv_sqrt(value: f32) -> f32 {
    1.0 / value.sqrt()
}

/// Off-center perspective or orthographic projection with depth mapped to [-1, 1].
fn frustum_matrix(near: f32, far: f32, left: f32, right: f32, top: f32, bottom: f32, parallel: bool) -> Mat4 {
    if parallel {
        return Mat4::orthographic_rh_gl(left, right, bottom, top, near, far);
    }

    let width = right - left;
    let height = top - bottom;
    let depth = far - near;
    Mat4::from_cols(
        Vec4::new(2.0 * near / width, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / height, 0.0, 0.0),
        Vec4::new((right + left) / width, (top + bottom) / height, -(far + near) / depth, -1.0),
        Vec4::new(0.0, 0.0, -2.0 * far * near / depth, 0.0),
    )
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
