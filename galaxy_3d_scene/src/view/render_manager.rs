/// RenderManager - per-frame orchestration of viewports.
///
/// Each frame the manager walks the pre, main and post viewport groups in
/// order. For every viewport it pushes the camera to the renderer, culls
/// and queues the attached scenes, then flushes the buckets:
///
/// 1. Opaque
/// 2. Sky, with depth range (1, 1)
/// 3. Transparent, depth range back to (0, 1)
/// 4. Gui, with depth range (0, 0) and an orthographic projection
/// 5. Translucent, after the processors' post-frame pass
///
/// Draws go through a `Dispatcher` that owns the renderer and the forced
/// material, technique and render state.

use glam::{Mat4, Vec4};
use slotmap::SlotMap;
use crate::camera::{Camera, PlaneState};
use crate::error::{Error, Result};
use crate::{engine_bail, engine_debug, engine_error, engine_info, engine_trace};
use crate::material::{Material, RenderState, TechniqueDef};
use crate::queue::{Bucket, GeometryRenderer, RenderQueue};
use crate::renderer::Renderer;
use crate::scene::{Geometry, SceneGraph, SpatialKey};
use crate::view::{ClearFlags, ProcessorContext, ViewPort, ViewPortKey};

/// Render manager configuration
#[derive(Debug, Clone)]
pub struct RenderManagerConfig {
    /// Draw the translucent bucket after the processors' post-frame pass.
    /// When false, translucent geometry is left to a processor.
    pub handle_translucent_bucket: bool,
}

impl Default for RenderManagerConfig {
    fn default() -> Self {
        Self { handle_translucent_bucket: true }
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Renderer plus the state overrides applied to every draw.
struct Dispatcher {
    renderer: Box<dyn Renderer>,
    forced_material: Option<Material>,
    forced_technique: Option<String>,
    forced_render_state: Option<RenderState>,
    /// Viewport whose camera rectangle was last uploaded
    prev_camera: Option<ViewPortKey>,
    ortho_matrix: Mat4,
}

impl Dispatcher {
    /// Push viewport rectangle and camera matrices to the renderer.
    fn set_camera(&mut self, key: ViewPortKey, camera: &mut Camera, ortho: bool) {
        self.set_view_port(key, camera);
        self.set_view_projection(camera, ortho);
    }

    fn set_view_port(&mut self, key: ViewPortKey, camera: &mut Camera) {
        if self.prev_camera == Some(key) && !camera.is_viewport_changed() {
            return;
        }

        let width = camera.width().max(1) as f32;
        let height = camera.height().max(1) as f32;
        let x = (camera.view_port_left() * width) as i32;
        let y = (camera.view_port_bottom() * height) as i32;
        let w = ((camera.view_port_right() - camera.view_port_left()) * width) as i32;
        let h = ((camera.view_port_top() - camera.view_port_bottom()) * height) as i32;
        self.renderer.set_view_port(x, y, w, h);
        self.renderer.set_clip_rect(x, y, w, h);
        camera.clear_viewport_changed();
        self.prev_camera = Some(key);

        // Pixel coordinates to clip space, z flattened
        self.ortho_matrix = Mat4::from_cols(
            Vec4::new(2.0 / width, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 / height, 0.0, 0.0),
            Vec4::ZERO,
            Vec4::new(-1.0, -1.0, 0.0, 1.0),
        );
    }

    fn set_view_projection(&mut self, camera: &Camera, ortho: bool) {
        if ortho {
            self.renderer.set_view_projection(&Mat4::IDENTITY, &self.ortho_matrix, &self.ortho_matrix);
        } else {
            self.renderer.set_view_projection(
                camera.view_matrix(),
                camera.projection_matrix(),
                camera.view_projection_matrix(),
            );
        }
    }
}

/// Issue one draw of `geometry` with `material` and `technique`.
fn draw(
    renderer: &mut dyn Renderer,
    material: &Material,
    technique: &TechniqueDef,
    forced_state: Option<&RenderState>,
    geometry: &Geometry,
) -> Result<()> {
    if !technique.is_supported(renderer.caps()) {
        engine_bail!("galaxy3d::RenderManager", InvalidResource =>
            "Technique '{}' of material '{}' is not supported by the renderer",
            technique.name(), material.name());
    }

    let state = forced_state.copied().unwrap_or_else(|| material.render_state(technique));
    renderer.apply_render_state(&state);
    for (unit, texture) in material.textures().enumerate() {
        renderer.set_texture(unit as u32, texture);
    }
    renderer.set_shader(material, technique)?;
    renderer.render_mesh(geometry.mesh(), geometry.lod_level(), 1)
}

fn active_technique(material: &Material) -> Result<&TechniqueDef> {
    match material.active_technique_def() {
        Some(technique) => Ok(technique),
        None => engine_bail!("galaxy3d::RenderManager", InvalidResource =>
            "Material '{}' has no technique '{}'", material.name(), material.active_technique()),
    }
}

impl GeometryRenderer for Dispatcher {
    fn render_geometry(&mut self, scene: &SceneGraph, key: SpatialKey) -> Result<()> {
        let Some(spatial) = scene.get(key) else {
            return Ok(());
        };
        let Some(geometry) = spatial.geometry() else {
            return Ok(());
        };

        let world = if spatial.is_ignore_transform() {
            Mat4::IDENTITY
        } else {
            spatial.world_transform().to_matrix()
        };
        self.renderer.set_world_matrix(&world);

        let renderer = self.renderer.as_mut();
        let forced_state = self.forced_render_state.as_ref();

        if let Some(forced_technique) = &self.forced_technique {
            let own = geometry
                .material()
                .ok_or_else(|| Error::MissingMaterial(spatial.name().to_string()))?;
            if let Some(technique) = own.def().technique(forced_technique) {
                // The technique's own forced state wins over the manager's
                let state = technique.forced_render_state().or(forced_state);
                draw(renderer, own, technique, state, geometry)
            } else if let Some(forced) = &self.forced_material {
                draw(renderer, forced, active_technique(forced)?, forced_state, geometry)
            } else {
                engine_trace!("galaxy3d::RenderManager",
                    "Skipping '{}': material '{}' has no technique '{}'",
                    spatial.name(), own.name(), forced_technique);
                Ok(())
            }
        } else if let Some(forced) = &self.forced_material {
            draw(renderer, forced, active_technique(forced)?, forced_state, geometry)
        } else {
            let own = geometry
                .material()
                .ok_or_else(|| Error::MissingMaterial(spatial.name().to_string()))?;
            draw(renderer, own, active_technique(own)?, forced_state, geometry)
        }
    }
}

// ============================================================================
// RenderManager
// ============================================================================

pub struct RenderManager {
    dispatcher: Dispatcher,
    view_ports: SlotMap<ViewPortKey, ViewPort>,
    pre_views: Vec<ViewPortKey>,
    main_views: Vec<ViewPortKey>,
    post_views: Vec<ViewPortKey>,
    handle_translucent_bucket: bool,
}

impl RenderManager {
    pub fn new(renderer: Box<dyn Renderer>) -> Self {
        Self::with_config(renderer, RenderManagerConfig::default())
    }

    pub fn with_config(renderer: Box<dyn Renderer>, config: RenderManagerConfig) -> Self {
        engine_info!("galaxy3d::RenderManager",
            "Render manager created (caps: {:?})", renderer.caps());
        Self {
            dispatcher: Dispatcher {
                renderer,
                forced_material: None,
                forced_technique: None,
                forced_render_state: None,
                prev_camera: None,
                ortho_matrix: Mat4::IDENTITY,
            },
            view_ports: SlotMap::with_key(),
            pre_views: Vec::new(),
            main_views: Vec::new(),
            post_views: Vec::new(),
            handle_translucent_bucket: config.handle_translucent_bucket,
        }
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.dispatcher.renderer.as_ref()
    }

    pub fn renderer_mut(&mut self) -> &mut dyn Renderer {
        self.dispatcher.renderer.as_mut()
    }

    // ===== VIEWPORTS =====

    /// Create a viewport drawn before the main views (e.g. shadow maps)
    pub fn create_pre_view(&mut self, name: impl Into<String>, camera: Camera) -> ViewPortKey {
        let key = self.view_ports.insert(ViewPort::new(name, camera));
        self.pre_views.push(key);
        engine_debug!("galaxy3d::RenderManager", "Created pre view '{}'", self.view_ports[key].name);
        key
    }

    pub fn create_main_view(&mut self, name: impl Into<String>, camera: Camera) -> ViewPortKey {
        let key = self.view_ports.insert(ViewPort::new(name, camera));
        self.main_views.push(key);
        engine_debug!("galaxy3d::RenderManager", "Created main view '{}'", self.view_ports[key].name);
        key
    }

    /// Create a viewport drawn after the main views (e.g. GUI overlay)
    pub fn create_post_view(&mut self, name: impl Into<String>, camera: Camera) -> ViewPortKey {
        let key = self.view_ports.insert(ViewPort::new(name, camera));
        self.post_views.push(key);
        engine_debug!("galaxy3d::RenderManager", "Created post view '{}'", self.view_ports[key].name);
        key
    }

    pub fn view_port(&self, key: ViewPortKey) -> Option<&ViewPort> {
        self.view_ports.get(key)
    }

    pub fn view_port_mut(&mut self, key: ViewPortKey) -> Option<&mut ViewPort> {
        self.view_ports.get_mut(key)
    }

    pub fn pre_views(&self) -> &[ViewPortKey] {
        &self.pre_views
    }

    pub fn main_views(&self) -> &[ViewPortKey] {
        &self.main_views
    }

    pub fn post_views(&self) -> &[ViewPortKey] {
        &self.post_views
    }

    fn find_in(&self, group: &[ViewPortKey], name: &str) -> Option<ViewPortKey> {
        group
            .iter()
            .copied()
            .find(|&k| self.view_ports.get(k).is_some_and(|vp| vp.name == name))
    }

    pub fn pre_view(&self, name: &str) -> Option<ViewPortKey> {
        self.find_in(&self.pre_views, name)
    }

    pub fn main_view(&self, name: &str) -> Option<ViewPortKey> {
        self.find_in(&self.main_views, name)
    }

    pub fn post_view(&self, name: &str) -> Option<ViewPortKey> {
        self.find_in(&self.post_views, name)
    }

    /// Remove a viewport from whichever group holds it. Its processors are
    /// cleaned up. Returns false for an unknown key.
    pub fn remove_view(&mut self, key: ViewPortKey) -> bool {
        let Some(mut view_port) = self.view_ports.remove(key) else {
            return false;
        };
        self.pre_views.retain(|&k| k != key);
        self.main_views.retain(|&k| k != key);
        self.post_views.retain(|&k| k != key);
        if self.dispatcher.prev_camera == Some(key) {
            self.dispatcher.prev_camera = None;
        }
        view_port.clear_processors();
        engine_debug!("galaxy3d::RenderManager", "Removed view '{}'", view_port.name);
        true
    }

    pub fn remove_pre_view(&mut self, name: &str) -> bool {
        self.pre_view(name).is_some_and(|key| self.remove_view(key))
    }

    pub fn remove_main_view(&mut self, name: &str) -> bool {
        self.main_view(name).is_some_and(|key| self.remove_view(key))
    }

    pub fn remove_post_view(&mut self, name: &str) -> bool {
        self.post_view(name).is_some_and(|key| self.remove_view(key))
    }

    fn all_views(&self) -> Vec<ViewPortKey> {
        self.pre_views
            .iter()
            .chain(&self.main_views)
            .chain(&self.post_views)
            .copied()
            .collect()
    }

    /// The render surface was resized.
    ///
    /// Cameras of viewports drawing to the main frame buffer follow the new
    /// size; processors are initialized or reshaped.
    pub fn notify_reshape(&mut self, width: u32, height: u32) -> Result<()> {
        for key in self.all_views() {
            let Some(vp) = self.view_ports.get_mut(key) else {
                continue;
            };
            if vp.output_frame_buffer.is_none() {
                vp.camera.resize(width, height, true);
            }

            let ViewPort { name, camera, processors, output_frame_buffer, .. } = vp;
            for processor in processors.iter_mut() {
                let mut ctx = ProcessorContext {
                    renderer: self.dispatcher.renderer.as_mut(),
                    view_port_name: name.as_str(),
                    camera: &*camera,
                    output_frame_buffer: output_frame_buffer.as_ref(),
                };
                if processor.is_initialized() {
                    processor.reshape(&mut ctx, width, height);
                } else {
                    processor.initialize(&mut ctx)?;
                }
            }
        }
        Ok(())
    }

    // ===== STATE OVERRIDES =====

    /// Draw every geometry with this material instead of its own
    pub fn set_forced_material(&mut self, material: Option<Material>) {
        self.dispatcher.forced_material = material;
    }

    pub fn forced_material(&self) -> Option<&Material> {
        self.dispatcher.forced_material.as_ref()
    }

    /// Draw every geometry with this technique of its own material.
    ///
    /// Geometries whose material lacks the technique fall back to the
    /// forced material, or are skipped when there is none.
    pub fn set_forced_technique(&mut self, technique: Option<String>) {
        self.dispatcher.forced_technique = technique;
    }

    pub fn forced_technique(&self) -> Option<&str> {
        self.dispatcher.forced_technique.as_deref()
    }

    /// Apply this state to every draw instead of the material's
    pub fn set_forced_render_state(&mut self, state: Option<RenderState>) {
        self.dispatcher.forced_render_state = state;
    }

    pub fn forced_render_state(&self) -> Option<&RenderState> {
        self.dispatcher.forced_render_state.as_ref()
    }

    pub fn set_handle_translucent_bucket(&mut self, handle: bool) {
        self.handle_translucent_bucket = handle;
    }

    pub fn is_handle_translucent_bucket(&self) -> bool {
        self.handle_translucent_bucket
    }

    // ===== DRAWING =====

    /// Draw a single geometry with the current overrides
    pub fn render_geometry(&mut self, scene: &SceneGraph, geometry: SpatialKey) -> Result<()> {
        self.dispatcher.render_geometry(scene, geometry)
    }

    /// Push a viewport's camera (or the GUI orthographic projection) to the renderer
    pub fn set_camera(&mut self, key: ViewPortKey, ortho: bool) -> Result<()> {
        let Some(vp) = self.view_ports.get_mut(key) else {
            engine_bail!("galaxy3d::RenderManager", InvalidResource => "Unknown viewport");
        };
        self.dispatcher.set_camera(key, &mut vp.camera, ortho);
        Ok(())
    }

    /// Cull and queue the scene rooted at `root` into a viewport's queue.
    pub fn render_scene(&mut self, scene: &mut SceneGraph, root: SpatialKey, key: ViewPortKey) -> Result<()> {
        let Some(vp) = self.view_ports.get_mut(key) else {
            engine_bail!("galaxy3d::RenderManager", InvalidResource => "Unknown viewport");
        };
        render_sub_scene(
            self.dispatcher.renderer.as_mut(),
            &vp.camera,
            &mut vp.queue,
            scene,
            root,
            PlaneState::empty(),
        )
    }

    /// Draw a viewport's buckets in the fixed order.
    ///
    /// With `flush` the drawn buckets are emptied.
    pub fn render_view_port_queues(&mut self, scene: &SceneGraph, key: ViewPortKey, flush: bool) -> Result<()> {
        let Some(vp) = self.view_ports.get_mut(key) else {
            engine_bail!("galaxy3d::RenderManager", InvalidResource => "Unknown viewport");
        };
        render_view_port_queues(&mut self.dispatcher, vp, key, scene, flush)
    }

    /// Draw and flush the translucent bucket, when enabled
    pub fn render_translucent_queue(&mut self, scene: &SceneGraph, key: ViewPortKey) -> Result<()> {
        let handle = self.handle_translucent_bucket;
        let Some(vp) = self.view_ports.get_mut(key) else {
            engine_bail!("galaxy3d::RenderManager", InvalidResource => "Unknown viewport");
        };
        render_translucent_queue(&mut self.dispatcher, vp, scene, handle)
    }

    /// Render a viewport without clearing, frame buffer switch or processors.
    pub fn render_view_port_raw(&mut self, scene: &mut SceneGraph, key: ViewPortKey) -> Result<()> {
        let Some(vp) = self.view_ports.get_mut(key) else {
            engine_bail!("galaxy3d::RenderManager", InvalidResource => "Unknown viewport");
        };
        self.dispatcher.set_camera(key, &mut vp.camera, false);
        queue_scenes(&mut self.dispatcher, vp, scene)?;
        render_view_port_queues(&mut self.dispatcher, vp, key, scene, true)
    }

    /// Render one viewport: processors, clear, queue, buckets, translucent pass.
    pub fn render_view_port(&mut self, scene: &mut SceneGraph, key: ViewPortKey, tpf: f32) -> Result<()> {
        let handle = self.handle_translucent_bucket;
        let Some(vp) = self.view_ports.get_mut(key) else {
            engine_bail!("galaxy3d::RenderManager", InvalidResource => "Unknown viewport");
        };
        if !vp.enabled {
            return Ok(());
        }

        let result = render_view_port_body(&mut self.dispatcher, vp, key, scene, tpf, handle);
        // An aborted frame must not leak queued geometries into the next one
        vp.queue.clear();
        result
    }

    /// Render every viewport, pre then main then post.
    ///
    /// Viewports drawing to the main frame buffer are skipped while it is
    /// not active (e.g. minimized window).
    pub fn render(&mut self, scene: &mut SceneGraph, tpf: f32, main_frame_buffer_active: bool) -> Result<()> {
        for key in self.all_views() {
            let has_output = self
                .view_ports
                .get(key)
                .is_some_and(|vp| vp.output_frame_buffer.is_some());
            if has_output || main_frame_buffer_active {
                self.render_view_port(scene, key, tpf)?;
            }
        }
        Ok(())
    }

    // ===== RESOURCES =====

    /// Remove a subtree from the scene and free its meshes' GPU buffers
    pub fn remove_spatial(&mut self, scene: &mut SceneGraph, key: SpatialKey) {
        let released = scene.remove(key);
        for mesh in &released {
            self.dispatcher.renderer.release_mesh(*mesh);
        }
        engine_debug!("galaxy3d::RenderManager", "Released {} mesh(es)", released.len());
    }
}

// ============================================================================
// Frame helpers
// ============================================================================

fn render_view_port_body(
    dispatcher: &mut Dispatcher,
    vp: &mut ViewPort,
    key: ViewPortKey,
    scene: &mut SceneGraph,
    tpf: f32,
    handle_translucent: bool,
) -> Result<()> {
    {
        let ViewPort { name, camera, processors, output_frame_buffer, .. } = &mut *vp;
        for processor in processors.iter_mut() {
            if !processor.is_initialized() {
                let mut ctx = ProcessorContext {
                    renderer: dispatcher.renderer.as_mut(),
                    view_port_name: name.as_str(),
                    camera: &*camera,
                    output_frame_buffer: output_frame_buffer.as_ref(),
                };
                processor.initialize(&mut ctx)?;
            }
            processor.pre_frame(tpf);
        }
    }

    dispatcher.renderer.set_frame_buffer(vp.output_frame_buffer.as_ref());
    dispatcher.set_camera(key, &mut vp.camera, false);

    let clear = vp.clear_flags;
    if !clear.is_empty() {
        if clear.contains(ClearFlags::COLOR) {
            dispatcher.renderer.set_background_color(vp.background_color);
        }
        dispatcher.renderer.clear_buffers(
            clear.contains(ClearFlags::COLOR),
            clear.contains(ClearFlags::DEPTH),
            clear.contains(ClearFlags::STENCIL),
        );
    }

    queue_scenes(dispatcher, vp, scene)?;

    for processor in vp.processors.iter_mut() {
        processor.post_queue(&mut vp.queue);
    }

    render_view_port_queues(dispatcher, vp, key, scene, true)?;

    for processor in vp.processors.iter_mut() {
        processor.post_frame(dispatcher.renderer.as_mut(), vp.output_frame_buffer.as_ref())?;
    }

    render_translucent_queue(dispatcher, vp, scene, handle_translucent)
}

/// Queue every attached scene, last attached first.
fn queue_scenes(dispatcher: &mut Dispatcher, vp: &mut ViewPort, scene: &mut SceneGraph) -> Result<()> {
    for i in (0..vp.scenes.len()).rev() {
        let root = vp.scenes[i];
        render_sub_scene(
            dispatcher.renderer.as_mut(),
            &vp.camera,
            &mut vp.queue,
            scene,
            root,
            PlaneState::empty(),
        )?;
    }
    Ok(())
}

/// Cull `key` and, when visible, queue it or recurse into its children.
///
/// `plane_state` is passed by value: each child starts from the state its
/// parent left, never from a sibling's.
fn render_sub_scene(
    renderer: &mut dyn Renderer,
    camera: &Camera,
    queue: &mut RenderQueue,
    scene: &mut SceneGraph,
    key: SpatialKey,
    mut plane_state: PlaneState,
) -> Result<()> {
    if !scene.check_culling(key, camera, &mut plane_state) {
        return Ok(());
    }
    scene.run_control_render(key, renderer, camera)?;

    let Some(spatial) = scene.get(key) else {
        return Ok(());
    };
    if spatial.is_node() {
        let mut index = 0;
        while let Some(&child) = scene.children(key).get(index) {
            render_sub_scene(renderer, camera, queue, scene, child, plane_state)?;
            index += 1;
        }
        return Ok(());
    }

    if spatial.geometry().is_some_and(|g| g.material().is_none()) {
        let name = spatial.name().to_string();
        engine_error!("galaxy3d::RenderManager", "No material is set for Geometry: {}", name);
        return Err(Error::MissingMaterial(name));
    }
    queue.add_to_queue(key, scene.effective_bucket(key))
}

fn render_view_port_queues(
    dispatcher: &mut Dispatcher,
    vp: &mut ViewPort,
    key: ViewPortKey,
    scene: &SceneGraph,
    flush: bool,
) -> Result<()> {
    let mut depth_range_changed = false;

    vp.queue.render_queue(Bucket::Opaque, &mut *dispatcher, scene, &vp.camera, flush)?;

    if !vp.queue.is_queue_empty(Bucket::Sky) {
        dispatcher.renderer.set_depth_range(1.0, 1.0);
        vp.queue.render_queue(Bucket::Sky, &mut *dispatcher, scene, &vp.camera, flush)?;
        depth_range_changed = true;
    }

    if !vp.queue.is_queue_empty(Bucket::Transparent) {
        if depth_range_changed {
            dispatcher.renderer.set_depth_range(0.0, 1.0);
            depth_range_changed = false;
        }
        vp.queue.render_queue(Bucket::Transparent, &mut *dispatcher, scene, &vp.camera, flush)?;
    }

    if !vp.queue.is_queue_empty(Bucket::Gui) {
        dispatcher.renderer.set_depth_range(0.0, 0.0);
        dispatcher.set_camera(key, &mut vp.camera, true);
        vp.queue.render_queue(Bucket::Gui, &mut *dispatcher, scene, &vp.camera, flush)?;
        dispatcher.set_camera(key, &mut vp.camera, false);
        depth_range_changed = true;
    }

    if depth_range_changed {
        dispatcher.renderer.set_depth_range(0.0, 1.0);
    }
    Ok(())
}

fn render_translucent_queue(
    dispatcher: &mut Dispatcher,
    vp: &mut ViewPort,
    scene: &SceneGraph,
    handle_translucent: bool,
) -> Result<()> {
    if handle_translucent && !vp.queue.is_queue_empty(Bucket::Translucent) {
        vp.queue.render_queue(Bucket::Translucent, &mut *dispatcher, scene, &vp.camera, true)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "render_manager_tests.rs"]
mod tests;
