/// SceneGraph - arena of spatials forming one or more trees.
///
/// Uses a SlotMap for O(1) insert/remove with stable keys. Parents own
/// their children through the `children` list of a node; a child refers
/// back to its parent by key.

use std::mem;
use slotmap::SlotMap;
use crate::camera::{Camera, FrustumIntersect, PlaneState};
use crate::error::Result;
use crate::{engine_bail, engine_trace};
use crate::material::Material;
use crate::math::Transform;
use crate::queue::Bucket;
use crate::renderer::Renderer;
use crate::scene::{
    Control, ControlRenderContext, ControlUpdateContext, CullHint, Geometry, Mesh, MeshId, Spatial,
    SpatialKey, SpatialKind,
};

#[derive(Default)]
pub struct SceneGraph {
    spatials: SlotMap<SpatialKey, Spatial>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self { spatials: SlotMap::with_key() }
    }

    // ===== CREATION =====

    /// Create a detached, empty node
    pub fn create_node(&mut self, name: impl Into<String>) -> SpatialKey {
        self.spatials.insert(Spatial::new(name.into(), SpatialKind::Node { children: Vec::new() }))
    }

    /// Create a detached geometry
    pub fn create_geometry(
        &mut self,
        name: impl Into<String>,
        mesh: Mesh,
        material: Option<Material>,
    ) -> SpatialKey {
        self.spatials.insert(Spatial::new_geometry(name.into(), mesh, material))
    }

    // ===== ACCESS =====

    pub fn get(&self, key: SpatialKey) -> Option<&Spatial> {
        self.spatials.get(key)
    }

    pub fn get_mut(&mut self, key: SpatialKey) -> Option<&mut Spatial> {
        self.spatials.get_mut(key)
    }

    pub fn contains(&self, key: SpatialKey) -> bool {
        self.spatials.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.spatials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spatials.is_empty()
    }

    pub fn geometry(&self, key: SpatialKey) -> Option<&Geometry> {
        self.spatials.get(key)?.geometry()
    }

    pub fn geometry_mut(&mut self, key: SpatialKey) -> Option<&mut Geometry> {
        self.spatials.get_mut(key)?.geometry_mut()
    }

    /// Children of a node; empty for geometries and unknown keys
    pub fn children(&self, key: SpatialKey) -> &[SpatialKey] {
        self.spatials.get(key).map_or(&[], Spatial::children)
    }

    pub fn parent(&self, key: SpatialKey) -> Option<SpatialKey> {
        self.spatials.get(key)?.parent
    }

    /// Find a spatial by name in the subtree of `root`, depth first
    pub fn find(&self, root: SpatialKey, name: &str) -> Option<SpatialKey> {
        self.descendants(root)
            .into_iter()
            .find(|&key| self.spatials.get(key).is_some_and(|s| s.name == name))
    }

    /// `root` and all its descendants, depth first, parents before children
    pub fn descendants(&self, root: SpatialKey) -> Vec<SpatialKey> {
        let mut result = Vec::new();
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            if !self.spatials.contains_key(key) {
                continue;
            }
            result.push(key);
            stack.extend(self.children(key).iter().rev());
        }
        result
    }

    /// Geometries in the subtree of `root`, depth first
    pub fn collect_geometries(&self, root: SpatialKey) -> Vec<SpatialKey> {
        self.descendants(root)
            .into_iter()
            .filter(|&key| self.geometry(key).is_some())
            .collect()
    }

    // ===== HIERARCHY =====

    /// Attach `child` as the last child of `parent`, detaching it from its
    /// previous parent first.
    pub fn attach_child(&mut self, parent: SpatialKey, child: SpatialKey) -> Result<()> {
        if !self.spatials.contains_key(child) {
            engine_bail!("galaxy3d::SceneGraph", InvalidResource => "Unknown child spatial");
        }
        match self.spatials.get(parent) {
            None => engine_bail!("galaxy3d::SceneGraph", InvalidResource => "Unknown parent spatial"),
            Some(p) if !p.is_node() => {
                engine_bail!("galaxy3d::SceneGraph", InvalidState =>
                    "Cannot attach to geometry '{}'", p.name);
            }
            Some(_) => {}
        }

        // The parent must not be the child itself or one of its descendants
        let mut ancestor = Some(parent);
        while let Some(key) = ancestor {
            if key == child {
                engine_bail!("galaxy3d::SceneGraph", InvalidState =>
                    "Attaching '{}' would create a cycle", self.spatials[child].name);
            }
            ancestor = self.parent(key);
        }

        self.detach(child);
        if let Some(SpatialKind::Node { children }) = self.spatials.get_mut(parent).map(|p| &mut p.kind) {
            children.push(child);
        }
        if let Some(spatial) = self.spatials.get_mut(child) {
            spatial.parent = Some(parent);
        }
        Ok(())
    }

    /// Detach a spatial from its parent. Returns false when it had none.
    pub fn detach(&mut self, child: SpatialKey) -> bool {
        let Some(parent) = self.spatials.get_mut(child).and_then(|s| s.parent.take()) else {
            return false;
        };
        if let Some(SpatialKind::Node { children }) = self.spatials.get_mut(parent).map(|p| &mut p.kind) {
            children.retain(|&c| c != child);
        }
        true
    }

    /// Remove a spatial and its whole subtree.
    ///
    /// Returns the ids of the removed meshes so their GPU buffers can be
    /// released.
    pub fn remove(&mut self, key: SpatialKey) -> Vec<MeshId> {
        self.detach(key);
        let mut meshes = Vec::new();
        for k in self.descendants(key) {
            if let Some(spatial) = self.spatials.remove(k) {
                if let Some(geometry) = spatial.geometry() {
                    meshes.push(geometry.mesh().id());
                }
            }
        }
        meshes
    }

    // ===== CONTROLS =====

    pub fn add_control(&mut self, key: SpatialKey, control: Box<dyn Control>) -> Result<()> {
        let Some(spatial) = self.spatials.get_mut(key) else {
            engine_bail!("galaxy3d::SceneGraph", InvalidResource => "Unknown spatial for control");
        };
        spatial.controls.push(control);
        Ok(())
    }

    /// First control of type `T` attached to a spatial
    pub fn control<T: Control>(&self, key: SpatialKey) -> Option<&T> {
        self.spatials
            .get(key)?
            .controls
            .iter()
            .find_map(|c| c.as_any().downcast_ref::<T>())
    }

    pub fn control_mut<T: Control>(&mut self, key: SpatialKey) -> Option<&mut T> {
        self.spatials
            .get_mut(key)?
            .controls
            .iter_mut()
            .find_map(|c| c.as_any_mut().downcast_mut::<T>())
    }

    // ===== FRAME UPDATE =====

    /// Run the controls of every spatial under `root`.
    pub fn update_logical_state(&mut self, root: SpatialKey, tpf: f32) -> Result<()> {
        for key in self.descendants(root) {
            if let Some(spatial) = self.spatials.get_mut(key) {
                for control in &mut spatial.controls {
                    let mut ctx = ControlUpdateContext { tpf, local_transform: &mut spatial.local_transform };
                    control.update(&mut ctx)?;
                }
            }
        }
        Ok(())
    }

    /// Recompute world transforms top-down and world bounds bottom-up.
    pub fn update_geometric_state(&mut self, root: SpatialKey) {
        let parent_world = self
            .parent(root)
            .and_then(|p| self.spatials.get(p))
            .map(|p| p.world_transform);
        self.update_world(root, parent_world);

        // Ancestors enclose the refreshed subtree again
        let mut ancestor = self.parent(root);
        while let Some(key) = ancestor {
            self.merge_child_bounds(key);
            ancestor = self.parent(key);
        }
    }

    fn update_world(&mut self, key: SpatialKey, parent_world: Option<Transform>) {
        let Some(spatial) = self.spatials.get_mut(key) else {
            return;
        };
        let world = match parent_world {
            Some(parent) => spatial.local_transform.combine_with_parent(&parent),
            None => spatial.local_transform,
        };
        spatial.world_transform = world;

        match &spatial.kind {
            SpatialKind::Geometry(geometry) => {
                let model_bound = geometry.mesh().bound();
                let mut bound = if spatial.ignore_transform {
                    *model_bound
                } else {
                    model_bound.transform(&world)
                };
                if let Some(previous) = &spatial.world_bound {
                    bound.set_check_plane(previous.check_plane());
                }
                spatial.world_bound = Some(bound);
            }
            SpatialKind::Node { children } => {
                let children = children.clone();
                for child in children {
                    self.update_world(child, Some(world));
                }
                self.merge_child_bounds(key);
            }
        }
    }

    /// World bound of a node: merge of its children's bounds
    fn merge_child_bounds(&mut self, key: SpatialKey) {
        let merged = self
            .children(key)
            .iter()
            .filter_map(|&c| self.spatials.get(c)?.world_bound)
            .reduce(|acc, b| acc.merge(&b));

        if let Some(spatial) = self.spatials.get_mut(key) {
            let check_plane = spatial.world_bound.map(|b| b.check_plane());
            spatial.world_bound = merged.map(|mut bound| {
                if let Some(plane) = check_plane {
                    bound.set_check_plane(plane);
                }
                bound
            });
        }
    }

    // ===== RENDERING SUPPORT =====

    /// Cull hint after resolving `Inherit` up the hierarchy
    pub fn effective_cull_hint(&self, key: SpatialKey) -> CullHint {
        let mut current = Some(key);
        while let Some(k) = current {
            let Some(spatial) = self.spatials.get(k) else {
                break;
            };
            if spatial.cull_hint != CullHint::Inherit {
                return spatial.cull_hint;
            }
            current = spatial.parent;
        }
        CullHint::Dynamic
    }

    /// Queue bucket after resolving `Inherit` up the hierarchy
    pub fn effective_bucket(&self, key: SpatialKey) -> Bucket {
        let mut current = Some(key);
        while let Some(k) = current {
            let Some(spatial) = self.spatials.get(k) else {
                break;
            };
            if spatial.queue_bucket != Bucket::Inherit {
                return spatial.queue_bucket;
            }
            current = spatial.parent;
        }
        Bucket::Opaque
    }

    /// Decide whether a spatial is potentially visible from `camera`.
    ///
    /// `plane_state` carries the planes the ancestors were found fully
    /// inside of and gains the planes this spatial is inside of.
    pub fn check_culling(
        &mut self,
        key: SpatialKey,
        camera: &Camera,
        plane_state: &mut PlaneState,
    ) -> bool {
        let hint = self.effective_cull_hint(key);
        let gui = self.effective_bucket(key) == Bucket::Gui;
        let Some(spatial) = self.spatials.get_mut(key) else {
            return false;
        };

        match hint {
            CullHint::Always => {
                spatial.frustum_intersects = FrustumIntersect::Outside;
                false
            }
            CullHint::Never => {
                spatial.frustum_intersects = FrustumIntersect::Intersects;
                true
            }
            CullHint::Dynamic | CullHint::Inherit => {
                if gui {
                    return camera.contains_gui(spatial.world_bound.as_ref());
                }
                let result = camera.contains(spatial.world_bound.as_mut(), plane_state);
                spatial.frustum_intersects = result;
                if result == FrustumIntersect::Outside {
                    engine_trace!("galaxy3d::SceneGraph", "Culled '{}'", spatial.name);
                }
                result != FrustumIntersect::Outside
            }
        }
    }

    /// Give the controls of a spatial their per-viewport render call.
    pub fn run_control_render(
        &mut self,
        key: SpatialKey,
        renderer: &mut dyn Renderer,
        camera: &Camera,
    ) -> Result<()> {
        let Some(spatial) = self.spatials.get_mut(key) else {
            return Ok(());
        };
        if spatial.controls.is_empty() {
            return Ok(());
        }

        // Controls are out of the arena while they run, so they can borrow the scene
        let mut controls = mem::take(&mut spatial.controls);
        let mut result = Ok(());
        {
            let mut ctx = ControlRenderContext { scene: self, spatial: key, renderer, camera };
            for control in &mut controls {
                result = control.render(&mut ctx);
                if result.is_err() {
                    break;
                }
            }
        }

        if let Some(spatial) = self.spatials.get_mut(key) {
            controls.append(&mut spatial.controls);
            spatial.controls = controls;
        }
        result
    }
}

#[cfg(test)]
#[path = "scene_graph_tests.rs"]
mod tests;
