/// Render queue - per-frame buckets of visible geometries.
///
/// Scene traversal drops every visible geometry into the bucket it
/// belongs to. The render manager then sorts and draws the buckets in a
/// fixed order, with a different depth range for the sky and GUI.

use crate::camera::Camera;
use crate::error::Result;
use crate::engine_bail;
use crate::queue::{
    GeometryComparator, GuiComparator, NullComparator, OpaqueComparator, SortKey,
    TransparentComparator,
};
use crate::scene::{SceneGraph, SpatialKey};

/// Queue a geometry is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Bucket {
    /// Solid geometry, drawn first, front to back
    Opaque,
    /// Blended geometry, drawn back to front after the sky
    Transparent,
    /// Drawn at the far plane, behind everything else
    Sky,
    /// Drawn after the scene processors' post-frame pass
    Translucent,
    /// Screen-space overlay with an orthographic projection
    Gui,
    /// Use the parent's bucket (`Opaque` at the root)
    #[default]
    Inherit,
}

/// Something that can draw a queued geometry.
pub trait GeometryRenderer {
    fn render_geometry(&mut self, scene: &SceneGraph, geometry: SpatialKey) -> Result<()>;
}

// ============================================================================
// GeometryList
// ============================================================================

/// Sortable list of queued geometries.
pub struct GeometryList {
    geometries: Vec<SpatialKey>,
    comparator: Box<dyn GeometryComparator>,
}

impl GeometryList {
    pub fn new(comparator: Box<dyn GeometryComparator>) -> Self {
        Self { geometries: Vec::new(), comparator }
    }

    pub fn add(&mut self, geometry: SpatialKey) {
        self.geometries.push(geometry);
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<SpatialKey> {
        self.geometries.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = SpatialKey> + '_ {
        self.geometries.iter().copied()
    }

    pub fn clear(&mut self) {
        self.geometries.clear();
    }

    pub fn set_comparator(&mut self, comparator: Box<dyn GeometryComparator>) {
        self.comparator = comparator;
    }

    /// Order the list for `camera`. Equal keys keep insertion order.
    pub fn sort(&mut self, scene: &SceneGraph, camera: &Camera) {
        if self.geometries.len() < 2 {
            return;
        }
        let mut keyed: Vec<(SortKey, SpatialKey)> = self
            .geometries
            .iter()
            .map(|&g| (self.comparator.sort_key(scene, g, camera), g))
            .collect();
        keyed.sort_by(|a, b| a.0.compare(&b.0));

        for (slot, (_, geometry)) in self.geometries.iter_mut().zip(keyed) {
            *slot = geometry;
        }
    }
}

// ============================================================================
// RenderQueue
// ============================================================================

pub struct RenderQueue {
    opaque: GeometryList,
    transparent: GeometryList,
    sky: GeometryList,
    translucent: GeometryList,
    gui: GeometryList,
}

impl Default for RenderQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderQueue {
    pub fn new() -> Self {
        Self {
            opaque: GeometryList::new(Box::new(OpaqueComparator)),
            transparent: GeometryList::new(Box::new(TransparentComparator)),
            sky: GeometryList::new(Box::new(NullComparator)),
            translucent: GeometryList::new(Box::new(TransparentComparator)),
            gui: GeometryList::new(Box::new(GuiComparator)),
        }
    }

    pub fn geometry_list(&self, bucket: Bucket) -> Option<&GeometryList> {
        match bucket {
            Bucket::Opaque => Some(&self.opaque),
            Bucket::Transparent => Some(&self.transparent),
            Bucket::Sky => Some(&self.sky),
            Bucket::Translucent => Some(&self.translucent),
            Bucket::Gui => Some(&self.gui),
            Bucket::Inherit => None,
        }
    }

    fn list_mut(&mut self, bucket: Bucket) -> Result<&mut GeometryList> {
        match bucket {
            Bucket::Opaque => Ok(&mut self.opaque),
            Bucket::Transparent => Ok(&mut self.transparent),
            Bucket::Sky => Ok(&mut self.sky),
            Bucket::Translucent => Ok(&mut self.translucent),
            Bucket::Gui => Ok(&mut self.gui),
            Bucket::Inherit => {
                engine_bail!("galaxy3d::RenderQueue", InvalidState =>
                    "Bucket::Inherit must be resolved before queueing");
            }
        }
    }

    /// Replace the sort strategy of a bucket
    pub fn set_geometry_comparator(
        &mut self,
        bucket: Bucket,
        comparator: Box<dyn GeometryComparator>,
    ) -> Result<()> {
        self.list_mut(bucket)?.set_comparator(comparator);
        Ok(())
    }

    /// Add a geometry to the end of a bucket.
    pub fn add_to_queue(&mut self, geometry: SpatialKey, bucket: Bucket) -> Result<()> {
        self.list_mut(bucket)?.add(geometry);
        Ok(())
    }

    pub fn is_queue_empty(&self, bucket: Bucket) -> bool {
        self.geometry_list(bucket).map_or(true, GeometryList::is_empty)
    }

    /// Sort a bucket for `camera` and draw it through `target`.
    ///
    /// With `flush` the bucket is emptied afterwards.
    pub fn render_queue(
        &mut self,
        bucket: Bucket,
        target: &mut dyn GeometryRenderer,
        scene: &SceneGraph,
        camera: &Camera,
        flush: bool,
    ) -> Result<()> {
        let list = self.list_mut(bucket)?;
        list.sort(scene, camera);
        for geometry in list.iter() {
            target.render_geometry(scene, geometry)?;
        }
        if flush {
            list.clear();
        }
        Ok(())
    }

    /// Empty every bucket
    pub fn clear(&mut self) {
        self.opaque.clear();
        self.transparent.clear();
        self.sky.clear();
        self.translucent.clear();
        self.gui.clear();
    }
}
