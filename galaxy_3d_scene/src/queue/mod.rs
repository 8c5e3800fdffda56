//! Render queue module
//!
//! Buckets of visible geometries and the strategies used to sort them.

mod comparator;
mod render_queue;

pub use comparator::{
    SortKey, GeometryComparator, OpaqueComparator, TransparentComparator,
    GuiComparator, NullComparator,
};
pub use render_queue::{Bucket, GeometryList, GeometryRenderer, RenderQueue};

#[cfg(test)]
#[path = "render_queue_tests.rs"]
mod tests;
