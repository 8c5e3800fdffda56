/*!
# Galaxy 3D Scene

Scene rendering core for the Galaxy 3D engine.

This crate turns a scene graph into an ordered stream of draw commands for
a GPU-facing [`Renderer`](renderer::Renderer) and deforms skinned meshes on
the way. It does not talk to a graphics API itself; backends implement the
`Renderer` trait.

## Architecture

- **Camera**: view/projection matrices and frustum culling with a plane-state mask
- **SceneGraph**: arena of nodes and geometries with controls attached
- **RenderQueue**: per-bucket geometry lists (Opaque, Sky, Transparent, Gui, Translucent)
- **ViewPort**: a camera rendering a set of scenes, with its own queue and processors
- **RenderManager**: per-frame traversal, bucket ordering and forced state
- **Skeleton / SkinningControl**: bone hierarchy and CPU or GPU skinning
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod math;
pub mod camera;
pub mod renderer;
pub mod material;
pub mod scene;
pub mod queue;
pub mod view;
pub mod animation;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Frame orchestration
    pub use crate::view::{RenderManager, RenderManagerConfig};

    // GPU-facing command sink
    pub use crate::renderer::Renderer;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    pub mod math {
        pub use crate::math::*;
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod render {
        pub use crate::renderer::*;
        pub use crate::material::*;
        pub use crate::queue::*;
        pub use crate::view::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }

    pub mod animation {
        pub use crate::animation::*;
    }
}

// Re-export math library at crate root
pub use glam;
