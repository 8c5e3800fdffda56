//! Material module
//!
//! Material definitions with named techniques, material instances holding
//! parameter values, and the fixed-function render state.

mod render_state;
mod material_def;
mod material;

pub use render_state::{RenderState, CullMode, PolygonMode, CompareOp, BlendMode, DepthBias};
pub use material_def::{MaterialDef, TechniqueDef, DEFAULT_TECHNIQUE};
pub use material::{Material, MatParam};

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
