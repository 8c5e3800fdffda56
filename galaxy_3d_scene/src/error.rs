//! Error types for the Galaxy3D scene core
//!
//! This module defines the error types returned by scene traversal,
//! rendering dispatch, and the skeletal animation pipeline.

use std::fmt;

/// Result type for Galaxy3D operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Error reported by the GPU-facing renderer
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (mesh, material, skeleton data, etc.)
    InvalidResource(String),

    /// Initialization failed (renderer, processors, controls)
    InitializationFailed(String),

    /// A geometry reached the render queue without a material
    MissingMaterial(String),

    /// Operation not allowed in the current state of the object
    InvalidState(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::MissingMaterial(name) => write!(f, "No material is set for Geometry: {}", name),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Build an error, logging it at ERROR severity with file:line details.
///
/// Without a variant the error is an `Error::BackendError`. A variant
/// carrying a `String` can be selected with `Variant =>`.
///
/// # Example
///
/// ```no_run
/// # use galaxy_3d_scene::engine_err;
/// # let name = "x";
/// let err = engine_err!("galaxy3d::Skeleton", "Bone {} not found", name);
/// let err = engine_err!("galaxy3d::Bone", InvalidState => "Bone {} is not user controlled", name);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $variant:ident => $($arg:tt)+) => {{
        let message = format!($($arg)+);
        $crate::engine_error!($source, "{}", message);
        $crate::galaxy3d::Error::$variant(message)
    }};
    ($source:expr, $($arg:tt)+) => {{
        let message = format!($($arg)+);
        $crate::engine_error!($source, "{}", message);
        $crate::galaxy3d::Error::BackendError(message)
    }};
}

/// Log an error and return it from the enclosing function.
///
/// Accepts the same forms as `engine_err!`.
///
/// # Example
///
/// ```no_run
/// # use galaxy_3d_scene::engine_bail;
/// # fn f() -> galaxy_3d_scene::galaxy3d::Result<()> {
/// engine_bail!("galaxy3d::Skinning", InvalidResource => "Max weights per vertex is incorrectly set");
/// # }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($($arg:tt)+) => {
        return Err($crate::engine_err!($($arg)+))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
