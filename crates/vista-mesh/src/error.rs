//! Mesh building errors.

use std::collections::TryReserveError;

/// Why a terrain mesh could not be built. No partial mesh is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    /// A grid needs at least 2 vertices per side to form a quad.
    #[error("mesh resolution must be at least 2, got {0}")]
    InvalidResolution(usize),

    /// The height field was sampled at a different resolution than the builder expects.
    #[error("height field resolution {actual} does not match mesh resolution {expected}")]
    ResolutionMismatch { expected: usize, actual: usize },

    /// `resolution²` vertices cannot be addressed with `u32` indices.
    #[error("resolution {0} produces more vertices than u32 indices can address")]
    TooManyVertices(usize),

    /// A vertex or index buffer could not be allocated.
    #[error("failed to allocate mesh buffers")]
    Allocation(#[from] TryReserveError),
}
