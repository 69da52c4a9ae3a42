//! Streaming errors.

use vista_mesh::MeshError;
use vista_terrain::{ChunkCoord, TerrainError};

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Terrain parameters or streaming settings were rejected at construction.
    #[error("invalid terrain configuration: {0}")]
    Terrain(#[from] TerrainError),

    /// The mesh builder could not be configured.
    #[error("invalid mesh configuration: {0}")]
    Mesh(#[from] MeshError),

    /// Prefetch worker threads could not be spawned.
    #[error("failed to start prefetch workers: {0}")]
    Workers(#[source] std::io::Error),

    /// A chunk failed to generate during an update. The chunk was not inserted.
    #[error("failed to generate chunk ({}, {})", .coord.x, .coord.z)]
    Generation {
        coord: ChunkCoord,
        #[source]
        source: MeshError,
    },
}
