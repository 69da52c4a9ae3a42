//! Terrain construction errors.

/// Errors raised when terrain components are built from invalid parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TerrainError {
    /// Noise scale must be finite and positive.
    #[error("noise scale must be finite and > 0, got {0}")]
    InvalidScale(f64),

    /// At least one octave is required.
    #[error("octave count must be at least 1")]
    ZeroOctaves,

    /// Lacunarity must be finite and positive.
    #[error("lacunarity must be finite and > 0, got {0}")]
    InvalidLacunarity(f64),

    /// Chunk resolution must be at least 2 vertices per side.
    #[error("chunk resolution must be at least 2, got {0}")]
    InvalidResolution(usize),

    /// Chunk size must be finite and positive.
    #[error("chunk size must be finite and > 0, got {0}")]
    InvalidChunkSize(f64),

    /// The heightmap cache needs room for at least one entry.
    #[error("heightmap cache capacity must be at least 1")]
    ZeroCacheCapacity,
}
