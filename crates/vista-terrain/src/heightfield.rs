//! Per-chunk height grids and the memoising generator that produces them.
//!
//! A chunk's grid is `resolution × resolution` samples spanning the chunk
//! edge to edge, so neighbouring chunks sample identical world positions
//! along their shared border.

use std::sync::Arc;

use crate::cache::{CacheStats, EvictionPolicy, HeightmapCache};
use crate::coord::ChunkCoord;
use crate::error::TerrainError;
use crate::sampler::TerrainSampler;
use crate::shaping::{carve_rivers, erode};

/// Sample layout of one chunk: which chunk, how large, how many samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkGrid {
    pub coord: ChunkCoord,
    /// Edge length of the chunk in world units.
    pub chunk_size: f64,
    /// Samples per side.
    pub resolution: usize,
}

impl ChunkGrid {
    pub fn new(coord: ChunkCoord, chunk_size: f64, resolution: usize) -> Self {
        Self {
            coord,
            chunk_size,
            resolution,
        }
    }

    /// World-space distance between adjacent samples.
    pub fn spacing(&self) -> f64 {
        self.chunk_size / (self.resolution.max(2) - 1) as f64
    }

    /// World `(x, z)` of sample `(i, j)`.
    ///
    /// The last sample of one chunk and the first sample of the next land on
    /// exactly the same coordinate.
    pub fn world_position(&self, i: usize, j: usize) -> (f64, f64) {
        let steps = (self.resolution.max(2) - 1) as f64;
        let x = (self.coord.x as f64 + i as f64 / steps) * self.chunk_size;
        let z = (self.coord.z as f64 + j as f64 / steps) * self.chunk_size;
        (x, z)
    }
}

/// Normalized heights for one chunk, row-major with `z` as the row index.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightField {
    coord: ChunkCoord,
    resolution: usize,
    heights: Vec<f32>,
}

impl HeightField {
    /// Wrap an existing grid. `heights.len()` must equal `resolution²`.
    pub fn from_heights(
        coord: ChunkCoord,
        resolution: usize,
        heights: Vec<f32>,
    ) -> Result<Self, TerrainError> {
        if resolution < 2 || heights.len() != resolution * resolution {
            return Err(TerrainError::InvalidResolution(resolution));
        }
        Ok(Self {
            coord,
            resolution,
            heights,
        })
    }

    /// A grid with every sample set to `value`.
    pub fn filled(coord: ChunkCoord, resolution: usize, value: f32) -> Self {
        Self {
            coord,
            resolution,
            heights: vec![value; resolution * resolution],
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    /// Height at sample `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if `i` or `j` is out of range.
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.heights[j * self.resolution + i]
    }
}

/// Sample and shape the height grid for one chunk.
///
/// Pure: the same sampler and grid always give the same field, on any thread.
pub fn generate_height_field(sampler: &TerrainSampler, grid: &ChunkGrid) -> HeightField {
    let resolution = grid.resolution;
    let mut heights = Vec::with_capacity(resolution * resolution);

    for j in 0..resolution {
        for i in 0..resolution {
            let (x, z) = grid.world_position(i, j);
            heights.push(sampler.height(x, z) as f32);
        }
    }

    erode(&mut heights, resolution);
    carve_rivers(&mut heights, grid, sampler);

    HeightField {
        coord: grid.coord,
        resolution,
        heights,
    }
}

/// Grid and cache settings for a [`HeightFieldGenerator`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightFieldSettings {
    pub chunk_size: f64,
    pub resolution: usize,
    pub cache_capacity: usize,
    pub eviction: EvictionPolicy,
}

impl Default for HeightFieldSettings {
    fn default() -> Self {
        Self {
            chunk_size: 200.0,
            resolution: 64,
            cache_capacity: HeightmapCache::DEFAULT_CAPACITY,
            eviction: EvictionPolicy::default(),
        }
    }
}

impl HeightFieldSettings {
    pub fn validate(&self) -> Result<(), TerrainError> {
        if !(self.chunk_size.is_finite() && self.chunk_size > 0.0) {
            return Err(TerrainError::InvalidChunkSize(self.chunk_size));
        }
        if self.resolution < 2 {
            return Err(TerrainError::InvalidResolution(self.resolution));
        }
        if self.cache_capacity == 0 {
            return Err(TerrainError::ZeroCacheCapacity);
        }
        Ok(())
    }
}

/// Produces height fields per chunk, memoised through a [`HeightmapCache`].
pub struct HeightFieldGenerator {
    sampler: Arc<TerrainSampler>,
    settings: HeightFieldSettings,
    cache: HeightmapCache,
}

impl HeightFieldGenerator {
    pub fn new(
        sampler: Arc<TerrainSampler>,
        settings: HeightFieldSettings,
    ) -> Result<Self, TerrainError> {
        settings.validate()?;
        let cache = HeightmapCache::new(settings.cache_capacity, settings.eviction)?;
        Ok(Self {
            sampler,
            settings,
            cache,
        })
    }

    /// The height field for `coord`, generated on first request.
    pub fn height_field(&mut self, coord: ChunkCoord) -> Arc<HeightField> {
        if let Some(field) = self.cache.get(&coord) {
            return field;
        }

        let field = Arc::new(generate_height_field(&self.sampler, &self.grid(coord)));
        tracing::trace!("Generated height field for chunk ({}, {})", coord.x, coord.z);
        self.cache.insert(Arc::clone(&field));
        field
    }

    /// Cache a field produced elsewhere, e.g. on a worker thread, so the next
    /// request for its chunk is a hit.
    pub fn insert(&mut self, field: HeightField) -> Result<(), TerrainError> {
        if field.resolution() != self.settings.resolution {
            return Err(TerrainError::InvalidResolution(field.resolution()));
        }
        let coord = field.coord();
        self.cache.insert(Arc::new(field));
        tracing::trace!("Cached prefetched height field for chunk ({}, {})", coord.x, coord.z);
        Ok(())
    }

    /// Sample layout used for `coord`.
    pub fn grid(&self, coord: ChunkCoord) -> ChunkGrid {
        ChunkGrid::new(coord, self.settings.chunk_size, self.settings.resolution)
    }

    pub fn sampler(&self) -> &Arc<TerrainSampler> {
        &self.sampler
    }

    pub fn settings(&self) -> &HeightFieldSettings {
        &self.settings
    }

    pub fn cache(&self) -> &HeightmapCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::TerrainParams;

    fn generator(resolution: usize, capacity: usize, eviction: EvictionPolicy) -> HeightFieldGenerator {
        let sampler = Arc::new(TerrainSampler::new(TerrainParams::default()).unwrap());
        HeightFieldGenerator::new(
            sampler,
            HeightFieldSettings {
                chunk_size: 200.0,
                resolution,
                cache_capacity: capacity,
                eviction,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_reference_chunk_is_memoised_and_stable() {
        let mut generator = generator(64, 20, EvictionPolicy::Lru);
        let a = generator.height_field(ChunkCoord::new(0, 0));
        let b = generator.height_field(ChunkCoord::new(0, 0));

        assert_eq!(a.resolution(), 64);
        assert_eq!(a.heights().len(), 64 * 64);
        assert_eq!(*a, *b);
        assert!(Arc::ptr_eq(&a, &b), "second request should hit the cache");
        assert_eq!(generator.cache_stats().hits, 1);
        assert_eq!(generator.cache_stats().misses, 1);
    }

    #[test]
    fn test_regenerated_after_eviction_is_identical() {
        let mut generator = generator(16, 2, EvictionPolicy::ClearAll);
        let first = generator.height_field(ChunkCoord::new(3, -4));
        generator.height_field(ChunkCoord::new(0, 0));
        generator.height_field(ChunkCoord::new(1, 0));
        assert!(!generator.cache().contains(&ChunkCoord::new(3, -4)));

        let again = generator.height_field(ChunkCoord::new(3, -4));
        assert!(!Arc::ptr_eq(&first, &again));
        assert_eq!(*first, *again);
    }

    #[test]
    fn test_heights_in_unit_range() {
        let mut generator = generator(32, 20, EvictionPolicy::Lru);
        for x in -2..2 {
            for z in -2..2 {
                let field = generator.height_field(ChunkCoord::new(x, z));
                assert!(field.heights().iter().all(|h| (0.0..=1.0).contains(h)));
            }
        }
    }

    #[test]
    fn test_cache_bound_over_many_requests() {
        let mut generator = generator(8, 20, EvictionPolicy::ClearAll);
        for i in 0..60 {
            generator.height_field(ChunkCoord::new(i % 9, i / 9));
            assert!(generator.cache().len() <= 20);
        }
    }

    #[test]
    fn test_neighbouring_chunks_share_border_samples() {
        let grid_a = ChunkGrid::new(ChunkCoord::new(0, 0), 200.0, 16);
        let grid_b = ChunkGrid::new(ChunkCoord::new(1, 0), 200.0, 16);
        for j in 0..16 {
            assert_eq!(grid_a.world_position(15, j), grid_b.world_position(0, j));
        }

        // Border cells are untouched by shaping, so shared edges match exactly.
        let mut generator = generator(16, 20, EvictionPolicy::Lru);
        let a = generator.height_field(ChunkCoord::new(0, 0));
        let b = generator.height_field(ChunkCoord::new(1, 0));
        for j in 0..16 {
            assert_eq!(a.get(15, j), b.get(0, j), "seam mismatch at row {j}");
        }
    }

    #[test]
    fn test_inserted_field_served_from_cache() {
        let mut generator = generator(16, 20, EvictionPolicy::Lru);
        let coord = ChunkCoord::new(-6, 11);
        let field = generate_height_field(generator.sampler(), &generator.grid(coord));
        generator.insert(field.clone()).unwrap();

        let served = generator.height_field(coord);
        assert_eq!(*served, field);
        assert_eq!(generator.cache_stats().hits, 1);
        assert_eq!(generator.cache_stats().misses, 0);

        assert_eq!(
            generator.insert(HeightField::filled(coord, 8, 0.0)),
            Err(TerrainError::InvalidResolution(8))
        );
    }

    #[test]
    fn test_from_heights_validates_length() {
        assert!(HeightField::from_heights(ChunkCoord::default(), 3, vec![0.0; 9]).is_ok());
        assert_eq!(
            HeightField::from_heights(ChunkCoord::default(), 3, vec![0.0; 8]).unwrap_err(),
            TerrainError::InvalidResolution(3)
        );
        assert!(HeightField::from_heights(ChunkCoord::default(), 1, vec![0.0; 1]).is_err());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let sampler = Arc::new(TerrainSampler::new(TerrainParams::default()).unwrap());
        let result = HeightFieldGenerator::new(
            Arc::clone(&sampler),
            HeightFieldSettings {
                resolution: 1,
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(TerrainError::InvalidResolution(1))));

        let result = HeightFieldGenerator::new(
            sampler,
            HeightFieldSettings {
                chunk_size: -5.0,
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(TerrainError::InvalidChunkSize(_))));
    }

    #[test]
    fn test_grid_matches_direct_sampling_on_border() {
        let sampler = TerrainSampler::new(TerrainParams::default()).unwrap();
        let grid = ChunkGrid::new(ChunkCoord::new(-1, 2), 200.0, 12);
        let field = generate_height_field(&sampler, &grid);
        for i in 0..12 {
            let (x, z) = grid.world_position(i, 0);
            assert_eq!(field.get(i, 0), sampler.height(x, z) as f32);
        }
    }
}
