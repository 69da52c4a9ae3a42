//! View-driven chunk streaming with a hysteresis band and deferred disposal.
//!
//! Chunks within `view_distance` of the viewer's chunk (Euclidean, in chunk
//! units) are visible. Chunks that drop out of view stay resident and hidden
//! until they are more than `view_distance + 2` away, at which point they
//! leave the live set and wait in a removal queue for the caller to dispose.

use std::collections::VecDeque;
use std::sync::Arc;

use glam::Vec3;
use rustc_hash::FxHashMap;
use vista_mesh::{Aabb, MeshBuilder};
use vista_terrain::{
    AsyncHeightFieldGenerator, BiomePalette, BiomeSample, CacheStats, ChunkCoord, EvictionPolicy,
    HeightFieldGenerator, HeightFieldSettings, HeightFieldTask, TerrainParams, TerrainSampler,
};

use crate::chunk::TerrainChunk;
use crate::error::StreamError;

/// Extra chunk radius beyond the view distance before hidden chunks retire.
pub const RETIRE_MARGIN: u32 = 2;

/// Submissions waiting for a prefetch worker.
const PREFETCH_QUEUE: usize = 64;

/// Grid and residency settings, fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamConfig {
    /// Edge length of a chunk in world units.
    pub chunk_size: f64,
    /// Vertices per chunk side.
    pub resolution: usize,
    /// Radius of the visible disc, in chunks.
    pub view_distance: u32,
    /// Height fields kept in memory.
    pub cache_capacity: usize,
    pub eviction: EvictionPolicy,
    /// Worker threads generating the ring just outside the view distance.
    /// `0` keeps all generation on the calling thread.
    pub prefetch_workers: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: 200.0,
            resolution: 64,
            view_distance: 6,
            cache_capacity: 20,
            eviction: EvictionPolicy::default(),
            prefetch_workers: 0,
        }
    }
}

impl StreamConfig {
    /// Radius beyond which hidden chunks are retired.
    pub fn retire_distance(&self) -> u32 {
        self.view_distance + RETIRE_MARGIN
    }
}

/// Where a coordinate is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    Absent,
    Visible,
    /// Resident but outside the view distance.
    Hidden,
    /// Retired and waiting in the removal queue.
    PendingRemoval,
}

/// What one [`ChunkStreamer::update`] did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StreamUpdate {
    /// Chunk the viewer stands in.
    pub center: ChunkCoord,
    /// `false` when the viewer stayed in the same chunk and nothing was done.
    pub changed: bool,
    pub created: Vec<ChunkCoord>,
    pub hidden: usize,
    pub retired: Vec<ChunkCoord>,
    /// Height fields from prefetch workers moved into the cache.
    pub prefetched: usize,
}

impl StreamUpdate {
    pub fn unchanged(center: ChunkCoord) -> Self {
        Self {
            center,
            ..Default::default()
        }
    }
}

/// Lattice points within `radius` of `center`, row by row.
fn disc(center: ChunkCoord, radius: u32) -> Vec<ChunkCoord> {
    let r = radius as i32;
    let r_sq = (radius as i64) * (radius as i64);
    let mut coords = Vec::new();
    for dz in -r..=r {
        for dx in -r..=r {
            if (dx as i64) * (dx as i64) + (dz as i64) * (dz as i64) <= r_sq {
                coords.push(center.offset(dx, dz));
            }
        }
    }
    coords
}

/// Owns the live chunk set and keeps it matched to a moving viewpoint.
pub struct ChunkStreamer {
    sampler: Arc<TerrainSampler>,
    heights: HeightFieldGenerator,
    mesher: MeshBuilder,
    config: StreamConfig,
    chunks: FxHashMap<ChunkCoord, TerrainChunk>,
    removals: VecDeque<TerrainChunk>,
    center: Option<ChunkCoord>,
    prefetcher: Option<AsyncHeightFieldGenerator>,
    #[cfg(test)]
    fail_at: Option<ChunkCoord>,
}

impl ChunkStreamer {
    pub fn new(params: TerrainParams, config: StreamConfig) -> Result<Self, StreamError> {
        let sampler = Arc::new(TerrainSampler::new(params)?);
        let heights = HeightFieldGenerator::new(
            Arc::clone(&sampler),
            HeightFieldSettings {
                chunk_size: config.chunk_size,
                resolution: config.resolution,
                cache_capacity: config.cache_capacity,
                eviction: config.eviction,
            },
        )?;
        let mesher = MeshBuilder::new(Arc::clone(&sampler), config.resolution)?;
        let prefetcher = match config.prefetch_workers {
            0 => None,
            workers => Some(
                AsyncHeightFieldGenerator::new(
                    Arc::clone(&sampler),
                    workers,
                    PREFETCH_QUEUE,
                    PREFETCH_QUEUE * 2,
                )
                .map_err(StreamError::Workers)?,
            ),
        };

        Ok(Self {
            sampler,
            heights,
            mesher,
            config,
            chunks: FxHashMap::default(),
            removals: VecDeque::new(),
            center: None,
            prefetcher,
            #[cfg(test)]
            fail_at: None,
        })
    }

    /// Replace the biome palette for chunks created from now on.
    pub fn with_palette(mut self, palette: BiomePalette) -> Self {
        self.mesher = self.mesher.with_palette(palette);
        self
    }

    /// Bring the live set in line with `viewpoint`.
    ///
    /// Does nothing while the viewer stays within the same chunk, apart from
    /// collecting finished prefetches. Missing chunks are all built before
    /// the live set changes: if one fails, the error is returned with every
    /// chunk's visibility and the recorded centre as they were, so the next
    /// call sweeps again.
    pub fn update(&mut self, viewpoint: Vec3) -> Result<StreamUpdate, StreamError> {
        let prefetched = self.absorb_prefetched();
        let center = ChunkCoord::from_world(
            viewpoint.x as f64,
            viewpoint.z as f64,
            self.config.chunk_size,
        );
        if self.center == Some(center) {
            return Ok(StreamUpdate {
                prefetched,
                ..StreamUpdate::unchanged(center)
            });
        }

        let in_view = disc(center, self.config.view_distance);
        let mut fresh = Vec::new();
        for &coord in &in_view {
            if !self.chunks.contains_key(&coord) {
                fresh.push(self.create_chunk(coord)?);
            }
        }

        let mut update = StreamUpdate {
            center,
            changed: true,
            prefetched,
            ..Default::default()
        };
        for chunk in self.chunks.values_mut() {
            chunk.set_visible(false);
        }
        for coord in &in_view {
            if let Some(chunk) = self.chunks.get_mut(coord) {
                chunk.set_visible(true);
            }
        }
        for chunk in fresh {
            update.created.push(chunk.coord());
            self.chunks.insert(chunk.coord(), chunk);
        }

        let retire = self.config.retire_distance() as i64;
        let retire_sq = retire * retire;
        let mut retiring: Vec<ChunkCoord> = self
            .chunks
            .values()
            .filter(|chunk| !chunk.is_visible() && chunk.coord().distance_sq(&center) > retire_sq)
            .map(TerrainChunk::coord)
            .collect();
        retiring.sort_unstable();

        for coord in &retiring {
            if let Some(chunk) = self.chunks.remove(coord) {
                tracing::debug!("Retired chunk ({}, {})", coord.x, coord.z);
                self.removals.push_back(chunk);
            }
        }
        update.retired = retiring;
        update.hidden = self.chunks.values().filter(|c| !c.is_visible()).count();

        debug_assert!(
            self.chunks
                .values()
                .all(|c| c.is_visible() || c.coord().distance_sq(&center) <= retire_sq),
            "hidden chunk left beyond the retire radius"
        );

        self.center = Some(center);
        self.prefetch_around(center);
        tracing::info!(
            "Streamed around chunk ({}, {}): {} created, {} hidden, {} retired, {} live",
            center.x,
            center.z,
            update.created.len(),
            update.hidden,
            update.retired.len(),
            self.chunks.len()
        );

        Ok(update)
    }

    fn create_chunk(&mut self, coord: ChunkCoord) -> Result<TerrainChunk, StreamError> {
        let field = self.heights.height_field(coord);
        #[cfg(test)]
        let field = match self.fail_at {
            Some(failing) if failing == coord => Arc::new(vista_terrain::HeightField::filled(
                coord,
                self.config.resolution + 1,
                0.0,
            )),
            _ => field,
        };
        let mesh = self
            .mesher
            .build(
                &field,
                coord,
                self.config.chunk_size,
                self.sampler.params().height_scale,
            )
            .map_err(|source| StreamError::Generation { coord, source })?;
        tracing::debug!("Created chunk ({}, {})", coord.x, coord.z);
        Ok(TerrainChunk::new(coord, mesh))
    }

    /// Queue the ring one chunk beyond the view distance, nearest first, and
    /// cancel prefetches that fell behind the retire radius.
    ///
    /// Any single-chunk move only brings in chunks from that ring.
    fn prefetch_around(&self, center: ChunkCoord) {
        let Some(prefetcher) = &self.prefetcher else {
            return;
        };

        let retire = self.config.retire_distance() as i64;
        for coord in prefetcher.pending_coords() {
            if coord.distance_sq(&center) > retire * retire {
                prefetcher.cancel(&coord);
            }
        }

        let view_sq = (self.config.view_distance as i64).pow(2);
        let tasks: Vec<HeightFieldTask> = disc(center, self.config.view_distance + 1)
            .into_iter()
            .filter(|coord| coord.distance_sq(&center) > view_sq)
            .filter(|coord| {
                !self.chunks.contains_key(coord)
                    && !self.heights.cache().contains(coord)
                    && !prefetcher.is_pending(coord)
            })
            .map(|coord| HeightFieldTask {
                grid: self.heights.grid(coord),
                priority: coord.distance_sq(&center) as u64,
            })
            .collect();
        if tasks.is_empty() {
            return;
        }

        let budget = self
            .config
            .cache_capacity
            .saturating_sub(prefetcher.in_flight_count() as usize);
        let queued = prefetcher.submit_batch(tasks, budget);
        tracing::debug!("Queued {queued} prefetches around chunk ({}, {})", center.x, center.z);
    }

    /// Move finished prefetches into the height-field cache. Fields for
    /// chunks that are already live are dropped. Returns how many were kept.
    pub fn absorb_prefetched(&mut self) -> usize {
        let Some(prefetcher) = &self.prefetcher else {
            return 0;
        };

        let mut absorbed = 0;
        for generated in prefetcher.drain_results() {
            if self.chunks.contains_key(&generated.coord) {
                continue;
            }
            match self.heights.insert(generated.field) {
                Ok(()) => absorbed += 1,
                Err(e) => tracing::warn!(
                    "Dropped prefetched height field for chunk ({}, {}): {e}",
                    generated.coord.x,
                    generated.coord.z
                ),
            }
        }
        absorbed
    }

    /// Prefetches queued or running on worker threads.
    pub fn prefetch_in_flight(&self) -> u64 {
        self.prefetcher
            .as_ref()
            .map_or(0, AsyncHeightFieldGenerator::in_flight_count)
    }

    /// Hand retired chunks to the caller for disposal, oldest retirement first.
    pub fn drain_removals(&mut self) -> Vec<TerrainChunk> {
        self.removals.drain(..).collect()
    }

    /// Surface height in world units at `(x, z)`, whether or not the chunk
    /// there is resident.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        self.sampler.height_at(x as f64, z as f64) as f32
    }

    /// Biome sample at `(x, z)`, whether or not the chunk there is resident.
    pub fn sample_at(&self, x: f32, z: f32) -> BiomeSample {
        self.sampler.sample(x as f64, z as f64)
    }

    /// Lifecycle state of `coord`. A live chunk wins over an older retired
    /// copy of the same coordinate still waiting in the removal queue.
    pub fn chunk_state(&self, coord: &ChunkCoord) -> ChunkState {
        match self.chunks.get(coord) {
            Some(chunk) if chunk.is_visible() => ChunkState::Visible,
            Some(_) => ChunkState::Hidden,
            None if self.removals.iter().any(|c| c.coord() == *coord) => {
                ChunkState::PendingRemoval
            }
            None => ChunkState::Absent,
        }
    }

    pub fn chunk(&self, coord: &ChunkCoord) -> Option<&TerrainChunk> {
        self.chunks.get(coord)
    }

    /// Every live chunk, visible or not.
    pub fn chunks(&self) -> impl Iterator<Item = &TerrainChunk> {
        self.chunks.values()
    }

    pub fn visible_chunks(&self) -> impl Iterator<Item = &TerrainChunk> {
        self.chunks.values().filter(|c| c.is_visible())
    }

    /// Visible chunks whose bounds overlap `region`.
    pub fn chunks_in<'a>(&'a self, region: &'a Aabb) -> impl Iterator<Item = &'a TerrainChunk> + 'a {
        self.visible_chunks().filter(move |c| c.bounds().intersects(region))
    }

    /// Box enclosing every visible chunk, or `None` before the first update.
    pub fn visible_bounds(&self) -> Option<Aabb> {
        self.visible_chunks()
            .map(|chunk| *chunk.bounds())
            .reduce(|a, b| a.union(&b))
    }

    pub fn live_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn pending_removal_count(&self) -> usize {
        self.removals.len()
    }

    /// Chunk the last successful update was centred on.
    pub fn center(&self) -> Option<ChunkCoord> {
        self.center
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn sampler(&self) -> &Arc<TerrainSampler> {
        &self.sampler
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.heights.cache_stats()
    }
}
