//! Bounded cache of generated height fields keyed by [`ChunkCoord`].

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::coord::ChunkCoord;
use crate::error::TerrainError;
use crate::heightfield::HeightField;

/// What happens when an insert would exceed the cache capacity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Evict the least-recently-used entry.
    #[default]
    Lru,
    /// Drop every entry, then insert. Thrashes once more than `capacity`
    /// distinct chunks are in rotation.
    ClearAll,
}

/// Hit/miss/eviction counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct CacheEntry {
    field: Arc<HeightField>,
    last_used: u64,
}

/// Maps chunk coordinates to shared height fields, never holding more than
/// `capacity` entries.
pub struct HeightmapCache {
    entries: FxHashMap<ChunkCoord, CacheEntry>,
    capacity: usize,
    policy: EvictionPolicy,
    clock: u64,
    stats: CacheStats,
}

impl HeightmapCache {
    /// Default number of cached height fields.
    pub const DEFAULT_CAPACITY: usize = 20;

    pub fn new(capacity: usize, policy: EvictionPolicy) -> Result<Self, TerrainError> {
        if capacity == 0 {
            return Err(TerrainError::ZeroCacheCapacity);
        }
        Ok(Self {
            entries: FxHashMap::default(),
            capacity,
            policy,
            clock: 0,
            stats: CacheStats::default(),
        })
    }

    /// Look up a height field, marking it as recently used.
    pub fn get(&mut self, coord: &ChunkCoord) -> Option<Arc<HeightField>> {
        self.clock += 1;
        match self.entries.get_mut(coord) {
            Some(entry) => {
                entry.last_used = self.clock;
                self.stats.hits += 1;
                Some(Arc::clone(&entry.field))
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Insert a height field under its own coordinate, evicting per policy
    /// when the cache is full. Replacing an existing entry never evicts.
    pub fn insert(&mut self, field: Arc<HeightField>) {
        self.clock += 1;
        let coord = field.coord();

        if !self.entries.contains_key(&coord) && self.entries.len() >= self.capacity {
            self.evict();
        }

        self.entries.insert(
            coord,
            CacheEntry {
                field,
                last_used: self.clock,
            },
        );
        debug_assert!(self.entries.len() <= self.capacity);
    }

    fn evict(&mut self) {
        match self.policy {
            EvictionPolicy::ClearAll => {
                tracing::debug!(
                    "Heightmap cache full ({} entries), clearing",
                    self.entries.len()
                );
                self.stats.evictions += self.entries.len() as u64;
                self.entries.clear();
            }
            EvictionPolicy::Lru => {
                let oldest = self
                    .entries
                    .iter()
                    .min_by_key(|(coord, entry)| (entry.last_used, **coord))
                    .map(|(coord, _)| *coord);
                if let Some(coord) = oldest {
                    self.entries.remove(&coord);
                    self.stats.evictions += 1;
                }
            }
        }
    }

    pub fn contains(&self, coord: &ChunkCoord) -> bool {
        self.entries.contains_key(coord)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(x: i32, z: i32) -> Arc<HeightField> {
        Arc::new(HeightField::filled(ChunkCoord::new(x, z), 2, 0.5))
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            HeightmapCache::new(0, EvictionPolicy::Lru),
            Err(TerrainError::ZeroCacheCapacity)
        ));
    }

    #[test]
    fn test_insert_then_get() {
        let mut cache = HeightmapCache::new(4, EvictionPolicy::Lru).unwrap();
        cache.insert(field(1, 2));
        let got = cache.get(&ChunkCoord::new(1, 2));
        assert!(got.is_some());
        assert!(cache.get(&ChunkCoord::new(2, 1)).is_none());
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        for policy in [EvictionPolicy::Lru, EvictionPolicy::ClearAll] {
            let mut cache = HeightmapCache::new(20, policy).unwrap();
            for i in 0..200 {
                cache.insert(field(i % 37, i / 37));
                assert!(cache.len() <= 20, "{policy:?} exceeded capacity");
            }
        }
    }

    #[test]
    fn test_clear_all_policy_empties_before_insert() {
        let mut cache = HeightmapCache::new(3, EvictionPolicy::ClearAll).unwrap();
        cache.insert(field(0, 0));
        cache.insert(field(1, 0));
        cache.insert(field(2, 0));
        assert_eq!(cache.len(), 3);

        cache.insert(field(3, 0));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&ChunkCoord::new(3, 0)));
        assert!(!cache.contains(&ChunkCoord::new(0, 0)));
        assert_eq!(cache.stats().evictions, 3);
    }

    #[test]
    fn test_lru_evicts_least_recently_used() {
        let mut cache = HeightmapCache::new(3, EvictionPolicy::Lru).unwrap();
        cache.insert(field(0, 0));
        cache.insert(field(1, 0));
        cache.insert(field(2, 0));

        // Touch (0,0) so (1,0) becomes the oldest.
        assert!(cache.get(&ChunkCoord::new(0, 0)).is_some());
        cache.insert(field(3, 0));

        assert_eq!(cache.len(), 3);
        assert!(cache.contains(&ChunkCoord::new(0, 0)));
        assert!(!cache.contains(&ChunkCoord::new(1, 0)));
        assert!(cache.contains(&ChunkCoord::new(2, 0)));
        assert!(cache.contains(&ChunkCoord::new(3, 0)));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_reinsert_existing_does_not_evict() {
        let mut cache = HeightmapCache::new(2, EvictionPolicy::ClearAll).unwrap();
        cache.insert(field(0, 0));
        cache.insert(field(1, 0));
        cache.insert(field(1, 0));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 0);
    }
}
