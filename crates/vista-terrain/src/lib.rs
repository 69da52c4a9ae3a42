//! Procedural terrain generation: seeded fractal noise, height remapping,
//! biome classification, height-field shaping and caching.

mod async_generation;
mod cache;
mod coord;
mod error;
mod height_curve;
mod heightfield;
mod noise_field;
mod sampler;

pub mod biome;
pub mod shaping;

pub use async_generation::{AsyncHeightFieldGenerator, GeneratedHeightField, HeightFieldTask};
pub use biome::{BiomeKind, BiomePalette, BiomeSample, Rgb, classify};
pub use cache::{CacheStats, EvictionPolicy, HeightmapCache};
pub use coord::ChunkCoord;
pub use error::TerrainError;
pub use height_curve::{CurvePoint, HeightCurve};
pub use heightfield::{
    ChunkGrid, HeightField, HeightFieldGenerator, HeightFieldSettings, generate_height_field,
};
pub use noise_field::{FractalType, NoiseField, NoiseKind};
pub use sampler::{TerrainParams, TerrainSampler};
