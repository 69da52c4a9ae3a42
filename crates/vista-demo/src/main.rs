//! Headless fly-through over streamed terrain.

use std::time::Instant;

use clap::Parser;
use glam::Vec3;
use tracing::{error, info, warn};
use vista_config::{CachePolicy, CliArgs, Config, default_config_dir};
use vista_mesh::Aabb;
use vista_stream::{ChunkStreamer, StreamConfig};
use vista_terrain::{EvictionPolicy, HeightCurve, TerrainParams};

/// World units travelled per simulated step.
const FLIGHT_SPEED: f32 = 45.0;
/// Retired chunks are disposed every this many steps.
const DRAIN_INTERVAL: u32 = 10;
/// Camera height above the terrain surface.
const CAMERA_CLEARANCE: f32 = 25.0;
/// Horizontal half-extent of the box counted as near the camera.
const NEAR_RADIUS: f32 = 300.0;

fn terrain_params(config: &Config) -> TerrainParams {
    TerrainParams {
        seed: config.world.seed,
        scale: config.world.noise_scale,
        octaves: config.world.octaves,
        gain: config.world.persistence,
        lacunarity: config.world.lacunarity,
        height_scale: config.world.height_multiplier,
        curve: HeightCurve::terrain(),
    }
}

fn stream_config(config: &Config) -> StreamConfig {
    StreamConfig {
        chunk_size: config.streaming.chunk_size,
        resolution: config.streaming.chunk_resolution,
        view_distance: config.streaming.view_distance,
        cache_capacity: config.streaming.cache_capacity,
        eviction: match config.streaming.cache_policy {
            CachePolicy::Lru => EvictionPolicy::Lru,
            CachePolicy::ClearAll => EvictionPolicy::ClearAll,
        },
        prefetch_workers: config.streaming.prefetch_workers,
    }
}

/// Gently curving flight path in the XZ plane.
fn flight_position(step: u32) -> (f32, f32) {
    let t = step as f32;
    let x = t * FLIGHT_SPEED;
    let z = (t * 0.02).sin() * 900.0 + t * FLIGHT_SPEED * 0.35;
    (x, z)
}

fn fly_through(streamer: &mut ChunkStreamer, steps: u32) {
    let start = Instant::now();
    let mut created = 0usize;
    let mut prefetched = 0usize;
    let mut disposed = 0usize;
    let mut disposed_bytes = 0usize;
    let mut camera = Vec3::ZERO;

    for step in 0..steps {
        let (x, z) = flight_position(step);
        camera = Vec3::new(x, streamer.height_at(x, z) + CAMERA_CLEARANCE, z);

        match streamer.update(camera) {
            Ok(update) => {
                created += update.created.len();
                prefetched += update.prefetched;
            }
            Err(e) => warn!("Streaming update failed at step {step}: {e}"),
        }

        if step % DRAIN_INTERVAL == 0 {
            for chunk in streamer.drain_removals() {
                disposed_bytes += chunk.mesh().vertex_buffer_bytes() + chunk.mesh().index_buffer_bytes();
                disposed += 1;
            }
        }
    }
    for chunk in streamer.drain_removals() {
        disposed_bytes += chunk.mesh().vertex_buffer_bytes() + chunk.mesh().index_buffer_bytes();
        disposed += 1;
    }

    let stats = streamer.cache_stats();
    let sample = streamer.sample_at(camera.x, camera.z);
    info!(
        "Fly-through: {steps} steps in {:.2?}, {created} chunks created, {disposed} disposed ({} KiB released)",
        start.elapsed(),
        disposed_bytes / 1024
    );
    info!(
        "Live chunks: {} ({} visible), heightmap cache: {} hits / {} misses / {} evictions, {prefetched} prefetched",
        streamer.live_count(),
        streamer.visible_chunks().count(),
        stats.hits,
        stats.misses,
        stats.evictions
    );
    log_coverage(streamer, camera);
    info!(
        "Final camera at ({:.1}, {:.1}, {:.1}) over {} (moisture {:.2}, temperature {:.2})",
        camera.x,
        camera.y,
        camera.z,
        sample.biome.name(),
        sample.moisture,
        sample.temperature
    );
}

/// Extent of the visible terrain and how many chunks sit near the camera.
fn log_coverage(streamer: &ChunkStreamer, camera: Vec3) {
    let Some(bounds) = streamer.visible_bounds() else {
        return;
    };
    let center = bounds.center();
    let size = bounds.size();
    info!(
        "Visible terrain spans {:.0} x {:.0} units around ({:.0}, {:.0}), heights {:.1}..{:.1}",
        size.x, size.z, center.x, center.z, bounds.min.y, bounds.max.y
    );

    let reach = Vec3::new(NEAR_RADIUS, f32::MAX, NEAR_RADIUS);
    let near = Aabb::new(camera - reach, camera + reach);
    info!(
        "{} chunks within {NEAR_RADIUS} units of the camera",
        streamer.chunks_in(&near).count()
    );
}

fn main() {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args.config.clone().unwrap_or_else(|| {
        default_config_dir().expect("Failed to resolve config directory")
    });

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    vista_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    if let Err(e) = config.validate() {
        error!("{e}");
        std::process::exit(2);
    }

    info!(
        "Seed {}, {} octaves, view distance {}, {}x{} vertices per chunk",
        config.world.seed,
        config.world.octaves,
        config.streaming.view_distance,
        config.streaming.chunk_resolution,
        config.streaming.chunk_resolution
    );

    let mut streamer = match ChunkStreamer::new(terrain_params(&config), stream_config(&config)) {
        Ok(streamer) => streamer,
        Err(e) => {
            error!("Failed to build terrain streamer: {e}");
            std::process::exit(1);
        }
    };

    fly_through(&mut streamer, args.steps);
}
