//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Vista command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "vista", about = "Streamed procedural terrain")]
pub struct CliArgs {
    /// World seed.
    #[arg(long, allow_hyphen_values = true)]
    pub seed: Option<i32>,

    /// Visible radius in chunks.
    #[arg(long)]
    pub view_distance: Option<u32>,

    /// Octaves of terrain noise.
    #[arg(long)]
    pub octaves: Option<u32>,

    /// Vertices per chunk side.
    #[arg(long)]
    pub resolution: Option<usize>,

    /// Height-field prefetch threads (0 disables).
    #[arg(long)]
    pub prefetch_workers: Option<usize>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of fly-through steps to simulate.
    #[arg(long, default_value_t = 200)]
    pub steps: u32,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.world.seed = seed;
        }
        if let Some(vd) = args.view_distance {
            self.streaming.view_distance = vd;
        }
        if let Some(octaves) = args.octaves {
            self.world.octaves = octaves;
        }
        if let Some(res) = args.resolution {
            self.streaming.chunk_resolution = res;
        }
        if let Some(workers) = args.prefetch_workers {
            self.streaming.prefetch_workers = workers;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
