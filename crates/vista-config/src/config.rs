//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// World generation settings.
    pub world: WorldConfig,
    /// Chunk streaming settings.
    pub streaming: StreamingConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// World generation configuration. Fixed for the lifetime of a world.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// World seed.
    pub seed: i32,
    /// World units per unit of noise space.
    pub noise_scale: f64,
    /// Octaves of the terrain noise.
    pub octaves: u32,
    /// Amplitude falloff between octaves.
    pub persistence: f64,
    /// Frequency growth between octaves.
    pub lacunarity: f64,
    /// World-space height of the highest terrain.
    pub height_multiplier: f64,
}

/// How the heightmap cache makes room.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum CachePolicy {
    #[default]
    Lru,
    ClearAll,
}

/// Chunk streaming configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    /// Chunk edge length in world units.
    pub chunk_size: f64,
    /// Vertices per chunk side.
    pub chunk_resolution: usize,
    /// Visible radius in chunks.
    pub view_distance: u32,
    /// Height fields kept in memory.
    pub cache_capacity: usize,
    pub cache_policy: CachePolicy,
    /// Threads generating height fields ahead of the viewer; 0 disables.
    pub prefetch_workers: usize,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            noise_scale: 100.0,
            octaves: 6,
            persistence: 0.5,
            lacunarity: 2.0,
            height_multiplier: 60.0,
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 200.0,
            chunk_resolution: 64,
            view_distance: 6,
            cache_capacity: 20,
            cache_policy: CachePolicy::Lru,
            prefetch_workers: 2,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Platform config directory for Vista, e.g. `~/.config/vista` on Linux.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vista"))
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be finite and > 0, got {value}"),
        })
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Reject values the terrain pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("world.noise_scale", self.world.noise_scale)?;
        positive("world.lacunarity", self.world.lacunarity)?;
        positive("streaming.chunk_size", self.streaming.chunk_size)?;
        if self.world.octaves == 0 {
            return Err(ConfigError::Invalid {
                field: "world.octaves",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.streaming.chunk_resolution < 2 {
            return Err(ConfigError::Invalid {
                field: "streaming.chunk_resolution",
                reason: format!("must be at least 2, got {}", self.streaming.chunk_resolution),
            });
        }
        if self.streaming.cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "streaming.cache_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
