//! Configuration for the Vista terrain streamer.
//!
//! Settings persist to disk as a RON file, can be overridden from the command
//! line via clap, and tolerate missing or unknown fields.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{CachePolicy, Config, DebugConfig, StreamingConfig, WorldConfig, default_config_dir};
pub use error::ConfigError;
