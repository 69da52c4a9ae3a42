//! Streams terrain chunks around a moving viewpoint.

mod chunk;
mod error;
mod streamer;

pub use chunk::TerrainChunk;
pub use error::StreamError;
pub use streamer::{ChunkState, ChunkStreamer, RETIRE_MARGIN, StreamConfig, StreamUpdate};
