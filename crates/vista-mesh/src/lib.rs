//! Terrain chunk meshing: height grids to coloured, lit triangle meshes ready
//! for GPU upload.

pub mod bounds;
pub mod builder;
pub mod error;
pub mod vertex;
pub mod vertex_format;

pub use bounds::Aabb;
pub use builder::{MeshBuilder, ROCK_COLOR};
pub use error::MeshError;
pub use vertex::{TerrainMesh, TerrainVertex};
pub use vertex_format::{TERRAIN_VERTEX_ATTRIBUTES, TERRAIN_VERTEX_LAYOUT, terrain_vertex_buffer_layout};
