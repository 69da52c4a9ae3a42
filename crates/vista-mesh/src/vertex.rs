//! Vertex and mesh data for terrain chunks, laid out for direct GPU upload.

use crate::bounds::Aabb;

/// A single terrain vertex (36 bytes).
///
/// Layout:
///   - `[0..12]`  position `[f32; 3]`, world space
///   - `[12..24]` normal `[f32; 3]`, unit length
///   - `[24..28]` color `[u8; 4]`, RGBA, alpha always 255
///   - `[28..36]` uv `[f32; 2]`, `0..=1` across the chunk
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [u8; 4],
    pub uv: [f32; 2],
}

static_assertions::assert_eq_size!(TerrainVertex, [u8; 36]);

impl TerrainVertex {
    /// Quantize a linear `[0, 1]` RGB colour into an opaque RGBA vertex colour.
    pub fn pack_color(rgb: [f32; 3]) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(rgb[0]), q(rgb[1]), q(rgb[2]), 255]
    }
}

/// The mesh of one terrain chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainMesh {
    /// Row-major vertex grid: vertex `(i, j)` is at `j * resolution + i`.
    pub vertices: Vec<TerrainVertex>,
    /// Index buffer (triangles, 3 indices per triangle).
    pub indices: Vec<u32>,
    /// Component-wise min/max over all vertex positions.
    pub bounds: Aabb,
}

impl TerrainMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Returns the size of the vertex buffer in bytes.
    pub fn vertex_buffer_bytes(&self) -> usize {
        std::mem::size_of_val(self.vertices.as_slice())
    }

    /// Returns the size of the index buffer in bytes.
    pub fn index_buffer_bytes(&self) -> usize {
        std::mem::size_of_val(self.indices.as_slice())
    }

    /// Returns the vertex data as a byte slice for GPU upload (zero-copy).
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Returns the index data as a byte slice for GPU upload (zero-copy).
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
