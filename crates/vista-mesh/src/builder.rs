//! Height field → vertex grid + triangle list, with biome-driven colouring.

use std::sync::Arc;

use glam::Vec3;
use vista_terrain::{
    BiomeKind, BiomePalette, ChunkCoord, ChunkGrid, HeightField, Rgb, TerrainSampler,
};

use crate::bounds::Aabb;
use crate::error::MeshError;
use crate::vertex::{TerrainMesh, TerrainVertex};

/// Colour that steep slopes blend toward.
pub const ROCK_COLOR: Rgb = [0.45, 0.42, 0.40];

/// Slope (rise over run, world units) above which rock shows through.
const ROCK_SLOPE: f32 = 0.5;
const MAX_ROCK_BLEND: f32 = 0.8;
/// Normals with an upward component below this darken the colour.
const STEEP_NORMAL_Y: f32 = 0.8;
const STEEP_DARKEN: f32 = 0.6;

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn lerp_rgb(a: Rgb, b: Rgb, t: f32) -> Rgb {
    [lerp(a[0], b[0], t), lerp(a[1], b[1], t), lerp(a[2], b[2], t)]
}

fn scale_rgb(c: Rgb, factor: f32) -> Rgb {
    [c[0] * factor, c[1] * factor, c[2] * factor]
}

/// Builds chunk meshes at a fixed grid resolution.
pub struct MeshBuilder {
    sampler: Arc<TerrainSampler>,
    palette: BiomePalette,
    resolution: usize,
}

impl MeshBuilder {
    pub fn new(sampler: Arc<TerrainSampler>, resolution: usize) -> Result<Self, MeshError> {
        if resolution < 2 {
            return Err(MeshError::InvalidResolution(resolution));
        }
        let vertex_count = resolution
            .checked_mul(resolution)
            .ok_or(MeshError::TooManyVertices(resolution))?;
        if vertex_count > u32::MAX as usize {
            return Err(MeshError::TooManyVertices(resolution));
        }
        Ok(Self {
            sampler,
            palette: BiomePalette::default(),
            resolution,
        })
    }

    /// Replace the biome palette.
    pub fn with_palette(mut self, palette: BiomePalette) -> Self {
        self.palette = palette;
        self
    }

    pub fn palette(&self) -> &BiomePalette {
        &self.palette
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Build the mesh for `field`, placed at `coord` in a grid of
    /// `chunk_size`-wide chunks, with heights scaled by `height_scale`.
    ///
    /// Identical inputs give byte-identical vertex and index buffers.
    pub fn build(
        &self,
        field: &HeightField,
        coord: ChunkCoord,
        chunk_size: f64,
        height_scale: f64,
    ) -> Result<TerrainMesh, MeshError> {
        let res = self.resolution;
        if field.resolution() != res {
            return Err(MeshError::ResolutionMismatch {
                expected: res,
                actual: field.resolution(),
            });
        }

        let vertex_count = res * res;
        let index_count = 6 * (res - 1) * (res - 1);
        let steps = (res - 1) as f64;
        let grid = ChunkGrid::new(coord, chunk_size, res);
        let spacing = grid.spacing() as f32;
        let heights = field.heights();

        let mut positions: Vec<Vec3> = Vec::new();
        let mut colors: Vec<Rgb> = Vec::new();
        let mut normals: Vec<Vec3> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();
        positions.try_reserve_exact(vertex_count)?;
        colors.try_reserve_exact(vertex_count)?;
        normals.try_reserve_exact(vertex_count)?;
        indices.try_reserve_exact(index_count)?;

        for j in 0..res {
            for i in 0..res {
                let (world_x, world_z) = grid.world_position(i, j);
                let h = heights[j * res + i];

                positions.push(Vec3::new(
                    world_x as f32,
                    (h as f64 * height_scale) as f32,
                    world_z as f32,
                ));

                let slope = slope_at(heights, res, i, j, spacing, height_scale as f32);
                colors.push(self.vertex_color(world_x, world_z, h, slope));
            }
        }

        for j in 0..res - 1 {
            for i in 0..res - 1 {
                let tl = (j * res + i) as u32;
                let tr = tl + 1;
                let bl = tl + res as u32;
                let br = bl + 1;
                indices.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
            }
        }

        normals.resize(vertex_count, Vec3::ZERO);
        for tri in indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        for n in &mut normals {
            *n = n.try_normalize().unwrap_or(Vec3::Y);
        }

        let mut vertices: Vec<TerrainVertex> = Vec::new();
        vertices.try_reserve_exact(vertex_count)?;
        for j in 0..res {
            for i in 0..res {
                let idx = j * res + i;
                let normal = normals[idx];
                let mut color = colors[idx];
                if normal.y < STEEP_NORMAL_Y {
                    let steepness = (STEEP_NORMAL_Y - normal.y) / STEEP_NORMAL_Y;
                    color = scale_rgb(color, lerp(1.0, STEEP_DARKEN, steepness));
                }
                vertices.push(TerrainVertex {
                    position: positions[idx].to_array(),
                    normal: normal.to_array(),
                    color: TerrainVertex::pack_color(color),
                    uv: [(i as f64 / steps) as f32, (j as f64 / steps) as f32],
                });
            }
        }

        let bounds = Aabb::from_points(positions.iter().copied())
            .unwrap_or_else(|| Aabb::new(Vec3::ZERO, Vec3::ZERO));

        tracing::trace!(
            "Built mesh for chunk ({}, {}): {} vertices, {} indices",
            coord.x,
            coord.z,
            vertices.len(),
            indices.len()
        );

        Ok(TerrainMesh {
            vertices,
            indices,
            bounds,
        })
    }

    /// Base colour of the biome at `(world_x, world_z)`, tinted by moisture,
    /// temperature, height and slope.
    fn vertex_color(&self, world_x: f64, world_z: f64, height: f32, slope: f32) -> Rgb {
        let sample = self.sampler.sample(world_x, world_z);
        let mut color = self.palette.color(sample.biome);

        if !matches!(sample.biome, BiomeKind::Ocean | BiomeKind::SnowyPeak) {
            let m = sample.moisture as f32;
            color[0] *= 1.0 - 0.25 * m;
            color[1] *= 1.0 - 0.1 * m;
            color[2] *= 1.0 - 0.2 * m;

            let cold = 1.0 - sample.temperature as f32;
            color[2] += 0.1 * cold;
            color[0] -= 0.05 * cold;
        }

        color = scale_rgb(color, lerp(0.7, 1.2, height));

        if sample.biome != BiomeKind::Ocean && slope > ROCK_SLOPE {
            let weight = (slope - ROCK_SLOPE).clamp(0.0, MAX_ROCK_BLEND);
            color = lerp_rgb(color, ROCK_COLOR, weight);
        }

        color
    }
}

/// Gradient magnitude of the height surface at `(i, j)` in world units.
/// Central differences inside the grid, one-sided on the edges.
fn slope_at(heights: &[f32], res: usize, i: usize, j: usize, spacing: f32, height_scale: f32) -> f32 {
    let at = |i: usize, j: usize| heights[j * res + i] * height_scale;

    let (x0, x1) = (i.saturating_sub(1), (i + 1).min(res - 1));
    let (z0, z1) = (j.saturating_sub(1), (j + 1).min(res - 1));
    let dx = (at(x1, j) - at(x0, j)) / ((x1 - x0) as f32 * spacing);
    let dz = (at(i, z1) - at(i, z0)) / ((z1 - z0) as f32 * spacing);

    (dx * dx + dz * dz).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_terrain::{HeightFieldGenerator, HeightFieldSettings, TerrainParams};

    fn sampler() -> Arc<TerrainSampler> {
        Arc::new(TerrainSampler::new(TerrainParams::default()).unwrap())
    }

    #[test]
    fn test_reference_chunk_counts() {
        let sampler = sampler();
        let mut generator =
            HeightFieldGenerator::new(Arc::clone(&sampler), HeightFieldSettings::default()).unwrap();
        let field = generator.height_field(ChunkCoord::new(0, 0));
        let builder = MeshBuilder::new(sampler, 64).unwrap();

        let mesh = builder.build(&field, ChunkCoord::new(0, 0), 200.0, 60.0).unwrap();
        assert_eq!(mesh.vertices.len(), 4096);
        assert_eq!(mesh.indices.len(), 23_814);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn test_normals_are_unit_length() {
        let sampler = sampler();
        let mut generator = HeightFieldGenerator::new(
            Arc::clone(&sampler),
            HeightFieldSettings {
                resolution: 24,
                ..Default::default()
            },
        )
        .unwrap();
        let builder = MeshBuilder::new(sampler, 24).unwrap();

        for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(-3, 5), ChunkCoord::new(7, -2)] {
            let field = generator.height_field(coord);
            let mesh = builder.build(&field, coord, 200.0, 60.0).unwrap();
            for v in &mesh.vertices {
                let len = Vec3::from_array(v.normal).length();
                assert!((len - 1.0).abs() < 1e-4, "normal length {len} at {coord:?}");
            }
        }
    }

    #[test]
    fn test_build_is_byte_deterministic() {
        let sampler = sampler();
        let field = vista_terrain::generate_height_field(
            &sampler,
            &ChunkGrid::new(ChunkCoord::new(2, 3), 200.0, 16),
        );
        let builder = MeshBuilder::new(sampler, 16).unwrap();

        let a = builder.build(&field, ChunkCoord::new(2, 3), 200.0, 60.0).unwrap();
        let b = builder.build(&field, ChunkCoord::new(2, 3), 200.0, 60.0).unwrap();
        assert_eq!(a.vertex_bytes(), b.vertex_bytes());
        assert_eq!(a.index_bytes(), b.index_bytes());
    }

    #[test]
    fn test_flat_field_points_up() {
        let field = HeightField::filled(ChunkCoord::new(0, 0), 5, 0.3);
        let builder = MeshBuilder::new(sampler(), 5).unwrap();
        let mesh = builder.build(&field, ChunkCoord::new(0, 0), 100.0, 50.0).unwrap();

        for v in &mesh.vertices {
            assert_eq!(v.normal, [0.0, 1.0, 0.0]);
            assert!((v.position[1] - 15.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_vertex_layout_and_uvs() {
        let field = HeightField::filled(ChunkCoord::new(1, -1), 3, 0.5);
        let builder = MeshBuilder::new(sampler(), 3).unwrap();
        let mesh = builder.build(&field, ChunkCoord::new(1, -1), 100.0, 10.0).unwrap();

        // Vertex (i, j) sits at j * res + i.
        let v = mesh.vertices[3 + 2];
        assert_eq!(v.position, [200.0, 5.0, -50.0]);
        assert_eq!(v.uv, [1.0, 0.5]);
        assert_eq!(mesh.vertices[0].uv, [0.0, 0.0]);

        assert_eq!(&mesh.indices[..6], &[0, 3, 1, 1, 3, 4]);
    }

    #[test]
    fn test_positions_follow_height_field_grid() {
        let sampler = sampler();
        let grid = ChunkGrid::new(ChunkCoord::new(-7, 3), 150.0, 9);
        let field = vista_terrain::generate_height_field(&sampler, &grid);
        let builder = MeshBuilder::new(sampler, 9).unwrap();
        let mesh = builder.build(&field, grid.coord, grid.chunk_size, 60.0).unwrap();

        for j in 0..9 {
            for i in 0..9 {
                let (x, z) = grid.world_position(i, j);
                let v = mesh.vertices[j * 9 + i];
                assert_eq!(v.position[0], x as f32, "x at ({i}, {j})");
                assert_eq!(v.position[2], z as f32, "z at ({i}, {j})");
                assert_eq!(v.position[1], (field.get(i, j) as f64 * 60.0) as f32);
            }
        }
    }

    #[test]
    fn test_bounds_cover_positions() {
        let sampler = sampler();
        let field = vista_terrain::generate_height_field(
            &sampler,
            &ChunkGrid::new(ChunkCoord::new(-1, 0), 200.0, 12),
        );
        let builder = MeshBuilder::new(sampler, 12).unwrap();
        let mesh = builder.build(&field, ChunkCoord::new(-1, 0), 200.0, 60.0).unwrap();

        assert_eq!(mesh.bounds.min.x, -200.0);
        assert_eq!(mesh.bounds.max.x, 0.0);
        assert_eq!(mesh.bounds.min.z, 0.0);
        assert_eq!(mesh.bounds.max.z, 200.0);
        for v in &mesh.vertices {
            let p = Vec3::from_array(v.position);
            assert!(p.cmpge(mesh.bounds.min).all() && p.cmple(mesh.bounds.max).all());
        }
    }

    #[test]
    fn test_steep_slopes_darken_and_rock() {
        // A ramp from 0 to 1 over one 10-unit chunk at height scale 60 is far
        // steeper than the rock threshold.
        let res = 4;
        let mut heights = Vec::new();
        for _j in 0..res {
            for i in 0..res {
                heights.push(i as f32 / (res - 1) as f32);
            }
        }
        let steep = HeightField::from_heights(ChunkCoord::new(0, 0), res, heights).unwrap();
        let flat = HeightField::filled(ChunkCoord::new(0, 0), res, 0.5);

        let builder = MeshBuilder::new(sampler(), res).unwrap();
        let steep_mesh = builder.build(&steep, ChunkCoord::new(0, 0), 10.0, 60.0).unwrap();
        let flat_mesh = builder.build(&flat, ChunkCoord::new(0, 0), 10.0, 60.0).unwrap();

        for v in &steep_mesh.vertices {
            assert!(v.normal[1] < STEEP_NORMAL_Y);
        }
        assert_ne!(steep_mesh.vertices[5].color, flat_mesh.vertices[5].color);
    }

    #[test]
    fn test_palette_override_changes_colours() {
        let field = HeightField::filled(ChunkCoord::new(0, 0), 4, 0.5);
        let sampler = sampler();
        let default_mesh = MeshBuilder::new(Arc::clone(&sampler), 4)
            .unwrap()
            .build(&field, ChunkCoord::new(0, 0), 200.0, 60.0)
            .unwrap();

        let mut palette = BiomePalette::default();
        for biome in BiomeKind::ALL {
            palette = palette.with_color(biome, [0.0, 0.0, 0.0]);
        }
        let black_mesh = MeshBuilder::new(sampler, 4)
            .unwrap()
            .with_palette(palette)
            .build(&field, ChunkCoord::new(0, 0), 200.0, 60.0)
            .unwrap();

        assert_ne!(default_mesh.vertices, black_mesh.vertices);
        for v in &black_mesh.vertices {
            // Only the cold blue shift can add colour to a black base.
            assert_eq!(v.color[0], 0);
            assert_eq!(v.color[1], 0);
        }
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            MeshBuilder::new(sampler(), 1),
            Err(MeshError::InvalidResolution(1))
        ));
        assert!(matches!(
            MeshBuilder::new(sampler(), 70_000),
            Err(MeshError::TooManyVertices(70_000))
        ));

        let builder = MeshBuilder::new(sampler(), 8).unwrap();
        let field = HeightField::filled(ChunkCoord::new(0, 0), 4, 0.2);
        assert!(matches!(
            builder.build(&field, ChunkCoord::new(0, 0), 200.0, 60.0),
            Err(MeshError::ResolutionMismatch {
                expected: 8,
                actual: 4
            })
        ));
    }
}
