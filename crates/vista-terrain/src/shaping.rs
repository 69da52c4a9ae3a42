//! Single-pass shaping heuristics applied to a freshly sampled height grid.
//!
//! Both passes read from a snapshot of the grid and write into it, so the
//! result does not depend on traversal order. Border cells are never touched
//! because they lack a full 4-neighbourhood, which also keeps shared chunk
//! edges identical between neighbours.

use crate::biome::{MOUNTAIN_THRESHOLD, WATER_THRESHOLD};
use crate::heightfield::ChunkGrid;
use crate::sampler::TerrainSampler;

/// Fraction of a peak's excess over its neighbourhood removed by erosion.
pub const EROSION_FACTOR: f32 = 0.2;
/// Fraction of a valley's deficit filled by deposition.
pub const DEPOSITION_FACTOR: f32 = 0.1;

/// Minimum moisture for a river to form.
pub const RIVER_MOISTURE: f64 = 0.7;
/// A neighbour must rise at least this much above the cell to count as a bank.
pub const RIVER_BANK_RISE: f32 = 0.01;
/// River noise must exceed this value.
pub const RIVER_NOISE_THRESHOLD: f64 = 0.9;
/// Depth carved into a river cell.
pub const RIVER_DEPTH: f32 = 0.1;
/// River beds never sink below this height.
pub const RIVER_BED_FLOOR: f32 = (WATER_THRESHOLD - 0.02) as f32;

/// Smooth land cells toward their 4-neighbour average.
///
/// Peaks lose [`EROSION_FACTOR`] of their excess, valleys gain
/// [`DEPOSITION_FACTOR`] of their deficit. Water cells are left alone.
pub fn erode(heights: &mut [f32], resolution: usize) {
    if resolution < 3 {
        return;
    }
    let source = heights.to_vec();
    let water = WATER_THRESHOLD as f32;

    for j in 1..resolution - 1 {
        for i in 1..resolution - 1 {
            let idx = j * resolution + i;
            let h = source[idx];
            if h <= water {
                continue;
            }

            let average = (source[idx - 1]
                + source[idx + 1]
                + source[idx - resolution]
                + source[idx + resolution])
                * 0.25;

            if h > average {
                heights[idx] = h - (h - average) * EROSION_FACTOR;
            } else if h < average {
                heights[idx] = h + (average - h) * DEPOSITION_FACTOR;
            }
        }
    }
}

/// Lower wet valley cells along river noise lines.
///
/// A cell is carved when it is land below the mountain band, has at least one
/// neighbour rising above it by [`RIVER_BANK_RISE`], its moisture exceeds
/// [`RIVER_MOISTURE`] and the river noise exceeds [`RIVER_NOISE_THRESHOLD`].
/// Carved cells drop by [`RIVER_DEPTH`], floored at [`RIVER_BED_FLOOR`].
pub fn carve_rivers(heights: &mut [f32], grid: &ChunkGrid, sampler: &TerrainSampler) {
    let resolution = grid.resolution;
    if resolution < 3 {
        return;
    }
    let source = heights.to_vec();
    let water = WATER_THRESHOLD as f32;
    let mountain = MOUNTAIN_THRESHOLD as f32;

    for j in 1..resolution - 1 {
        for i in 1..resolution - 1 {
            let idx = j * resolution + i;
            let h = source[idx];
            if h <= water || h >= mountain {
                continue;
            }

            let neighbours = [
                source[idx - 1],
                source[idx + 1],
                source[idx - resolution],
                source[idx + resolution],
            ];
            if !neighbours.iter().any(|&n| n - h > RIVER_BANK_RISE) {
                continue;
            }

            let (x, z) = grid.world_position(i, j);
            if sampler.moisture(x, z) <= RIVER_MOISTURE {
                continue;
            }
            if sampler.river_noise(x, z) <= RIVER_NOISE_THRESHOLD {
                continue;
            }

            heights[idx] = (h - RIVER_DEPTH).max(RIVER_BED_FLOOR);
        }
    }
}
