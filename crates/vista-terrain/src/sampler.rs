//! Point sampling of height, moisture, temperature and biome.
//!
//! [`TerrainSampler`] owns four independently seeded noise fields (terrain,
//! detail, moisture, temperature) plus a [`HeightCurve`]. Every query is a pure
//! function of the world coordinate, independent of which chunks are loaded.

use crate::biome::{BiomeSample, classify};
use crate::error::TerrainError;
use crate::height_curve::HeightCurve;
use crate::noise_field::NoiseField;

/// Weight of the detail field added to the base height.
const DETAIL_WEIGHT: f64 = 0.1;
/// Detail field frequency relative to the terrain field.
const DETAIL_FREQUENCY: f64 = 4.0;
/// Moisture varies over twice the terrain scale.
const MOISTURE_FREQUENCY: f64 = 0.5;
/// Temperature varies over three times the terrain scale.
const TEMPERATURE_FREQUENCY: f64 = 1.0 / 3.0;
/// Temperature lost per unit of normalized height.
const ALTITUDE_COOLING: f64 = 0.3;
/// River noise is sampled at 1/8 of the detail frequency, away from the origin.
const RIVER_FREQUENCY: f64 = 0.125;
const RIVER_OFFSET: f64 = 1000.0;

/// Parameters fixed at sampler construction.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainParams {
    /// World seed. The four fields use `seed`, `seed + 1`, `seed + 2`, `seed + 3`.
    pub seed: i32,
    /// World units per unit of noise space. Larger values give broader features.
    pub scale: f64,
    /// Octaves of the terrain field. More octaves add detail and cost.
    pub octaves: u32,
    /// Amplitude multiplier between octaves (persistence).
    pub gain: f64,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
    /// World-space height of a normalized height of `1.0`.
    pub height_scale: f64,
    /// Remap applied to the normalized noise height.
    pub curve: HeightCurve,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            scale: 100.0,
            octaves: 6,
            gain: 0.5,
            lacunarity: 2.0,
            height_scale: 60.0,
            curve: HeightCurve::terrain(),
        }
    }
}

impl TerrainParams {
    /// Check the parameters without building any noise fields.
    pub fn validate(&self) -> Result<(), TerrainError> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(TerrainError::InvalidScale(self.scale));
        }
        if self.octaves == 0 {
            return Err(TerrainError::ZeroOctaves);
        }
        if !(self.lacunarity.is_finite() && self.lacunarity > 0.0) {
            return Err(TerrainError::InvalidLacunarity(self.lacunarity));
        }
        Ok(())
    }
}

/// Samples the terrain's scalar fields at world coordinates.
#[derive(Clone, Debug)]
pub struct TerrainSampler {
    params: TerrainParams,
    terrain: NoiseField,
    detail: NoiseField,
    moisture: NoiseField,
    temperature: NoiseField,
}

impl TerrainSampler {
    /// Build the four noise fields for `params`.
    pub fn new(params: TerrainParams) -> Result<Self, TerrainError> {
        params.validate()?;

        let seed = params.seed;
        let terrain = NoiseField::new(seed)
            .with_frequency(1.0)
            .with_octaves(params.octaves)
            .with_gain(params.gain)
            .with_lacunarity(params.lacunarity);
        let detail = NoiseField::new(seed.wrapping_add(1))
            .with_frequency(DETAIL_FREQUENCY)
            .with_octaves(3);
        let moisture = NoiseField::new(seed.wrapping_add(2))
            .with_frequency(MOISTURE_FREQUENCY)
            .with_octaves(4);
        let temperature = NoiseField::new(seed.wrapping_add(3))
            .with_frequency(TEMPERATURE_FREQUENCY)
            .with_octaves(3);

        Ok(Self {
            params,
            terrain,
            detail,
            moisture,
            temperature,
        })
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Normalized height in `[0, 1]` at a world coordinate.
    pub fn height(&self, world_x: f64, world_z: f64) -> f64 {
        let (nx, nz) = self.noise_coords(world_x, world_z);
        let base = self.terrain.evaluate(nx, nz);
        let detail = self.detail.evaluate(nx, nz) * DETAIL_WEIGHT;
        let normalized = to_unit(base + detail);
        self.params.curve.evaluate(normalized).clamp(0.0, 1.0)
    }

    /// Moisture in `[0, 1]` at a world coordinate.
    pub fn moisture(&self, world_x: f64, world_z: f64) -> f64 {
        let (nx, nz) = self.noise_coords(world_x, world_z);
        to_unit(self.moisture.evaluate(nx, nz))
    }

    /// Temperature in `[0, 1]` at a world coordinate whose normalized height
    /// is `height`. Higher ground is colder.
    pub fn temperature(&self, world_x: f64, world_z: f64, height: f64) -> f64 {
        let (nx, nz) = self.noise_coords(world_x, world_z);
        (to_unit(self.temperature.evaluate(nx, nz)) - height * ALTITUDE_COOLING).max(0.0)
    }

    /// Full biome sample at a world coordinate.
    pub fn sample(&self, world_x: f64, world_z: f64) -> BiomeSample {
        let height = self.height(world_x, world_z);
        let moisture = self.moisture(world_x, world_z);
        let temperature = self.temperature(world_x, world_z, height);
        BiomeSample {
            biome: classify(height, moisture, temperature),
            height,
            moisture,
            temperature,
        }
    }

    /// Surface height in world units, for placing objects on the terrain.
    pub fn height_at(&self, world_x: f64, world_z: f64) -> f64 {
        self.height(world_x, world_z) * self.params.height_scale
    }

    /// Secondary noise used to decide where rivers run, in `[0, 1]`.
    ///
    /// Peaks along the zero-crossings of the detail field, which trace thin
    /// winding lines.
    pub fn river_noise(&self, world_x: f64, world_z: f64) -> f64 {
        let (nx, nz) = self.noise_coords(world_x, world_z);
        let n = self.detail.evaluate(
            nx * RIVER_FREQUENCY + RIVER_OFFSET,
            nz * RIVER_FREQUENCY + RIVER_OFFSET,
        );
        1.0 - n.abs()
    }

    #[inline]
    fn noise_coords(&self, world_x: f64, world_z: f64) -> (f64, f64) {
        (world_x / self.params.scale, world_z / self.params.scale)
    }
}

/// Map `[-1, 1]` to `[0, 1]`, clamped.
#[inline]
fn to_unit(v: f64) -> f64 {
    ((v + 1.0) * 0.5).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::BiomeKind;

    fn sampler(seed: i32) -> TerrainSampler {
        TerrainSampler::new(TerrainParams {
            seed,
            ..Default::default()
        })
        .expect("default params are valid")
    }

    #[test]
    fn test_sample_deterministic() {
        let a = sampler(12345);
        let b = sampler(12345);
        for i in 0..500 {
            let x = i as f64 * 13.7 - 2000.0;
            let z = i as f64 * -7.9 + 500.0;
            assert_eq!(a.sample(x, z), b.sample(x, z), "mismatch at ({x}, {z})");
            assert_eq!(a.sample(x, z), a.sample(x, z));
        }
    }

    #[test]
    fn test_fields_within_unit_range() {
        let s = sampler(7);
        for xi in -30..30 {
            for zi in -30..30 {
                let sample = s.sample(xi as f64 * 41.0, zi as f64 * 37.0);
                assert!((0.0..=1.0).contains(&sample.height));
                assert!((0.0..=1.0).contains(&sample.moisture));
                assert!((0.0..=1.0).contains(&sample.temperature));
            }
        }
    }

    #[test]
    fn test_temperature_cools_with_height() {
        let s = sampler(3);
        let low = s.temperature(10.0, 20.0, 0.0);
        let high = s.temperature(10.0, 20.0, 1.0);
        assert!(high <= low);
        assert!(high >= 0.0);
        assert!(((low - high) - 0.3).abs() < 1e-12 || high == 0.0);
    }

    #[test]
    fn test_biome_matches_classification_of_fields() {
        let s = sampler(99);
        for i in 0..200 {
            let x = i as f64 * 23.0;
            let sample = s.sample(x, -x);
            assert_eq!(
                sample.biome,
                classify(sample.height, sample.moisture, sample.temperature)
            );
        }
    }

    #[test]
    fn test_height_at_scales_normalized_height() {
        let s = sampler(5);
        let h = s.height(120.0, -40.0);
        assert!((s.height_at(120.0, -40.0) - h * 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = sampler(0);
        let b = sampler(9999);
        let differs = (0..100).any(|i| {
            let x = i as f64 * 31.0;
            (a.height(x, x) - b.height(x, x)).abs() > 1e-9
        });
        assert!(differs);
    }

    #[test]
    fn test_sub_seeds_are_independent_fields() {
        let s = sampler(11);
        let differs = (0..100).any(|i| {
            let x = i as f64 * 17.0;
            (s.moisture(x, x) - s.temperature(x, x, 0.0)).abs() > 1e-9
        });
        assert!(differs, "moisture and temperature must not be the same field");
    }

    #[test]
    fn test_flat_curve_gives_constant_height() {
        let s = TerrainSampler::new(TerrainParams {
            curve: HeightCurve::from_points([(0.0, 0.5)]),
            ..Default::default()
        })
        .unwrap();
        for i in 0..50 {
            assert_eq!(s.height(i as f64 * 10.0, 3.0), 0.5);
        }
        assert_eq!(s.sample(0.0, 0.0).biome, classify(0.5, s.moisture(0.0, 0.0), s.temperature(0.0, 0.0, 0.5)));
    }

    #[test]
    fn test_empty_curve_gives_ocean() {
        let s = TerrainSampler::new(TerrainParams {
            curve: HeightCurve::new(),
            ..Default::default()
        })
        .unwrap();
        let sample = s.sample(250.0, 250.0);
        assert_eq!(sample.height, 0.0);
        assert_eq!(sample.biome, BiomeKind::Ocean);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let bad_scale = TerrainParams {
            scale: 0.0,
            ..Default::default()
        };
        assert_eq!(
            TerrainSampler::new(bad_scale).unwrap_err(),
            TerrainError::InvalidScale(0.0)
        );

        let no_octaves = TerrainParams {
            octaves: 0,
            ..Default::default()
        };
        assert_eq!(
            TerrainSampler::new(no_octaves).unwrap_err(),
            TerrainError::ZeroOctaves
        );
    }

    #[test]
    fn test_river_noise_in_unit_range() {
        let s = sampler(1);
        for i in 0..300 {
            let v = s.river_noise(i as f64 * 9.0, i as f64 * 4.0);
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
