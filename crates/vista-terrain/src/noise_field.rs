//! Seeded 2D fractal noise.
//!
//! A [`NoiseField`] is an immutable description of a scalar noise source:
//! seed, frequency, base noise kind and fractal composition. Evaluation is a
//! pure function of `(x, y)`, so a field can be shared read-only between
//! threads. Changing a parameter produces a new field through the `with_*`
//! builders; derived state (the fractal bounding and per-octave simplex
//! tables) is rebuilt there and nowhere else.

use std::sync::LazyLock;

use noise::{NoiseFn, OpenSimplex};

const PRIME_X: i32 = 501_125_321;
const PRIME_Y: i32 = 1_136_930_381;
const HASH_MULTIPLIER: i32 = 0x27d4_eb2d;

/// Brings single-octave gradient noise back to roughly `[-1, 1]`.
const PERLIN_SCALE: f64 = 1.424_769_110_467_781_3;

/// `0.5 * (sqrt(3) - 1)`.
const SIMPLEX_SKEW: f64 = 0.366_025_403_784_438_6;

const GRADIENT_COUNT: usize = 128;

/// Unit gradients evenly spread around the circle.
///
/// Built with `libm` so the table is bit-identical on every platform.
static GRADIENTS: LazyLock<[[f64; 2]; GRADIENT_COUNT]> = LazyLock::new(|| {
    let mut table = [[0.0; 2]; GRADIENT_COUNT];
    for (i, gradient) in table.iter_mut().enumerate() {
        let angle = (i as f64 + 0.5) * std::f64::consts::TAU / GRADIENT_COUNT as f64;
        *gradient = [libm::cos(angle), libm::sin(angle)];
    }
    table
});

/// Base noise evaluated once per octave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NoiseKind {
    /// Hashed-gradient lattice noise with quintic interpolation.
    #[default]
    Perlin,
    /// Simplex-family noise. The input domain is skewed before sampling to
    /// break up axis-aligned artifacts.
    OpenSimplex2,
}

/// How octaves are combined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FractalType {
    /// Single octave, no fractal sum.
    None,
    /// Fractional Brownian motion: plain sum of octaves.
    #[default]
    FBm,
    /// Inverted, square-biased octaves producing sharp ridgelines.
    Ridged,
    /// Octaves folded into a triangular wave, producing banded patterns.
    PingPong,
}

/// Immutable seeded noise generator.
#[derive(Clone, Debug)]
pub struct NoiseField {
    seed: i32,
    frequency: f64,
    kind: NoiseKind,
    fractal: FractalType,
    octaves: u32,
    lacunarity: f64,
    gain: f64,
    weighted_strength: f64,
    ping_pong_strength: f64,
    fractal_bounding: f64,
    simplex: Vec<OpenSimplex>,
}

impl NoiseField {
    /// Create a field with the default parameters: Perlin base noise, FBm
    /// with 3 octaves, frequency 0.01, lacunarity 2 and gain 0.5.
    pub fn new(seed: i32) -> Self {
        Self {
            seed,
            frequency: 0.01,
            kind: NoiseKind::Perlin,
            fractal: FractalType::FBm,
            octaves: 3,
            lacunarity: 2.0,
            gain: 0.5,
            weighted_strength: 0.0,
            ping_pong_strength: 2.0,
            fractal_bounding: 0.0,
            simplex: Vec::new(),
        }
        .rebuild()
    }

    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_kind(mut self, kind: NoiseKind) -> Self {
        self.kind = kind;
        self.rebuild()
    }

    pub fn with_fractal(mut self, fractal: FractalType) -> Self {
        self.fractal = fractal;
        self.rebuild()
    }

    /// Set the octave count. Zero is treated as one.
    pub fn with_octaves(mut self, octaves: u32) -> Self {
        self.octaves = octaves.max(1);
        self.rebuild()
    }

    pub fn with_lacunarity(mut self, lacunarity: f64) -> Self {
        self.lacunarity = lacunarity;
        self
    }

    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self.rebuild()
    }

    /// Weight each octave's amplitude by the previous octave's value.
    /// `0.0` disables weighting.
    pub fn with_weighted_strength(mut self, weighted_strength: f64) -> Self {
        self.weighted_strength = weighted_strength;
        self
    }

    pub fn with_ping_pong_strength(mut self, strength: f64) -> Self {
        self.ping_pong_strength = strength;
        self
    }

    pub fn seed(&self) -> i32 {
        self.seed
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn kind(&self) -> NoiseKind {
        self.kind
    }

    pub fn fractal(&self) -> FractalType {
        self.fractal
    }

    pub fn octaves(&self) -> u32 {
        self.octaves
    }

    pub fn lacunarity(&self) -> f64 {
        self.lacunarity
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Normalisation applied to the first octave so the fractal sum stays
    /// within `[-1, 1]` regardless of octave count.
    pub fn fractal_bounding(&self) -> f64 {
        self.fractal_bounding
    }

    /// Evaluate the field at `(x, y)`. The result lies in `[-1, 1]`.
    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        let mut x = x * self.frequency;
        let mut y = y * self.frequency;

        if self.kind == NoiseKind::OpenSimplex2 {
            let t = (x + y) * SIMPLEX_SKEW;
            x += t;
            y += t;
        }

        let value = match self.fractal {
            FractalType::None => self.single(0, x, y),
            FractalType::FBm => self.fbm(x, y),
            FractalType::Ridged => self.ridged(x, y),
            FractalType::PingPong => self.ping_pong(x, y),
        };

        value.clamp(-1.0, 1.0)
    }

    fn rebuild(mut self) -> Self {
        self.fractal_bounding = fractal_bounding(self.gain, self.octaves);
        self.simplex = match self.kind {
            NoiseKind::Perlin => Vec::new(),
            NoiseKind::OpenSimplex2 => (0..self.octave_count())
                .map(|octave| OpenSimplex::new(self.seed.wrapping_add(octave as i32) as u32))
                .collect(),
        };
        self
    }

    fn octave_count(&self) -> u32 {
        match self.fractal {
            FractalType::None => 1,
            _ => self.octaves,
        }
    }

    fn single(&self, octave: u32, x: f64, y: f64) -> f64 {
        match self.kind {
            NoiseKind::Perlin => perlin(self.seed.wrapping_add(octave as i32), x, y),
            NoiseKind::OpenSimplex2 => self.simplex[octave as usize].get([x, y]),
        }
    }

    fn fbm(&self, mut x: f64, mut y: f64) -> f64 {
        let mut sum = 0.0;
        let mut amp = self.fractal_bounding;

        for octave in 0..self.octaves {
            let noise = self.single(octave, x, y);
            sum += noise * amp;
            amp *= lerp(1.0, (noise + 1.0).min(2.0) * 0.5, self.weighted_strength);

            x *= self.lacunarity;
            y *= self.lacunarity;
            amp *= self.gain;
        }

        sum
    }

    fn ridged(&self, mut x: f64, mut y: f64) -> f64 {
        let mut sum = 0.0;
        let mut amp = self.fractal_bounding;

        for octave in 0..self.octaves {
            let ridge = 1.0 - self.single(octave, x, y).abs();
            sum += (ridge * ridge * 2.0 - 1.0) * amp;
            amp *= lerp(1.0, ridge, self.weighted_strength);

            x *= self.lacunarity;
            y *= self.lacunarity;
            amp *= self.gain;
        }

        sum
    }

    fn ping_pong(&self, mut x: f64, mut y: f64) -> f64 {
        let mut sum = 0.0;
        let mut amp = self.fractal_bounding;

        for octave in 0..self.octaves {
            let folded = fold(
                (self.single(octave, x, y) + 1.0) * self.ping_pong_strength,
            );
            sum += (folded - 0.5) * 2.0 * amp;
            amp *= lerp(1.0, folded, self.weighted_strength);

            x *= self.lacunarity;
            y *= self.lacunarity;
            amp *= self.gain;
        }

        sum
    }
}

/// `1 / (1 + |g| + |g|^2 + ... + |g|^(octaves - 1))`.
fn fractal_bounding(gain: f64, octaves: u32) -> f64 {
    let gain = gain.abs();
    let mut amp = gain;
    let mut total = 1.0;
    for _ in 1..octaves {
        total += amp;
        amp *= gain;
    }
    1.0 / total
}

/// Fold `t >= 0` into a triangular wave with period 2 and range `[0, 1]`.
fn fold(t: f64) -> f64 {
    let t = t - (t * 0.5).trunc() * 2.0;
    if t < 1.0 { t } else { 2.0 - t }
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

#[inline]
fn quintic(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn gradient_dot(seed: i32, x_primed: i32, y_primed: i32, xd: f64, yd: f64) -> f64 {
    let mut hash = (seed ^ x_primed ^ y_primed).wrapping_mul(HASH_MULTIPLIER);
    hash ^= hash >> 15;
    let gradient = GRADIENTS[(hash as u32 as usize) & (GRADIENT_COUNT - 1)];
    xd * gradient[0] + yd * gradient[1]
}

fn perlin(seed: i32, x: f64, y: f64) -> f64 {
    let x_floor = x.floor();
    let y_floor = y.floor();

    let xd0 = x - x_floor;
    let yd0 = y - y_floor;
    let xd1 = xd0 - 1.0;
    let yd1 = yd0 - 1.0;

    let xs = quintic(xd0);
    let ys = quintic(yd0);

    let x0 = (x_floor as i32).wrapping_mul(PRIME_X);
    let y0 = (y_floor as i32).wrapping_mul(PRIME_Y);
    let x1 = x0.wrapping_add(PRIME_X);
    let y1 = y0.wrapping_add(PRIME_Y);

    let xf0 = lerp(
        gradient_dot(seed, x0, y0, xd0, yd0),
        gradient_dot(seed, x1, y0, xd1, yd0),
        xs,
    );
    let xf1 = lerp(
        gradient_dot(seed, x0, y1, xd0, yd1),
        gradient_dot(seed, x1, y1, xd1, yd1),
        xs,
    );

    lerp(xf0, xf1, ys) * PERLIN_SCALE
}
