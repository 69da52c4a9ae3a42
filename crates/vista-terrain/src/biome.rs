//! Biome classification and the base-colour palette.
//!
//! Classification is a fixed decision table over `(height, moisture,
//! temperature)`: five height bands, each split by moisture and temperature.
//! It is pure and total, every input maps to exactly one [`BiomeKind`].

/// Heights below this are water.
pub const WATER_THRESHOLD: f64 = 0.18;
/// Upper bound of the plains band.
pub const PLAIN_THRESHOLD: f64 = 0.25;
/// Upper bound of the hills band.
pub const HILL_THRESHOLD: f64 = 0.45;
/// Upper bound of the mountain band; everything above is peak.
pub const MOUNTAIN_THRESHOLD: f64 = 0.65;

/// The terrain biome kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BiomeKind {
    Ocean,
    Plains,
    Forest,
    Swamp,
    Desert,
    Savanna,
    Hills,
    Taiga,
    Tundra,
    Mountain,
    SnowyPeak,
}

impl BiomeKind {
    /// Every biome kind, in palette order.
    pub const ALL: [BiomeKind; 11] = [
        BiomeKind::Ocean,
        BiomeKind::Plains,
        BiomeKind::Forest,
        BiomeKind::Swamp,
        BiomeKind::Desert,
        BiomeKind::Savanna,
        BiomeKind::Hills,
        BiomeKind::Taiga,
        BiomeKind::Tundra,
        BiomeKind::Mountain,
        BiomeKind::SnowyPeak,
    ];

    /// Number of biome kinds.
    pub const COUNT: usize = Self::ALL.len();

    /// Position of this kind in [`BiomeKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lower-case identifier, e.g. `"snowy_peak"`.
    pub fn name(self) -> &'static str {
        match self {
            BiomeKind::Ocean => "ocean",
            BiomeKind::Plains => "plains",
            BiomeKind::Forest => "forest",
            BiomeKind::Swamp => "swamp",
            BiomeKind::Desert => "desert",
            BiomeKind::Savanna => "savanna",
            BiomeKind::Hills => "hills",
            BiomeKind::Taiga => "taiga",
            BiomeKind::Tundra => "tundra",
            BiomeKind::Mountain => "mountain",
            BiomeKind::SnowyPeak => "snowy_peak",
        }
    }
}

/// Everything known about a single terrain point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeSample {
    pub biome: BiomeKind,
    /// Normalized height in `[0, 1]`.
    pub height: f64,
    /// Moisture in `[0, 1]`.
    pub moisture: f64,
    /// Temperature in `[0, 1]`, already cooled by altitude.
    pub temperature: f64,
}

/// Classify a point by height band, then moisture and temperature.
pub fn classify(height: f64, moisture: f64, temperature: f64) -> BiomeKind {
    if height < WATER_THRESHOLD {
        BiomeKind::Ocean
    } else if height < PLAIN_THRESHOLD {
        if moisture > 0.7 {
            BiomeKind::Swamp
        } else if moisture > 0.4 {
            BiomeKind::Forest
        } else {
            BiomeKind::Plains
        }
    } else if height < HILL_THRESHOLD {
        if temperature > 0.7 && moisture < 0.3 {
            BiomeKind::Desert
        } else if temperature > 0.6 && moisture < 0.5 {
            BiomeKind::Savanna
        } else if temperature < 0.3 {
            BiomeKind::Taiga
        } else if moisture > 0.6 {
            BiomeKind::Forest
        } else {
            BiomeKind::Hills
        }
    } else if height < MOUNTAIN_THRESHOLD {
        if temperature < 0.25 {
            BiomeKind::Tundra
        } else if moisture > 0.5 {
            BiomeKind::Taiga
        } else {
            BiomeKind::Mountain
        }
    } else if temperature > 0.6 {
        BiomeKind::Mountain
    } else {
        BiomeKind::SnowyPeak
    }
}

/// Linear RGB colour with components in `[0, 1]`.
pub type Rgb = [f32; 3];

/// Base colour per biome kind.
#[derive(Clone, Debug, PartialEq)]
pub struct BiomePalette {
    colors: [Rgb; BiomeKind::COUNT],
}

impl BiomePalette {
    /// Replace the colour of one biome, returning the updated palette.
    pub fn with_color(mut self, biome: BiomeKind, color: Rgb) -> Self {
        self.colors[biome.index()] = color;
        self
    }

    pub fn color(&self, biome: BiomeKind) -> Rgb {
        self.colors[biome.index()]
    }
}

impl Default for BiomePalette {
    fn default() -> Self {
        Self {
            colors: [
                [0.10, 0.30, 0.60], // ocean
                [0.45, 0.68, 0.30], // plains
                [0.20, 0.50, 0.18], // forest
                [0.28, 0.38, 0.22], // swamp
                [0.86, 0.78, 0.52], // desert
                [0.70, 0.66, 0.35], // savanna
                [0.42, 0.56, 0.28], // hills
                [0.25, 0.40, 0.30], // taiga
                [0.62, 0.64, 0.58], // tundra
                [0.50, 0.46, 0.42], // mountain
                [0.95, 0.96, 0.98], // snowy peak
            ],
        }
    }
}
