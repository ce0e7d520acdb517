//! # Biome Classification
//!
//! Determines terrain type from a single low-frequency noise field.
//!
//! The field is bucketed by four ascending thresholds into five biomes.
//! Boundaries are hard edges: neighbouring columns on either side of a
//! threshold get different surface blocks with no transition band.

use crate::config::BiomeConfig;
use crate::noise::{SimplexNoise, WorldSeed};

/// Biome types in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Biome {
    /// Arid desert
    Desert = 0,
    /// Plains/grassland
    Plains = 1,
    /// Forest
    Forest = 2,
    /// Cold conifer forest
    Taiga = 3,
    /// Frozen tundra
    Tundra = 4,
}

impl Biome {
    /// Every biome in classification order.
    pub const ALL: [Self; 5] = [
        Self::Desert,
        Self::Plains,
        Self::Forest,
        Self::Taiga,
        Self::Tundra,
    ];

    /// Buckets a field value by ascending thresholds.
    #[must_use]
    pub fn from_field(value: f64, thresholds: &[f64; 4]) -> Self {
        let bucket = thresholds.iter().take_while(|&&t| value >= t).count();
        Self::ALL[bucket]
    }
}

/// Biome classifier that determines biome from world coordinates.
pub struct BiomeClassifier {
    noise: SimplexNoise,
    scale: f64,
    thresholds: [f64; 4],
}

impl BiomeClassifier {
    /// Seed purpose for the biome field.
    pub const SEED_PURPOSE: u64 = 2;

    /// Creates a new biome classifier from a world seed.
    #[must_use]
    pub fn new(seed: WorldSeed, config: &BiomeConfig) -> Self {
        Self {
            noise: SimplexNoise::new(seed.derive(Self::SEED_PURPOSE)),
            scale: config.scale,
            thresholds: config.thresholds,
        }
    }

    /// Raw field value in [-1, 1].
    #[must_use]
    pub fn field(&self, x: i32, z: i32) -> f64 {
        self.noise
            .sample(f64::from(x) * self.scale, f64::from(z) * self.scale)
    }

    /// Classifies the biome at a world column.
    #[must_use]
    pub fn classify(&self, x: i32, z: i32) -> Biome {
        Biome::from_field(self.field(x, z), &self.thresholds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_buckets() {
        let t = [-0.5, 0.0, 0.3, 0.6];
        assert_eq!(Biome::from_field(-0.9, &t), Biome::Desert);
        assert_eq!(Biome::from_field(-0.5, &t), Biome::Plains);
        assert_eq!(Biome::from_field(0.1, &t), Biome::Forest);
        assert_eq!(Biome::from_field(0.59, &t), Biome::Taiga);
        assert_eq!(Biome::from_field(1.0, &t), Biome::Tundra);
    }

    #[test]
    fn test_biome_deterministic() {
        let config = BiomeConfig::default();
        let a = BiomeClassifier::new(WorldSeed::new(42), &config);
        let b = BiomeClassifier::new(WorldSeed::new(42), &config);

        for i in -50..50 {
            assert_eq!(a.classify(i * 37, i * 11), b.classify(i * 37, i * 11));
        }
    }

    #[test]
    fn test_all_biomes_reachable() {
        let classifier = BiomeClassifier::new(WorldSeed::new(12345), &BiomeConfig::default());
        let mut found_biomes = std::collections::HashSet::new();

        for x in (-4000..4000).step_by(40) {
            for z in (-4000..4000).step_by(40) {
                found_biomes.insert(classifier.classify(x, z));
            }
        }

        assert!(
            found_biomes.len() >= 4,
            "Should find multiple biomes, found: {found_biomes:?}"
        );
    }
}
