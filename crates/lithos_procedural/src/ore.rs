//! # Ore Seeder
//!
//! Per-voxel ore placement from one 3D noise field per tier.
//!
//! Tiers are evaluated in configuration order and the first tier whose
//! band contains the voxel and whose noise exceeds its threshold wins.
//! Every configured tier takes part.

use crate::block::{BlockId, BlockRegistry};
use crate::config::{ConfigError, OreConfig};
use crate::noise::{SimplexNoise, WorldSeed};

/// Seed purpose of the first ore tier; later tiers count up from here.
const ORE_SEED_BASE: u64 = 300;

struct OreTier {
    block: BlockId,
    min_height: i32,
    max_height: i32,
    scale: f64,
    threshold: f64,
    noise: SimplexNoise,
}

/// Priority-ordered ore tiers.
pub struct OreSeeder {
    tiers: Vec<OreTier>,
}

impl OreSeeder {
    /// Resolves each tier's block and seeds its noise field.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownBlock`] if a tier names a block the
    /// registry does not contain.
    pub fn new(
        seed: WorldSeed,
        ores: &[OreConfig],
        registry: &BlockRegistry,
    ) -> Result<Self, ConfigError> {
        let tiers = ores
            .iter()
            .zip(ORE_SEED_BASE..)
            .map(|(ore, purpose)| {
                Ok(OreTier {
                    block: registry.require(&ore.block)?,
                    min_height: ore.min_height,
                    max_height: ore.max_height,
                    scale: ore.scale,
                    threshold: ore.threshold,
                    noise: SimplexNoise::new(seed.derive(purpose)),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { tiers })
    }

    /// Ore to place at a voxel, if any.
    #[must_use]
    pub fn pick(&self, x: i32, y: i32, z: i32) -> Option<BlockId> {
        let (fx, fy, fz) = (f64::from(x), f64::from(y), f64::from(z));
        self.tiers
            .iter()
            .filter(|tier| (tier.min_height..=tier.max_height).contains(&y))
            .find(|tier| {
                tier.noise
                    .sample3(fx * tier.scale, fy * tier.scale, fz * tier.scale)
                    > tier.threshold
            })
            .map(|tier| tier.block)
    }

    /// Number of configured tiers.
    #[must_use]
    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }
}
