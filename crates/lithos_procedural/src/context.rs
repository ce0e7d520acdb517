//! # Generation Context
//!
//! Everything one world needs to generate chunks: the validated config,
//! resolved block codes, and every seeded noise field. Built once, then
//! borrowed by each generation call. Independent worlds are independent
//! contexts; there is no process-wide state.

use crate::biome::BiomeClassifier;
use crate::block::BlockRegistry;
use crate::carver::CaveCarver;
use crate::chunk::ChunkCoord;
use crate::column::ColumnAssigner;
use crate::config::{ConfigError, WorldConfig};
use crate::height::HeightField;
use crate::noise::WorldSeed;
use crate::ore::OreSeeder;
use crate::structure::StructurePlanner;

/// Largest chunk coordinate magnitude the generator will fill.
///
/// Keeps every world position, plus structure and flatness neighbourhoods,
/// well inside `i32`. Chunks beyond it generate as air.
pub const MAX_GENERATED_CHUNK: u32 = 1 << 26;

/// Immutable per-world generation state.
pub struct GenerationContext {
    config: WorldConfig,
    registry: BlockRegistry,
    seed: WorldSeed,
    heights: HeightField,
    biomes: BiomeClassifier,
    columns: ColumnAssigner,
    carver: CaveCarver,
    ores: OreSeeder,
    structures: StructurePlanner,
}

impl GenerationContext {
    /// Validates `config` and resolves it against `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if validation fails, or
    /// [`ConfigError::UnknownBlock`] if the config names a block the
    /// registry lacks.
    pub fn new(config: WorldConfig, registry: BlockRegistry) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = WorldSeed::new(config.seed);

        let heights = HeightField::new(seed, &config.terrain);
        let biomes = BiomeClassifier::new(seed, &config.biome);
        let columns = ColumnAssigner::new(&config, &registry)?;
        let carver = CaveCarver::new(seed, &config.caves);
        let ores = OreSeeder::new(seed, &config.ores, &registry)?;
        let structures = StructurePlanner::new(seed, &config, &registry)?;

        Ok(Self {
            config,
            registry,
            seed,
            heights,
            biomes,
            columns,
            carver,
            ores,
            structures,
        })
    }

    /// Context with the builtin block table.
    ///
    /// # Errors
    ///
    /// Same as [`GenerationContext::new`].
    pub fn with_builtin_blocks(config: WorldConfig) -> Result<Self, ConfigError> {
        Self::new(config, BlockRegistry::default())
    }

    /// Returns true if `coord` lies inside the configured world bounds.
    ///
    /// An unbounded world still stops at [`MAX_GENERATED_CHUNK`].
    #[must_use]
    pub fn in_bounds(&self, coord: ChunkCoord) -> bool {
        if [coord.x, coord.y, coord.z]
            .iter()
            .any(|v| v.unsigned_abs() > MAX_GENERATED_CHUNK)
        {
            return false;
        }
        let size = self.config.world_size;
        if size == 0 {
            return true;
        }
        let half = i64::from(size);
        (-half..half).contains(&i64::from(coord.x)) && (-half..half).contains(&i64::from(coord.z))
    }

    /// The validated configuration.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Block table the context was resolved against.
    #[must_use]
    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// World seed.
    #[must_use]
    pub fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Height field.
    #[must_use]
    pub fn heights(&self) -> &HeightField {
        &self.heights
    }

    /// Biome classifier.
    #[must_use]
    pub fn biomes(&self) -> &BiomeClassifier {
        &self.biomes
    }

    /// Column assigner.
    #[must_use]
    pub fn columns(&self) -> &ColumnAssigner {
        &self.columns
    }

    /// Cave carver.
    #[must_use]
    pub fn carver(&self) -> &CaveCarver {
        &self.carver
    }

    /// Ore seeder.
    #[must_use]
    pub fn ores(&self) -> &OreSeeder {
        &self.ores
    }

    /// Structure planner.
    #[must_use]
    pub fn structures(&self) -> &StructurePlanner {
        &self.structures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_surface_block_rejected() {
        let mut config = WorldConfig::default();
        config.biomes.plains.surface = "moss".to_owned();
        let err = GenerationContext::with_builtin_blocks(config).err();
        assert_eq!(err, Some(ConfigError::UnknownBlock("moss".to_owned())));
    }

    #[test]
    fn test_world_bounds() {
        let config = WorldConfig {
            world_size: 2,
            ..WorldConfig::default()
        };
        let ctx = GenerationContext::with_builtin_blocks(config).unwrap();
        assert!(ctx.in_bounds(ChunkCoord::new(-2, 9, 1)));
        assert!(!ctx.in_bounds(ChunkCoord::new(2, 0, 0)));
        assert!(!ctx.in_bounds(ChunkCoord::new(0, 0, -3)));
    }

    #[test]
    fn test_independent_contexts() {
        let a = GenerationContext::with_builtin_blocks(WorldConfig { seed: 1, ..WorldConfig::default() }).unwrap();
        let b = GenerationContext::with_builtin_blocks(WorldConfig { seed: 2, ..WorldConfig::default() }).unwrap();
        let differs = (0..64).any(|i| a.heights().height_at(i * 40, 0) != b.heights().height_at(i * 40, 0));
        assert!(differs);
        assert_ne!(a.seed(), b.seed());
        assert_eq!(a.seed().value(), 1);
    }

    #[test]
    fn test_far_chunks_out_of_bounds() {
        let ctx = GenerationContext::with_builtin_blocks(WorldConfig::default()).unwrap();
        let limit = MAX_GENERATED_CHUNK as i32;
        assert!(ctx.in_bounds(ChunkCoord::new(limit, -limit, 0)));
        assert!(!ctx.in_bounds(ChunkCoord::new(200_000_000, 0, 0)));
        assert!(!ctx.in_bounds(ChunkCoord::new(0, i32::MIN, 0)));
        assert!(!ctx.in_bounds(ChunkCoord::new(0, 0, -limit - 1)));
    }
}
