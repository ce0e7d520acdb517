//! # Column Assigner
//!
//! Chooses the block for each voxel of a column from its terrain height
//! and biome: bedrock floor, stone body, biome crust, biome surface, then
//! water up to the water level. Columns whose surface sits within the
//! beach band of the water level get sand regardless of biome.

use crate::biome::Biome;
use crate::block::{BlockId, BlockRegistry, AIR};
use crate::config::{ConfigError, WorldConfig};

/// Resolved surface/crust blocks of one biome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnStyle {
    /// Top block.
    pub surface: BlockId,
    /// Block beneath the surface.
    pub crust: BlockId,
    /// Crust thickness.
    pub crust_depth: i32,
}

/// Per-voxel terrain block assignment.
#[derive(Clone, Debug)]
pub struct ColumnAssigner {
    stone: BlockId,
    water: BlockId,
    sand: BlockId,
    bedrock: BlockId,
    water_level: i32,
    beach_band: i32,
    bedrock_level: i32,
    styles: [ColumnStyle; 5],
}

impl ColumnAssigner {
    /// Resolves every block the terrain and biome tables name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownBlock`] for a name missing from the
    /// registry.
    pub fn new(config: &WorldConfig, registry: &BlockRegistry) -> Result<Self, ConfigError> {
        let mut styles = [ColumnStyle {
            surface: AIR,
            crust: AIR,
            crust_depth: 0,
        }; 5];
        for biome in Biome::ALL {
            let params = config.biomes.get(biome);
            styles[biome as usize] = ColumnStyle {
                surface: registry.require(&params.surface)?,
                crust: registry.require(&params.crust)?,
                crust_depth: params.crust_depth,
            };
        }

        Ok(Self {
            stone: registry.require("stone")?,
            water: registry.require("water")?,
            sand: registry.require("sand")?,
            bedrock: registry.require("bedrock")?,
            water_level: config.terrain.water_level,
            beach_band: config.terrain.beach_band,
            bedrock_level: config.terrain.bedrock_level,
            styles,
        })
    }

    /// Resolved style of a biome.
    #[must_use]
    pub fn style(&self, biome: Biome) -> ColumnStyle {
        self.styles[biome as usize]
    }

    /// Returns true if a surface at `height` falls in the beach band.
    #[must_use]
    pub fn is_beach(&self, height: i32) -> bool {
        (height - self.water_level).abs() <= self.beach_band
    }

    /// Block at height `y` in a column of terrain `height` and `biome`.
    #[must_use]
    pub fn block_at(&self, y: i32, height: i32, biome: Biome) -> BlockId {
        if y < self.bedrock_level {
            return AIR;
        }
        if y == self.bedrock_level {
            return self.bedrock;
        }
        if y > height {
            return if y <= self.water_level { self.water } else { AIR };
        }

        let style = self.style(biome);
        let (surface, crust) = if self.is_beach(height) {
            (self.sand, self.sand)
        } else {
            (style.surface, style.crust)
        };

        let depth = height - y;
        if depth == 0 {
            surface
        } else if depth <= style.crust_depth {
            crust
        } else {
            self.stone
        }
    }

    /// Stone block code; ores only replace this.
    #[must_use]
    pub fn stone(&self) -> BlockId {
        self.stone
    }

    /// Water block code.
    #[must_use]
    pub fn water(&self) -> BlockId {
        self.water
    }

    /// Bedrock block code.
    #[must_use]
    pub fn bedrock(&self) -> BlockId {
        self.bedrock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assigner() -> (ColumnAssigner, BlockRegistry) {
        let registry = BlockRegistry::default();
        let assigner = ColumnAssigner::new(&WorldConfig::default(), &registry).unwrap();
        (assigner, registry)
    }

    #[test]
    fn test_layering_above_water() {
        let (a, r) = assigner();
        let h = 70;
        assert_eq!(a.block_at(h + 1, h, Biome::Forest), AIR);
        assert_eq!(a.block_at(h, h, Biome::Forest), r.get("grass").unwrap());
        assert_eq!(a.block_at(h - 4, h, Biome::Forest), r.get("dirt").unwrap());
        assert_eq!(a.block_at(h - 5, h, Biome::Forest), r.get("stone").unwrap());
        assert_eq!(a.block_at(0, h, Biome::Forest), r.get("bedrock").unwrap());
        assert_eq!(a.block_at(-1, h, Biome::Forest), AIR);
    }

    #[test]
    fn test_water_fills_to_level() {
        let (a, r) = assigner();
        let level = WorldConfig::default().terrain.water_level;
        let h = level - 10;
        let water = r.get("water").unwrap();
        assert_eq!(a.block_at(h + 1, h, Biome::Plains), water);
        assert_eq!(a.block_at(level, h, Biome::Plains), water);
        assert_eq!(a.block_at(level + 1, h, Biome::Plains), AIR);
    }

    #[test]
    fn test_beach_rule_overrides_biome() {
        let (a, r) = assigner();
        let level = WorldConfig::default().terrain.water_level;
        let sand = r.get("sand").unwrap();
        for h in [level - 2, level, level + 2] {
            assert_eq!(a.block_at(h, h, Biome::Tundra), sand, "height {h}");
            assert_eq!(a.block_at(h - 1, h, Biome::Tundra), sand, "height {h}");
        }
        assert_eq!(a.block_at(level + 3, level + 3, Biome::Tundra), r.get("snow").unwrap());
    }
}
