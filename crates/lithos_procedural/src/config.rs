//! # World Configuration
//!
//! Every tunable of the generation pipeline, loaded once per session.
//!
//! All sections carry `#[serde(default)]`, so a TOML file only has to
//! name the keys it overrides:
//!
//! ```toml
//! seed = 1
//!
//! [terrain]
//! water_level = 40
//!
//! [[ores]]
//! block = "coal_ore"
//! min_height = 5
//! max_height = 96
//! scale = 0.11
//! threshold = 0.72
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::biome::Biome;

/// Errors raised while loading or validating a configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config {path}: {message}")]
    Io {
        /// Path that failed.
        path: String,
        /// OS error text.
        message: String,
    },

    /// The config text is not valid TOML for this schema.
    #[error("invalid config syntax: {0}")]
    Parse(String),

    /// A value is out of its allowed range.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// A block name is not present in the block registry.
    #[error("unknown block type: {0}")]
    UnknownBlock(String),
}

/// Terrain height field parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Ground level the fractal sum is centered on.
    pub base_height: i32,
    /// Maximum deviation above/below `base_height`.
    pub height_range: f64,
    /// Hard ceiling for terrain height.
    pub max_height: i32,
    /// Horizontal noise scale (smaller = smoother).
    pub scale: f64,
    /// Fractal octaves.
    pub octaves: u32,
    /// Amplitude multiplier per octave.
    pub persistence: f64,
    /// Frequency multiplier per octave.
    pub lacunarity: f64,
    /// Water fills every column up to this height.
    pub water_level: i32,
    /// Surfaces within this many blocks of the water level become sand.
    pub beach_band: i32,
    /// Bedrock layer; nothing is generated below it.
    pub bedrock_level: i32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            base_height: 48,
            height_range: 24.0,
            max_height: 120,
            scale: 0.008,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            water_level: 44,
            beach_band: 2,
            bedrock_level: 0,
        }
    }
}

/// Biome field parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeConfig {
    /// Horizontal scale of the biome noise (low frequency).
    pub scale: f64,
    /// Ascending cut points: desert | plains | forest | taiga | tundra.
    pub thresholds: [f64; 4],
}

impl Default for BiomeConfig {
    fn default() -> Self {
        Self {
            scale: 0.003,
            thresholds: [-0.45, -0.1, 0.25, 0.55],
        }
    }
}

/// Horizontal tunnel carver parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelConfig {
    /// Primary noise scale.
    pub scale: f64,
    /// Multiplier on `y` before sampling; above 1 flattens tunnels.
    pub vertical_scale: f64,
    /// Secondary variation noise scale.
    pub variation_scale: f64,
    /// Weight of the variation term.
    pub variation_weight: f64,
    /// Connector noise scale (creates intersections).
    pub connector_scale: f64,
    /// Weight of the connector term.
    pub connector_weight: f64,
    /// Height tunnels prefer.
    pub preferred_height: f64,
    /// Standard deviation of the Gaussian height bias.
    pub height_variation: f64,
    /// Carve when the biased density exceeds this.
    pub threshold: f64,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            scale: 0.03,
            vertical_scale: 2.0,
            variation_scale: 0.08,
            variation_weight: 0.3,
            connector_scale: 0.015,
            connector_weight: 0.25,
            preferred_height: 24.0,
            height_variation: 14.0,
            threshold: 0.62,
        }
    }
}

/// Spaghetti cave carver parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaghettiConfig {
    /// Primary noise scale.
    pub scale: f64,
    /// Multiplier on `y` before sampling; below 1 stretches caves vertically.
    pub vertical_squeeze: f64,
    /// Winding noise scale (higher frequency).
    pub winding_scale: f64,
    /// Weight of the winding term.
    pub winding_weight: f64,
    /// Branch noise scale.
    pub branch_scale: f64,
    /// Branch noise is only added above this value.
    pub branch_threshold: f64,
    /// Weight of the branch term.
    pub branch_weight: f64,
    /// Carve when the density exceeds this.
    pub threshold: f64,
}

impl Default for SpaghettiConfig {
    fn default() -> Self {
        Self {
            scale: 0.04,
            vertical_squeeze: 0.5,
            winding_scale: 0.12,
            winding_weight: 0.35,
            branch_scale: 0.06,
            branch_threshold: 0.6,
            branch_weight: 0.4,
            threshold: 0.78,
        }
    }
}

/// Cave carving parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveConfig {
    /// Lowest carvable height (inclusive).
    pub min_height: i32,
    /// Highest carvable height (inclusive).
    pub max_height: i32,
    /// Tunnel carver.
    pub tunnel: TunnelConfig,
    /// Spaghetti carver.
    pub spaghetti: SpaghettiConfig,
}

/// One ore tier. Tiers are checked in list order; first match wins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OreConfig {
    /// Block name placed for this ore.
    pub block: String,
    /// Lowest height (inclusive).
    pub min_height: i32,
    /// Highest height (inclusive).
    pub max_height: i32,
    /// 3D noise scale.
    pub scale: f64,
    /// Place the ore where noise exceeds this.
    pub threshold: f64,
}

impl OreConfig {
    fn tier(block: &str, min_height: i32, max_height: i32, scale: f64, threshold: f64) -> Self {
        Self {
            block: block.to_owned(),
            min_height,
            max_height,
            scale,
            threshold,
        }
    }

    /// Default tiers, in priority order.
    #[must_use]
    pub fn default_tiers() -> Vec<Self> {
        vec![
            Self::tier("coal_ore", 5, 96, 0.11, 0.72),
            Self::tier("iron_ore", 5, 64, 0.13, 0.78),
            Self::tier("gold_ore", 5, 32, 0.15, 0.84),
            Self::tier("diamond_ore", 1, 16, 0.17, 0.88),
        ]
    }
}

/// Structure placement parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    /// Minimum distance between two accepted placements.
    pub min_spacing: f64,
    /// Radius within which accepted placements are compared.
    pub influence_radius: f64,
    /// Neighborhood radius for the flatness test.
    pub flatness_radius: i32,
    /// Largest allowed height difference inside the neighborhood.
    pub max_height_delta: i32,
    /// Candidates must stand this far above the water level.
    pub beach_buffer: i32,
    /// Horizontal scale of the density noise.
    pub density_scale: f64,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            min_spacing: 5.0,
            influence_radius: 8.0,
            flatness_radius: 1,
            max_height_delta: 1,
            beach_buffer: 2,
            density_scale: 0.35,
        }
    }
}

/// Builtin tree shape for one biome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Density noise must exceed this for a candidate.
    pub threshold: f64,
    /// Base trunk height; a position hash adds 0..=2.
    pub trunk_height: i32,
    /// Canopy radius of the lower leaf layers.
    pub canopy_radius: i32,
    /// Trunk block name.
    pub log: String,
    /// Leaf block name.
    pub leaves: String,
}

/// Per-biome block and structure table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeParams {
    /// Top block of each column.
    pub surface: String,
    /// Block between surface and stone.
    pub crust: String,
    /// Crust thickness below the surface.
    pub crust_depth: i32,
    /// Builtin tree, if the biome grows any.
    #[serde(default)]
    pub tree: Option<TreeConfig>,
    /// Imported pattern stamped instead of the builtin tree.
    #[serde(default)]
    pub pattern: Option<String>,
}

impl BiomeParams {
    fn new(surface: &str, crust: &str, crust_depth: i32, tree: Option<TreeConfig>) -> Self {
        Self {
            surface: surface.to_owned(),
            crust: crust.to_owned(),
            crust_depth,
            tree,
            pattern: None,
        }
    }
}

fn tree(threshold: f64, trunk_height: i32, canopy_radius: i32, log: &str, leaves: &str) -> TreeConfig {
    TreeConfig {
        threshold,
        trunk_height,
        canopy_radius,
        log: log.to_owned(),
        leaves: leaves.to_owned(),
    }
}

/// Parameters for every biome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeTable {
    /// Desert parameters.
    pub desert: BiomeParams,
    /// Plains parameters.
    pub plains: BiomeParams,
    /// Forest parameters.
    pub forest: BiomeParams,
    /// Taiga parameters.
    pub taiga: BiomeParams,
    /// Tundra parameters.
    pub tundra: BiomeParams,
}

impl BiomeTable {
    /// Parameters for one biome.
    #[must_use]
    pub fn get(&self, biome: Biome) -> &BiomeParams {
        match biome {
            Biome::Desert => &self.desert,
            Biome::Plains => &self.plains,
            Biome::Forest => &self.forest,
            Biome::Taiga => &self.taiga,
            Biome::Tundra => &self.tundra,
        }
    }
}

impl Default for BiomeTable {
    fn default() -> Self {
        Self {
            desert: BiomeParams::new("sand", "sandstone", 4, None),
            plains: BiomeParams::new("grass", "dirt", 3, Some(tree(0.7, 4, 2, "log", "leaves"))),
            forest: BiomeParams::new("grass", "dirt", 4, Some(tree(0.1, 5, 2, "log", "leaves"))),
            taiga: BiomeParams::new(
                "grass",
                "gravel",
                3,
                Some(tree(0.3, 6, 2, "spruce_log", "spruce_leaves")),
            ),
            tundra: BiomeParams::new("snow", "gravel", 2, None),
        }
    }
}

/// Complete, immutable configuration of a generation session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World seed.
    pub seed: u64,
    /// Horizontal extent in chunks from the origin; 0 = unbounded.
    pub world_size: u32,
    /// Height field.
    pub terrain: TerrainConfig,
    /// Biome field.
    pub biome: BiomeConfig,
    /// Cave carvers.
    pub caves: CaveConfig,
    /// Ore tiers in priority order.
    pub ores: Vec<OreConfig>,
    /// Structure placement.
    pub structures: StructureConfig,
    /// Per-biome tables.
    pub biomes: BiomeTable,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            world_size: 0,
            terrain: TerrainConfig::default(),
            biome: BiomeConfig::default(),
            caves: CaveConfig {
                min_height: 4,
                max_height: 64,
                ..CaveConfig::default()
            },
            ores: OreConfig::default_tiers(),
            structures: StructureConfig::default(),
            biomes: BiomeTable::default(),
        }
    }
}

impl WorldConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on syntax/schema errors and
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise
    /// the same errors as [`WorldConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges that would otherwise break generation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn ensure(ok: bool, message: &str) -> Result<(), ConfigError> {
            if ok {
                Ok(())
            } else {
                Err(ConfigError::Invalid(message.to_owned()))
            }
        }

        let t = &self.terrain;
        ensure(t.octaves >= 1, "terrain.octaves must be at least 1")?;
        ensure(t.scale > 0.0, "terrain.scale must be positive")?;
        ensure(t.height_range >= 0.0, "terrain.height_range must not be negative")?;
        ensure(t.max_height > t.bedrock_level, "terrain.max_height must be above bedrock_level")?;
        ensure(t.beach_band >= 0, "terrain.beach_band must not be negative")?;

        ensure(self.biome.scale > 0.0, "biome.scale must be positive")?;
        ensure(
            self.biome.thresholds.windows(2).all(|w| w[0] <= w[1]),
            "biome.thresholds must be ascending",
        )?;

        let c = &self.caves;
        ensure(c.min_height <= c.max_height, "caves.min_height must not exceed caves.max_height")?;
        ensure(c.tunnel.scale > 0.0, "caves.tunnel.scale must be positive")?;
        ensure(c.tunnel.height_variation > 0.0, "caves.tunnel.height_variation must be positive")?;
        ensure(c.spaghetti.scale > 0.0, "caves.spaghetti.scale must be positive")?;

        for ore in &self.ores {
            ensure(ore.min_height <= ore.max_height, "ores: min_height must not exceed max_height")?;
            ensure(ore.scale > 0.0, "ores: scale must be positive")?;
        }

        let s = &self.structures;
        ensure(s.min_spacing >= 0.0, "structures.min_spacing must not be negative")?;
        ensure(
            s.influence_radius >= s.min_spacing,
            "structures.influence_radius must be at least min_spacing",
        )?;
        ensure(
            (0..=16).contains(&s.flatness_radius),
            "structures.flatness_radius must be in 0..=16",
        )?;
        ensure(s.max_height_delta >= 0, "structures.max_height_delta must not be negative")?;
        ensure(s.density_scale > 0.0, "structures.density_scale must be positive")?;

        for biome in Biome::ALL {
            let params = self.biomes.get(biome);
            ensure(params.crust_depth >= 0, "biomes: crust_depth must not be negative")?;
            if let Some(tree) = &params.tree {
                ensure((1..=64).contains(&tree.trunk_height), "biomes: tree trunk_height must be in 1..=64")?;
                ensure((1..=16).contains(&tree.canopy_radius), "biomes: tree canopy_radius must be in 1..=16")?;
            }
        }

        Ok(())
    }
}
