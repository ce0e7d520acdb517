//! # Height Field
//!
//! Per-column terrain height from a fractal noise sum, and the per-chunk
//! column cache the rest of the pipeline reads from.

use crate::biome::{Biome, BiomeClassifier};
use crate::chunk::{ChunkCoord, CHUNK_SIZE_I32};
use crate::config::TerrainConfig;
use crate::noise::{SimplexNoise, WorldSeed};

/// Fractal height field.
pub struct HeightField {
    noise: SimplexNoise,
    base_height: f64,
    height_range: f64,
    max_height: i32,
    scale: f64,
    octaves: u32,
    persistence: f64,
    lacunarity: f64,
}

impl HeightField {
    /// Seed purpose for the height field.
    pub const SEED_PURPOSE: u64 = 1;

    /// Creates a height field from a world seed.
    #[must_use]
    pub fn new(seed: WorldSeed, config: &TerrainConfig) -> Self {
        Self {
            noise: SimplexNoise::new(seed.derive(Self::SEED_PURPOSE)),
            base_height: f64::from(config.base_height),
            height_range: config.height_range,
            max_height: config.max_height,
            scale: config.scale,
            octaves: config.octaves,
            persistence: config.persistence,
            lacunarity: config.lacunarity,
        }
    }

    /// Terrain height (y of the surface block) at a world column.
    #[must_use]
    pub fn height_at(&self, x: i32, z: i32) -> i32 {
        let sum = self.noise.octaved(
            f64::from(x) * self.scale,
            f64::from(z) * self.scale,
            self.octaves,
            self.persistence,
            self.lacunarity,
        );
        let height = (self.base_height + sum * self.height_range).floor() as i32;
        height.min(self.max_height)
    }
}

/// Height and biome for every column of one chunk footprint, plus a border.
///
/// Scoped to a single chunk generation call. Lookups outside the cached
/// window fall back to evaluating the fields directly.
pub struct ColumnCache<'a> {
    heights: &'a HeightField,
    origin_x: i32,
    origin_z: i32,
    side: usize,
    height: Vec<i32>,
    biome: Vec<Biome>,
}

impl<'a> ColumnCache<'a> {
    /// Evaluates every column of `coord`'s footprint, widened by `border`.
    #[must_use]
    pub fn build(
        coord: ChunkCoord,
        border: i32,
        heights: &'a HeightField,
        biomes: &BiomeClassifier,
    ) -> Self {
        let border = border.max(0);
        let side = (CHUNK_SIZE_I32 + 2 * border) as usize;
        let origin_x = coord.world_x() - border;
        let origin_z = coord.world_z() - border;

        let mut height = Vec::with_capacity(side * side);
        let mut biome = Vec::with_capacity(side * side);
        for dz in 0..side as i32 {
            for dx in 0..side as i32 {
                let (x, z) = (origin_x + dx, origin_z + dz);
                height.push(heights.height_at(x, z));
                biome.push(biomes.classify(x, z));
            }
        }

        Self {
            heights,
            origin_x,
            origin_z,
            side,
            height,
            biome,
        }
    }

    fn slot(&self, x: i32, z: i32) -> Option<usize> {
        let dx = x - self.origin_x;
        let dz = z - self.origin_z;
        let side = self.side as i32;
        if (0..side).contains(&dx) && (0..side).contains(&dz) {
            Some(dz as usize * self.side + dx as usize)
        } else {
            None
        }
    }

    /// Terrain height at a world column.
    #[must_use]
    pub fn height(&self, x: i32, z: i32) -> i32 {
        self.slot(x, z)
            .map_or_else(|| self.heights.height_at(x, z), |i| self.height[i])
    }

    /// Biome at a world column inside the cached window.
    ///
    /// Columns outside the window report `None`.
    #[must_use]
    pub fn biome(&self, x: i32, z: i32) -> Option<Biome> {
        self.slot(x, z).map(|i| self.biome[i])
    }
}
