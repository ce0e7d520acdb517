//! # Chunk Assembler
//!
//! Runs the generation stages in order for one chunk:
//!
//! 1. Height and biome per column
//! 2. Column assignment
//! 3. Cave carving
//! 4. Ore seeding
//! 5. Structure placement
//! 6. Modification overlay
//!
//! Stages 1-5 never look at the modification store, so edits can't change
//! what the generator produces; stage 6 then overwrites it.

use std::time::Instant;

use crate::block::AIR;
use crate::chunk::{BlockPos, Chunk, ChunkCoord, CHUNK_SIZE};
use crate::context::GenerationContext;
use crate::height::ColumnCache;
use crate::modification::ModificationStore;
use crate::schematic::PatternRegistry;

/// Builds finished chunks from a generation context.
pub struct ChunkAssembler<'a> {
    ctx: &'a GenerationContext,
    patterns: &'a PatternRegistry,
}

impl<'a> ChunkAssembler<'a> {
    /// Creates an assembler borrowing a context and the loaded patterns.
    #[must_use]
    pub fn new(ctx: &'a GenerationContext, patterns: &'a PatternRegistry) -> Self {
        Self { ctx, patterns }
    }

    /// Terrain, caves, ores and structures, without the overlay.
    #[must_use]
    pub fn generate(&self, coord: ChunkCoord) -> Chunk {
        let mut chunk = Chunk::new(coord);
        if !self.ctx.in_bounds(coord) {
            return chunk;
        }

        let structures = self.ctx.structures();
        let cache = ColumnCache::build(
            coord,
            structures.flatness_radius(),
            self.ctx.heights(),
            self.ctx.biomes(),
        );
        self.fill_terrain(&mut chunk, &cache);
        self.carve_and_seed(&mut chunk);

        let placements = structures.plan(coord, &cache);
        structures.stamp(&mut chunk, &placements, self.patterns);
        chunk
    }

    /// Full pipeline: generation, then every stored override for the chunk.
    #[must_use]
    pub fn assemble(&self, coord: ChunkCoord, modifications: &ModificationStore) -> Chunk {
        let start = Instant::now();
        let mut chunk = self.generate(coord);
        let applied = modifications.apply_to(&mut chunk);
        tracing::debug!(
            x = coord.x,
            y = coord.y,
            z = coord.z,
            applied,
            elapsed_us = start.elapsed().as_micros() as u64,
            "chunk assembled"
        );
        chunk
    }

    fn fill_terrain(&self, chunk: &mut Chunk, cache: &ColumnCache<'_>) {
        let columns = self.ctx.columns();
        let coord = chunk.coord;
        for z in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                let origin = BlockPos::from_chunk_local(coord, x, 0, z);
                let height = cache.height(origin.x, origin.z);
                let Some(biome) = cache.biome(origin.x, origin.z) else {
                    continue;
                };
                for y in 0..CHUNK_SIZE {
                    let block = columns.block_at(origin.y + y as i32, height, biome);
                    if block != AIR {
                        chunk.set(x, y, z, block);
                    }
                }
            }
        }
    }

    fn carve_and_seed(&self, chunk: &mut Chunk) {
        let columns = self.ctx.columns();
        let carver = self.ctx.carver();
        let ores = self.ctx.ores();
        let (water, bedrock, stone) = (columns.water(), columns.bedrock(), columns.stone());

        for index in 0..chunk.blocks().len() {
            let block = chunk.blocks()[index];
            if block == AIR || block == water || block == bedrock {
                continue;
            }
            let (x, y, z) = Chunk::from_index(index);
            let pos = BlockPos::from_chunk_local(chunk.coord, x, y, z);
            if carver.is_cave(pos.x, pos.y, pos.z) {
                chunk.set(x, y, z, AIR);
            } else if block == stone {
                if let Some(ore) = ores.pick(pos.x, pos.y, pos.z) {
                    chunk.set(x, y, z, ore);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;

    fn context() -> GenerationContext {
        GenerationContext::with_builtin_blocks(WorldConfig::default()).unwrap()
    }

    #[test]
    fn test_generation_is_deterministic() {
        let ctx = context();
        let patterns = PatternRegistry::new();
        let assembler = ChunkAssembler::new(&ctx, &patterns);

        let a = assembler.generate(ChunkCoord::new(0, 2, 0));
        let b = assembler.generate(ChunkCoord::new(0, 2, 0));
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_surface_chunk_has_ground_and_sky() {
        let ctx = context();
        let patterns = PatternRegistry::new();
        let assembler = ChunkAssembler::new(&ctx, &patterns);
        let surface = ctx.heights().height_at(0, 0);

        // The chunk holding a surface block mixes solid ground and air/water.
        let coord = BlockPos::new(0, surface, 0).chunk();
        let chunk = assembler.generate(coord);
        assert!(!chunk.is_empty());
        assert!(chunk.count(AIR) > 0 || chunk.count(ctx.columns().water()) > 0);
    }

    #[test]
    fn test_out_of_bounds_chunk_is_empty() {
        let config = WorldConfig {
            world_size: 1,
            ..WorldConfig::default()
        };
        let ctx = GenerationContext::with_builtin_blocks(config).unwrap();
        let patterns = PatternRegistry::new();
        let mut mods = ModificationStore::new();
        mods.set(BlockPos::new(40, 1, 0), 5);

        let chunk = ChunkAssembler::new(&ctx, &patterns).assemble(ChunkCoord::new(2, 0, 0), &mods);
        assert_eq!(chunk.count(AIR), chunk.blocks().len() - 1);
        assert_eq!(chunk.get(8, 1, 0), 5);
    }

    #[test]
    fn test_far_chunks_generate_as_air() {
        let ctx = context();
        let patterns = PatternRegistry::new();
        let assembler = ChunkAssembler::new(&ctx, &patterns);
        assert!(assembler.generate(ChunkCoord::new(200_000_000, 0, 0)).is_empty());
        assert!(assembler.generate(ChunkCoord::new(0, i32::MIN, i32::MAX)).is_empty());

        // Edits at the edge of the addressable world still land.
        let mut mods = ModificationStore::new();
        let edge = BlockPos::new(i32::MAX, i32::MIN, 0);
        mods.set(edge, 4);
        let chunk = assembler.assemble(edge.chunk(), &mods);
        assert_eq!(chunk.get_world(edge), Some(4));
        assert_eq!(chunk.count(AIR), chunk.blocks().len() - 1);
    }

    #[test]
    fn test_overlay_wins() {
        let ctx = context();
        let patterns = PatternRegistry::new();
        let mut mods = ModificationStore::new();
        let pos = BlockPos::new(3, 0, 3);
        mods.set(pos, AIR);

        let chunk = ChunkAssembler::new(&ctx, &patterns).assemble(pos.chunk(), &mods);
        // Bedrock level is 0; the override replaces it.
        assert_eq!(chunk.get_world(pos), Some(AIR));
    }
}
