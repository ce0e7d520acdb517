//! # Generation Pipeline Tests
//!
//! End-to-end properties of chunk assembly: determinism, edit precedence,
//! structure spacing, non-destructive stamping, ore priority and the
//! shoreline rule for structure candidates.

use lithos_procedural::config::OreConfig;
use lithos_procedural::{
    BlockPos, BlockRegistry, ChunkAssembler, ChunkCoord, ColumnCache, GenerationContext,
    ModificationRecord, ModificationStore, PatternRegistry, WorldConfig, AIR,
};

fn context(config: WorldConfig) -> GenerationContext {
    GenerationContext::with_builtin_blocks(config).expect("valid config")
}

/// Chunk coordinate whose slab contains the terrain surface at a column.
fn surface_chunk(ctx: &GenerationContext, cx: i32, cz: i32) -> ChunkCoord {
    let x = cx * 16 + 8;
    let z = cz * 16 + 8;
    BlockPos::new(x, ctx.heights().height_at(x, z) + 1, z).chunk()
}

fn without_trees(mut config: WorldConfig) -> WorldConfig {
    for params in [
        &mut config.biomes.desert,
        &mut config.biomes.plains,
        &mut config.biomes.forest,
        &mut config.biomes.taiga,
        &mut config.biomes.tundra,
    ] {
        params.tree = None;
    }
    config
}

/// Scenario A: same seed, same config, same chunk, twice.
#[test]
fn test_chunk_generation_is_deterministic() {
    let config = WorldConfig {
        seed: 1,
        ..WorldConfig::default()
    };
    let patterns = PatternRegistry::new();
    let mods = ModificationStore::new();

    let ctx = context(config.clone());
    let first = ChunkAssembler::new(&ctx, &patterns).assemble(ChunkCoord::new(0, 0, 0), &mods);
    let second = ChunkAssembler::new(&ctx, &patterns).assemble(ChunkCoord::new(0, 0, 0), &mods);
    assert_eq!(first.as_bytes(), second.as_bytes());

    // A fresh context for the same world must agree too.
    let other = context(config);
    let third = ChunkAssembler::new(&other, &patterns).assemble(ChunkCoord::new(0, 0, 0), &mods);
    assert_eq!(first.as_bytes(), third.as_bytes());
}

#[test]
fn test_surface_chunks_deterministic_across_contexts() {
    let patterns = PatternRegistry::new();
    let mods = ModificationStore::new();
    let a = context(WorldConfig::default());
    let b = context(WorldConfig::default());

    for cx in -2..2 {
        for cz in -2..2 {
            let coord = surface_chunk(&a, cx, cz);
            let one = ChunkAssembler::new(&a, &patterns).assemble(coord, &mods);
            let two = ChunkAssembler::new(&b, &patterns).assemble(coord, &mods);
            assert_eq!(one, two, "chunk {coord:?} differs");
        }
    }
}

/// Scenario B: an edit always survives regeneration.
#[test]
fn test_modification_survives_regeneration() {
    let ctx = context(WorldConfig {
        seed: 1,
        ..WorldConfig::default()
    });
    let patterns = PatternRegistry::new();
    let assembler = ChunkAssembler::new(&ctx, &patterns);
    let mut mods = ModificationStore::new();
    let pos = BlockPos::new(5, 10, 5);

    mods.import([ModificationRecord::new(pos, 3)]);

    for _ in 0..2 {
        let chunk = assembler.assemble(pos.chunk(), &mods);
        assert_eq!(chunk.get_world(pos), Some(3));
    }
}

#[test]
fn test_edits_do_not_leak_into_generation() {
    let ctx = context(WorldConfig::default());
    let patterns = PatternRegistry::new();
    let assembler = ChunkAssembler::new(&ctx, &patterns);
    let coord = surface_chunk(&ctx, 0, 0);

    let mut mods = ModificationStore::new();
    mods.set(BlockPos::from_chunk_local(coord, 1, 1, 1), 22);

    let edited = assembler.assemble(coord, &mods);
    let pristine = assembler.generate(coord);
    let differing = edited
        .blocks()
        .iter()
        .zip(pristine.blocks())
        .filter(|(a, b)| a != b)
        .count();
    assert!(differing <= 1);
}

#[test]
fn test_structure_spacing_in_real_chunks() {
    let ctx = context(WorldConfig::default());
    let planner = ctx.structures();
    let min_spacing = ctx.config().structures.min_spacing;
    let mut total = 0;

    // Spread out so several biomes are sampled.
    for cx in -4..4 {
        for cz in -4..4 {
            let coord = surface_chunk(&ctx, cx * 20, cz * 20);
            let cache = ColumnCache::build(coord, planner.flatness_radius(), ctx.heights(), ctx.biomes());
            let accepted = planner.plan(coord, &cache);
            total += accepted.len();

            for (i, a) in accepted.iter().enumerate() {
                for b in &accepted[i + 1..] {
                    let dx = f64::from(a.x - b.x);
                    let dz = f64::from(a.z - b.z);
                    assert!(
                        (dx * dx + dz * dz).sqrt() >= min_spacing,
                        "placements {a:?} and {b:?} closer than {min_spacing}"
                    );
                }
            }
        }
    }
    assert!(total > 0, "expected at least one structure in 64 surface chunks");
}

/// Scenario D: shoreline and underwater columns never host structures.
#[test]
fn test_low_columns_never_selected() {
    let config = WorldConfig::default();
    let floor = config.terrain.water_level + config.structures.beach_buffer;
    let ctx = context(config);
    let planner = ctx.structures();

    for cx in -6..6 {
        for cz in -6..6 {
            for cy in 0..8 {
                let coord = ChunkCoord::new(cx, cy, cz);
                let cache = ColumnCache::build(coord, planner.flatness_radius(), ctx.heights(), ctx.biomes());
                for candidate in planner.candidates(coord, &cache) {
                    let height = candidate.y - 1;
                    assert!(height > floor, "candidate {candidate:?} at height {height} <= {floor}");
                }
            }
        }
    }

    let mut flooded = WorldConfig::default();
    flooded.terrain.water_level = flooded.terrain.max_height;
    let ctx = context(flooded);
    let planner = ctx.structures();
    for cx in -3..3 {
        let coord = surface_chunk(&ctx, cx, 0);
        let cache = ColumnCache::build(coord, planner.flatness_radius(), ctx.heights(), ctx.biomes());
        assert!(planner.candidates(coord, &cache).is_empty());
    }
}

#[test]
fn test_structures_never_overwrite_terrain() {
    let with = context(WorldConfig::default());
    let bare = context(without_trees(WorldConfig::default()));
    let patterns = PatternRegistry::new();
    let mut stamped_any = false;

    for cx in -3..3 {
        for cz in -3..3 {
            let coord = surface_chunk(&with, cx * 25, cz * 25);
            let planted = ChunkAssembler::new(&with, &patterns).generate(coord);
            let terrain = ChunkAssembler::new(&bare, &patterns).generate(coord);

            for (i, (&before, &after)) in terrain.blocks().iter().zip(planted.blocks()).enumerate() {
                if before != AIR {
                    assert_eq!(before, after, "voxel {i} of {coord:?} overwritten by a structure");
                } else if after != AIR {
                    stamped_any = true;
                }
            }
        }
    }
    assert!(stamped_any, "expected some structure blocks in 36 surface chunks");
}

#[test]
fn test_higher_priority_ore_wins() {
    let registry = BlockRegistry::default();
    let coal = registry.get("coal_ore").unwrap();
    let iron = registry.get("iron_ore").unwrap();
    let stone = registry.get("stone").unwrap();

    let config = WorldConfig {
        ores: vec![
            OreConfig {
                block: "coal_ore".to_owned(),
                min_height: 0,
                max_height: 40,
                scale: 0.1,
                threshold: -2.0,
            },
            OreConfig {
                block: "iron_ore".to_owned(),
                min_height: 0,
                max_height: 40,
                scale: 0.1,
                threshold: -2.0,
            },
        ],
        ..WorldConfig::default()
    };
    let ctx = context(config);
    let patterns = PatternRegistry::new();
    let chunk = ChunkAssembler::new(&ctx, &patterns).generate(ChunkCoord::new(0, 1, 0));

    assert!(chunk.count(coal) > 0);
    assert_eq!(chunk.count(iron), 0, "lower-priority ore placed where coal also qualified");
    assert_eq!(chunk.count(stone), 0, "every stone voxel in band should be claimed");
}

#[test]
fn test_bulk_import_then_export_round_trip() {
    let mut mods = ModificationStore::new();
    let records: Vec<ModificationRecord> = (0..50)
        .map(|i| ModificationRecord::new(BlockPos::new(i * 7 - 100, i, -i * 3), (i % 20) as u16 + 1))
        .collect();
    mods.import(records.iter().copied());

    let mut expected = records;
    expected.sort_by_key(|r| r.pos);
    assert_eq!(mods.export(), expected);
}
