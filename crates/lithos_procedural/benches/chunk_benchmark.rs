//! Benchmark for chunk assembly performance.
//!
//! Run with: cargo bench --package lithos_procedural --bench chunk_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lithos_procedural::{
    BlockPos, ChunkAssembler, ChunkCoord, GenerationContext, ModificationStore, PatternRegistry,
    WorldConfig,
};

fn benchmark_single_chunk(c: &mut Criterion) {
    let ctx = GenerationContext::with_builtin_blocks(WorldConfig::default()).unwrap();
    let patterns = PatternRegistry::new();
    let assembler = ChunkAssembler::new(&ctx, &patterns);
    let mods = ModificationStore::new();

    c.bench_function("single_surface_chunk", |b| {
        let mut coord = 0i32;
        b.iter(|| {
            coord = coord.wrapping_add(1);
            black_box(assembler.assemble(ChunkCoord::new(coord, 3, coord / 2), &mods))
        });
    });
}

fn benchmark_column_stack(c: &mut Criterion) {
    let ctx = GenerationContext::with_builtin_blocks(WorldConfig::default()).unwrap();
    let patterns = PatternRegistry::new();
    let assembler = ChunkAssembler::new(&ctx, &patterns);
    let mods = ModificationStore::new();

    let mut group = c.benchmark_group("column_stack");
    group.sample_size(10);

    // 8x8 columns, bedrock to above the highest terrain.
    group.throughput(Throughput::Elements(8 * 8 * 8));
    group.bench_function("8x8x8_chunks", |b| {
        b.iter(|| {
            for z in 0..8 {
                for x in 0..8 {
                    for y in 0..8 {
                        black_box(assembler.assemble(ChunkCoord::new(x, y, z), &mods));
                    }
                }
            }
        });
    });

    group.finish();
}

fn benchmark_overlay(c: &mut Criterion) {
    let ctx = GenerationContext::with_builtin_blocks(WorldConfig::default()).unwrap();
    let patterns = PatternRegistry::new();
    let assembler = ChunkAssembler::new(&ctx, &patterns);
    let mut mods = ModificationStore::new();
    for i in 0..4096 {
        mods.set(BlockPos::new(i % 16, (i / 16) % 16, i / 256), 1);
    }

    c.bench_function("chunk_with_full_overlay", |b| {
        b.iter(|| black_box(assembler.assemble(ChunkCoord::new(0, 0, 0), &mods)));
    });
}

criterion_group!(
    benches,
    benchmark_single_chunk,
    benchmark_column_stack,
    benchmark_overlay
);
criterion_main!(benches);
