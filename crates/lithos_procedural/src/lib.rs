//! # LITHOS Procedural Generation
//!
//! Deterministic voxel world generation with imported structures.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed and config always produce the same chunk
//! 2. **Chunked**: The world is generated in independent 16³ cubes
//! 3. **Contextual**: All per-world state lives in a [`GenerationContext`]
//! 4. **Edits win**: The modification overlay is applied after generation
//!
//! ## Core Components
//!
//! - `SimplexNoise`: 2D/3D noise generation
//! - `HeightField` / `BiomeClassifier`: per-column terrain
//! - `ColumnAssigner`: surface, crust, water and beach blocks
//! - `CaveCarver` / `OreSeeder`: per-voxel density features
//! - `StructurePlanner`: spacing-constrained trees and patterns
//! - `SchematicPattern`: structure file decoder
//! - `ModificationStore`: persistent block overrides
//! - `ChunkAssembler`: runs the pipeline
//!
//! ## Example
//!
//! ```rust
//! use lithos_procedural::{
//!     BlockPos, ChunkAssembler, GenerationContext, ModificationStore, PatternRegistry, WorldConfig,
//! };
//!
//! let ctx = GenerationContext::with_builtin_blocks(WorldConfig::default()).unwrap();
//! let patterns = PatternRegistry::new();
//! let mut edits = ModificationStore::new();
//! edits.set(BlockPos::new(5, 10, 5), 3);
//!
//! let chunk = ChunkAssembler::new(&ctx, &patterns).assemble(BlockPos::new(5, 10, 5).chunk(), &edits);
//! assert_eq!(chunk.get(5, 10, 5), 3);
//! ```

#![deny(unsafe_code)]

pub mod assembler;
pub mod biome;
pub mod block;
pub mod carver;
pub mod chunk;
pub mod column;
pub mod config;
pub mod context;
pub mod height;
pub mod modification;
pub mod noise;
pub mod ore;
pub mod schematic;
pub mod structure;

pub use assembler::ChunkAssembler;
pub use biome::{Biome, BiomeClassifier};
pub use block::{BlockId, BlockRegistry, AIR};
pub use carver::CaveCarver;
pub use chunk::{BlockPos, Chunk, ChunkCoord, BLOCKS_PER_CHUNK, CHUNK_SIZE, MAX_CHUNK_COORD, MIN_CHUNK_COORD};
pub use column::ColumnAssigner;
pub use config::{ConfigError, WorldConfig};
pub use context::{GenerationContext, MAX_GENERATED_CHUNK};
pub use height::{ColumnCache, HeightField};
pub use modification::{ModificationRecord, ModificationStore, PersistenceError};
pub use noise::{position_hash, SimplexNoise, WorldSeed};
pub use ore::OreSeeder;
pub use schematic::{DecodeErrorKind, PatternRegistry, SchematicError, SchematicPattern};
pub use structure::{Placement, StructurePlanner};
