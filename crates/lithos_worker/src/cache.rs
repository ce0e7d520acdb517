//! # Chunk Cache
//!
//! Finished chunks kept by the worker, readable from any thread.
//!
//! The worker is the only writer. Collision and vision code read single
//! blocks through [`ChunkCache::block_at`], which answers `0` (air) for
//! anything not loaded so speculative probes are always safe.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use lithos_procedural::{BlockId, BlockPos, Chunk, ChunkCoord, AIR};

/// Initial map capacity.
const INITIAL_CHUNKS: usize = 1024;

/// Cache shared between the worker thread and its handle.
pub type SharedChunkCache = Arc<RwLock<ChunkCache>>;

/// Loaded chunks by coordinate.
#[derive(Debug, Default)]
pub struct ChunkCache {
    chunks: HashMap<ChunkCoord, Arc<Chunk>>,
}

impl ChunkCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunks: HashMap::with_capacity(INITIAL_CHUNKS),
        }
    }

    /// Creates an empty cache behind a lock.
    #[must_use]
    pub fn shared() -> SharedChunkCache {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Stores a chunk, replacing any previous one at the same coordinate.
    pub fn insert(&mut self, chunk: Arc<Chunk>) {
        self.chunks.insert(chunk.coord, chunk);
    }

    /// Cached chunk, if loaded.
    #[must_use]
    pub fn get(&self, coord: ChunkCoord) -> Option<&Arc<Chunk>> {
        self.chunks.get(&coord)
    }

    /// Mutable access; clones the chunk first if a response still holds it.
    pub fn get_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord).map(Arc::make_mut)
    }

    /// Drops a chunk. Returns true if it was loaded.
    pub fn remove(&mut self, coord: ChunkCoord) -> bool {
        self.chunks.remove(&coord).is_some()
    }

    /// Returns true if the chunk is loaded.
    #[must_use]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Block at an absolute position; air when the chunk is not loaded.
    #[must_use]
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> BlockId {
        let pos = BlockPos::new(x, y, z);
        self.chunks
            .get(&pos.chunk())
            .and_then(|chunk| chunk.get_world(pos))
            .unwrap_or(AIR)
    }

    /// Number of loaded chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true if nothing is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Drops every chunk.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}
