//! # Chunk System
//!
//! World data is organized into fixed-size cubic chunks.
//!
//! ## Chunk Format
//!
//! Chunks are 16x16x16 blocks. Each block is stored as a `u16` code in a
//! flat buffer laid out `[y][z][x]`, so
//! `index(x, y, z) = (y * 16 + z) * 16 + x`.

use crate::block::{BlockId, AIR};

/// Chunk edge length in blocks.
pub const CHUNK_SIZE: usize = 16;

/// Chunk edge length as a signed world-space quantity.
pub const CHUNK_SIZE_I32: i32 = CHUNK_SIZE as i32;

/// Total blocks per chunk.
pub const BLOCKS_PER_CHUNK: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;

/// Largest chunk coordinate whose blocks all have `i32` positions.
pub const MAX_CHUNK_COORD: i32 = i32::MAX / CHUNK_SIZE_I32;

/// Smallest chunk coordinate whose blocks all have `i32` positions.
pub const MIN_CHUNK_COORD: i32 = i32::MIN / CHUNK_SIZE_I32;

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not blocks).
    pub x: i32,
    /// Y coordinate (in chunks).
    pub y: i32,
    /// Z coordinate (in chunks).
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Chunk containing an absolute block position.
    #[inline]
    #[must_use]
    pub const fn from_block_pos(pos: BlockPos) -> Self {
        Self {
            x: pos.x.div_euclid(CHUNK_SIZE_I32),
            y: pos.y.div_euclid(CHUNK_SIZE_I32),
            z: pos.z.div_euclid(CHUNK_SIZE_I32),
        }
    }

    /// Returns true if every block of the chunk has an `i32` position.
    ///
    /// The world-origin accessors below assume this holds.
    #[inline]
    #[must_use]
    pub const fn is_addressable(self) -> bool {
        const fn axis(v: i32) -> bool {
            v >= MIN_CHUNK_COORD && v <= MAX_CHUNK_COORD
        }
        axis(self.x) && axis(self.y) && axis(self.z)
    }

    /// Returns the world X coordinate of the chunk's origin (corner).
    #[inline]
    #[must_use]
    pub const fn world_x(self) -> i32 {
        self.x * CHUNK_SIZE_I32
    }

    /// Returns the world Y coordinate of the chunk's origin.
    #[inline]
    #[must_use]
    pub const fn world_y(self) -> i32 {
        self.y * CHUNK_SIZE_I32
    }

    /// Returns the world Z coordinate of the chunk's origin.
    #[inline]
    #[must_use]
    pub const fn world_z(self) -> i32 {
        self.z * CHUNK_SIZE_I32
    }

    /// Absolute position of the chunk's origin block.
    #[inline]
    #[must_use]
    pub const fn origin(self) -> BlockPos {
        BlockPos::new(self.world_x(), self.world_y(), self.world_z())
    }
}

/// Absolute voxel coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockPos {
    /// World X.
    pub x: i32,
    /// World Y.
    pub y: i32,
    /// World Z.
    pub z: i32,
}

impl BlockPos {
    /// Creates a new block position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Chunk containing this position.
    #[inline]
    #[must_use]
    pub const fn chunk(self) -> ChunkCoord {
        ChunkCoord::from_block_pos(self)
    }

    /// Local coordinates inside the containing chunk.
    #[inline]
    #[must_use]
    pub const fn local(self) -> (usize, usize, usize) {
        (
            self.x.rem_euclid(CHUNK_SIZE_I32) as usize,
            self.y.rem_euclid(CHUNK_SIZE_I32) as usize,
            self.z.rem_euclid(CHUNK_SIZE_I32) as usize,
        )
    }

    /// Absolute position of a local voxel in a chunk.
    #[inline]
    #[must_use]
    pub const fn from_chunk_local(coord: ChunkCoord, x: usize, y: usize, z: usize) -> Self {
        Self::new(
            coord.world_x() + x as i32,
            coord.world_y() + y as i32,
            coord.world_z() + z as i32,
        )
    }
}

/// A chunk of world data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk position in the world.
    pub coord: ChunkCoord,
    /// Block codes, indexed by [`Chunk::index`].
    blocks: Box<[BlockId]>,
}

impl Chunk {
    /// Creates a new all-air chunk at the given coordinates.
    #[must_use]
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            blocks: vec![AIR; BLOCKS_PER_CHUNK].into_boxed_slice(),
        }
    }

    /// Flat buffer index of a local coordinate.
    #[inline]
    #[must_use]
    pub const fn index(x: usize, y: usize, z: usize) -> usize {
        (y * CHUNK_SIZE + z) * CHUNK_SIZE + x
    }

    /// Inverse of [`Chunk::index`].
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> (usize, usize, usize) {
        let x = index % CHUNK_SIZE;
        let z = (index / CHUNK_SIZE) % CHUNK_SIZE;
        let y = index / (CHUNK_SIZE * CHUNK_SIZE);
        (x, y, z)
    }

    #[inline]
    const fn in_bounds(x: usize, y: usize, z: usize) -> bool {
        x < CHUNK_SIZE && y < CHUNK_SIZE && z < CHUNK_SIZE
    }

    /// Gets a block at local coordinates. Out of range reads as air.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> BlockId {
        if Self::in_bounds(x, y, z) {
            self.blocks[Self::index(x, y, z)]
        } else {
            AIR
        }
    }

    /// Sets a block at local coordinates. Out of range writes are ignored.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, block: BlockId) {
        if Self::in_bounds(x, y, z) {
            self.blocks[Self::index(x, y, z)] = block;
        }
    }

    /// Writes `block` only if the voxel is currently air.
    ///
    /// Returns `true` if the voxel was written.
    #[inline]
    pub fn set_if_air(&mut self, x: usize, y: usize, z: usize, block: BlockId) -> bool {
        if !Self::in_bounds(x, y, z) {
            return false;
        }
        let slot = &mut self.blocks[Self::index(x, y, z)];
        if *slot == AIR {
            *slot = block;
            true
        } else {
            false
        }
    }

    /// Gets a block by absolute position, if it lies inside this chunk.
    #[must_use]
    pub fn get_world(&self, pos: BlockPos) -> Option<BlockId> {
        if pos.chunk() != self.coord {
            return None;
        }
        let (x, y, z) = pos.local();
        Some(self.get(x, y, z))
    }

    /// Block codes in index order.
    #[inline]
    #[must_use]
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    /// Raw native-endian bytes of the block buffer, for upload.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.blocks)
    }

    /// Returns true if every voxel is air.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|&b| b == AIR)
    }

    /// Number of voxels holding `block`.
    #[must_use]
    pub fn count(&self, block: BlockId) -> usize {
        self.blocks.iter().filter(|&&b| b == block).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for y in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    let index = Chunk::index(x, y, z);
                    assert!(index < BLOCKS_PER_CHUNK);
                    assert_eq!(Chunk::from_index(index), (x, y, z));
                }
            }
        }
    }

    #[test]
    fn test_chunk_coord_negative() {
        let pos = BlockPos::new(-1, -17, 16);
        assert_eq!(pos.chunk(), ChunkCoord::new(-1, -2, 1));
        assert_eq!(pos.local(), (15, 15, 0));
        assert_eq!(BlockPos::from_chunk_local(pos.chunk(), 15, 15, 0), pos);
    }

    #[test]
    fn test_addressable_limits() {
        let top = ChunkCoord::new(MAX_CHUNK_COORD, MIN_CHUNK_COORD, 0);
        assert!(top.is_addressable());
        assert_eq!(BlockPos::from_chunk_local(top, 15, 0, 0).x, i32::MAX);
        assert_eq!(top.world_y(), i32::MIN);

        assert!(!ChunkCoord::new(MAX_CHUNK_COORD + 1, 0, 0).is_addressable());
        assert!(!ChunkCoord::new(0, 0, MIN_CHUNK_COORD - 1).is_addressable());
    }

    #[test]
    fn test_set_if_air() {
        let mut chunk = Chunk::new(ChunkCoord::default());
        assert!(chunk.set_if_air(1, 2, 3, 5));
        assert!(!chunk.set_if_air(1, 2, 3, 9));
        assert_eq!(chunk.get(1, 2, 3), 5);
        assert!(!chunk.set_if_air(CHUNK_SIZE, 0, 0, 9));
    }

    #[test]
    fn test_out_of_range_reads_air() {
        let mut chunk = Chunk::new(ChunkCoord::default());
        chunk.set(CHUNK_SIZE, 0, 0, 7);
        assert_eq!(chunk.get(CHUNK_SIZE, 0, 0), AIR);
        assert!(chunk.is_empty());
    }

    #[test]
    fn test_as_bytes_length() {
        let mut chunk = Chunk::new(ChunkCoord::new(2, 0, -3));
        chunk.set(0, 0, 0, 0x0102);
        assert_eq!(chunk.as_bytes().len(), BLOCKS_PER_CHUNK * 2);
        assert_eq!(chunk.count(0x0102), 1);
        assert_eq!(chunk.get_world(BlockPos::new(32, 0, -48)), Some(0x0102));
        assert_eq!(chunk.get_world(BlockPos::new(0, 0, 0)), None);
    }
}
