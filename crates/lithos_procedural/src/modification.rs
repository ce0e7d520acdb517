//! # Modification Store
//!
//! Absolute-coordinate block overrides that survive regeneration.
//!
//! Records are created by any edit (single update or bulk import),
//! overwritten on repeat, and removed only by [`ModificationStore::clear`].
//! They are partitioned by chunk so the assembler touches only the
//! records of the chunk it is building.
//!
//! ## File Format
//!
//! LZ4 (`compress_prepend_size`) around:
//! `b"LMOD"`, version `u16` LE, then 16-byte records
//! `{ x: i32, y: i32, z: i32, block: u16, reserved: u16 }`, all little-endian.

use std::collections::HashMap;
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use thiserror::Error;

use crate::block::BlockId;
use crate::chunk::{BlockPos, Chunk, ChunkCoord};

const MAGIC: &[u8; 4] = b"LMOD";
const VERSION: u16 = 1;
const HEADER_LEN: usize = 6;

/// Errors from reading or writing a modification file.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// File could not be read or written.
    #[error("modification file I/O: {0}")]
    Io(#[from] std::io::Error),

    /// LZ4 payload is corrupt.
    #[error("modification file decompression failed: {0}")]
    Decompress(String),

    /// Header or record layout is invalid.
    #[error("corrupt modification file: {0}")]
    Corrupt(String),
}

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// One block override.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModificationRecord {
    /// Absolute position.
    pub pos: BlockPos,
    /// Block code that wins over generator output.
    pub block: BlockId,
}

impl ModificationRecord {
    /// Creates a record.
    #[must_use]
    pub const fn new(pos: BlockPos, block: BlockId) -> Self {
        Self { pos, block }
    }
}

/// On-disk record layout.
#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct RawRecord {
    x: i32,
    y: i32,
    z: i32,
    block: u16,
    reserved: u16,
}

impl From<ModificationRecord> for RawRecord {
    fn from(r: ModificationRecord) -> Self {
        Self {
            x: r.pos.x.to_le(),
            y: r.pos.y.to_le(),
            z: r.pos.z.to_le(),
            block: r.block.to_le(),
            reserved: 0,
        }
    }
}

impl From<RawRecord> for ModificationRecord {
    fn from(r: RawRecord) -> Self {
        Self::new(
            BlockPos::new(i32::from_le(r.x), i32::from_le(r.y), i32::from_le(r.z)),
            u16::from_le(r.block),
        )
    }
}

/// Chunk-partitioned override map.
#[derive(Clone, Debug, Default)]
pub struct ModificationStore {
    chunks: HashMap<ChunkCoord, HashMap<BlockPos, BlockId>>,
    count: usize,
}

impl ModificationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an override. Returns the chunk it belongs to.
    pub fn set(&mut self, pos: BlockPos, block: BlockId) -> ChunkCoord {
        let coord = pos.chunk();
        if self.chunks.entry(coord).or_default().insert(pos, block).is_none() {
            self.count += 1;
        }
        coord
    }

    /// Records many overrides; later entries win over earlier ones.
    ///
    /// Returns each affected chunk once, in coordinate order.
    pub fn import<I>(&mut self, records: I) -> Vec<ChunkCoord>
    where
        I: IntoIterator<Item = ModificationRecord>,
    {
        let mut affected: Vec<ChunkCoord> = records
            .into_iter()
            .map(|r| self.set(r.pos, r.block))
            .collect();
        affected.sort_unstable();
        affected.dedup();
        tracing::debug!(chunks = affected.len(), total = self.count, "imported modifications");
        affected
    }

    /// Override at a position, if any.
    #[must_use]
    pub fn get(&self, pos: BlockPos) -> Option<BlockId> {
        self.chunks.get(&pos.chunk())?.get(&pos).copied()
    }

    /// Overrides inside one chunk.
    pub fn for_chunk(&self, coord: ChunkCoord) -> impl Iterator<Item = ModificationRecord> + '_ {
        self.chunks
            .get(&coord)
            .into_iter()
            .flatten()
            .map(|(&pos, &block)| ModificationRecord::new(pos, block))
    }

    /// Writes every override of `chunk`'s coordinate into it.
    ///
    /// Returns the number of voxels written.
    pub fn apply_to(&self, chunk: &mut Chunk) -> usize {
        let mut written = 0;
        for record in self.for_chunk(chunk.coord) {
            let (x, y, z) = record.pos.local();
            chunk.set(x, y, z, record.block);
            written += 1;
        }
        written
    }

    /// Every record, sorted by position.
    #[must_use]
    pub fn export(&self) -> Vec<ModificationRecord> {
        let mut records: Vec<ModificationRecord> = self
            .chunks
            .values()
            .flatten()
            .map(|(&pos, &block)| ModificationRecord::new(pos, block))
            .collect();
        records.sort_unstable_by_key(|r| r.pos);
        records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.count = 0;
    }

    /// Serializes every record into the compressed file format.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let raw: Vec<RawRecord> = self.export().into_iter().map(RawRecord::from).collect();
        let mut payload = Vec::with_capacity(HEADER_LEN + raw.len() * std::mem::size_of::<RawRecord>());
        payload.extend_from_slice(MAGIC);
        payload.extend_from_slice(&VERSION.to_le_bytes());
        payload.extend_from_slice(bytemuck::cast_slice(&raw));
        compress_prepend_size(&payload)
    }

    /// Parses the compressed file format.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Decompress`] for a corrupt LZ4 payload
    /// and [`PersistenceError::Corrupt`] for a bad header or misaligned
    /// record data.
    pub fn from_bytes(bytes: &[u8]) -> PersistenceResult<Self> {
        let payload =
            decompress_size_prepended(bytes).map_err(|e| PersistenceError::Decompress(e.to_string()))?;

        if payload.len() < HEADER_LEN || &payload[..4] != MAGIC {
            return Err(PersistenceError::Corrupt("missing LMOD header".to_owned()));
        }
        let version = u16::from_le_bytes([payload[4], payload[5]]);
        if version != VERSION {
            return Err(PersistenceError::Corrupt(format!("unsupported version {version}")));
        }

        let body = &payload[HEADER_LEN..];
        let record_len = std::mem::size_of::<RawRecord>();
        if body.len() % record_len != 0 {
            return Err(PersistenceError::Corrupt(format!(
                "{} trailing bytes after last record",
                body.len() % record_len
            )));
        }

        let mut store = Self::new();
        for chunk in body.chunks_exact(record_len) {
            let raw: RawRecord = bytemuck::pod_read_unaligned(chunk);
            let record = ModificationRecord::from(raw);
            store.set(record.pos, record.block);
        }
        Ok(store)
    }

    /// Writes the store to a file.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Io`] if the file cannot be written.
    pub fn save_compressed(&self, path: &Path) -> PersistenceResult<()> {
        std::fs::write(path, self.to_bytes())?;
        tracing::info!(path = %path.display(), records = self.count, "saved modifications");
        Ok(())
    }

    /// Reads a store from a file.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Io`] if the file cannot be read, and
    /// the errors of [`ModificationStore::from_bytes`] otherwise.
    pub fn load_compressed(path: &Path) -> PersistenceResult<Self> {
        let bytes = std::fs::read(path)?;
        let store = Self::from_bytes(&bytes)?;
        tracing::info!(path = %path.display(), records = store.count, "loaded modifications");
        Ok(store)
    }
}
