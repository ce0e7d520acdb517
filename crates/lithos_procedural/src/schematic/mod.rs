//! # Schematic Decoder
//!
//! Turns a structure file into a [`SchematicPattern`]: a list of blocks
//! with offsets relative to the structure's anchor point.
//!
//! ## Input
//!
//! - Optionally gzip-compressed (sniffed from the `1f 8b` magic bytes).
//! - A tag tree whose root is a compound holding `Width`, `Height`,
//!   `Length`, a `Palette` compound (identifier → index) and a varint
//!   `BlockData` byte array. Files that wrap these in a `Schematic`
//!   compound with a nested `Blocks { Palette, Data }` section are read
//!   the same way.
//!
//! ## Output
//!
//! Offsets are re-centered on the structure footprint: `x - width / 2`,
//! `z - length / 2`, and `y` shifted by the declared vertical offset.

pub mod palette;
pub mod tag;

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use flate2::read::GzDecoder;
use thiserror::Error;

use crate::block::{BlockId, BlockRegistry};
use crate::chunk::{Chunk, CHUNK_SIZE_I32};

pub use tag::{Tag, TagReader, TagType};

/// Largest inflated size accepted from a compressed file.
pub const MAX_INFLATED_BYTES: u64 = 64 * 1024 * 1024;

/// Largest voxel count a pattern may declare.
pub const MAX_PATTERN_VOLUME: usize = 1 << 24;

/// Largest vertical shift, declared or supplied, in either direction.
pub const MAX_Y_OFFSET: i32 = 1 << 20;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Broad class of a decode failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// The bytes are not a well-formed structure file.
    Format,
    /// The file is well-formed so far but data is missing.
    Incomplete,
}

/// Errors from decoding a structure file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchematicError {
    /// The buffer ended before a value was complete.
    #[error("truncated input: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes the next read required.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// Unknown tag type byte.
    #[error("invalid tag type {0}")]
    InvalidTagType(u8),

    /// A length prefix was negative.
    #[error("negative length {0}")]
    NegativeLength(i32),

    /// Compounds/lists nested too deeply.
    #[error("tag nesting exceeds {}", tag::MAX_DEPTH)]
    TooDeep,

    /// A string was not valid UTF-8.
    #[error("invalid UTF-8 in string")]
    InvalidUtf8,

    /// The root tag was not a compound.
    #[error("root tag must be a compound, found type {0}")]
    RootNotCompound(u8),

    /// Gzip stream could not be inflated.
    #[error("decompression failed: {0}")]
    Decompress(String),

    /// A required field is absent.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A field has the wrong tag type or shape.
    #[error("field `{0}` has the wrong type")]
    WrongFieldType(&'static str),

    /// A dimension is zero, or the volume exceeds [`MAX_PATTERN_VOLUME`].
    #[error("invalid dimensions {width}x{height}x{length}")]
    BadDimensions {
        /// Width.
        width: usize,
        /// Height.
        height: usize,
        /// Length.
        length: usize,
    },

    /// The vertical offset exceeds [`MAX_Y_OFFSET`] in magnitude.
    #[error("vertical offset {0} out of range")]
    OffsetOutOfRange(i32),

    /// Block data does not hold exactly one entry per voxel.
    #[error("block data has {actual} entries, expected {expected}")]
    DataLength {
        /// Entries implied by the dimensions.
        expected: usize,
        /// Entries found.
        actual: usize,
    },

    /// A varint in block data ran past five bytes.
    #[error("malformed varint in block data")]
    BadVarint,

    /// Block data references a palette index that does not exist.
    #[error("palette index {0} out of range")]
    PaletteIndex(u32),
}

impl SchematicError {
    /// Distinguishes malformed input from incomplete input.
    #[must_use]
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            Self::Truncated { .. } | Self::MissingField(_) | Self::DataLength { .. } => {
                DecodeErrorKind::Incomplete
            }
            _ => DecodeErrorKind::Format,
        }
    }
}

/// One block of a pattern, relative to the anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatternBlock {
    /// X offset.
    pub dx: i32,
    /// Y offset.
    pub dy: i32,
    /// Z offset.
    pub dz: i32,
    /// World block code.
    pub block: BlockId,
}

/// A decoded, immutable structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchematicPattern {
    /// Extent along X.
    pub width: usize,
    /// Extent along Y.
    pub height: usize,
    /// Extent along Z.
    pub length: usize,
    /// Non-empty blocks.
    pub blocks: Vec<PatternBlock>,
}

impl SchematicPattern {
    /// Decodes a structure file.
    ///
    /// `y_offset` overrides the vertical offset declared in the file.
    ///
    /// # Errors
    ///
    /// Returns a [`SchematicError`] for malformed, truncated or incomplete
    /// input. Never panics on untrusted bytes.
    pub fn decode(
        bytes: &[u8],
        registry: &BlockRegistry,
        y_offset: Option<i32>,
    ) -> Result<Self, SchematicError> {
        let inflated;
        let raw = if bytes.starts_with(&GZIP_MAGIC) {
            inflated = inflate(bytes)?;
            &inflated[..]
        } else {
            bytes
        };

        let (_, root) = TagReader::new(raw).read_root()?;
        let root = root
            .get("Schematic")
            .filter(|inner| inner.as_compound().is_some())
            .unwrap_or(&root);

        let width = dimension(root, "Width")?;
        let height = dimension(root, "Height")?;
        let length = dimension(root, "Length")?;
        let volume = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(length))
            .filter(|&v| v > 0 && v <= MAX_PATTERN_VOLUME)
            .ok_or(SchematicError::BadDimensions {
                width,
                height,
                length,
            })?;

        let (palette_tag, data) = match root.get("Blocks").filter(|b| b.as_compound().is_some()) {
            Some(blocks) => (
                blocks.get("Palette").ok_or(SchematicError::MissingField("Palette"))?,
                blocks.get("Data").ok_or(SchematicError::MissingField("BlockData"))?,
            ),
            None => (
                root.get("Palette").ok_or(SchematicError::MissingField("Palette"))?,
                root.get("BlockData").ok_or(SchematicError::MissingField("BlockData"))?,
            ),
        };
        let Tag::ByteArray(data) = data else {
            return Err(SchematicError::WrongFieldType("BlockData"));
        };
        let palette = build_palette(palette_tag, registry)?;

        let y_shift = y_offset.unwrap_or_else(|| declared_y_offset(root));
        if y_shift.unsigned_abs() > MAX_Y_OFFSET.unsigned_abs() {
            return Err(SchematicError::OffsetOutOfRange(y_shift));
        }
        let half_w = (width / 2) as i32;
        let half_l = (length / 2) as i32;

        let mut blocks = Vec::new();
        let mut cursor = 0usize;
        let mut index = 0usize;
        while cursor < data.len() {
            let entry = read_varint(data, &mut cursor)?;
            if index >= volume {
                index += 1;
                continue;
            }
            if entry != 0 {
                let resolved = *palette
                    .get(entry as usize)
                    .ok_or(SchematicError::PaletteIndex(entry))?;
                if let Some(block) = resolved {
                    let x = index % width;
                    let z = (index / width) % length;
                    let y = index / (width * length);
                    blocks.push(PatternBlock {
                        dx: x as i32 - half_w,
                        dy: y as i32 + y_shift,
                        dz: z as i32 - half_l,
                        block,
                    });
                }
            }
            index += 1;
        }
        if index != volume {
            return Err(SchematicError::DataLength {
                expected: volume,
                actual: index,
            });
        }

        Ok(Self {
            width,
            height,
            length,
            blocks,
        })
    }

    /// Stamps the pattern anchored at an absolute position into `chunk`.
    ///
    /// Only the part of the pattern inside the chunk is written, and only
    /// into air voxels. Returns the number of voxels written.
    pub fn stamp(&self, chunk: &mut Chunk, anchor: (i32, i32, i32)) -> usize {
        let (ax, ay, az) = (i64::from(anchor.0), i64::from(anchor.1), i64::from(anchor.2));
        stamp_blocks(
            chunk,
            self.blocks.iter().map(|b| {
                (
                    ax + i64::from(b.dx),
                    ay + i64::from(b.dy),
                    az + i64::from(b.dz),
                    b.block,
                )
            }),
        )
    }
}

/// Write-if-air placement of absolute-coordinate blocks, clipped to `chunk`.
///
/// Positions are `i64` so pattern offsets can never overflow the sum.
pub(crate) fn stamp_blocks<I>(chunk: &mut Chunk, blocks: I) -> usize
where
    I: IntoIterator<Item = (i64, i64, i64, BlockId)>,
{
    let size = i64::from(CHUNK_SIZE_I32);
    let c = chunk.coord;
    let (ox, oy, oz) = (i64::from(c.x) * size, i64::from(c.y) * size, i64::from(c.z) * size);
    let range = 0..size;
    let mut written = 0;
    for (x, y, z, block) in blocks {
        let (lx, ly, lz) = (x - ox, y - oy, z - oz);
        if range.contains(&lx)
            && range.contains(&ly)
            && range.contains(&lz)
            && chunk.set_if_air(lx as usize, ly as usize, lz as usize, block)
        {
            written += 1;
        }
    }
    written
}

fn inflate(bytes: &[u8]) -> Result<Vec<u8>, SchematicError> {
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .take(MAX_INFLATED_BYTES + 1)
        .read_to_end(&mut out)
        .map_err(|e| SchematicError::Decompress(e.to_string()))?;
    if out.len() as u64 > MAX_INFLATED_BYTES {
        return Err(SchematicError::Decompress(format!(
            "inflated size exceeds {MAX_INFLATED_BYTES} bytes"
        )));
    }
    Ok(out)
}

fn dimension(root: &Tag, field: &'static str) -> Result<usize, SchematicError> {
    match root.get(field) {
        // Stored as a signed short but meant as unsigned.
        Some(Tag::Short(v)) => Ok(usize::from(*v as u16)),
        Some(Tag::Int(v)) => usize::try_from(*v).map_err(|_| SchematicError::WrongFieldType(field)),
        Some(_) => Err(SchematicError::WrongFieldType(field)),
        None => Err(SchematicError::MissingField(field)),
    }
}

fn declared_y_offset(root: &Tag) -> i32 {
    match root.get("Offset") {
        Some(Tag::IntArray(values)) => values.get(1).copied().unwrap_or(0),
        _ => 0,
    }
}

fn build_palette(
    tag: &Tag,
    registry: &BlockRegistry,
) -> Result<Vec<Option<BlockId>>, SchematicError> {
    let entries = tag
        .as_compound()
        .ok_or(SchematicError::WrongFieldType("Palette"))?;

    let mut palette = vec![None; entries.len()];
    for (identifier, value) in entries {
        let index = value
            .as_i64()
            .ok_or(SchematicError::WrongFieldType("Palette"))?;
        let slot = usize::try_from(index)
            .ok()
            .and_then(|i| palette.get_mut(i))
            .ok_or(SchematicError::PaletteIndex(index as u32))?;
        *slot = palette::resolve(identifier, registry);
    }
    Ok(palette)
}

fn read_varint(data: &[u8], cursor: &mut usize) -> Result<u32, SchematicError> {
    let mut value = 0u32;
    for shift in (0..35).step_by(7) {
        let Some(&byte) = data.get(*cursor) else {
            return Err(SchematicError::Truncated {
                needed: 1,
                remaining: 0,
            });
        };
        *cursor += 1;
        value |= u32::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(SchematicError::BadVarint)
}

/// Decoded patterns keyed by name.
#[derive(Clone, Debug, Default)]
pub struct PatternRegistry {
    patterns: HashMap<String, Arc<SchematicPattern>>,
}

impl PatternRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pattern, replacing any previous one with that name.
    pub fn insert(&mut self, name: impl Into<String>, pattern: SchematicPattern) {
        self.patterns.insert(name.into(), Arc::new(pattern));
    }

    /// Looks up a pattern.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<SchematicPattern>> {
        self.patterns.get(name)
    }

    /// Removes a pattern, so placements requesting it fall back to no stamp.
    pub fn remove(&mut self, name: &str) -> Option<Arc<SchematicPattern>> {
        self.patterns.remove(name)
    }

    /// Drops every pattern.
    pub fn clear(&mut self) {
        self.patterns.clear();
    }

    /// Number of registered patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if no pattern is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
