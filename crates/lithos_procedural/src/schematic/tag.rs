//! # Tag Tree Codec
//!
//! Cursor-based reader (and a small writer) for the big-endian typed tag
//! tree used by structure files.
//!
//! Every read checks the remaining length first; nothing here indexes past
//! the buffer or allocates more than the input could possibly describe.

use std::collections::HashMap;

use super::SchematicError;

/// Maximum compound/list nesting accepted by the reader.
pub const MAX_DEPTH: usize = 512;

/// Tag type identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum TagType {
    /// Terminates a compound.
    End = 0,
    /// Signed 8-bit integer.
    Byte = 1,
    /// Signed 16-bit integer.
    Short = 2,
    /// Signed 32-bit integer.
    Int = 3,
    /// Signed 64-bit integer.
    Long = 4,
    /// 32-bit float.
    Float = 5,
    /// 64-bit float.
    Double = 6,
    /// Length-prefixed byte array.
    ByteArray = 7,
    /// Length-prefixed UTF-8 string.
    String = 8,
    /// Homogeneous list.
    List = 9,
    /// Named tag map.
    Compound = 10,
    /// Length-prefixed int array.
    IntArray = 11,
    /// Length-prefixed long array.
    LongArray = 12,
}

impl TagType {
    /// Converts from u8.
    #[must_use]
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Self::End,
            1 => Self::Byte,
            2 => Self::Short,
            3 => Self::Int,
            4 => Self::Long,
            5 => Self::Float,
            6 => Self::Double,
            7 => Self::ByteArray,
            8 => Self::String,
            9 => Self::List,
            10 => Self::Compound,
            11 => Self::IntArray,
            12 => Self::LongArray,
            _ => return None,
        })
    }
}

/// A decoded tag value.
#[derive(Clone, Debug, PartialEq)]
pub enum Tag {
    /// End marker (only meaningful as an empty list element type).
    End,
    /// Signed byte.
    Byte(i8),
    /// Signed short.
    Short(i16),
    /// Signed int.
    Int(i32),
    /// Signed long.
    Long(i64),
    /// Float.
    Float(f32),
    /// Double.
    Double(f64),
    /// Raw bytes.
    ByteArray(Vec<u8>),
    /// String.
    String(String),
    /// List with its declared element type.
    List(TagType, Vec<Tag>),
    /// Named children.
    Compound(HashMap<String, Tag>),
    /// Ints.
    IntArray(Vec<i32>),
    /// Longs.
    LongArray(Vec<i64>),
}

impl Tag {
    /// Type identifier of this value.
    #[must_use]
    pub fn tag_type(&self) -> TagType {
        match self {
            Self::End => TagType::End,
            Self::Byte(_) => TagType::Byte,
            Self::Short(_) => TagType::Short,
            Self::Int(_) => TagType::Int,
            Self::Long(_) => TagType::Long,
            Self::Float(_) => TagType::Float,
            Self::Double(_) => TagType::Double,
            Self::ByteArray(_) => TagType::ByteArray,
            Self::String(_) => TagType::String,
            Self::List(..) => TagType::List,
            Self::Compound(_) => TagType::Compound,
            Self::IntArray(_) => TagType::IntArray,
            Self::LongArray(_) => TagType::LongArray,
        }
    }

    /// Child of a compound.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Tag> {
        match self {
            Self::Compound(map) => map.get(name),
            _ => None,
        }
    }

    /// Children of a compound.
    #[must_use]
    pub fn as_compound(&self) -> Option<&HashMap<String, Tag>> {
        match self {
            Self::Compound(map) => Some(map),
            _ => None,
        }
    }

    /// Any integer tag widened to `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Byte(v) => Some(i64::from(v)),
            Self::Short(v) => Some(i64::from(v)),
            Self::Int(v) => Some(i64::from(v)),
            Self::Long(v) => Some(v),
            _ => None,
        }
    }

    /// Serializes this tag as a named root.
    #[must_use]
    pub fn to_bytes(&self, name: &str) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(self.tag_type() as u8);
        write_string(&mut out, name);
        self.write_payload(&mut out);
        out
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        match self {
            Self::End => {}
            Self::Byte(v) => out.extend_from_slice(&v.to_be_bytes()),
            Self::Short(v) => out.extend_from_slice(&v.to_be_bytes()),
            Self::Int(v) => out.extend_from_slice(&v.to_be_bytes()),
            Self::Long(v) => out.extend_from_slice(&v.to_be_bytes()),
            Self::Float(v) => out.extend_from_slice(&v.to_be_bytes()),
            Self::Double(v) => out.extend_from_slice(&v.to_be_bytes()),
            Self::ByteArray(bytes) => {
                out.extend_from_slice(&(bytes.len() as i32).to_be_bytes());
                out.extend_from_slice(bytes);
            }
            Self::String(s) => write_string(out, s),
            Self::List(element, items) => {
                out.push(*element as u8);
                out.extend_from_slice(&(items.len() as i32).to_be_bytes());
                for item in items {
                    item.write_payload(out);
                }
            }
            Self::Compound(map) => {
                // Sorted so encoding is stable.
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                for (name, tag) in entries {
                    out.push(tag.tag_type() as u8);
                    write_string(out, name);
                    tag.write_payload(out);
                }
                out.push(TagType::End as u8);
            }
            Self::IntArray(values) => {
                out.extend_from_slice(&(values.len() as i32).to_be_bytes());
                for v in values {
                    out.extend_from_slice(&v.to_be_bytes());
                }
            }
            Self::LongArray(values) => {
                out.extend_from_slice(&(values.len() as i32).to_be_bytes());
                for v in values {
                    out.extend_from_slice(&v.to_be_bytes());
                }
            }
        }
    }
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    let len = bytes.len().min(usize::from(u16::MAX));
    out.extend_from_slice(&(len as u16).to_be_bytes());
    out.extend_from_slice(&bytes[..len]);
}

/// Big-endian cursor over a tag tree buffer.
pub struct TagReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> TagReader<'a> {
    /// Creates a new reader from a buffer.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Returns the number of bytes remaining.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], SchematicError> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(SchematicError::Truncated { needed, remaining });
        }
        let slice = &self.buffer[self.position..self.position + needed];
        self.position += needed;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], SchematicError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Reads an unsigned byte.
    pub fn read_u8(&mut self) -> Result<u8, SchematicError> {
        Ok(self.take_array::<1>()?[0])
    }

    /// Reads a signed short.
    pub fn read_i16(&mut self) -> Result<i16, SchematicError> {
        Ok(i16::from_be_bytes(self.take_array()?))
    }

    /// Reads a signed int.
    pub fn read_i32(&mut self) -> Result<i32, SchematicError> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    /// Reads a signed long.
    pub fn read_i64(&mut self) -> Result<i64, SchematicError> {
        Ok(i64::from_be_bytes(self.take_array()?))
    }

    /// Reads a `u16`-length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, SchematicError> {
        let len = usize::from(u16::from_be_bytes(self.take_array()?));
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| SchematicError::InvalidUtf8)
    }

    /// Reads an `i32` element count and checks that `count * element_size`
    /// bytes can still follow.
    fn read_len(&mut self, element_size: usize) -> Result<usize, SchematicError> {
        let raw = self.read_i32()?;
        let len = usize::try_from(raw).map_err(|_| SchematicError::NegativeLength(raw))?;
        let needed = len.saturating_mul(element_size.max(1));
        let remaining = self.remaining();
        if needed > remaining {
            return Err(SchematicError::Truncated { needed, remaining });
        }
        Ok(len)
    }

    fn read_type(&mut self) -> Result<TagType, SchematicError> {
        let id = self.read_u8()?;
        TagType::from_u8(id).ok_or(SchematicError::InvalidTagType(id))
    }

    /// Reads the named root tag.
    ///
    /// # Errors
    ///
    /// Fails on truncation, unknown tag types, negative lengths, invalid
    /// UTF-8, nesting deeper than [`MAX_DEPTH`], or a root that is not a
    /// compound.
    pub fn read_root(&mut self) -> Result<(String, Tag), SchematicError> {
        let tag_type = self.read_type()?;
        if tag_type != TagType::Compound {
            return Err(SchematicError::RootNotCompound(tag_type as u8));
        }
        let name = self.read_string()?;
        let tag = self.read_payload(tag_type, 0)?;
        Ok((name, tag))
    }

    /// Reads the payload of a tag of the given type.
    pub fn read_payload(&mut self, tag_type: TagType, depth: usize) -> Result<Tag, SchematicError> {
        if depth > MAX_DEPTH {
            return Err(SchematicError::TooDeep);
        }

        Ok(match tag_type {
            TagType::End => Tag::End,
            TagType::Byte => Tag::Byte(i8::from_be_bytes(self.take_array()?)),
            TagType::Short => Tag::Short(self.read_i16()?),
            TagType::Int => Tag::Int(self.read_i32()?),
            TagType::Long => Tag::Long(self.read_i64()?),
            TagType::Float => Tag::Float(f32::from_be_bytes(self.take_array()?)),
            TagType::Double => Tag::Double(f64::from_be_bytes(self.take_array()?)),
            TagType::ByteArray => {
                let len = self.read_len(1)?;
                Tag::ByteArray(self.take(len)?.to_vec())
            }
            TagType::String => Tag::String(self.read_string()?),
            TagType::List => {
                let element = self.read_type()?;
                let len = self.read_len(1)?;
                if element == TagType::End && len > 0 {
                    return Err(SchematicError::InvalidTagType(TagType::End as u8));
                }
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.read_payload(element, depth + 1)?);
                }
                Tag::List(element, items)
            }
            TagType::Compound => {
                let mut map = HashMap::new();
                loop {
                    let child = self.read_type()?;
                    if child == TagType::End {
                        break;
                    }
                    let name = self.read_string()?;
                    let value = self.read_payload(child, depth + 1)?;
                    map.insert(name, value);
                }
                Tag::Compound(map)
            }
            TagType::IntArray => {
                let len = self.read_len(4)?;
                let mut values = Vec::with_capacity(len);
                for _ in 0..len {
                    values.push(self.read_i32()?);
                }
                Tag::IntArray(values)
            }
            TagType::LongArray => {
                let len = self.read_len(8)?;
                let mut values = Vec::with_capacity(len);
                for _ in 0..len {
                    values.push(self.read_i64()?);
                }
                Tag::LongArray(values)
            }
        })
    }
}
