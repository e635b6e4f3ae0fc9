//! Minimal NBT reader/writer for block state records.
//!
//! Two little-endian flavours are supported:
//!
//! | Flavour | String length | Int / Long | List & array length |
//! |---------|---------------|------------|---------------------|
//! | [`NbtFlavor::LittleEndian`] | `u16` LE | fixed LE | `i32` LE |
//! | [`NbtFlavor::NetworkLittleEndian`] | varuint32 | zig-zag varint | zig-zag varint32 |
//!
//! Disk palettes use the plain little-endian flavour; shipped state tables are
//! usually network little-endian.

use std::collections::BTreeMap;

use crate::wire::{ByteReader, Eof, write_varint32, write_varint64, write_varuint32};

const TAG_END: u8 = 0;
const TAG_BYTE: u8 = 1;
const TAG_SHORT: u8 = 2;
const TAG_INT: u8 = 3;
const TAG_LONG: u8 = 4;
const TAG_FLOAT: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_BYTE_ARRAY: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_LIST: u8 = 9;
const TAG_COMPOUND: u8 = 10;
const TAG_INT_ARRAY: u8 = 11;
const TAG_LONG_ARRAY: u8 = 12;

/// Nesting limit for compounds and lists.
const MAX_DEPTH: usize = 512;

/// Byte layout variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NbtFlavor {
    /// Fixed-width little-endian integers (Bedrock disk format).
    LittleEndian,
    /// Varint integers and lengths (Bedrock network format).
    #[default]
    NetworkLittleEndian,
}

/// A decoded NBT value.
#[derive(Clone, Debug, PartialEq)]
pub enum NbtTag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    String(String),
    List(Vec<NbtTag>),
    Compound(BTreeMap<String, NbtTag>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

/// Errors produced while reading or writing NBT.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NbtError {
    /// The input ended inside a tag.
    #[error(transparent)]
    UnexpectedEof(#[from] Eof),
    /// A tag type byte outside 0..=12.
    #[error("unknown NBT tag type {0}")]
    UnknownTag(u8),
    /// The root tag was not a compound.
    #[error("root tag must be a compound, found type {0}")]
    RootNotCompound(u8),
    /// A string was not valid UTF-8.
    #[error("NBT string is not valid UTF-8")]
    InvalidString,
    /// A list or array declared a negative length.
    #[error("negative NBT length {0}")]
    NegativeLength(i32),
    /// A list contained elements of mixed types.
    #[error("NBT list mixes element types")]
    MixedList,
    /// A string is too long for the flavour's `u16` length prefix.
    #[error("NBT string of {0} bytes exceeds the 65535 byte limit")]
    StringTooLong(usize),
    /// Nesting exceeded the depth limit.
    #[error("NBT nesting exceeds the depth limit")]
    DepthLimit,
}

impl NbtTag {
    /// Tag type id.
    pub fn type_id(&self) -> u8 {
        match self {
            NbtTag::Byte(_) => TAG_BYTE,
            NbtTag::Short(_) => TAG_SHORT,
            NbtTag::Int(_) => TAG_INT,
            NbtTag::Long(_) => TAG_LONG,
            NbtTag::Float(_) => TAG_FLOAT,
            NbtTag::Double(_) => TAG_DOUBLE,
            NbtTag::ByteArray(_) => TAG_BYTE_ARRAY,
            NbtTag::String(_) => TAG_STRING,
            NbtTag::List(_) => TAG_LIST,
            NbtTag::Compound(_) => TAG_COMPOUND,
            NbtTag::IntArray(_) => TAG_INT_ARRAY,
            NbtTag::LongArray(_) => TAG_LONG_ARRAY,
        }
    }

    /// Lower-case tag name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            NbtTag::Byte(_) => "byte",
            NbtTag::Short(_) => "short",
            NbtTag::Int(_) => "int",
            NbtTag::Long(_) => "long",
            NbtTag::Float(_) => "float",
            NbtTag::Double(_) => "double",
            NbtTag::ByteArray(_) => "byte array",
            NbtTag::String(_) => "string",
            NbtTag::List(_) => "list",
            NbtTag::Compound(_) => "compound",
            NbtTag::IntArray(_) => "int array",
            NbtTag::LongArray(_) => "long array",
        }
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Streaming reader over a sequence of root compounds.
pub struct NbtReader<'a> {
    input: ByteReader<'a>,
    flavor: NbtFlavor,
}

impl<'a> NbtReader<'a> {
    pub fn new(data: &'a [u8], flavor: NbtFlavor) -> Self {
        Self {
            input: ByteReader::new(data),
            flavor,
        }
    }

    /// Continues reading from an existing cursor (used inside larger records).
    pub fn from_reader(input: ByteReader<'a>, flavor: NbtFlavor) -> Self {
        Self { input, flavor }
    }

    /// Hands the cursor back, positioned after the last tag read.
    pub fn into_inner(self) -> ByteReader<'a> {
        self.input
    }

    /// Reads the next root compound, or `None` at a clean end of input.
    pub fn next_root(&mut self) -> Result<Option<BTreeMap<String, NbtTag>>, NbtError> {
        if self.input.is_empty() {
            return Ok(None);
        }
        self.read_root().map(Some)
    }

    /// Reads one root compound, failing if the input is exhausted.
    pub fn read_root(&mut self) -> Result<BTreeMap<String, NbtTag>, NbtError> {
        let ty = self.input.read_u8()?;
        if ty != TAG_COMPOUND {
            return Err(NbtError::RootNotCompound(ty));
        }
        let _name = self.read_string()?;
        self.read_compound_body(0)
    }

    fn read_string(&mut self) -> Result<String, NbtError> {
        let len = match self.flavor {
            NbtFlavor::LittleEndian => self.input.read_u16_le()? as usize,
            NbtFlavor::NetworkLittleEndian => self.input.read_varuint32()? as usize,
        };
        let bytes = self.input.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| NbtError::InvalidString)
    }

    fn read_int(&mut self) -> Result<i32, NbtError> {
        Ok(match self.flavor {
            NbtFlavor::LittleEndian => self.input.read_i32_le()?,
            NbtFlavor::NetworkLittleEndian => self.input.read_varint32()?,
        })
    }

    fn read_long(&mut self) -> Result<i64, NbtError> {
        Ok(match self.flavor {
            NbtFlavor::LittleEndian => self.input.read_i64_le()?,
            NbtFlavor::NetworkLittleEndian => self.input.read_varint64()?,
        })
    }

    fn read_len(&mut self) -> Result<usize, NbtError> {
        let len = self.read_int()?;
        usize::try_from(len).map_err(|_| NbtError::NegativeLength(len))
    }

    fn read_compound_body(&mut self, depth: usize) -> Result<BTreeMap<String, NbtTag>, NbtError> {
        if depth >= MAX_DEPTH {
            return Err(NbtError::DepthLimit);
        }
        let mut map = BTreeMap::new();
        loop {
            let ty = self.input.read_u8()?;
            if ty == TAG_END {
                return Ok(map);
            }
            let name = self.read_string()?;
            let value = self.read_payload(ty, depth + 1)?;
            map.insert(name, value);
        }
    }

    fn read_payload(&mut self, ty: u8, depth: usize) -> Result<NbtTag, NbtError> {
        if depth >= MAX_DEPTH {
            return Err(NbtError::DepthLimit);
        }
        Ok(match ty {
            TAG_BYTE => NbtTag::Byte(self.input.read_u8()? as i8),
            TAG_SHORT => NbtTag::Short(self.input.read_i16_le()?),
            TAG_INT => NbtTag::Int(self.read_int()?),
            TAG_LONG => NbtTag::Long(self.read_long()?),
            TAG_FLOAT => NbtTag::Float(f32::from_bits(self.input.read_u32_le()?)),
            TAG_DOUBLE => NbtTag::Double(f64::from_bits(self.input.read_i64_le()? as u64)),
            TAG_BYTE_ARRAY => {
                let len = self.read_len()?;
                NbtTag::ByteArray(self.input.take(len)?.to_vec())
            }
            TAG_STRING => NbtTag::String(self.read_string()?),
            TAG_LIST => {
                let elem = self.input.read_u8()?;
                let len = self.read_len()?;
                if elem == TAG_END && len > 0 {
                    return Err(NbtError::UnknownTag(TAG_END));
                }
                // Each element needs at least one byte; cap the reservation accordingly.
                let mut items = Vec::with_capacity(len.min(self.input.remaining()));
                for _ in 0..len {
                    items.push(self.read_payload(elem, depth + 1)?);
                }
                NbtTag::List(items)
            }
            TAG_COMPOUND => NbtTag::Compound(self.read_compound_body(depth)?),
            TAG_INT_ARRAY => {
                let len = self.read_len()?;
                let mut items = Vec::with_capacity(len.min(self.input.remaining()));
                for _ in 0..len {
                    items.push(self.read_int()?);
                }
                NbtTag::IntArray(items)
            }
            TAG_LONG_ARRAY => {
                let len = self.read_len()?;
                let mut items = Vec::with_capacity(len.min(self.input.remaining()));
                for _ in 0..len {
                    items.push(self.read_long()?);
                }
                NbtTag::LongArray(items)
            }
            other => return Err(NbtError::UnknownTag(other)),
        })
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Serializer appending NBT to a byte buffer.
pub struct NbtWriter<'a> {
    out: &'a mut Vec<u8>,
    flavor: NbtFlavor,
}

impl<'a> NbtWriter<'a> {
    pub fn new(out: &'a mut Vec<u8>, flavor: NbtFlavor) -> Self {
        Self { out, flavor }
    }

    /// Writes an unnamed root compound.
    ///
    /// On error the buffer may hold a partial compound.
    pub fn write_root(&mut self, compound: &BTreeMap<String, NbtTag>) -> Result<(), NbtError> {
        self.out.push(TAG_COMPOUND);
        self.write_string("")?;
        self.write_compound_body(compound)
    }

    fn write_string(&mut self, s: &str) -> Result<(), NbtError> {
        match self.flavor {
            NbtFlavor::LittleEndian => {
                let len = u16::try_from(s.len()).map_err(|_| NbtError::StringTooLong(s.len()))?;
                self.out.extend_from_slice(&len.to_le_bytes());
            }
            NbtFlavor::NetworkLittleEndian => write_varuint32(self.out, s.len() as u32),
        }
        self.out.extend_from_slice(s.as_bytes());
        Ok(())
    }

    fn write_int(&mut self, v: i32) {
        match self.flavor {
            NbtFlavor::LittleEndian => self.out.extend_from_slice(&v.to_le_bytes()),
            NbtFlavor::NetworkLittleEndian => write_varint32(self.out, v),
        }
    }

    fn write_long(&mut self, v: i64) {
        match self.flavor {
            NbtFlavor::LittleEndian => self.out.extend_from_slice(&v.to_le_bytes()),
            NbtFlavor::NetworkLittleEndian => write_varint64(self.out, v),
        }
    }

    fn write_compound_body(&mut self, compound: &BTreeMap<String, NbtTag>) -> Result<(), NbtError> {
        for (name, value) in compound {
            self.out.push(value.type_id());
            self.write_string(name)?;
            self.write_payload(value)?;
        }
        self.out.push(TAG_END);
        Ok(())
    }

    fn write_payload(&mut self, tag: &NbtTag) -> Result<(), NbtError> {
        match tag {
            NbtTag::Byte(v) => self.out.push(*v as u8),
            NbtTag::Short(v) => self.out.extend_from_slice(&v.to_le_bytes()),
            NbtTag::Int(v) => self.write_int(*v),
            NbtTag::Long(v) => self.write_long(*v),
            NbtTag::Float(v) => self.out.extend_from_slice(&v.to_bits().to_le_bytes()),
            NbtTag::Double(v) => self.out.extend_from_slice(&v.to_bits().to_le_bytes()),
            NbtTag::ByteArray(v) => {
                self.write_int(v.len() as i32);
                self.out.extend_from_slice(v);
            }
            NbtTag::String(v) => self.write_string(v)?,
            NbtTag::List(items) => {
                let elem = items.first().map_or(TAG_END, NbtTag::type_id);
                if items.iter().any(|t| t.type_id() != elem) {
                    return Err(NbtError::MixedList);
                }
                self.out.push(elem);
                self.write_int(items.len() as i32);
                for item in items {
                    self.write_payload(item)?;
                }
            }
            NbtTag::Compound(map) => self.write_compound_body(map)?,
            NbtTag::IntArray(v) => {
                self.write_int(v.len() as i32);
                for x in v {
                    self.write_int(*x);
                }
            }
            NbtTag::LongArray(v) => {
                self.write_int(v.len() as i32);
                for x in v {
                    self.write_long(*x);
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BTreeMap<String, NbtTag> {
        let mut states = BTreeMap::new();
        states.insert("age".to_string(), NbtTag::Int(-3));
        states.insert("lit".to_string(), NbtTag::Byte(1));
        states.insert("facing".to_string(), NbtTag::String("north".into()));

        let mut root = BTreeMap::new();
        root.insert("name".to_string(), NbtTag::String("minecraft:furnace".into()));
        root.insert("states".to_string(), NbtTag::Compound(states));
        root.insert("version".to_string(), NbtTag::Int(17_825_806));
        root.insert(
            "extra".to_string(),
            NbtTag::List(vec![NbtTag::Long(1 << 40), NbtTag::Long(-7)]),
        );
        root.insert("scale".to_string(), NbtTag::Double(0.25));
        root
    }

    #[test]
    fn test_roundtrip_both_flavors() {
        for flavor in [NbtFlavor::LittleEndian, NbtFlavor::NetworkLittleEndian] {
            let mut out = Vec::new();
            NbtWriter::new(&mut out, flavor).write_root(&sample()).unwrap();
            let mut reader = NbtReader::new(&out, flavor);
            assert_eq!(reader.next_root().unwrap(), Some(sample()), "{flavor:?}");
            assert_eq!(reader.next_root().unwrap(), None);
        }
    }

    #[test]
    fn test_little_endian_layout() {
        let mut root = BTreeMap::new();
        root.insert("v".to_string(), NbtTag::Int(1));
        let mut out = Vec::new();
        NbtWriter::new(&mut out, NbtFlavor::LittleEndian)
            .write_root(&root)
            .unwrap();
        assert_eq!(
            out,
            [
                TAG_COMPOUND, 0, 0, // root, empty name
                TAG_INT, 1, 0, b'v', 1, 0, 0, 0, // "v": 1
                TAG_END,
            ]
        );
    }

    #[test]
    fn test_truncated_input_is_error() {
        let mut out = Vec::new();
        NbtWriter::new(&mut out, NbtFlavor::LittleEndian)
            .write_root(&sample())
            .unwrap();
        for cut in [1, 3, out.len() / 2, out.len() - 1] {
            let mut reader = NbtReader::new(&out[..cut], NbtFlavor::LittleEndian);
            assert!(
                matches!(reader.next_root(), Err(NbtError::UnexpectedEof(_))),
                "cut at {cut}"
            );
        }
    }

    #[test]
    fn test_root_must_be_compound() {
        let mut reader = NbtReader::new(&[TAG_INT, 0, 0, 1, 0, 0, 0], NbtFlavor::LittleEndian);
        assert_eq!(reader.next_root(), Err(NbtError::RootNotCompound(TAG_INT)));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let data = [TAG_COMPOUND, 0, 0, 42, 1, 0, b'x'];
        let mut reader = NbtReader::new(&data, NbtFlavor::LittleEndian);
        assert_eq!(reader.next_root(), Err(NbtError::UnknownTag(42)));
    }

    #[test]
    fn test_negative_list_length_rejected() {
        let mut data = vec![TAG_COMPOUND, 0, 0, TAG_LIST, 1, 0, b'l', TAG_BYTE];
        data.extend_from_slice(&(-1i32).to_le_bytes());
        let mut reader = NbtReader::new(&data, NbtFlavor::LittleEndian);
        assert_eq!(reader.next_root(), Err(NbtError::NegativeLength(-1)));
    }

    #[test]
    fn test_long_string_rejected_by_fixed_width_flavor() {
        let mut root = BTreeMap::new();
        root.insert("name".to_string(), NbtTag::String("é".repeat(40_000)));

        let mut out = Vec::new();
        let result = NbtWriter::new(&mut out, NbtFlavor::LittleEndian).write_root(&root);
        assert_eq!(result, Err(NbtError::StringTooLong(80_000)));

        let mut out = Vec::new();
        NbtWriter::new(&mut out, NbtFlavor::NetworkLittleEndian)
            .write_root(&root)
            .unwrap();
        let decoded = NbtReader::new(&out, NbtFlavor::NetworkLittleEndian)
            .read_root()
            .unwrap();
        assert_eq!(decoded, root);
    }

    #[test]
    fn test_mixed_list_rejected_on_write() {
        let mut root = BTreeMap::new();
        root.insert(
            "l".to_string(),
            NbtTag::List(vec![NbtTag::Byte(1), NbtTag::Int(2)]),
        );
        let mut out = Vec::new();
        let result = NbtWriter::new(&mut out, NbtFlavor::LittleEndian).write_root(&root);
        assert_eq!(result, Err(NbtError::MixedList));
    }
}
