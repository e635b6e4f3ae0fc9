//! Byte codec for a single [`PalettedStorage`].
//!
//! ## Layout
//!
//! | Field | Size | Notes |
//! |-------|------|-------|
//! | header | 1 | `(bits << 1) \| network_flag` |
//! | words | `word_count(bits) × 4` | packed indices, `u32` little-endian |
//! | palette count | varint / 4 | network: zig-zag varint32, omitted when `bits == 0`; disk: `u32` LE |
//! | palette entries | … | see below |
//!
//! Palette entries are zig-zag varint32 values under the network encoding. On
//! disk, block entries are little-endian NBT `{name, states, version}` compounds
//! and biome entries are `u32` LE.

use crate::bit_packed::{PackedWords, is_valid_width, word_count};
use crate::encoding::{CodecError, Encoding, PaletteKind};
use crate::nbt::{NbtFlavor, NbtReader, NbtWriter};
use crate::palette::Palette;
use crate::paletted_storage::{PalettedStorage, STORAGE_VOLUME};
use crate::registry::BlockStateRegistry;
use crate::state::BlockStateRecord;
use crate::wire::{ByteReader, write_varint32};

/// Appends the encoded form of `storage` to `out`.
///
/// The output depends only on the arguments. Only disk block palettes consult
/// the registry, to turn runtime IDs back into state records.
pub fn encode_storage(
    out: &mut Vec<u8>,
    storage: &PalettedStorage,
    encoding: Encoding,
    kind: PaletteKind,
    registry: &BlockStateRegistry,
) -> Result<(), CodecError> {
    let words = storage.words();
    out.reserve(1 + words.len() * 4);
    out.push((storage.bits() << 1) | encoding.network_flag());
    for &word in words {
        out.extend_from_slice(&word.to_le_bytes());
    }

    let values = storage.palette().values();
    match encoding {
        Encoding::Network => {
            if storage.bits() != 0 {
                write_varint32(out, values.len() as i32);
            }
            for &v in values {
                write_varint32(out, v as i32);
            }
        }
        Encoding::Disk => {
            out.extend_from_slice(&(values.len() as u32).to_le_bytes());
            match kind {
                PaletteKind::Block => {
                    for &id in values {
                        let record = registry.resolve(id)?;
                        NbtWriter::new(out, NbtFlavor::LittleEndian).write_root(&record.to_nbt())?;
                    }
                }
                PaletteKind::Biome => {
                    for &v in values {
                        out.extend_from_slice(&v.to_le_bytes());
                    }
                }
            }
        }
    }
    Ok(())
}

/// Reads one storage from `reader`, header byte included.
///
/// Every length is checked against the remaining input before it is used, and
/// the cursor is left after the palette on success.
pub fn decode_storage(
    reader: &mut ByteReader<'_>,
    encoding: Encoding,
    kind: PaletteKind,
    registry: &BlockStateRegistry,
) -> Result<PalettedStorage, CodecError> {
    let header = reader.read_u8()?;
    let bits = header >> 1;
    if !is_valid_width(bits) {
        return Err(CodecError::MalformedPalette(format!(
            "invalid index width {bits}"
        )));
    }
    if header & 1 != encoding.network_flag() {
        return Err(CodecError::MalformedPalette(format!(
            "storage header {header:#04x} does not match {encoding:?} encoding"
        )));
    }

    let raw = reader.take(word_count(bits, STORAGE_VOLUME) * 4)?;
    let words = raw
        .chunks_exact(4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    let indices = PackedWords::from_words(bits, STORAGE_VOLUME, words);

    let len = match encoding {
        Encoding::Network if bits == 0 => 1,
        Encoding::Network => {
            let n = reader.read_varint32()?;
            usize::try_from(n).map_err(|_| {
                CodecError::MalformedPalette(format!("negative palette length {n}"))
            })?
        }
        Encoding::Disk => reader.read_u32_le()? as usize,
    };
    if len == 0 || len > STORAGE_VOLUME {
        return Err(CodecError::MalformedPalette(format!(
            "palette length {len} outside 1..={STORAGE_VOLUME}"
        )));
    }
    if bits == 0 && len != 1 {
        return Err(CodecError::MalformedPalette(format!(
            "width 0 storage with {len} palette entries"
        )));
    }

    let mut values = Vec::with_capacity(len);
    for _ in 0..len {
        values.push(read_entry(reader, encoding, kind, registry)?);
    }
    let palette = Palette::from_values(values)
        .ok_or_else(|| CodecError::MalformedPalette("repeated palette entry".into()))?;

    PalettedStorage::from_parts(palette, indices).ok_or_else(|| {
        CodecError::MalformedPalette(format!("index exceeds palette length {len}"))
    })
}

fn read_entry(
    reader: &mut ByteReader<'_>,
    encoding: Encoding,
    kind: PaletteKind,
    registry: &BlockStateRegistry,
) -> Result<u32, CodecError> {
    match (encoding, kind) {
        // Entries are the bit pattern of the value, so IDs above i32::MAX come
        // back negative from the varint.
        (Encoding::Network, _) => Ok(reader.read_varint32()? as u32),
        (Encoding::Disk, PaletteKind::Biome) => Ok(reader.read_u32_le()?),
        (Encoding::Disk, PaletteKind::Block) => {
            let mut nbt = NbtReader::from_reader(reader.clone(), NbtFlavor::LittleEndian);
            let root = nbt.read_root()?;
            *reader = nbt.into_inner();
            let record = BlockStateRecord::from_nbt(root)?;
            registry
                .lookup(&record.name, &record.properties)
                .ok_or(CodecError::UnknownState { name: record.name })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
