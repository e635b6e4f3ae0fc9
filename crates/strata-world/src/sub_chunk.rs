//! 16-block-tall vertical slices and their byte codec.
//!
//! A sub-chunk record is `[version][storage count][vertical index]` followed by
//! one block storage per layer. Version 8 records omit the vertical index. An
//! empty sub-chunk is written as zero bytes.

use crate::chunk::VerticalRange;
use crate::encoding::{CodecError, Encoding, PaletteKind};
use crate::paletted_storage::PalettedStorage;
use crate::registry::{BlockStateRegistry, RuntimeId};
use crate::storage_codec::{decode_storage, encode_storage};
use crate::wire::ByteReader;

/// Version byte written by [`encode_sub_chunk`].
pub const SUB_CHUNK_VERSION: u8 = 9;

/// Older version without the vertical index byte. Read only.
pub const SUB_CHUNK_VERSION_NO_INDEX: u8 = 8;

/// One 16×16×16 slice holding a block storage per layer.
///
/// Layer 0 holds regular blocks; higher layers hold blocks that share a cell
/// with them, such as water in a waterlogged block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubChunk {
    air: RuntimeId,
    storages: Vec<PalettedStorage>,
}

impl SubChunk {
    /// An empty slice whose absent cells read as `air`.
    pub fn new(air: RuntimeId) -> Self {
        Self {
            air,
            storages: Vec::new(),
        }
    }

    /// A slice built from decoded layers.
    pub fn from_storages(air: RuntimeId, storages: Vec<PalettedStorage>) -> Self {
        Self { air, storages }
    }

    /// Whether the slice holds no layers.
    pub fn is_empty(&self) -> bool {
        self.storages.is_empty()
    }

    /// Runtime ID reported for cells of absent layers.
    pub fn air(&self) -> RuntimeId {
        self.air
    }

    pub fn storages(&self) -> &[PalettedStorage] {
        &self.storages
    }

    /// Layer `layer`, if it exists.
    pub fn layer(&self, layer: u8) -> Option<&PalettedStorage> {
        self.storages.get(usize::from(layer))
    }

    /// Layer `layer`, allocating it and every layer below it filled with air.
    pub fn layer_mut(&mut self, layer: u8) -> &mut PalettedStorage {
        let index = usize::from(layer);
        while self.storages.len() <= index {
            self.storages.push(PalettedStorage::uniform(self.air));
        }
        &mut self.storages[index]
    }

    /// Runtime ID at local `(x, y, z)` in `layer`; air for absent layers.
    pub fn block(&self, x: u8, y: u8, z: u8, layer: u8) -> RuntimeId {
        self.layer(layer)
            .map_or(self.air, |storage| storage.at(x, y, z))
    }

    /// Stores `id` at local `(x, y, z)` in `layer`.
    ///
    /// Writing air to an absent layer leaves it absent.
    pub fn set_block(&mut self, x: u8, y: u8, z: u8, layer: u8, id: RuntimeId) {
        if id == self.air && self.layer(layer).is_none() {
            return;
        }
        self.layer_mut(layer).set(x, y, z, id);
    }

    /// Compacts every layer and drops trailing layers that hold only air.
    pub fn compact(&mut self) {
        for storage in &mut self.storages {
            storage.compact();
        }
        while self
            .storages
            .last()
            .is_some_and(|storage| storage.is_filled_with(self.air))
        {
            self.storages.pop();
        }
    }
}

/// Appends the record for the sub-chunk at position `index` (counted from the
/// bottom of `range`). Writes nothing for an empty sub-chunk.
pub fn encode_sub_chunk(
    out: &mut Vec<u8>,
    sub: &SubChunk,
    encoding: Encoding,
    range: VerticalRange,
    index: usize,
    registry: &BlockStateRegistry,
) -> Result<(), CodecError> {
    if sub.is_empty() {
        return Ok(());
    }
    let count = u8::try_from(sub.storages.len()).map_err(|_| CodecError::TooManyLayers {
        count: sub.storages.len(),
    })?;
    out.push(SUB_CHUNK_VERSION);
    out.push(count);
    out.push(range.vertical_index(index) as u8);
    for storage in &sub.storages {
        encode_storage(out, storage, encoding, PaletteKind::Block, registry)?;
    }
    Ok(())
}

/// Decodes a sub-chunk record.
///
/// Returns the slice and the vertical index from its header, which version 8
/// records and empty input do not carry. Bytes after the last layer are ignored.
pub fn decode_sub_chunk(
    data: &[u8],
    encoding: Encoding,
    air: RuntimeId,
    registry: &BlockStateRegistry,
) -> Result<(SubChunk, Option<i8>), CodecError> {
    if data.is_empty() {
        return Ok((SubChunk::new(air), None));
    }
    let mut reader = ByteReader::new(data);
    let version = reader.read_u8()?;
    let (count, index) = match version {
        SUB_CHUNK_VERSION => {
            let count = reader.read_u8()?;
            let index = reader.read_u8()? as i8;
            (count, Some(index))
        }
        SUB_CHUNK_VERSION_NO_INDEX => (reader.read_u8()?, None),
        other => return Err(CodecError::UnsupportedVersion(other)),
    };

    let mut storages = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        storages.push(decode_storage(
            &mut reader,
            encoding,
            PaletteKind::Block,
            registry,
        )?);
    }
    Ok((SubChunk::from_storages(air, storages), index))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
