//! Whole-chunk encoding into [`SerialisedData`] and back.
//!
//! A [`ChunkCodec`] is created once per world from the frozen registry and
//! shared by every worker thread. Each call checks scratch buffers out of the
//! codec's [`BufferPool`], so concurrent calls never wait on each other.

use std::sync::Arc;

use crate::chunk::{Chunk, SerialisedData, VerticalRange};
use crate::encoding::{CodecError, Encoding, PaletteKind};
use crate::paletted_storage::PalettedStorage;
use crate::pool::BufferPool;
use crate::registry::BlockStateRegistry;
use crate::storage_codec::{decode_storage, encode_storage};
use crate::sub_chunk::{SubChunk, decode_sub_chunk, encode_sub_chunk};
use crate::wire::ByteReader;

/// Biome header byte meaning "same storage as the slice below". Network only.
pub const BIOME_COPY_PREVIOUS: u8 = 0xFF;

/// Encodes and decodes chunks for one vertical range.
#[derive(Debug)]
pub struct ChunkCodec {
    registry: Arc<BlockStateRegistry>,
    range: VerticalRange,
    pool: BufferPool,
    default_biome: u32,
}

impl ChunkCodec {
    pub fn new(registry: Arc<BlockStateRegistry>, range: VerticalRange, pool: BufferPool) -> Self {
        Self {
            registry,
            range,
            pool,
            default_biome: 0,
        }
    }

    /// Biome given to every slice of a decoded chunk that carries no biome data.
    pub fn with_default_biome(mut self, biome: u32) -> Self {
        self.default_biome = biome;
        self
    }

    pub fn registry(&self) -> &Arc<BlockStateRegistry> {
        &self.registry
    }

    pub fn range(&self) -> VerticalRange {
        self.range
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// A new all-air chunk spanning this codec's range.
    pub fn new_chunk(&self) -> Chunk {
        Chunk::new(self.registry.air_id(), self.range, self.default_biome)
    }

    /// Serialises `chunk`: one record per sub-chunk, the concatenated biome
    /// storages, and the block entity NBT unchanged.
    pub fn encode(&self, chunk: &Chunk, encoding: Encoding) -> Result<SerialisedData, CodecError> {
        if chunk.range() != self.range {
            return Err(CodecError::RangeMismatch {
                expected_min: self.range.min(),
                expected_max: self.range.max(),
                found_min: chunk.range().min(),
                found_max: chunk.range().max(),
            });
        }
        let expected = self.range.sub_chunk_count();
        if chunk.sub_chunks().len() != expected {
            return Err(CodecError::SubChunkCountMismatch {
                expected,
                found: chunk.sub_chunks().len(),
            });
        }

        let sub_chunks = chunk
            .sub_chunks()
            .iter()
            .enumerate()
            .map(|(index, sub)| self.encode_sub_chunk(sub, encoding, index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SerialisedData {
            sub_chunks,
            biomes: self.encode_biomes(chunk, encoding)?,
            block_nbt: chunk.block_nbt().to_vec(),
        })
    }

    /// Encodes the sub-chunk at `index` (counted from the bottom of the range).
    pub fn encode_sub_chunk(
        &self,
        sub: &SubChunk,
        encoding: Encoding,
        index: usize,
    ) -> Result<Vec<u8>, CodecError> {
        let mut buf = self.pool.acquire();
        encode_sub_chunk(&mut buf, sub, encoding, self.range, index, &self.registry)?;
        Ok(buf.to_vec())
    }

    /// Encodes every biome storage of `chunk`, bottom to top, into one byte string.
    pub fn encode_biomes(&self, chunk: &Chunk, encoding: Encoding) -> Result<Vec<u8>, CodecError> {
        let mut buf = self.pool.acquire();
        for storage in chunk.biome_storages() {
            encode_storage(&mut buf, storage, encoding, PaletteKind::Biome, &self.registry)?;
        }
        Ok(buf.to_vec())
    }

    /// Rebuilds a chunk from its serialised parts.
    ///
    /// The sub-chunk count must match the range and every version 9 record must
    /// carry the vertical index of its position. Empty biome data leaves every
    /// slice at the default biome.
    pub fn decode(&self, data: &SerialisedData, encoding: Encoding) -> Result<Chunk, CodecError> {
        let expected = self.range.sub_chunk_count();
        if data.sub_chunks.len() != expected {
            return Err(CodecError::SubChunkCountMismatch {
                expected,
                found: data.sub_chunks.len(),
            });
        }

        let air = self.registry.air_id();
        let mut sub = Vec::with_capacity(expected);
        for (position, bytes) in data.sub_chunks.iter().enumerate() {
            let (decoded, index) = decode_sub_chunk(bytes, encoding, air, &self.registry)?;
            let want = self.range.vertical_index(position);
            if let Some(found) = index
                && found != want
            {
                return Err(CodecError::SubChunkIndexMismatch {
                    position,
                    expected: want,
                    found,
                });
            }
            sub.push(decoded);
        }

        let biomes = self.decode_biomes(&data.biomes, encoding)?;
        Ok(Chunk::from_parts(
            air,
            self.range,
            sub,
            biomes,
            data.block_nbt.clone(),
        ))
    }

    /// Decodes the concatenated biome storages of a chunk.
    pub fn decode_biomes(
        &self,
        data: &[u8],
        encoding: Encoding,
    ) -> Result<Vec<PalettedStorage>, CodecError> {
        let count = self.range.sub_chunk_count();
        if data.is_empty() {
            return Ok(vec![PalettedStorage::uniform(self.default_biome); count]);
        }

        let mut reader = ByteReader::new(data);
        let mut biomes: Vec<PalettedStorage> = Vec::with_capacity(count);
        for position in 0..count {
            if encoding == Encoding::Network && reader.peek_u8() == Some(BIOME_COPY_PREVIOUS) {
                reader.read_u8()?;
                let previous = biomes.last().cloned().ok_or_else(|| {
                    CodecError::MalformedPalette(
                        "first biome storage refers to a previous one".into(),
                    )
                })?;
                biomes.push(previous);
                continue;
            }
            let storage = decode_storage(&mut reader, encoding, PaletteKind::Biome, &self.registry)
                .inspect_err(|e| {
                    tracing::debug!(position, error = %e, "biome storage failed to decode");
                })?;
            biomes.push(storage);
        }
        Ok(biomes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
