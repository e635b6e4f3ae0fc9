//! In-memory chunk column: stacked sub-chunks, per-slice biomes and block
//! entity data.
//!
//! Block coordinates are chunk-local on the horizontal axes (`x`, `z` in
//! `0..16`) and world-absolute on the vertical axis.

use crate::paletted_storage::PalettedStorage;
use crate::registry::RuntimeId;
use crate::sub_chunk::SubChunk;

/// Inclusive world height range `[min, max]` a chunk spans.
///
/// Both ends lie on sub-chunk boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VerticalRange {
    min: i32,
    max: i32,
}

impl VerticalRange {
    /// Returns `None` unless `min` starts and `max` ends a 16-block slice and
    /// the range holds between 1 and 128 slices.
    pub fn new(min: i32, max: i32) -> Option<Self> {
        if min.rem_euclid(16) != 0 || (max + 1).rem_euclid(16) != 0 || max < min {
            return None;
        }
        let slices = (max - min + 1) / 16;
        let lowest = min >> 4;
        let highest = lowest + slices - 1;
        if slices > 128 || lowest < i32::from(i8::MIN) || highest > i32::from(i8::MAX) {
            return None;
        }
        Some(Self { min, max })
    }

    pub fn min(self) -> i32 {
        self.min
    }

    pub fn max(self) -> i32 {
        self.max
    }

    /// Number of sub-chunks spanning the range.
    pub fn sub_chunk_count(self) -> usize {
        ((self.max - self.min) >> 4) as usize + 1
    }

    /// Signed vertical index written in the header of the sub-chunk at
    /// `position`.
    pub fn vertical_index(self, position: usize) -> i8 {
        (position as i32 + (self.min >> 4)) as i8
    }

    /// Whether `y` lies inside the range.
    pub fn contains(self, y: i32) -> bool {
        (self.min..=self.max).contains(&y)
    }

    /// Position of the sub-chunk holding world height `y`.
    pub fn sub_chunk_position(self, y: i32) -> usize {
        ((y - self.min) >> 4) as usize
    }
}

/// Encoded chunk parts, handed as-is to the transport or storage layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SerialisedData {
    /// One record per sub-chunk, bottom to top. Empty for absent slices.
    pub sub_chunks: Vec<Vec<u8>>,
    /// Biome storages of every slice, concatenated.
    pub biomes: Vec<u8>,
    /// Block entity NBT, passed through unchanged.
    pub block_nbt: Vec<u8>,
}

/// A full-height column of sub-chunks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    air: RuntimeId,
    range: VerticalRange,
    sub: Vec<SubChunk>,
    biomes: Vec<PalettedStorage>,
    block_nbt: Vec<u8>,
}

impl Chunk {
    /// An all-air chunk with every biome set to `default_biome`.
    pub fn new(air: RuntimeId, range: VerticalRange, default_biome: u32) -> Self {
        let count = range.sub_chunk_count();
        Self {
            air,
            range,
            sub: vec![SubChunk::new(air); count],
            biomes: vec![PalettedStorage::uniform(default_biome); count],
            block_nbt: Vec::new(),
        }
    }

    /// Reassembles a decoded chunk. `sub` and `biomes` hold one entry per slice.
    pub(crate) fn from_parts(
        air: RuntimeId,
        range: VerticalRange,
        sub: Vec<SubChunk>,
        biomes: Vec<PalettedStorage>,
        block_nbt: Vec<u8>,
    ) -> Self {
        debug_assert_eq!(sub.len(), range.sub_chunk_count());
        debug_assert_eq!(biomes.len(), range.sub_chunk_count());
        Self {
            air,
            range,
            sub,
            biomes,
            block_nbt,
        }
    }

    pub fn air(&self) -> RuntimeId {
        self.air
    }

    pub fn range(&self) -> VerticalRange {
        self.range
    }

    /// Sub-chunks from the bottom of the range upward.
    pub fn sub_chunks(&self) -> &[SubChunk] {
        &self.sub
    }

    /// Sub-chunk at `position`, counted from the bottom.
    pub fn sub_chunk_mut(&mut self, position: usize) -> Option<&mut SubChunk> {
        self.sub.get_mut(position)
    }

    /// Biome storage of every slice, bottom to top.
    pub fn biome_storages(&self) -> &[PalettedStorage] {
        &self.biomes
    }

    /// Runtime ID at `(x, y, z)` in `layer`. Heights outside the range read as air.
    pub fn block(&self, x: u8, y: i32, z: u8, layer: u8) -> RuntimeId {
        if !self.range.contains(y) {
            return self.air;
        }
        self.sub[self.range.sub_chunk_position(y)].block(x, local_y(y), z, layer)
    }

    /// Stores `id` at `(x, y, z)` in `layer`.
    ///
    /// Writes outside the range are ignored. A non-air write to a missing layer
    /// allocates it filled with air.
    pub fn set_block(&mut self, x: u8, y: i32, z: u8, layer: u8, id: RuntimeId) {
        if !self.range.contains(y) {
            return;
        }
        let position = self.range.sub_chunk_position(y);
        self.sub[position].set_block(x, local_y(y), z, layer, id);
    }

    /// Biome at `(x, y, z)`. Heights outside the range read the nearest slice.
    pub fn biome(&self, x: u8, y: i32, z: u8) -> u32 {
        let y = y.clamp(self.range.min, self.range.max);
        self.biomes[self.range.sub_chunk_position(y)].at(x, local_y(y), z)
    }

    /// Sets the biome at `(x, y, z)`. Writes outside the range are ignored.
    pub fn set_biome(&mut self, x: u8, y: i32, z: u8, biome: u32) {
        if !self.range.contains(y) {
            return;
        }
        let position = self.range.sub_chunk_position(y);
        self.biomes[position].set(x, local_y(y), z, biome);
    }

    /// Opaque block entity NBT carried with the chunk.
    pub fn block_nbt(&self) -> &[u8] {
        &self.block_nbt
    }

    pub fn set_block_nbt(&mut self, data: Vec<u8>) {
        self.block_nbt = data;
    }

    /// Compacts every block and biome storage.
    pub fn compact(&mut self) {
        for sub in &mut self.sub {
            sub.compact();
        }
        for biome in &mut self.biomes {
            biome.compact();
        }
    }
}

fn local_y(y: i32) -> u8 {
    (y & 15) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overworld() -> VerticalRange {
        VerticalRange::new(-64, 319).unwrap()
    }

    #[test]
    fn test_range_validation() {
        assert!(VerticalRange::new(0, 255).is_some());
        assert!(VerticalRange::new(-64, 319).is_some());
        assert!(VerticalRange::new(-60, 319).is_none());
        assert!(VerticalRange::new(0, 250).is_none());
        assert!(VerticalRange::new(0, -1).is_none());
        assert!(VerticalRange::new(0, 16 * 129 - 1).is_none());
    }

    #[test]
    fn test_range_positions() {
        let range = overworld();
        assert_eq!(range.sub_chunk_count(), 24);
        assert_eq!(range.sub_chunk_position(-64), 0);
        assert_eq!(range.sub_chunk_position(-49), 0);
        assert_eq!(range.sub_chunk_position(-48), 1);
        assert_eq!(range.sub_chunk_position(319), 23);
        assert_eq!(range.vertical_index(0), -4);
        assert_eq!(range.vertical_index(23), 19);
    }

    #[test]
    fn test_new_chunk_is_air() {
        let chunk = Chunk::new(0, overworld(), 1);
        assert!(chunk.sub_chunks().iter().all(SubChunk::is_empty));
        assert_eq!(chunk.block(3, 100, 3, 0), 0);
        assert_eq!(chunk.biome(3, 100, 3), 1);
    }

    #[test]
    fn test_set_block_allocates_layer() {
        let mut chunk = Chunk::new(0, overworld(), 1);
        chunk.set_block(1, -64, 2, 0, 7);
        chunk.set_block(1, -64, 2, 1, 8);
        assert_eq!(chunk.block(1, -64, 2, 0), 7);
        assert_eq!(chunk.block(1, -64, 2, 1), 8);
        assert_eq!(chunk.sub_chunks()[0].storages().len(), 2);

        chunk.set_block(0, 0, 0, 0, 0);
        assert!(chunk.sub_chunks()[4].is_empty());
    }

    #[test]
    fn test_out_of_range_access() {
        let mut chunk = Chunk::new(0, overworld(), 1);
        chunk.set_block(0, 400, 0, 0, 9);
        assert_eq!(chunk.block(0, 400, 0, 0), 0);
        chunk.set_biome(0, -64, 0, 5);
        assert_eq!(chunk.biome(0, -1000, 0), 5);
    }

    #[test]
    fn test_compact_empties_cleared_slices() {
        let mut chunk = Chunk::new(0, overworld(), 1);
        chunk.set_block(5, 70, 5, 0, 3);
        chunk.set_block(5, 70, 5, 0, 0);
        chunk.compact();
        assert!(chunk.sub_chunks().iter().all(SubChunk::is_empty));
    }
}
