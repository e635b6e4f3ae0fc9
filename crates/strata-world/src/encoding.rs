//! Encoding selectors and the codec error type.

use thiserror::Error;

use crate::nbt::NbtError;
use crate::registry::RegistryError;
use crate::wire::Eof;

/// Which variant of the storage format to read or write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Varint palettes of runtime IDs, sent to clients.
    #[default]
    Network,
    /// Fixed-width counts and NBT block records, persisted to disk.
    Disk,
}

impl Encoding {
    /// Low bit of every storage header byte.
    pub fn network_flag(self) -> u8 {
        match self {
            Encoding::Network => 1,
            Encoding::Disk => 0,
        }
    }
}

/// What the palette entries of a storage denote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaletteKind {
    /// Block runtime IDs.
    Block,
    /// Biome IDs.
    Biome,
}

/// Errors produced while encoding or decoding storages, sub-chunks and chunks.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The sub-chunk version byte is not one this build reads.
    #[error("unsupported sub-chunk version {0}")]
    UnsupportedVersion(u8),
    /// A storage header, word array or palette is inconsistent.
    #[error("malformed palette: {0}")]
    MalformedPalette(String),
    /// The input ended in the middle of a record.
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the input.
        remaining: usize,
    },
    /// A disk palette names a state the registry does not hold.
    #[error("unknown block state {name}")]
    UnknownState {
        /// Block name of the unresolved record.
        name: String,
    },
    /// A palette entry could not be resolved through the registry.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A disk palette record is not valid NBT.
    #[error("palette record: {0}")]
    Nbt(#[from] NbtError),
    /// A serialised chunk holds a different number of sub-chunks than its range.
    #[error("expected {expected} sub-chunks, found {found}")]
    SubChunkCountMismatch {
        /// Sub-chunks spanned by the vertical range.
        expected: usize,
        /// Sub-chunks present in the input.
        found: usize,
    },
    /// A chunk spans a different vertical range than the codec encoding it.
    #[error("chunk spans y {found_min}..={found_max}, codec expects {expected_min}..={expected_max}")]
    RangeMismatch {
        expected_min: i32,
        expected_max: i32,
        found_min: i32,
        found_max: i32,
    },
    /// A sub-chunk holds more layers than its count byte can express.
    #[error("sub-chunk holds {count} layers, at most 255 can be written")]
    TooManyLayers {
        /// Layers present in the sub-chunk.
        count: usize,
    },
    /// A sub-chunk's vertical index does not match its position.
    #[error("sub-chunk at position {position} has vertical index {found}, expected {expected}")]
    SubChunkIndexMismatch {
        /// Position in the chunk, counted from the bottom.
        position: usize,
        /// Index implied by the position and range.
        expected: i8,
        /// Index written in the header.
        found: i8,
    },
}

impl From<Eof> for CodecError {
    fn from(e: Eof) -> Self {
        CodecError::UnexpectedEof {
            needed: e.needed,
            remaining: e.remaining,
        }
    }
}
