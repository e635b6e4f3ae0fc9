//! Block state registry, palette-compressed chunk storage, and the network and
//! disk codecs for sub-chunks and chunks.

pub mod bit_packed;
pub mod block;
pub mod chunk;
pub mod chunk_codec;
pub mod encoding;
pub mod nbt;
pub mod palette;
pub mod paletted_storage;
pub mod pool;
pub mod property;
pub mod registry;
pub mod state;
pub mod storage_codec;
pub mod sub_chunk;
pub mod wire;

pub use block::{Aabb, Block, Face, Model};
pub use chunk::{Chunk, SerialisedData, VerticalRange};
pub use chunk_codec::ChunkCodec;
pub use encoding::{CodecError, Encoding, PaletteKind};
pub use nbt::{NbtError, NbtFlavor, NbtTag};
pub use palette::Palette;
pub use paletted_storage::{PalettedStorage, STORAGE_VOLUME, cell_index};
pub use pool::{BufferPool, PooledBuffer};
pub use property::{Properties, PropertyValue, hash_properties};
pub use registry::{BlockStateRegistry, BlockStateRegistryBuilder, RegistryError, RuntimeId};
pub use state::{AIR_NAME, BlockStateRecord, StateHash, read_state_table};
pub use storage_codec::{decode_storage, encode_storage};
pub use sub_chunk::{SUB_CHUNK_VERSION, SubChunk, decode_sub_chunk, encode_sub_chunk};
