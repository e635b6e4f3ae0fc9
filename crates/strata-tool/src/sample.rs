//! Built-in states and generated chunks for exercising the codecs.

use strata_world::{
    AIR_NAME, BlockStateRecord, BlockStateRegistry, Chunk, ChunkCodec, Properties, PropertyValue,
    RegistryError, RuntimeId, property::properties,
};

/// Block format version stamped on the built-in states (1.16.0.14).
const SAMPLE_VERSION: i32 = 17_825_806;

/// Registry used when no state table is configured.
pub fn sample_registry() -> Result<BlockStateRegistry, RegistryError> {
    let plain = [
        AIR_NAME,
        "minecraft:stone",
        "minecraft:dirt",
        "minecraft:grass",
        "minecraft:sand",
        "minecraft:water",
    ];
    let mut records: Vec<BlockStateRecord> = plain
        .iter()
        .map(|name| BlockStateRecord::new(*name, Properties::new(), SAMPLE_VERSION))
        .collect();

    for wood in ["oak", "spruce", "birch", "jungle"] {
        for axis in ["x", "y", "z"] {
            records.push(BlockStateRecord::new(
                "minecraft:log",
                properties([
                    ("old_log_type", PropertyValue::from(wood)),
                    ("pillar_axis", PropertyValue::from(axis)),
                ]),
                SAMPLE_VERSION,
            ));
        }
    }
    for colour in 0..16 {
        for lit in [false, true] {
            records.push(BlockStateRecord::new(
                "minecraft:concrete_lamp",
                properties([
                    ("color", PropertyValue::Int(colour)),
                    ("lit", PropertyValue::Bool(lit)),
                ]),
                SAMPLE_VERSION,
            ));
        }
    }

    BlockStateRegistry::from_records(records.into_iter().map(Ok))
}

/// Terrain-like chunk whose layout depends on `seed`.
///
/// Uses every non-air state of the registry, so large registries produce wide
/// palettes in the decorated slice.
pub fn generate_chunk(codec: &ChunkCodec, seed: u32) -> Chunk {
    let registry = codec.registry();
    let air = registry.air_id();
    let solids: Vec<RuntimeId> = registry
        .iter()
        .map(|(id, _)| id)
        .filter(|&id| id != air)
        .collect();

    let mut chunk = codec.new_chunk();
    if solids.is_empty() {
        return chunk;
    }
    let pick = |n: u32| solids[n as usize % solids.len()];

    let range = codec.range();
    let span = (range.max() - range.min()).max(1) as u32;
    let ground = range.min() + (span / 3) as i32;
    for x in 0..16u8 {
        for z in 0..16u8 {
            let cell = u32::from(x) * 16 + u32::from(z);
            let height = (ground + ((cell * 7 + seed * 13) % 12) as i32).min(range.max());
            for y in range.min()..height - 3 {
                chunk.set_block(x, y, z, 0, pick(0));
            }
            for y in (height - 3).max(range.min())..height {
                chunk.set_block(x, y, z, 0, pick(1));
            }
            chunk.set_block(x, height, z, 0, pick(2));
            if cell % 7 == 0 {
                chunk.set_block(x, height, z, 1, pick(4));
            }
            let decorated = (height + 16).min(range.max());
            chunk.set_block(x, decorated, z, 0, pick(cell.wrapping_mul(31) + seed));
            chunk.set_biome(x, height, z, 1 + (cell + seed) % 8);
        }
    }
    chunk
}
