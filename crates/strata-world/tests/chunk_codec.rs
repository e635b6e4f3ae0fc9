use std::sync::Arc;

use strata_world::nbt::NbtWriter;
use strata_world::{
    AIR_NAME, BlockStateRecord, BlockStateRegistry, BufferPool, Chunk, ChunkCodec, CodecError,
    Encoding, NbtFlavor, Properties, PropertyValue, RuntimeId, VerticalRange,
    property::properties,
};

/// State table with air, a handful of plain blocks and 64 wool colours.
fn state_table() -> Vec<u8> {
    let mut records = vec![BlockStateRecord::new(AIR_NAME, Properties::new(), 17_825_806)];
    for name in ["minecraft:stone", "minecraft:dirt", "minecraft:grass", "minecraft:water"] {
        records.push(BlockStateRecord::new(name, Properties::new(), 17_825_806));
    }
    for colour in 0..64 {
        records.push(BlockStateRecord::new(
            "minecraft:wool",
            properties([
                ("color", PropertyValue::Int(colour)),
                ("dyed_bit", PropertyValue::Bool(colour % 2 == 0)),
            ]),
            17_825_806,
        ));
    }

    let mut data = Vec::new();
    for record in &records {
        NbtWriter::new(&mut data, NbtFlavor::NetworkLittleEndian)
            .write_root(&record.to_nbt())
            .unwrap();
    }
    data
}

fn codec() -> ChunkCodec {
    let registry =
        BlockStateRegistry::from_state_table(&state_table(), NbtFlavor::NetworkLittleEndian)
            .unwrap();
    ChunkCodec::new(
        Arc::new(registry),
        VerticalRange::new(-64, 319).unwrap(),
        BufferPool::new(16, 1024),
    )
    .with_default_biome(1)
}

/// Terrain-like chunk whose contents depend on `seed`.
fn layered_chunk(codec: &ChunkCodec, seed: u32) -> Chunk {
    let registry = codec.registry();
    let stone = registry.lookup("minecraft:stone", &Properties::new()).unwrap();
    let dirt = registry.lookup("minecraft:dirt", &Properties::new()).unwrap();
    let grass = registry.lookup("minecraft:grass", &Properties::new()).unwrap();
    let water = registry.lookup("minecraft:water", &Properties::new()).unwrap();
    let first_wool: RuntimeId = 5;

    let mut chunk = codec.new_chunk();
    for x in 0..16u8 {
        for z in 0..16u8 {
            let height = 40 + ((u32::from(x) * 7 + u32::from(z) * 13 + seed) % 24) as i32;
            for y in -64..height - 4 {
                chunk.set_block(x, y, z, 0, stone);
            }
            for y in height - 4..height {
                chunk.set_block(x, y, z, 0, dirt);
            }
            chunk.set_block(x, height, z, 0, grass);
            if (x + z) % 5 == 0 {
                chunk.set_block(x, height, z, 1, water);
            }
            let wool = first_wool + (u32::from(x) * 16 + u32::from(z) + seed) % 64;
            chunk.set_block(x, 200, z, 0, wool);
            chunk.set_biome(x, height, z, 1 + (seed + u32::from(x)) % 4);
        }
    }
    chunk.set_block_nbt(vec![0x0A, 0x00, 0x00, 0x00]);
    chunk
}

#[test]
fn full_chunk_roundtrip_in_both_encodings() {
    let codec = codec();
    let chunk = layered_chunk(&codec, 3);
    for encoding in [Encoding::Network, Encoding::Disk] {
        let data = codec.encode(&chunk, encoding).unwrap();
        let decoded = codec.decode(&data, encoding).unwrap();
        assert_eq!(decoded, chunk, "{encoding:?}");
        assert_eq!(codec.encode(&decoded, encoding).unwrap(), data);
    }
}

#[test]
fn compacted_chunk_roundtrips() {
    let codec = codec();
    let mut chunk = layered_chunk(&codec, 9);
    for x in 0..16 {
        for z in 0..16 {
            chunk.set_block(x, 200, z, 0, codec.registry().air_id());
        }
    }
    chunk.compact();

    let data = codec.encode(&chunk, Encoding::Disk).unwrap();
    let top = VerticalRange::new(-64, 319).unwrap().sub_chunk_position(200);
    assert!(data.sub_chunks[top].is_empty());
    assert_eq!(codec.decode(&data, Encoding::Disk).unwrap(), chunk);
}

#[test]
fn concurrent_encoding_shares_one_registry() {
    let codec = codec();
    let chunks: Vec<Chunk> = (0..8).map(|seed| layered_chunk(&codec, seed)).collect();
    let expected: Vec<_> = chunks
        .iter()
        .map(|c| codec.encode(c, Encoding::Network).unwrap())
        .collect();

    std::thread::scope(|s| {
        for (chunk, want) in chunks.iter().zip(&expected) {
            let codec = &codec;
            s.spawn(move || {
                for _ in 0..4 {
                    for encoding in [Encoding::Network, Encoding::Disk] {
                        let data = codec.encode(chunk, encoding).unwrap();
                        if encoding == Encoding::Network {
                            assert_eq!(&data, want);
                        }
                        assert_eq!(&codec.decode(&data, encoding).unwrap(), chunk);
                    }
                }
            });
        }
    });
    assert!(codec.pool().idle() <= 16);
}

#[test]
fn corrupt_chunk_does_not_affect_others() {
    let codec = codec();
    let good = layered_chunk(&codec, 1);
    let data = codec.encode(&good, Encoding::Network).unwrap();
    let mut corrupt = data.clone();
    corrupt.sub_chunks[0][0] = 42;

    std::thread::scope(|s| {
        let bad = s.spawn(|| codec.decode(&corrupt, Encoding::Network));
        let ok = s.spawn(|| codec.decode(&data, Encoding::Network));
        assert!(matches!(
            bad.join().unwrap(),
            Err(CodecError::UnsupportedVersion(42))
        ));
        assert_eq!(ok.join().unwrap().unwrap(), good);
    });
}

#[test]
fn disk_palette_survives_registry_rebuild() {
    // Disk palettes store names and properties, so a registry built from a
    // reordered table still resolves them.
    let codec = codec();
    let chunk = layered_chunk(&codec, 5);
    let data = codec.encode(&chunk, Encoding::Disk).unwrap();

    let mut records: Vec<_> = codec
        .registry()
        .iter()
        .map(|(_, record)| record.clone())
        .collect();
    records.reverse();
    let reordered = BlockStateRegistry::from_records(records.into_iter().map(Ok)).unwrap();
    let other = ChunkCodec::new(
        Arc::new(reordered),
        codec.range(),
        BufferPool::default(),
    )
    .with_default_biome(1);

    let decoded = other.decode(&data, Encoding::Disk).unwrap();
    for (x, y, z) in [(0, -64, 0), (3, 45, 9), (15, 200, 15)] {
        let original = codec.registry().resolve(chunk.block(x, y, z, 0)).unwrap();
        let moved = other.registry().resolve(decoded.block(x, y, z, 0)).unwrap();
        assert_eq!(original, moved);
    }
}
