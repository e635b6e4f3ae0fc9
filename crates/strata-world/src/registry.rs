//! Block state registry: maps `(name, properties)` to dense [`RuntimeId`] values.
//!
//! The registry is built once during startup with a [`BlockStateRegistryBuilder`]
//! and frozen by [`BlockStateRegistryBuilder::build`]. The frozen
//! [`BlockStateRegistry`] has no mutating methods and is shared between encoder
//! threads behind an `Arc`.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::block::Block;
use crate::nbt::{NbtError, NbtFlavor};
use crate::property::Properties;
use crate::state::{AIR_NAME, BlockStateRecord, StateHash, read_state_table};

/// Dense identifier of a registered block state, assigned in registration order.
pub type RuntimeId = u32;

/// Default light filtering of a newly registered state (fully opaque).
pub const DEFAULT_FILTERING: u8 = 15;

/// Default light emission of a newly registered state.
pub const DEFAULT_EMISSION: u8 = 0;

/// Errors that can occur while building or querying the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A state property had a type other than bool, byte, int or string.
    #[error("invalid block property type {tag} for property {property}")]
    InvalidPropertyType {
        /// Property name.
        property: String,
        /// Name of the offending tag type.
        tag: &'static str,
    },
    /// The same `(name, properties)` pair was registered twice.
    #[error("cannot register the same state twice: {name} (already runtime ID {existing})")]
    DuplicateState {
        /// Block name of the duplicate.
        name: String,
        /// Runtime ID the state already holds.
        existing: RuntimeId,
    },
    /// A runtime ID beyond the end of the table.
    #[error("runtime ID {id} out of range (registry holds {len} states)")]
    OutOfRange {
        /// Requested ID.
        id: RuntimeId,
        /// Number of registered states.
        len: usize,
    },
    /// The registry was frozen without an air state.
    #[error("no minecraft:air state was registered")]
    MissingAir,
    /// A state table record lacked a required field or had the wrong shape.
    #[error("malformed state record: {0}")]
    MalformedRecord(String),
    /// The state table could not be decoded.
    #[error("state table: {0}")]
    StateTable(#[from] NbtError),
    /// More states than fit in a [`RuntimeId`].
    #[error("block state registry is full")]
    RegistryFull,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Mutable registry used during the startup build phase.
#[derive(Default)]
pub struct BlockStateRegistryBuilder {
    blocks: Vec<Block>,
    state_ids: FxHashMap<StateHash, RuntimeId>,
    nbt: Vec<bool>,
    random_tick: Vec<bool>,
    filtering: Vec<u8>,
    emission: Vec<u8>,
    air: Option<RuntimeId>,
}

impl BlockStateRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a state and returns its runtime ID.
    ///
    /// Every per-ID table grows by one entry with its default value, so all
    /// tables stay the same length as the state table.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateState`] if the state is already
    /// registered. The registry is left unchanged in that case.
    pub fn register(&mut self, record: BlockStateRecord) -> Result<RuntimeId, RegistryError> {
        let hash = record.state_hash();
        if let Some(&existing) = self.state_ids.get(&hash) {
            return Err(RegistryError::DuplicateState {
                name: record.name,
                existing,
            });
        }
        let id = RuntimeId::try_from(self.blocks.len()).map_err(|_| RegistryError::RegistryFull)?;
        if record.name == AIR_NAME {
            self.air = Some(id);
        }

        self.state_ids.insert(hash, id);
        self.blocks.push(Block::Unknown(record));
        self.nbt.push(false);
        self.random_tick.push(false);
        self.filtering.push(DEFAULT_FILTERING);
        self.emission.push(DEFAULT_EMISSION);
        Ok(id)
    }

    /// Flags a state as carrying block entity NBT.
    pub fn mark_nbt(&mut self, id: RuntimeId) -> Result<(), RegistryError> {
        let len = self.len();
        let slot = self
            .nbt
            .get_mut(id as usize)
            .ok_or(RegistryError::OutOfRange { id, len })?;
        *slot = true;
        Ok(())
    }

    /// Flags a state as receiving random ticks.
    pub fn mark_random_ticking(&mut self, id: RuntimeId) -> Result<(), RegistryError> {
        let len = self.len();
        let slot = self
            .random_tick
            .get_mut(id as usize)
            .ok_or(RegistryError::OutOfRange { id, len })?;
        *slot = true;
        Ok(())
    }

    /// Overrides the light filtering and emission of a state.
    pub fn set_light(
        &mut self,
        id: RuntimeId,
        filtering: u8,
        emission: u8,
    ) -> Result<(), RegistryError> {
        let len = self.len();
        let index = id as usize;
        if index >= len {
            return Err(RegistryError::OutOfRange { id, len });
        }
        self.filtering[index] = filtering;
        self.emission[index] = emission;
        Ok(())
    }

    /// Runtime ID of an already registered state.
    pub fn lookup(&self, name: &str, properties: &Properties) -> Option<RuntimeId> {
        self.state_ids
            .get(&StateHash::new(name, properties))
            .copied()
    }

    /// Number of registered states.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Freezes the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MissingAir`] if no air state was registered.
    pub fn build(self) -> Result<BlockStateRegistry, RegistryError> {
        let air = self.air.ok_or(RegistryError::MissingAir)?;
        tracing::info!(states = self.blocks.len(), air, "block state registry built");
        Ok(BlockStateRegistry {
            blocks: self.blocks,
            state_ids: self.state_ids,
            nbt: self.nbt,
            random_tick: self.random_tick,
            filtering: self.filtering,
            emission: self.emission,
            air,
        })
    }
}

// ---------------------------------------------------------------------------
// Frozen registry
// ---------------------------------------------------------------------------

/// Immutable table of block states, indexed by [`RuntimeId`].
#[derive(Debug)]
pub struct BlockStateRegistry {
    /// Dense array where `index == RuntimeId`.
    blocks: Vec<Block>,
    /// Reverse lookup: state hash → ID.
    state_ids: FxHashMap<StateHash, RuntimeId>,
    nbt: Vec<bool>,
    random_tick: Vec<bool>,
    filtering: Vec<u8>,
    emission: Vec<u8>,
    air: RuntimeId,
}

impl BlockStateRegistry {
    /// Builds a registry by registering `records` in stream order.
    ///
    /// The first error aborts the build; no partially built registry is returned.
    pub fn from_records<I>(records: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Result<BlockStateRecord, RegistryError>>,
    {
        let mut builder = BlockStateRegistryBuilder::new();
        for record in records {
            builder.register(record?)?;
        }
        tracing::debug!(states = builder.len(), "state stream exhausted");
        builder.build()
    }

    /// Builds a registry from a serialized state table.
    pub fn from_state_table(data: &[u8], flavor: NbtFlavor) -> Result<Self, RegistryError> {
        Self::from_records(read_state_table(data, flavor))
    }

    /// Runtime ID of the state, or `None` if it was never registered.
    pub fn lookup(&self, name: &str, properties: &Properties) -> Option<RuntimeId> {
        self.state_ids
            .get(&StateHash::new(name, properties))
            .copied()
    }

    /// Record registered under `id`.
    pub fn resolve(&self, id: RuntimeId) -> Result<&BlockStateRecord, RegistryError> {
        self.block(id).map(Block::state)
    }

    /// Block behaviour registered under `id`.
    pub fn block(&self, id: RuntimeId) -> Result<&Block, RegistryError> {
        self.blocks.get(id as usize).ok_or(RegistryError::OutOfRange {
            id,
            len: self.blocks.len(),
        })
    }

    /// Runtime ID of `minecraft:air`.
    pub fn air_id(&self) -> RuntimeId {
        self.air
    }

    /// Whether the state carries block entity NBT. `false` for unknown IDs.
    pub fn carries_nbt(&self, id: RuntimeId) -> bool {
        self.nbt.get(id as usize).copied().unwrap_or(false)
    }

    /// Whether the state receives random ticks. `false` for unknown IDs.
    pub fn random_ticks(&self, id: RuntimeId) -> bool {
        self.random_tick.get(id as usize).copied().unwrap_or(false)
    }

    /// Light filtering of the state (0..=15).
    pub fn filtering(&self, id: RuntimeId) -> Option<u8> {
        self.filtering.get(id as usize).copied()
    }

    /// Light emission of the state (0..=15).
    pub fn emission(&self, id: RuntimeId) -> Option<u8> {
        self.emission.get(id as usize).copied()
    }

    /// Number of registered states.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always `false`: a frozen registry holds at least the air state.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterates `(id, record)` pairs in ID order.
    pub fn iter(&self) -> impl Iterator<Item = (RuntimeId, &BlockStateRecord)> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (i as RuntimeId, b.state()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nbt::NbtWriter;
    use crate::property::{PropertyValue, properties};

    fn air() -> BlockStateRecord {
        BlockStateRecord::new(AIR_NAME, Properties::new(), 1)
    }

    fn granite() -> BlockStateRecord {
        BlockStateRecord::new(
            "minecraft:stone",
            properties([("type", PropertyValue::from("granite"))]),
            1,
        )
    }

    #[test]
    fn test_air_and_stone_scenario() {
        let registry = BlockStateRegistry::from_records([Ok(air()), Ok(granite())]).unwrap();
        assert_eq!(registry.air_id(), 0);
        assert_eq!(
            registry.lookup(
                "minecraft:stone",
                &properties([("type", PropertyValue::from("granite"))])
            ),
            Some(1)
        );
        assert_eq!(
            registry.lookup(
                "minecraft:stone",
                &properties([("type", PropertyValue::from("andesite"))])
            ),
            None
        );
    }

    #[test]
    fn test_duplicate_rejected_and_registry_unchanged() {
        let mut builder = BlockStateRegistryBuilder::new();
        builder.register(granite()).unwrap();
        let err = builder.register(granite()).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DuplicateState { existing: 0, ref name } if name == "minecraft:stone"
        ));
        assert_eq!(builder.len(), 1);

        builder.register(air()).unwrap();
        let registry = builder.build().unwrap();
        assert_eq!(registry.resolve(0).unwrap(), &granite());
        assert_eq!(registry.air_id(), 1);
    }

    #[test]
    fn test_duplicate_ignores_version() {
        let mut builder = BlockStateRegistryBuilder::new();
        builder.register(granite()).unwrap();
        let mut newer = granite();
        newer.version = 2;
        assert!(builder.register(newer).is_err());
    }

    #[test]
    fn test_lookup_after_register_for_every_record() {
        let mut builder = BlockStateRegistryBuilder::new();
        let mut expected = Vec::new();
        builder.register(air()).unwrap();
        for growth in 0..8 {
            let record = BlockStateRecord::new(
                "minecraft:wheat",
                properties([("growth", PropertyValue::Int(growth))]),
                1,
            );
            let id = builder.register(record.clone()).unwrap();
            expected.push((record, id));
        }
        for facing in ["north", "south", "east", "west"] {
            for open in [false, true] {
                let record = BlockStateRecord::new(
                    "minecraft:trapdoor",
                    properties([
                        ("facing", PropertyValue::from(facing)),
                        ("open_bit", PropertyValue::Bool(open)),
                    ]),
                    1,
                );
                let id = builder.register(record.clone()).unwrap();
                expected.push((record, id));
            }
        }

        let registry = builder.build().unwrap();
        for (record, id) in &expected {
            assert_eq!(registry.lookup(&record.name, &record.properties), Some(*id));
            assert_eq!(registry.resolve(*id).unwrap(), record);
        }
        assert_eq!(registry.len(), 1 + expected.len());
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut builder = BlockStateRegistryBuilder::new();
        assert_eq!(builder.register(air()).unwrap(), 0);
        assert_eq!(builder.register(granite()).unwrap(), 1);
        assert_eq!(
            builder
                .register(BlockStateRecord::new("minecraft:dirt", Properties::new(), 1))
                .unwrap(),
            2
        );
    }

    #[test]
    fn test_resolve_out_of_range() {
        let registry = BlockStateRegistry::from_records([Ok(air())]).unwrap();
        assert!(matches!(
            registry.resolve(5),
            Err(RegistryError::OutOfRange { id: 5, len: 1 })
        ));
    }

    #[test]
    fn test_missing_air_fails_build() {
        let result = BlockStateRegistry::from_records([Ok(granite())]);
        assert!(matches!(result, Err(RegistryError::MissingAir)));
    }

    #[test]
    fn test_stream_error_aborts_build() {
        let result = BlockStateRegistry::from_records([
            Ok(air()),
            Err(RegistryError::MalformedRecord("bad".into())),
            Ok(granite()),
        ]);
        assert!(matches!(result, Err(RegistryError::MalformedRecord(_))));

        let result = BlockStateRegistry::from_records([Ok(air()), Ok(granite()), Ok(granite())]);
        assert!(matches!(result, Err(RegistryError::DuplicateState { .. })));
    }

    #[test]
    fn test_parallel_tables_track_registration() {
        let mut builder = BlockStateRegistryBuilder::new();
        builder.register(air()).unwrap();
        let stone = builder.register(granite()).unwrap();
        builder.mark_nbt(stone).unwrap();
        builder.mark_random_ticking(stone).unwrap();
        builder.set_light(0, 0, 0).unwrap();
        assert!(matches!(
            builder.mark_nbt(9),
            Err(RegistryError::OutOfRange { id: 9, len: 2 })
        ));

        let registry = builder.build().unwrap();
        assert!(!registry.carries_nbt(0));
        assert!(registry.carries_nbt(stone));
        assert!(registry.random_ticks(stone));
        assert!(!registry.random_ticks(99));
        assert_eq!(registry.filtering(0), Some(0));
        assert_eq!(registry.filtering(stone), Some(DEFAULT_FILTERING));
        assert_eq!(registry.emission(stone), Some(DEFAULT_EMISSION));
        assert_eq!(registry.filtering(2), None);
    }

    #[test]
    fn test_from_state_table() {
        let mut data = Vec::new();
        for record in [air(), granite()] {
            NbtWriter::new(&mut data, NbtFlavor::NetworkLittleEndian)
                .write_root(&record.to_nbt())
                .unwrap();
        }
        let registry =
            BlockStateRegistry::from_state_table(&data, NbtFlavor::NetworkLittleEndian).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.air_id(), 0);
        let ids: Vec<_> = registry.iter().map(|(id, r)| (id, r.name.as_str())).collect();
        assert_eq!(ids, [(0, AIR_NAME), (1, "minecraft:stone")]);
    }
}
