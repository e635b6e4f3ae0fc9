//! Block state records and the state table they are loaded from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::nbt::{NbtFlavor, NbtReader, NbtTag};
use crate::property::{Properties, PropertyValue, hash_properties};
use crate::registry::RegistryError;

/// Name of the empty-space block.
pub const AIR_NAME: &str = "minecraft:air";

/// A named block state: `{ name, states, version }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStateRecord {
    /// Namespaced block name, e.g. `minecraft:stone`.
    pub name: String,
    /// Property bag.
    pub properties: Properties,
    /// Block format version the state was defined in.
    pub version: i32,
}

impl BlockStateRecord {
    pub fn new(name: impl Into<String>, properties: Properties, version: i32) -> Self {
        Self {
            name: name.into(),
            properties,
            version,
        }
    }

    /// Registry key of this state.
    pub fn state_hash(&self) -> StateHash {
        StateHash::new(&self.name, &self.properties)
    }

    /// Builds a record from a decoded `{name, states, version}` compound.
    ///
    /// A missing `states` compound is an empty bag and a missing `version` is 0.
    pub fn from_nbt(mut compound: BTreeMap<String, NbtTag>) -> Result<Self, RegistryError> {
        let name = match compound.remove("name") {
            Some(NbtTag::String(name)) => name,
            Some(other) => {
                return Err(RegistryError::MalformedRecord(format!(
                    "name is a {} tag",
                    other.type_name()
                )));
            }
            None => return Err(RegistryError::MalformedRecord("missing name".into())),
        };

        let properties = match compound.remove("states") {
            Some(NbtTag::Compound(states)) => states
                .into_iter()
                .map(|(key, tag)| {
                    let value = PropertyValue::from_tag(&key, tag)?;
                    Ok((key, value))
                })
                .collect::<Result<Properties, RegistryError>>()?,
            Some(other) => {
                return Err(RegistryError::MalformedRecord(format!(
                    "states of {name} is a {} tag",
                    other.type_name()
                )));
            }
            None => Properties::new(),
        };

        let version = match compound.remove("version") {
            Some(NbtTag::Int(v)) => v,
            Some(other) => {
                return Err(RegistryError::MalformedRecord(format!(
                    "version of {name} is a {} tag",
                    other.type_name()
                )));
            }
            None => 0,
        };

        Ok(Self {
            name,
            properties,
            version,
        })
    }

    /// The `{name, states, version}` compound written into disk palettes.
    pub fn to_nbt(&self) -> BTreeMap<String, NbtTag> {
        let states = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.to_tag()))
            .collect();

        let mut root = BTreeMap::new();
        root.insert("name".to_string(), NbtTag::String(self.name.clone()));
        root.insert("states".to_string(), NbtTag::Compound(states));
        root.insert("version".to_string(), NbtTag::Int(self.version));
        root
    }
}

/// Registry lookup key: block name plus property digest.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateHash {
    pub name: String,
    pub properties: Box<[u8]>,
}

impl StateHash {
    pub fn new(name: &str, properties: &Properties) -> Self {
        Self {
            name: name.to_string(),
            properties: hash_properties(properties),
        }
    }
}

/// Iterator over the records of a serialized state table.
///
/// The table is a plain concatenation of root compounds. Iteration ends at a
/// clean end of input; a truncated or malformed compound yields one error and
/// then ends.
pub struct StateTableReader<'a> {
    reader: NbtReader<'a>,
    failed: bool,
}

/// Reads block state records from a state table.
pub fn read_state_table(data: &[u8], flavor: NbtFlavor) -> StateTableReader<'_> {
    StateTableReader {
        reader: NbtReader::new(data, flavor),
        failed: false,
    }
}

impl Iterator for StateTableReader<'_> {
    type Item = Result<BlockStateRecord, RegistryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = match self.reader.next_root() {
            Ok(Some(compound)) => BlockStateRecord::from_nbt(compound),
            Ok(None) => return None,
            Err(e) => Err(RegistryError::StateTable(e)),
        };
        self.failed = item.is_err();
        Some(item)
    }
}
