//! Block state properties and the order-independent property digest.
//!
//! A block state carries a small bag of typed properties (`"facing" => "north"`,
//! `"age" => 3`, ...). The registry needs a map key for that bag that does not
//! depend on how the bag was built, so [`hash_properties`] serializes the values
//! in sorted key order into a flat byte string.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::nbt::NbtTag;
use crate::registry::RegistryError;

/// A single typed property value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Boolean property. Digests identically to `Byte(0)` / `Byte(1)`.
    Bool(bool),
    /// Unsigned 8-bit property (NBT byte tag).
    Byte(u8),
    /// Signed 32-bit property (NBT int tag).
    Int(i32),
    /// String property (NBT string tag).
    String(String),
}

/// Property bag of a block state. Iteration is always in sorted key order.
pub type Properties = BTreeMap<String, PropertyValue>;

impl PropertyValue {
    /// Appends the type-tagged digest bytes of this value to `out`.
    fn write_digest(&self, out: &mut Vec<u8>) {
        match self {
            PropertyValue::Bool(v) => out.push(u8::from(*v)),
            PropertyValue::Byte(v) => out.push(*v),
            PropertyValue::Int(v) => out.extend_from_slice(&int_bits(*v)),
            PropertyValue::String(v) => out.extend_from_slice(v.as_bytes()),
        }
    }

    /// Converts a decoded NBT tag into a property value.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidPropertyType`] for any tag other than
    /// byte, int or string.
    pub fn from_tag(property: &str, tag: NbtTag) -> Result<Self, RegistryError> {
        match tag {
            NbtTag::Byte(v) => Ok(PropertyValue::Byte(v as u8)),
            NbtTag::Int(v) => Ok(PropertyValue::Int(v)),
            NbtTag::String(v) => Ok(PropertyValue::String(v)),
            other => Err(RegistryError::InvalidPropertyType {
                property: property.to_string(),
                tag: other.type_name(),
            }),
        }
    }

    /// Converts this value into the NBT tag written in disk palettes.
    pub fn to_tag(&self) -> NbtTag {
        match self {
            PropertyValue::Bool(v) => NbtTag::Byte(i8::from(*v)),
            PropertyValue::Byte(v) => NbtTag::Byte(*v as i8),
            PropertyValue::Int(v) => NbtTag::Int(*v),
            PropertyValue::String(v) => NbtTag::String(v.clone()),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<u8> for PropertyValue {
    fn from(v: u8) -> Self {
        PropertyValue::Byte(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::String(v)
    }
}

/// Two's-complement bit pattern of `v` in little-endian byte order.
pub fn int_bits(v: i32) -> [u8; 4] {
    v.to_le_bytes()
}

/// Produces the digest of a property bag.
///
/// Values are appended in lexicographic key order; keys themselves are not part
/// of the digest. An empty bag digests to an empty byte string.
pub fn hash_properties(properties: &Properties) -> Box<[u8]> {
    let mut out = Vec::new();
    for value in properties.values() {
        value.write_digest(&mut out);
    }
    out.into_boxed_slice()
}

/// Like [`hash_properties`], for properties given as unordered pairs.
pub fn hash_property_pairs<'a, I>(pairs: I) -> Box<[u8]>
where
    I: IntoIterator<Item = (&'a str, &'a PropertyValue)>,
{
    let mut sorted: Vec<_> = pairs.into_iter().collect();
    sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut out = Vec::new();
    for (_, value) in sorted {
        value.write_digest(&mut out);
    }
    out.into_boxed_slice()
}

/// Builds a [`Properties`] bag from `(name, value)` pairs.
pub fn properties<K, V, I>(pairs: I) -> Properties
where
    K: Into<String>,
    V: Into<PropertyValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
