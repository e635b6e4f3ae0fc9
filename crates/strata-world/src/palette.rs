//! First-seen-order palette of distinct storage values.

use rustc_hash::FxHashMap;

use crate::bit_packed::width_for_palette_len;

/// Distinct values referenced by a storage, in first-seen order.
///
/// Values are runtime IDs for block storages and biome IDs for biome storages.
#[derive(Clone, Debug)]
pub struct Palette {
    values: Vec<u32>,
    positions: FxHashMap<u32, u16>,
}

impl Palette {
    /// A palette holding only `value`.
    pub fn new(value: u32) -> Self {
        let mut positions = FxHashMap::default();
        positions.insert(value, 0);
        Self {
            values: vec![value],
            positions,
        }
    }

    /// Builds a palette from already distinct values.
    ///
    /// Returns `None` for an empty list, a repeated value, or more entries
    /// than a `u16` index can address.
    pub fn from_values(values: Vec<u32>) -> Option<Self> {
        if values.is_empty() || values.len() > usize::from(u16::MAX) + 1 {
            return None;
        }
        let mut positions = FxHashMap::default();
        positions.reserve(values.len());
        for (i, &v) in values.iter().enumerate() {
            if positions.insert(v, i as u16).is_some() {
                return None;
            }
        }
        Some(Self { values, positions })
    }

    /// Position of `value`, if present.
    pub fn index_of(&self, value: u32) -> Option<u16> {
        self.positions.get(&value).copied()
    }

    /// Position of `value`, appending it when absent.
    pub fn insert(&mut self, value: u32) -> u16 {
        if let Some(&i) = self.positions.get(&value) {
            return i;
        }
        let i = self.values.len() as u16;
        self.values.push(value);
        self.positions.insert(value, i);
        i
    }

    /// Value at palette position `i`.
    pub fn get(&self, i: u16) -> Option<u32> {
        self.values.get(usize::from(i)).copied()
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false`: a palette holds at least one value.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Index width needed to address every entry.
    pub fn width(&self) -> u8 {
        width_for_palette_len(self.values.len())
    }
}

impl PartialEq for Palette {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Eq for Palette {}
