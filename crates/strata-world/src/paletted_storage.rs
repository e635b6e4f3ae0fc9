//! Palette-compressed storage for one 16×16×16 cell volume.
//!
//! A storage pairs a [`Palette`] with a [`PackedWords`] array of per-cell
//! palette positions. Cells are ordered XZY: `(x << 8) | (z << 4) | y`. The
//! index width grows automatically as the palette grows, and [`PalettedStorage::compact`]
//! drops entries no longer referenced.

use crate::bit_packed::{PackedWords, width_for_palette_len};
use crate::palette::Palette;

/// Side length of a storage in cells.
pub const STORAGE_SIDE: usize = 16;

/// Number of cells in a storage (16³).
pub const STORAGE_VOLUME: usize = STORAGE_SIDE * STORAGE_SIDE * STORAGE_SIDE;

/// Cell position of local coordinates `(x, y, z)`, each in `0..16`.
pub fn cell_index(x: u8, y: u8, z: u8) -> usize {
    debug_assert!(x < 16 && y < 16 && z < 16);
    (usize::from(x) << 8) | (usize::from(z) << 4) | usize::from(y)
}

/// Palette plus packed per-cell indices for 4096 cells.
///
/// Every packed index is smaller than the palette length, and the packed width
/// is at least the palette's minimum width.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PalettedStorage {
    palette: Palette,
    indices: PackedWords,
}

impl PalettedStorage {
    /// A storage with every cell set to `value`. Uses zero index bits.
    pub fn uniform(value: u32) -> Self {
        Self {
            palette: Palette::new(value),
            indices: PackedWords::new(0, STORAGE_VOLUME),
        }
    }

    /// Builds a storage from one value per cell, in cell order.
    ///
    /// The palette lists distinct values in first-seen order and the index
    /// width is the smallest that addresses it.
    pub fn from_values(values: &[u32; STORAGE_VOLUME]) -> Self {
        let mut palette = Palette::new(values[0]);
        let positions: Vec<u16> = values.iter().map(|&v| palette.insert(v)).collect();
        let indices = PackedWords::pack(palette.width(), &positions);
        Self { palette, indices }
    }

    /// Pairs a decoded palette with decoded indices.
    ///
    /// Returns `None` if the array does not hold 4096 cells or any index points
    /// past the end of the palette.
    pub fn from_parts(palette: Palette, indices: PackedWords) -> Option<Self> {
        if indices.len() != STORAGE_VOLUME {
            return None;
        }
        if indices.bits() > 0 {
            let len = palette.len();
            if (0..STORAGE_VOLUME).any(|i| usize::from(indices.get(i)) >= len) {
                return None;
            }
        }
        Some(Self { palette, indices })
    }

    /// Value stored at local coordinates `(x, y, z)`.
    pub fn at(&self, x: u8, y: u8, z: u8) -> u32 {
        self.value(cell_index(x, y, z))
    }

    /// Stores `value` at local coordinates `(x, y, z)`.
    pub fn set(&mut self, x: u8, y: u8, z: u8, value: u32) {
        self.set_value(cell_index(x, y, z), value);
    }

    /// Value of cell `i` in XZY order.
    pub fn value(&self, i: usize) -> u32 {
        self.palette.values()[usize::from(self.indices.get(i))]
    }

    /// Stores `value` in cell `i`, growing the palette and index width as needed.
    pub fn set_value(&mut self, i: usize, value: u32) {
        let position = self.palette.insert(value);
        let needed = self.palette.width();
        if needed > self.indices.bits() {
            self.indices = self.indices.resized(needed);
        }
        self.indices.set(i, position);
    }

    /// Every cell value in XZY order.
    pub fn values(&self) -> Vec<u32> {
        (0..STORAGE_VOLUME).map(|i| self.value(i)).collect()
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// The packed index array.
    pub fn indices(&self) -> &PackedWords {
        &self.indices
    }

    /// Bits per packed index.
    pub fn bits(&self) -> u8 {
        self.indices.bits()
    }

    /// Raw packed words, as written by the storage codec.
    pub fn words(&self) -> &[u32] {
        self.indices.words()
    }

    /// Whether every cell holds `value`.
    pub fn is_filled_with(&self, value: u32) -> bool {
        match self.palette.index_of(value) {
            None => false,
            Some(_) if self.palette.len() == 1 => true,
            Some(position) => (0..STORAGE_VOLUME).all(|i| self.indices.get(i) == position),
        }
    }

    /// Removes unreferenced palette entries and narrows the index width.
    ///
    /// Surviving entries keep their relative order.
    pub fn compact(&mut self) {
        let mut used = vec![false; self.palette.len()];
        if self.indices.bits() == 0 {
            used[0] = true;
        } else {
            for i in 0..STORAGE_VOLUME {
                used[usize::from(self.indices.get(i))] = true;
            }
        }

        let mut old_to_new = vec![0u16; used.len()];
        let mut kept = Vec::with_capacity(used.len());
        for (old, &in_use) in used.iter().enumerate() {
            if in_use {
                old_to_new[old] = kept.len() as u16;
                kept.push(self.palette.values()[old]);
            }
        }

        let bits = width_for_palette_len(kept.len());
        if kept.len() == used.len() && bits == self.indices.bits() {
            return;
        }

        let mut indices = PackedWords::new(bits, STORAGE_VOLUME);
        if bits > 0 {
            for i in 0..STORAGE_VOLUME {
                indices.set(i, old_to_new[usize::from(self.indices.get(i))]);
            }
        }
        if let Some(palette) = Palette::from_values(kept) {
            self.palette = palette;
            self.indices = indices;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
