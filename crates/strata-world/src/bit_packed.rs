//! Fixed-width palette indices packed into little-endian `u32` words.
//!
//! Each word holds `32 / bits` indices, least significant first. Indices never
//! straddle a word boundary, so widths that do not divide 32 (3, 5, 6) leave the
//! top `32 % bits` bits of every word as zero padding.

use serde::{Deserialize, Serialize};

/// Bit widths a storage may use, ascending.
pub const VALID_WIDTHS: [u8; 9] = [0, 1, 2, 3, 4, 5, 6, 8, 16];

/// Returns `true` if `bits` is one of [`VALID_WIDTHS`].
pub fn is_valid_width(bits: u8) -> bool {
    VALID_WIDTHS.contains(&bits)
}

/// Smallest valid width able to index a palette of `len` entries.
///
/// A single entry needs no index bits at all.
pub fn width_for_palette_len(len: usize) -> u8 {
    VALID_WIDTHS
        .iter()
        .copied()
        .find(|&bits| (1usize << bits) >= len)
        .unwrap_or(16)
}

/// Indices stored in one word at width `bits`. Zero for width 0.
pub fn indices_per_word(bits: u8) -> usize {
    if bits == 0 { 0 } else { 32 / bits as usize }
}

/// Words needed to store `len` indices at width `bits`.
pub fn word_count(bits: u8, len: usize) -> usize {
    match indices_per_word(bits) {
        0 => 0,
        per_word => len.div_ceil(per_word),
    }
}

/// A fixed-length array of palette indices packed into `u32` words.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedWords {
    /// Raw storage words.
    words: Vec<u32>,
    /// Bits per index.
    bits: u8,
    /// Number of logical indices.
    len: usize,
}

impl PackedWords {
    /// Creates `len` zeroed indices at width `bits`.
    ///
    /// `bits` must be one of [`VALID_WIDTHS`].
    pub fn new(bits: u8, len: usize) -> Self {
        debug_assert!(is_valid_width(bits), "invalid bit width {bits}");
        Self {
            words: vec![0u32; word_count(bits, len)],
            bits,
            len,
        }
    }

    /// Packs `indices` at width `bits`.
    pub fn pack(bits: u8, indices: &[u16]) -> Self {
        let mut packed = Self::new(bits, indices.len());
        if bits > 0 {
            for (i, &v) in indices.iter().enumerate() {
                packed.set(i, v);
            }
        }
        packed
    }

    /// Returns the index at position `i`. Always 0 at width 0.
    pub fn get(&self, i: usize) -> u16 {
        debug_assert!(i < self.len, "index out of bounds");
        if self.bits == 0 {
            return 0;
        }
        let per_word = indices_per_word(self.bits);
        let word = self.words[i / per_word];
        let offset = (i % per_word) as u32 * u32::from(self.bits);
        let mask = (1u32 << self.bits) - 1;
        ((word >> offset) & mask) as u16
    }

    /// Stores `value` at position `i`. A no-op at width 0.
    pub fn set(&mut self, i: usize, value: u16) {
        debug_assert!(i < self.len, "index out of bounds");
        if self.bits == 0 {
            return;
        }
        debug_assert!(
            self.bits >= 16 || value < (1u16 << self.bits),
            "value {value} exceeds {}-bit capacity",
            self.bits
        );
        let per_word = indices_per_word(self.bits);
        let offset = (i % per_word) as u32 * u32::from(self.bits);
        let mask = (1u32 << self.bits) - 1;
        let word = &mut self.words[i / per_word];
        *word &= !(mask << offset);
        *word |= u32::from(value) << offset;
    }

    /// Copies the indices into a new array at width `bits`.
    pub fn resized(&self, bits: u8) -> Self {
        let mut out = Self::new(bits, self.len);
        if self.bits > 0 && bits > 0 {
            for i in 0..self.len {
                out.set(i, self.get(i));
            }
        }
        out
    }

    /// Unpacks every index.
    pub fn unpack(&self) -> Vec<u16> {
        (0..self.len).map(|i| self.get(i)).collect()
    }

    /// Bits per index.
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Number of logical indices.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The raw storage words.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Rebuilds an array from raw words.
    ///
    /// The caller must supply exactly [`word_count`]`(bits, len)` words.
    pub fn from_words(bits: u8, len: usize, words: Vec<u32>) -> Self {
        debug_assert_eq!(words.len(), word_count(bits, len));
        Self { words, bits, len }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
