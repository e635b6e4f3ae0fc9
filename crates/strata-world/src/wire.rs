//! Low-level byte primitives shared by the NBT and storage codecs.
//!
//! Varints are LEB128 (7 bits per byte, least significant group first).
//! Signed varints are zig-zag mapped first so small negative numbers stay short.

/// The input ended before a read could be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
pub struct Eof {
    /// Bytes the read required.
    pub needed: usize,
    /// Bytes left in the input.
    pub remaining: usize,
}

/// Maximum bytes a 32-bit varint may occupy.
const MAX_VARINT32_LEN: usize = 5;
/// Maximum bytes a 64-bit varint may occupy.
const MAX_VARINT64_LEN: usize = 10;

/// Bounds-checked cursor over a byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns `true` once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Current offset from the start of the input.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the next byte without consuming it.
    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Consumes exactly `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], Eof> {
        if self.remaining() < n {
            return Err(Eof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, Eof> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i16_le(&mut self) -> Result<i16, Eof> {
        let b = self.take(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u16_le(&mut self) -> Result<u16, Eof> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, Eof> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i32_le(&mut self) -> Result<i32, Eof> {
        Ok(self.read_u32_le()? as i32)
    }

    pub fn read_i64_le(&mut self) -> Result<i64, Eof> {
        let b = self.take(8)?;
        let mut word = [0u8; 8];
        word.copy_from_slice(b);
        Ok(i64::from_le_bytes(word))
    }

    /// Reads an unsigned 32-bit varint.
    ///
    /// Overlong encodings (more than five bytes) are reported as [`Eof`] with
    /// `needed` past the varint limit, since no valid input can satisfy them.
    pub fn read_varuint32(&mut self) -> Result<u32, Eof> {
        let mut value: u32 = 0;
        for i in 0..MAX_VARINT32_LEN {
            let b = self.read_u8()?;
            value |= u32::from(b & 0x7F) << (7 * i);
            if b & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(Eof {
            needed: MAX_VARINT32_LEN + 1,
            remaining: self.remaining(),
        })
    }

    /// Reads a zig-zag signed 32-bit varint.
    pub fn read_varint32(&mut self) -> Result<i32, Eof> {
        let raw = self.read_varuint32()?;
        Ok(((raw >> 1) as i32) ^ -((raw & 1) as i32))
    }

    /// Reads a zig-zag signed 64-bit varint.
    pub fn read_varint64(&mut self) -> Result<i64, Eof> {
        let mut raw: u64 = 0;
        for i in 0..MAX_VARINT64_LEN {
            let b = self.read_u8()?;
            raw |= u64::from(b & 0x7F) << (7 * i);
            if b & 0x80 == 0 {
                return Ok(((raw >> 1) as i64) ^ -((raw & 1) as i64));
            }
        }
        Err(Eof {
            needed: MAX_VARINT64_LEN + 1,
            remaining: self.remaining(),
        })
    }
}

/// Writes an unsigned 32-bit varint.
pub fn write_varuint32(out: &mut Vec<u8>, mut value: u32) {
    loop {
        if value & !0x7F == 0 {
            out.push(value as u8);
            return;
        }
        out.push((value & 0x7F | 0x80) as u8);
        value >>= 7;
    }
}

/// Writes a zig-zag signed 32-bit varint.
pub fn write_varint32(out: &mut Vec<u8>, value: i32) {
    write_varuint32(out, ((value << 1) ^ (value >> 31)) as u32);
}

/// Writes a zig-zag signed 64-bit varint.
pub fn write_varint64(out: &mut Vec<u8>, value: i64) {
    let mut raw = ((value << 1) ^ (value >> 63)) as u64;
    loop {
        if raw & !0x7F == 0 {
            out.push(raw as u8);
            return;
        }
        out.push((raw & 0x7F | 0x80) as u8);
        raw >>= 7;
    }
}
