//! Sequential reader over a Thales record buffer.
//!
//! All scalars are big-endian without padding: `f8` (IEEE double), `i2`
//! (signed 16 bit), `i6` (signed 48 bit). Strings are a 2-byte signed length
//! followed by that many ASCII bytes stored with inverted letter case.

use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

use crate::swapcase::swap_ascii_case;

pub const F8_BYTES: usize = 8;
pub const I2_BYTES: usize = 2;
pub const I6_BYTES: usize = 6;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("data truncated at offset {offset}: expected {expected} bytes, got {available}")]
    Truncated {
        offset: usize,
        expected: usize,
        available: usize,
    },
    #[error("non-ASCII byte 0x{byte:02x} in string field at offset {offset}")]
    InvalidEncoding { offset: usize, byte: u8 },
}

/// Cursor over an in-memory record. Reading never copies more than the
/// requested field and only advances the position on success.
#[derive(Debug, Clone)]
pub struct ThalesReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ThalesReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current byte offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the current position.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    /// Everything after the current position, without consuming it.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], ReadError> {
        let available = self.remaining();
        if count > available {
            return Err(ReadError::Truncated {
                offset: self.pos,
                expected: count,
                available,
            });
        }
        let slice = &self.buf[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    fn array_bytes(&self, count: usize, width: usize) -> Result<usize, ReadError> {
        count.checked_mul(width).ok_or(ReadError::Truncated {
            offset: self.pos,
            expected: usize::MAX,
            available: self.remaining(),
        })
    }

    /// Read `count` raw bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], ReadError> {
        self.take(count)
    }

    /// Skip `count` bytes.
    pub fn skip(&mut self, count: usize) -> Result<(), ReadError> {
        self.take(count).map(|_| ())
    }

    pub fn read_f8(&mut self) -> Result<f64, ReadError> {
        Ok(BigEndian::read_f64(self.take(F8_BYTES)?))
    }

    pub fn read_f8_array(&mut self, count: usize) -> Result<Vec<f64>, ReadError> {
        let byte_count = self.array_bytes(count, F8_BYTES)?;
        let bytes = self.take(byte_count)?;
        let mut out = vec![0.0f64; count];
        BigEndian::read_f64_into(bytes, &mut out);
        Ok(out)
    }

    pub fn read_i2(&mut self) -> Result<i16, ReadError> {
        Ok(BigEndian::read_i16(self.take(I2_BYTES)?))
    }

    pub fn read_i2_array(&mut self, count: usize) -> Result<Vec<i16>, ReadError> {
        let byte_count = self.array_bytes(count, I2_BYTES)?;
        let bytes = self.take(byte_count)?;
        let mut out = vec![0i16; count];
        BigEndian::read_i16_into(bytes, &mut out);
        Ok(out)
    }

    /// Read a 48-bit signed integer, sign-extended to `i64`.
    pub fn read_i6(&mut self) -> Result<i64, ReadError> {
        Ok(BigEndian::read_i48(self.take(I6_BYTES)?))
    }

    /// Read a length-prefixed, case-swapped ASCII string.
    ///
    /// A negative length prefix yields an empty string.
    pub fn read_string(&mut self) -> Result<String, ReadError> {
        let length = usize::try_from(self.read_i2()?).unwrap_or(0);
        let offset = self.pos;
        let bytes = self.take(length)?;

        let mut text = String::with_capacity(length);
        for (i, &b) in bytes.iter().enumerate() {
            if !b.is_ascii() {
                return Err(ReadError::InvalidEncoding {
                    offset: offset + i,
                    byte: b,
                });
            }
            text.push(char::from(swap_ascii_case(b)));
        }
        Ok(text)
    }
}
