//! Writer mirroring [`ThalesReader`](crate::reader::ThalesReader) field by field.

use byteorder::{BigEndian, WriteBytesExt};
use std::io::{self, Write};
use thiserror::Error;

use crate::swapcase::swap_case_in_place;

/// Largest magnitude representable by a 48-bit signed field.
pub const I6_MAX: i64 = (1 << 47) - 1;
pub const I6_MIN: i64 = -(1 << 47);

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("non-ASCII character {0:?} in string field")]
    InvalidEncoding(char),
    #[error("string of {0} bytes exceeds the i16 length prefix")]
    StringTooLong(usize),
    #[error("value {0} does not fit a 48-bit integer field")]
    OutOfRange(i64),
}

/// Big-endian field writer over any `Write` sink.
pub struct ThalesWriter<W: Write> {
    writer: W,
}

impl ThalesWriter<Vec<u8>> {
    /// Writer collecting into a fresh byte buffer.
    pub fn buffer() -> Self {
        Self::new(Vec::new())
    }
}

impl<W: Write> ThalesWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        self.writer.write_all(bytes)?;
        Ok(())
    }

    pub fn write_f8(&mut self, value: f64) -> Result<(), WriteError> {
        self.writer.write_f64::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_f8_array(&mut self, values: &[f64]) -> Result<(), WriteError> {
        for &v in values {
            self.write_f8(v)?;
        }
        Ok(())
    }

    pub fn write_i2(&mut self, value: i16) -> Result<(), WriteError> {
        self.writer.write_i16::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_i2_array(&mut self, values: &[i16]) -> Result<(), WriteError> {
        for &v in values {
            self.write_i2(v)?;
        }
        Ok(())
    }

    pub fn write_i6(&mut self, value: i64) -> Result<(), WriteError> {
        if !(I6_MIN..=I6_MAX).contains(&value) {
            return Err(WriteError::OutOfRange(value));
        }
        self.writer.write_i48::<BigEndian>(value)?;
        Ok(())
    }

    /// Write a length-prefixed string, inverting letter case on the way out.
    pub fn write_string(&mut self, text: &str) -> Result<(), WriteError> {
        if let Some(c) = text.chars().find(|c| !c.is_ascii()) {
            return Err(WriteError::InvalidEncoding(c));
        }
        let length =
            i16::try_from(text.len()).map_err(|_| WriteError::StringTooLong(text.len()))?;
        let mut bytes = text.as_bytes().to_vec();
        swap_case_in_place(&mut bytes);
        self.write_i2(length)?;
        self.write_bytes(&bytes)
    }

    pub fn flush(&mut self) -> Result<(), WriteError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Consume and return the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
