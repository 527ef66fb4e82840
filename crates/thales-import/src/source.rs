//! Verbatim source bytes shared by every decoded record.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use thales_io::ThalesReader;

use crate::error::DecodeError;

/// Original bytes of a decoded file together with its name.
#[derive(Debug, Clone)]
pub struct SourceFile {
    file_name: String,
    content: Arc<[u8]>,
}

impl SourceFile {
    /// Read a whole file into memory.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let content = fs::read(path)?;
        log::debug!("Read {} bytes from {}", content.len(), path.display());
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            file_name,
            content: content.into(),
        })
    }

    /// Wrap an in-memory buffer; the name becomes `FromBytes.<extension>`.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, extension: &str) -> Self {
        Self {
            file_name: format!("FromBytes.{}", extension),
            content: bytes.into().into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Write the original bytes unchanged.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::write(path, &self.content)
    }
}

/// Common surface of the binary record formats.
pub trait ThalesFile: Sized {
    /// File extension without the dot.
    const EXTENSION: &'static str;

    fn decode(source: SourceFile) -> Result<Self, DecodeError>;

    fn source(&self) -> &SourceFile;

    fn open<P: AsRef<Path>>(path: P) -> Result<Self, DecodeError> {
        Self::decode(SourceFile::open(path)?)
    }

    fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, DecodeError> {
        Self::decode(SourceFile::from_bytes(bytes, Self::EXTENSION))
    }

    fn file_name(&self) -> &str {
        self.source().file_name()
    }

    fn binary_content(&self) -> &[u8] {
        self.source().content()
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        self.source().save(path)
    }
}

/// Read an `i6` count stored as `count - 1`.
pub(crate) fn read_sample_count(reader: &mut ThalesReader<'_>) -> Result<usize, DecodeError> {
    let raw = reader.read_i6()?;
    let count = raw + 1;
    usize::try_from(count).map_err(|_| DecodeError::InvalidSampleCount(count))
}
