//! Polarization sweeps (`.isw`): interleaved voltage/current/time triplets
//! stored in thousandths.

use thales_io::ThalesReader;

use crate::error::DecodeError;
use crate::source::{read_sample_count, SourceFile, ThalesFile};

const SCALE: f64 = 1000.0;

#[derive(Debug, Clone)]
pub struct IswRecord {
    source: SourceFile,
    version: i64,
    reserved: i64,
    voltage: Vec<f64>,
    current: Vec<f64>,
    time: Vec<f64>,
}

impl ThalesFile for IswRecord {
    const EXTENSION: &'static str = "isw";

    fn decode(source: SourceFile) -> Result<Self, DecodeError> {
        let mut reader = ThalesReader::new(source.content());
        let version = reader.read_i6()?;
        let reserved = reader.read_i6()?;
        let n = read_sample_count(&mut reader)?;
        let triplets = reader.read_f8_array(n.saturating_mul(3))?;

        let mut voltage = Vec::with_capacity(n);
        let mut current = Vec::with_capacity(n);
        let mut time = Vec::with_capacity(n);
        for t in triplets.chunks_exact(3) {
            voltage.push(t[0] / SCALE);
            current.push(t[1] / SCALE);
            time.push(t[2] / SCALE);
        }
        log::debug!("Decoded {} with {} samples", source.file_name(), n);

        Ok(Self {
            source,
            version,
            reserved,
            voltage,
            current,
            time,
        })
    }

    fn source(&self) -> &SourceFile {
        &self.source
    }
}

impl IswRecord {
    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn reserved(&self) -> i64 {
        self.reserved
    }

    pub fn number_of_samples(&self) -> usize {
        self.time.len()
    }

    pub fn voltage(&self) -> &[f64] {
        &self.voltage
    }

    pub fn current(&self) -> &[f64] {
        &self.current
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }
}
