//! Auxiliary acquisition (ACQ) channels.
//!
//! Spectra carry at most a voltage/current pair interleaved per sample. CV
//! records may append a table of up to 32 named channels after their string
//! block:
//!
//! ```text
//! 32 × string   channel names
//! 32 × string   channel units
//! 32 × 11 × f8  calibration coefficients (unused)
//! i6            row count - 1
//! i2            channel count
//! per channel   row count × f8
//! ```

use serde::Serialize;
use std::collections::HashSet;
use thales_io::{ThalesReader, F8_BYTES};

use crate::error::{DecodeError, DecodeWarning};
use crate::source::read_sample_count;

pub const ACQ_MAX_CHANNELS: usize = 32;
pub const ACQ_CALIBRATION_COEFFICIENTS: usize = 11;
/// A CV record only carries a table if more than this many bytes follow the
/// string block.
pub const ACQ_MIN_TRAILING_BYTES: usize = 400;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcqChannel {
    pub name: String,
    pub unit: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AcqStatus {
    NotPresent,
    Decoded,
    Failed(DecodeWarning),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcqTable {
    status: AcqStatus,
    channels: Vec<AcqChannel>,
}

impl AcqTable {
    pub fn not_present() -> Self {
        Self {
            status: AcqStatus::NotPresent,
            channels: Vec::new(),
        }
    }

    pub(crate) fn decoded(channels: Vec<AcqChannel>) -> Self {
        Self {
            status: AcqStatus::Decoded,
            channels,
        }
    }

    /// Decode the table from the bytes after the CV string block, aligning
    /// every channel to `sample_count` rows. Never fails; a broken table is
    /// reported through [`AcqStatus::Failed`].
    pub fn decode(trailing: &[u8], sample_count: usize) -> Self {
        if trailing.len() <= ACQ_MIN_TRAILING_BYTES {
            return Self::not_present();
        }
        match read_channels(trailing, sample_count) {
            Ok(channels) => {
                log::debug!("Decoded {} ACQ channels", channels.len());
                Self::decoded(channels)
            }
            Err(e) => {
                let warning = DecodeWarning::AcqDecodeFailure {
                    reason: e.to_string(),
                };
                log::warn!("{}", warning);
                Self {
                    status: AcqStatus::Failed(warning),
                    channels: Vec::new(),
                }
            }
        }
    }

    pub fn status(&self) -> &AcqStatus {
        &self.status
    }

    pub fn channels(&self) -> &[AcqChannel] {
        &self.channels
    }

    pub fn channel(&self, name: &str) -> Option<&AcqChannel> {
        self.channels.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name.as_str()).collect()
    }
}

fn read_channels(buf: &[u8], sample_count: usize) -> Result<Vec<AcqChannel>, DecodeError> {
    let mut reader = ThalesReader::new(buf);

    let names = (0..ACQ_MAX_CHANNELS)
        .map(|_| reader.read_string())
        .collect::<Result<Vec<_>, _>>()?;
    let units = (0..ACQ_MAX_CHANNELS)
        .map(|_| reader.read_string())
        .collect::<Result<Vec<_>, _>>()?;
    reader.skip(ACQ_MAX_CHANNELS * ACQ_CALIBRATION_COEFFICIENTS * F8_BYTES)?;

    let rows = read_sample_count(&mut reader)?;
    let raw_count = reader.read_i2()?;
    let count = usize::try_from(raw_count)
        .ok()
        .filter(|&c| c <= ACQ_MAX_CHANNELS)
        .ok_or(DecodeError::InvalidChannelCount(i64::from(raw_count)))?;

    let names = unique_names(&names[..count]);
    names
        .into_iter()
        .zip(units)
        .map(|(name, unit)| -> Result<AcqChannel, DecodeError> {
            let values = reader.read_f8_array(rows)?;
            Ok(AcqChannel {
                name,
                unit,
                values: reconcile(values, sample_count),
            })
        })
        .collect()
}

/// Make names unique by appending `-1`, `-2`, … to repeats.
pub fn unique_names(names: &[String]) -> Vec<String> {
    let mut used = HashSet::new();
    names
        .iter()
        .map(|name| {
            let mut candidate = name.clone();
            let mut suffix = 1;
            while used.contains(&candidate) {
                candidate = format!("{}-{}", name, suffix);
                suffix += 1;
            }
            used.insert(candidate.clone());
            candidate
        })
        .collect()
}

/// Align a channel to `target` rows: surplus leading rows are dropped, a
/// short channel is padded with its last value (zeros if empty).
pub fn reconcile(mut values: Vec<f64>, target: usize) -> Vec<f64> {
    if values.len() > target {
        values.drain(..values.len() - target);
    } else {
        let fill = values.last().copied().unwrap_or(0.0);
        values.resize(target, fill);
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use thales_io::ThalesWriter;

    fn table_bytes(names: &[&str], rows: &[Vec<f64>]) -> Vec<u8> {
        table_bytes_with_count(names, rows, rows.len() as i16)
    }

    fn table_bytes_with_count(names: &[&str], rows: &[Vec<f64>], channel_count: i16) -> Vec<u8> {
        let mut w = ThalesWriter::buffer();
        for i in 0..ACQ_MAX_CHANNELS {
            w.write_string(names.get(i).copied().unwrap_or("")).unwrap();
        }
        for i in 0..ACQ_MAX_CHANNELS {
            w.write_string(if i < names.len() { "V" } else { "" }).unwrap();
        }
        w.write_f8_array(&vec![0.0; ACQ_MAX_CHANNELS * ACQ_CALIBRATION_COEFFICIENTS])
            .unwrap();
        let row_count = rows.first().map_or(0, |r| r.len());
        w.write_i6(row_count as i64 - 1).unwrap();
        w.write_i2(channel_count).unwrap();
        for r in rows {
            w.write_f8_array(r).unwrap();
        }
        w.into_inner()
    }

    #[test]
    fn test_reconcile() {
        assert_eq!(reconcile(vec![1.0, 2.0, 3.0, 4.0], 2), vec![3.0, 4.0]);
        assert_eq!(reconcile(vec![1.0, 2.0], 4), vec![1.0, 2.0, 2.0, 2.0]);
        assert_eq!(reconcile(vec![], 3), vec![0.0; 3]);
        assert_eq!(reconcile(vec![5.0], 1), vec![5.0]);
    }

    #[test]
    fn test_unique_names() {
        let names: Vec<String> = ["T", "U", "T", "T", "T-1"].iter().map(|s| s.to_string()).collect();
        assert_eq!(unique_names(&names), vec!["T", "U", "T-1", "T-2", "T-1-1"]);
    }

    #[test]
    fn test_decode_table() {
        let buf = table_bytes(&["Temp", "Temp"], &[vec![1.0, 2.0], vec![3.0, 4.0]]);
        let table = AcqTable::decode(&buf, 3);
        assert_eq!(table.status(), &AcqStatus::Decoded);
        assert_eq!(table.names(), vec!["Temp", "Temp-1"]);
        assert_eq!(table.channel("Temp-1").unwrap().values, vec![3.0, 4.0, 4.0]);
        assert_eq!(table.channel("Temp").unwrap().unit, "V");
    }

    #[test]
    fn test_short_trailing_is_not_present() {
        let table = AcqTable::decode(&[0u8; ACQ_MIN_TRAILING_BYTES], 5);
        assert_eq!(table.status(), &AcqStatus::NotPresent);
        assert!(table.channels().is_empty());
    }

    #[test]
    fn test_truncated_table_fails_softly() {
        let mut buf = table_bytes(&["A"], &[vec![1.0, 2.0, 3.0]]);
        buf.truncate(buf.len() - 4);
        let table = AcqTable::decode(&buf, 3);
        assert!(matches!(
            table.status(),
            AcqStatus::Failed(DecodeWarning::AcqDecodeFailure { .. })
        ));
        assert!(table.channels().is_empty());
    }

    #[test]
    fn test_channel_count_over_limit_fails_softly() {
        let rows = vec![vec![1.0, 2.0]; ACQ_MAX_CHANNELS + 1];
        let buf = table_bytes_with_count(&["A"], &rows, 33);
        let table = AcqTable::decode(&buf, 2);
        match table.status() {
            AcqStatus::Failed(DecodeWarning::AcqDecodeFailure { reason }) => {
                assert!(reason.contains("33"));
            }
            other => panic!("unexpected status {:?}", other),
        }
        assert!(table.channels().is_empty());

        let table = AcqTable::decode(&table_bytes_with_count(&["A"], &[vec![1.0]], -1), 1);
        assert!(matches!(table.status(), AcqStatus::Failed(_)));
    }
}
