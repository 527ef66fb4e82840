//! Impedance spectra (`.ism`).
//!
//! ```text
//! i6             version
//! i6             sample count - 1
//! N × f8         frequency [Hz]
//! N × f8         impedance magnitude [Ω]
//! N × f8         phase [rad]
//! N × f8         timestamp [s since 1980-01-01]
//! N × i2         significance
//! ── metadata block ──
//! 10 × string    date (DDMMYY), system, potential, current, temperature,
//!                time, comment 1-4
//! 2 × string     electrode area, serial quantity
//! i2             acquisition flag
//! 32 × f8        k-values
//! N × 2 × f8     voltage/current pairs, if the flag announces them
//! ...            opaque trailing metadata
//! ```

use chrono::{Duration, NaiveDateTime};
use num_complex::Complex64;
use serde::Serialize;
use thales_io::{decode_date, decode_timestamp, fallback_date, thales_epoch, ThalesReader};

use crate::acq::AcqChannel;
use crate::error::{DecodeError, DecodeWarning};
use crate::range::{FrequencyRange, Span};
use crate::source::{read_sample_count, SourceFile, ThalesFile};

pub const K_VALUE_COUNT: usize = 32;
/// k-value holding the excitation amplitude in mV.
pub const AMPLITUDE_K_INDEX: usize = 25;
/// k-value whose bit 15 announces voltage/current channels.
pub const ACQ_K_INDEX: usize = 27;
pub const ACQ_PRESENT_BIT: i64 = 0x8000;
pub const ACQ_FLAG_THRESHOLD: i16 = 256;
/// Significance written for samples without a measured value.
pub const DEFAULT_SIGNIFICANCE: i16 = 1000;

pub const VOLTAGE_TRACK: &str = "Voltage/V";
pub const CURRENT_TRACK: &str = "Current/A";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsmMetadata {
    /// Date field as stored.
    pub date: String,
    /// Parsed date, 1970-01-01 when `date` is not `DDMMYY`.
    pub measurement_date: NaiveDateTime,
    pub system: String,
    pub potential: String,
    pub current: String,
    pub temperature: String,
    pub time: String,
    pub comments: [String; 4],
    pub electrode_area: String,
    pub serial_quantity: String,
    pub acquisition_flag: i16,
    pub k_values: [f64; K_VALUE_COUNT],
}

impl IsmMetadata {
    /// Excitation amplitude in V.
    pub fn amplitude(&self) -> f64 {
        self.k_values[AMPLITUDE_K_INDEX] / 1000.0
    }

    /// Whether voltage/current pairs follow the k-values.
    pub fn has_acq_channels(&self) -> bool {
        self.acquisition_flag > ACQ_FLAG_THRESHOLD
            && (self.k_values[ACQ_K_INDEX] as i64) & ACQ_PRESENT_BIT != 0
    }
}

struct MetadataBlock {
    metadata: IsmMetadata,
    acq_channels: Vec<AcqChannel>,
    date_warning: Option<DecodeWarning>,
}

fn read_metadata_block(
    reader: &mut ThalesReader<'_>,
    sample_count: usize,
) -> Result<MetadataBlock, DecodeError> {
    let date = reader.read_string()?;
    let system = reader.read_string()?;
    let potential = reader.read_string()?;
    let current = reader.read_string()?;
    let temperature = reader.read_string()?;
    let time = reader.read_string()?;
    let comments = [
        reader.read_string()?,
        reader.read_string()?,
        reader.read_string()?,
        reader.read_string()?,
    ];
    let electrode_area = reader.read_string()?;
    let serial_quantity = reader.read_string()?;
    let acquisition_flag = reader.read_i2()?;
    let mut k_values = [0.0; K_VALUE_COUNT];
    k_values.copy_from_slice(&reader.read_f8_array(K_VALUE_COUNT)?);

    let (measurement_date, date_warning) = match decode_date(&date) {
        Ok(d) => (d, None),
        Err(e) => (fallback_date(), Some(DecodeWarning::from(e))),
    };

    let metadata = IsmMetadata {
        date,
        measurement_date,
        system,
        potential,
        current,
        temperature,
        time,
        comments,
        electrode_area,
        serial_quantity,
        acquisition_flag,
        k_values,
    };

    let acq_channels = if metadata.has_acq_channels() {
        let pairs = reader.read_f8_array(sample_count.saturating_mul(2))?;
        let (voltage, current): (Vec<f64>, Vec<f64>) =
            pairs.chunks_exact(2).map(|p| (p[0], p[1])).unzip();
        vec![
            AcqChannel {
                name: VOLTAGE_TRACK.to_string(),
                unit: "V".to_string(),
                values: voltage,
            },
            AcqChannel {
                name: CURRENT_TRACK.to_string(),
                unit: "A".to_string(),
                values: current,
            },
        ]
    } else {
        Vec::new()
    };

    Ok(MetadataBlock {
        metadata,
        acq_channels,
        date_warning,
    })
}

/// Decoded impedance spectrum.
///
/// Sample accessors return the normalized sweep (see [`FrequencyRange`]);
/// the `_in` variants take a [`Span`] to include every sample.
#[derive(Debug, Clone)]
pub struct IsmSpectrum {
    source: SourceFile,
    version: i64,
    frequency: Vec<f64>,
    impedance: Vec<f64>,
    phase: Vec<f64>,
    timestamps: Vec<NaiveDateTime>,
    significance: Vec<i16>,
    metadata: Option<IsmMetadata>,
    acq_channels: Vec<AcqChannel>,
    trailing_metadata: Vec<u8>,
    range: FrequencyRange,
    warnings: Vec<DecodeWarning>,
}

impl ThalesFile for IsmSpectrum {
    const EXTENSION: &'static str = "ism";

    fn decode(source: SourceFile) -> Result<Self, DecodeError> {
        let mut reader = ThalesReader::new(source.content());

        let version = reader.read_i6()?;
        let n = read_sample_count(&mut reader)?;
        let frequency = reader.read_f8_array(n)?;
        let impedance = reader.read_f8_array(n)?;
        let phase = reader.read_f8_array(n)?;
        let timestamps = reader
            .read_f8_array(n)?
            .into_iter()
            .map(decode_timestamp)
            .collect();
        let significance = reader.read_i2_array(n)?;

        let mut warnings = Vec::new();
        let mut block_reader = reader.clone();
        let (metadata, acq_channels) = match read_metadata_block(&mut block_reader, n) {
            Ok(block) => {
                reader = block_reader;
                if let Some(w) = block.date_warning {
                    log::warn!("{}: {}", source.file_name(), w);
                    warnings.push(w);
                }
                (Some(block.metadata), block.acq_channels)
            }
            Err(e) => {
                let w = DecodeWarning::MetadataParseFailure {
                    reason: e.to_string(),
                };
                log::warn!("{}: {}", source.file_name(), w);
                warnings.push(w);
                (None, Vec::new())
            }
        };
        let trailing_metadata = reader.rest().to_vec();

        let range = FrequencyRange::from_frequencies(&frequency);
        log::debug!(
            "Decoded {} with {} samples, range {}..{} (swap: {})",
            source.file_name(),
            n,
            range.from_index,
            range.to_index,
            range.swap_necessary
        );

        Ok(Self {
            source,
            version,
            frequency,
            impedance,
            phase,
            timestamps,
            significance,
            metadata,
            acq_channels,
            trailing_metadata,
            range,
            warnings,
        })
    }

    fn source(&self) -> &SourceFile {
        &self.source
    }
}

impl IsmSpectrum {
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Number of samples stored in the file, before trimming.
    pub fn number_of_samples(&self) -> usize {
        self.frequency.len()
    }

    pub fn range(&self) -> FrequencyRange {
        self.range
    }

    pub fn frequency(&self) -> Vec<f64> {
        self.frequency_in(Span::Trimmed)
    }

    pub fn frequency_in(&self, span: Span) -> Vec<f64> {
        self.range.select(&self.frequency, span)
    }

    pub fn impedance(&self) -> Vec<f64> {
        self.impedance_in(Span::Trimmed)
    }

    pub fn impedance_in(&self, span: Span) -> Vec<f64> {
        self.range.select(&self.impedance, span)
    }

    /// Phase in radians.
    pub fn phase(&self) -> Vec<f64> {
        self.phase_in(Span::Trimmed)
    }

    pub fn phase_in(&self, span: Span) -> Vec<f64> {
        self.range.select(&self.phase, span)
    }

    pub fn phase_degrees(&self) -> Vec<f64> {
        self.phase().into_iter().map(f64::to_degrees).collect()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.timestamps_in(Span::Trimmed)
    }

    pub fn timestamps_in(&self, span: Span) -> Vec<NaiveDateTime> {
        self.range.select(&self.timestamps, span)
    }

    pub fn significance(&self) -> Vec<i16> {
        self.significance_in(Span::Trimmed)
    }

    pub fn significance_in(&self, span: Span) -> Vec<i16> {
        self.range.select(&self.significance, span)
    }

    /// `|Z|·e^{jθ}` over the normalized sweep.
    pub fn complex_impedance(&self) -> Vec<Complex64> {
        self.complex_impedance_in(Span::Trimmed)
    }

    pub fn complex_impedance_in(&self, span: Span) -> Vec<Complex64> {
        self.impedance_in(span)
            .into_iter()
            .zip(self.phase_in(span))
            .map(|(z, p)| Complex64::from_polar(z, p))
            .collect()
    }

    /// Earliest sample timestamp.
    pub fn measurement_start(&self) -> Option<NaiveDateTime> {
        self.timestamps.iter().min().copied()
    }

    /// Latest sample timestamp.
    pub fn measurement_end(&self) -> Option<NaiveDateTime> {
        self.timestamps.iter().max().copied()
    }

    pub fn metadata(&self) -> Option<&IsmMetadata> {
        self.metadata.as_ref()
    }

    pub fn measurement_date(&self) -> Option<NaiveDateTime> {
        self.metadata.as_ref().map(|m| m.measurement_date)
    }

    pub fn amplitude(&self) -> Option<f64> {
        self.metadata.as_ref().map(IsmMetadata::amplitude)
    }

    pub fn acq_channels(&self) -> &[AcqChannel] {
        &self.acq_channels
    }

    pub fn track_names(&self) -> Vec<&str> {
        self.acq_channels.iter().map(|c| c.name.as_str()).collect()
    }

    /// ACQ track by name, in file order.
    pub fn track(&self, name: &str) -> Option<&[f64]> {
        self.acq_channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Bytes after the decoded fields, kept for re-export.
    pub fn trailing_metadata(&self) -> &[u8] {
        &self.trailing_metadata
    }

    pub fn warnings(&self) -> &[DecodeWarning] {
        &self.warnings
    }

    pub fn metadata_parse_failed(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, DecodeWarning::MetadataParseFailure { .. }))
    }

    pub fn date_parse_failed(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, DecodeWarning::DateParseFailure { .. }))
    }

    /// New spectrum over replacement samples, sharing source and metadata.
    ///
    /// Inputs are cut to the shortest length. Timestamps and significance
    /// carry over when the count matches the normalized sweep, otherwise
    /// they become one second per sample and [`DEFAULT_SIGNIFICANCE`]. ACQ
    /// tracks do not follow the new samples and are dropped.
    pub fn with_samples(&self, frequency: Vec<f64>, impedance: Vec<f64>, phase: Vec<f64>) -> Self {
        let n = frequency.len().min(impedance.len()).min(phase.len());
        let mut frequency = frequency;
        let mut impedance = impedance;
        let mut phase = phase;
        frequency.truncate(n);
        impedance.truncate(n);
        phase.truncate(n);

        let (timestamps, significance) = if self.range.len() == n {
            (self.timestamps(), self.significance())
        } else {
            let start = thales_epoch();
            (
                (0..n).map(|i| start + Duration::seconds(i as i64)).collect(),
                vec![DEFAULT_SIGNIFICANCE; n],
            )
        };

        Self {
            source: self.source.clone(),
            version: self.version,
            range: FrequencyRange::from_frequencies(&frequency),
            frequency,
            impedance,
            phase,
            timestamps,
            significance,
            metadata: self.metadata.clone(),
            acq_channels: Vec::new(),
            trailing_metadata: self.trailing_metadata.clone(),
            warnings: self.warnings.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use thales_io::ThalesWriter;

    /// Options for a synthesized spectrum buffer.
    pub(crate) struct Fixture {
        pub frequency: Vec<f64>,
        pub date: &'static str,
        pub acquisition_flag: i16,
        pub k_values: [f64; K_VALUE_COUNT],
        pub with_metadata: bool,
        pub trailing: Vec<u8>,
    }

    impl Default for Fixture {
        fn default() -> Self {
            Self {
                frequency: vec![1.0, 10.0, 100.0],
                date: "150323",
                acquisition_flag: 0,
                k_values: [0.0; K_VALUE_COUNT],
                with_metadata: true,
                trailing: Vec::new(),
            }
        }
    }

    impl Fixture {
        pub(crate) fn impedance(&self) -> Vec<f64> {
            self.frequency.iter().map(|f| 100.0 + f).collect()
        }

        pub(crate) fn phase(&self) -> Vec<f64> {
            self.frequency.iter().map(|f| -0.01 * f).collect()
        }

        pub(crate) fn bytes(&self) -> Vec<u8> {
            let n = self.frequency.len();
            let mut w = ThalesWriter::buffer();
            w.write_i6(3).unwrap();
            w.write_i6(n as i64 - 1).unwrap();
            w.write_f8_array(&self.frequency).unwrap();
            w.write_f8_array(&self.impedance()).unwrap();
            w.write_f8_array(&self.phase()).unwrap();
            let times: Vec<f64> = (0..n).map(|i| 1000.0 + i as f64).collect();
            w.write_f8_array(&times).unwrap();
            w.write_i2_array(&vec![900; n]).unwrap();
            if self.with_metadata {
                w.write_string(self.date).unwrap();
                for s in ["IM6", "0 V", "0 A", "25 C", "10:00:00", "c1", "c2", "c3", "c4"] {
                    w.write_string(s).unwrap();
                }
                w.write_string("1 cm2").unwrap();
                w.write_string("").unwrap();
                w.write_i2(self.acquisition_flag).unwrap();
                w.write_f8_array(&self.k_values).unwrap();
                if self.acquisition_flag > ACQ_FLAG_THRESHOLD {
                    for i in 0..n {
                        w.write_f8(i as f64).unwrap();
                        w.write_f8(-(i as f64) / 10.0).unwrap();
                    }
                }
            }
            w.write_bytes(&self.trailing).unwrap();
            w.into_inner()
        }

        pub(crate) fn decode(&self) -> IsmSpectrum {
            IsmSpectrum::from_bytes(self.bytes()).unwrap()
        }
    }

    #[test]
    fn test_decode_basic() {
        let fixture = Fixture {
            trailing: vec![1, 2, 3],
            ..Default::default()
        };
        let s = fixture.decode();
        assert_eq!(s.version(), 3);
        assert_eq!(s.file_name(), "FromBytes.ism");
        assert_eq!(s.frequency(), vec![1.0, 10.0, 100.0]);
        assert_eq!(s.impedance(), vec![101.0, 110.0, 200.0]);
        assert_eq!(s.significance(), vec![900; 3]);
        assert_eq!(s.trailing_metadata(), &[1, 2, 3]);
        assert!(s.warnings().is_empty());

        let meta = s.metadata().unwrap();
        assert_eq!(meta.system, "IM6");
        assert_eq!(meta.comments[3], "c4");
        assert_eq!(meta.electrode_area, "1 cm2");
        assert_eq!(s.measurement_date().unwrap().to_string(), "2023-03-15 00:00:00");
        assert_eq!(
            s.measurement_start().unwrap(),
            thales_epoch() + Duration::seconds(1000)
        );
        assert_eq!(
            s.measurement_end().unwrap(),
            thales_epoch() + Duration::seconds(1002)
        );
        assert_eq!(s.binary_content(), fixture.bytes().as_slice());
    }

    #[test]
    fn test_descending_sweep() {
        let s = Fixture {
            frequency: vec![1000.0, 100.0, 10.0, 1.0, 5.0],
            ..Default::default()
        }
        .decode();
        assert!(s.range().swap_necessary);
        assert_eq!(s.frequency(), vec![1.0, 10.0, 100.0, 1000.0]);
        assert_eq!(s.impedance(), vec![101.0, 110.0, 200.0, 1100.0]);
        assert_eq!(s.frequency_in(Span::Full), vec![5.0, 1.0, 10.0, 100.0, 1000.0]);
        assert!(s.frequency().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_amplitude() {
        let mut k_values = [0.0; K_VALUE_COUNT];
        k_values[AMPLITUDE_K_INDEX] = 5000.0;
        let s = Fixture {
            k_values,
            ..Default::default()
        }
        .decode();
        assert_eq!(s.amplitude(), Some(5.0));
    }

    #[test]
    fn test_acq_channels() {
        let mut k_values = [0.0; K_VALUE_COUNT];
        k_values[ACQ_K_INDEX] = f64::from(0x8000 | 0x0001);
        let s = Fixture {
            acquisition_flag: 257,
            k_values,
            trailing: vec![0xAB],
            ..Default::default()
        }
        .decode();
        assert_eq!(s.track_names(), vec![VOLTAGE_TRACK, CURRENT_TRACK]);
        assert_eq!(s.track(VOLTAGE_TRACK).unwrap(), &[0.0, 1.0, 2.0]);
        assert_eq!(s.track(CURRENT_TRACK).unwrap(), &[-0.0, -0.1, -0.2]);
        assert_eq!(s.trailing_metadata(), &[0xAB]);
        assert!(s.track("Temperature").is_none());
    }

    #[test]
    fn test_acq_needs_flag_and_bit() {
        let mut k_values = [0.0; K_VALUE_COUNT];
        k_values[ACQ_K_INDEX] = f64::from(0x8000);
        let s = Fixture {
            acquisition_flag: 256,
            k_values,
            ..Default::default()
        }
        .decode();
        assert!(s.acq_channels().is_empty());
    }

    #[test]
    fn test_date_fallback() {
        let s = Fixture {
            date: "bad!!x",
            ..Default::default()
        }
        .decode();
        assert_eq!(s.measurement_date(), Some(fallback_date()));
        assert!(s.date_parse_failed());
        assert!(!s.metadata_parse_failed());
    }

    #[test]
    fn test_missing_metadata_is_a_warning() {
        let s = Fixture {
            with_metadata: false,
            trailing: vec![0x00, 0x05, b'a'],
            ..Default::default()
        }
        .decode();
        assert!(s.metadata().is_none());
        assert!(s.metadata_parse_failed());
        assert_eq!(s.trailing_metadata(), &[0x00, 0x05, b'a']);
        assert_eq!(s.frequency().len(), 3);
    }

    #[test]
    fn test_truncated_acq_pairs_are_a_metadata_warning() {
        let mut k_values = [0.0; K_VALUE_COUNT];
        k_values[ACQ_K_INDEX] = f64::from(0x8000);
        let fixture = Fixture {
            acquisition_flag: 300,
            k_values,
            ..Default::default()
        };
        let mut bytes = fixture.bytes();
        bytes.truncate(bytes.len() - 12);
        // version, count, four f8 arrays and one i2 array of 3 samples
        let arrays_end = 12 + 3 * 8 * 4 + 3 * 2;

        let s = IsmSpectrum::from_bytes(bytes.clone()).unwrap();
        assert!(s.metadata_parse_failed());
        assert!(matches!(
            s.warnings(),
            [DecodeWarning::MetadataParseFailure { .. }]
        ));
        assert!(s.metadata().is_none());
        assert!(s.acq_channels().is_empty());
        assert_eq!(s.frequency(), fixture.frequency);
        assert_eq!(s.impedance(), fixture.impedance());
        assert_eq!(s.phase(), fixture.phase());
        assert_eq!(s.trailing_metadata(), &bytes[arrays_end..]);
    }

    #[test]
    fn test_truncated_primary_arrays() {
        let mut bytes = Fixture::default().bytes();
        bytes.truncate(40);
        assert!(matches!(
            IsmSpectrum::from_bytes(bytes),
            Err(DecodeError::TruncatedData { .. })
        ));
    }

    #[test]
    fn test_complex_impedance() {
        let s = Fixture::default().decode();
        let z = s.complex_impedance();
        assert_eq!(z.len(), 3);
        assert!((z[0].norm() - 101.0).abs() < 1e-9);
        assert!((z[2].arg() - (-1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_with_samples() {
        let s = Fixture::default().decode();
        let same = s.with_samples(s.frequency(), vec![1.0, 2.0, 3.0], s.phase());
        assert_eq!(same.impedance(), vec![1.0, 2.0, 3.0]);
        assert_eq!(same.significance(), vec![900; 3]);
        assert_eq!(same.timestamps(), s.timestamps());
        // original untouched
        assert_eq!(s.impedance(), vec![101.0, 110.0, 200.0]);

        let shorter = s.with_samples(vec![3.0, 2.0], vec![1.0, 1.0, 1.0], vec![0.0, 0.0]);
        assert_eq!(shorter.number_of_samples(), 2);
        assert!(shorter.range().swap_necessary);
        assert_eq!(shorter.frequency(), vec![2.0, 3.0]);
        assert_eq!(shorter.significance(), vec![DEFAULT_SIGNIFICANCE; 2]);
    }
}
