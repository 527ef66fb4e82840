//! Cyclic voltammetry records (`.isc`).
//!
//! 17 `f8` scan parameters, `i6` sample count - 1, `i2` voltage codes, `f8`
//! currents and the shared string block. The time axis is not stored; it is
//! rebuilt from `time_per_point` and `s_start`. An ACQ channel table may
//! follow, see [`crate::acq`].

use chrono::NaiveDateTime;
use serde::Serialize;
use thales_io::{ReadError, ThalesReader};

use crate::acq::{AcqChannel, AcqStatus, AcqTable};
use crate::error::{DecodeError, DecodeWarning};
use crate::popf::{PopfLayout, PotentialScaling};
use crate::scan::{resolve_span, ScanMetadata};
use crate::source::{read_sample_count, SourceFile, ThalesFile};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CvScanParameters {
    pub p_start: f64,
    pub t_start: f64,
    pub p_upper: f64,
    pub p_lower: f64,
    pub t_end: f64,
    pub p_end: f64,
    /// mV/s
    pub scan_rate: f64,
    pub periods: f64,
    pub points_per_period: f64,
    pub i_min: f64,
    pub i_max: f64,
    pub ohmic_drop: f64,
    pub s_start: f64,
    pub s_end: f64,
    pub acquisition_time: f64,
    pub time_per_point: f64,
    pub delay: f64,
}

impl CvScanParameters {
    fn read(reader: &mut ThalesReader<'_>) -> Result<Self, ReadError> {
        Ok(Self {
            p_start: reader.read_f8()?,
            t_start: reader.read_f8()?,
            p_upper: reader.read_f8()?,
            p_lower: reader.read_f8()?,
            t_end: reader.read_f8()?,
            p_end: reader.read_f8()?,
            scan_rate: reader.read_f8()?,
            periods: reader.read_f8()?,
            points_per_period: reader.read_f8()?,
            i_min: reader.read_f8()?,
            i_max: reader.read_f8()?,
            ohmic_drop: reader.read_f8()?,
            s_start: reader.read_f8()?,
            s_end: reader.read_f8()?,
            acquisition_time: reader.read_f8()?,
            time_per_point: reader.read_f8()?,
            delay: reader.read_f8()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct IscRecord {
    source: SourceFile,
    parameters: CvScanParameters,
    voltage: Vec<f64>,
    current: Vec<f64>,
    time: Vec<f64>,
    metadata: ScanMetadata,
    scaling: PotentialScaling,
    span: Option<(NaiveDateTime, NaiveDateTime)>,
    acq: AcqTable,
    warnings: Vec<DecodeWarning>,
}

impl ThalesFile for IscRecord {
    const EXTENSION: &'static str = "isc";

    fn decode(source: SourceFile) -> Result<Self, DecodeError> {
        let mut reader = ThalesReader::new(source.content());

        let parameters = CvScanParameters::read(&mut reader)?;
        let m = read_sample_count(&mut reader)?;
        let codes = reader.read_i2_array(m)?;
        let current = reader.read_f8_array(m)?;
        let metadata = ScanMetadata::read(&mut reader)?;

        let scaling = PotentialScaling::parse(&metadata.popf, PopfLayout::Cv);
        let voltage = scaling.scale(&codes);
        let time = (0..m)
            .map(|i| i as f64 * parameters.time_per_point + parameters.s_start)
            .collect();

        let mut warnings = Vec::new();
        let span = resolve_span(&metadata, &mut warnings);

        let acq = AcqTable::decode(reader.rest(), m);
        if let AcqStatus::Failed(w) = acq.status() {
            warnings.push(w.clone());
        }

        log::debug!(
            "Decoded {} with {} samples, {} ACQ channels",
            source.file_name(),
            m,
            acq.channels().len()
        );

        Ok(Self {
            source,
            parameters,
            voltage,
            current,
            time,
            metadata,
            scaling,
            span,
            acq,
            warnings,
        })
    }

    fn source(&self) -> &SourceFile {
        &self.source
    }
}

impl IscRecord {
    pub fn parameters(&self) -> &CvScanParameters {
        &self.parameters
    }

    pub fn number_of_samples(&self) -> usize {
        self.current.len()
    }

    /// Voltage in V.
    pub fn voltage(&self) -> &[f64] {
        &self.voltage
    }

    /// Current in A.
    pub fn current(&self) -> &[f64] {
        &self.current
    }

    /// Time in s.
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Scan rate in V/s.
    pub fn scan_rate(&self) -> f64 {
        self.parameters.scan_rate / 1000.0
    }

    pub fn metadata(&self) -> &ScanMetadata {
        &self.metadata
    }

    pub fn scaling(&self) -> &PotentialScaling {
        &self.scaling
    }

    pub fn measurement_start(&self) -> Option<NaiveDateTime> {
        self.span.map(|(start, _)| start)
    }

    pub fn measurement_end(&self) -> Option<NaiveDateTime> {
        self.span.map(|(_, end)| end)
    }

    pub fn acq_status(&self) -> &AcqStatus {
        self.acq.status()
    }

    pub fn acq_channels(&self) -> &[AcqChannel] {
        self.acq.channels()
    }

    pub fn acq_channel(&self, name: &str) -> Option<&AcqChannel> {
        self.acq.channel(name)
    }

    pub fn warnings(&self) -> &[DecodeWarning] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acq::{ACQ_CALIBRATION_COEFFICIENTS, ACQ_MAX_CHANNELS};
    use chrono::NaiveDate;
    use thales_io::ThalesWriter;

    fn cv_bytes(popf: &str, time: &str, acq: Option<&[f64]>) -> Vec<u8> {
        let mut w = ThalesWriter::buffer();
        let mut params = [0.0; 17];
        params[6] = 50.0; // scan rate, mV/s
        params[12] = 2.0; // s_start
        params[15] = 0.5; // time per point
        w.write_f8_array(&params).unwrap();
        w.write_i6(3).unwrap();
        w.write_i2_array(&[0, 4000, 8000, -8000]).unwrap();
        w.write_f8_array(&[1e-6, 2e-6, 3e-6, 4e-6]).unwrap();
        for s in ["150323", "IM6", "25 C", time, "50 mV/s"] {
            w.write_string(s).unwrap();
        }
        for _ in 0..5 {
            w.write_string("").unwrap();
        }
        w.write_string("1 cm2").unwrap();
        w.write_string(popf).unwrap();

        if let Some(values) = acq {
            w.write_string("Temperature").unwrap();
            for _ in 1..ACQ_MAX_CHANNELS {
                w.write_string("").unwrap();
            }
            w.write_string("C").unwrap();
            for _ in 1..ACQ_MAX_CHANNELS {
                w.write_string("").unwrap();
            }
            w.write_f8_array(&vec![0.0; ACQ_MAX_CHANNELS * ACQ_CALIBRATION_COEFFICIENTS])
                .unwrap();
            w.write_i6(values.len() as i64 - 1).unwrap();
            w.write_i2(1).unwrap();
            w.write_f8_array(values).unwrap();
        }
        w.into_inner()
    }

    #[test]
    fn test_decode_cv() {
        let r = IscRecord::from_bytes(cv_bytes("0.5, 2.0 PO PF 1.0, 0.0", "10:00:00-10:05:00", None))
            .unwrap();
        assert_eq!(r.number_of_samples(), 4);
        assert_eq!(r.voltage(), &[0.5, 1.5, 2.5, -1.5]);
        assert_eq!(r.current(), &[1e-6, 2e-6, 3e-6, 4e-6]);
        assert_eq!(r.time(), &[2.0, 2.5, 3.0, 3.5]);
        assert_eq!(r.scan_rate(), 0.05);
        assert_eq!(r.metadata().electrode_area, "1 cm2");

        let day = NaiveDate::from_ymd_opt(2023, 3, 15).unwrap();
        assert_eq!(r.measurement_start(), day.and_hms_opt(10, 0, 0));
        assert_eq!(r.measurement_end(), day.and_hms_opt(10, 5, 0));
        assert_eq!(r.acq_status(), &AcqStatus::NotPresent);
        assert!(r.warnings().is_empty());
    }

    #[test]
    fn test_unparsable_annotation_uses_identity_scaling() {
        let r = IscRecord::from_bytes(cv_bytes("", "10:00:00-10:05:00", None)).unwrap();
        assert_eq!(r.voltage(), &[0.0, 0.5, 1.0, -1.0]);
    }

    #[test]
    fn test_bad_time_range_is_a_warning() {
        let r = IscRecord::from_bytes(cv_bytes("", "morning", None)).unwrap();
        assert!(r.measurement_start().is_none());
        assert!(r.measurement_end().is_none());
        assert!(matches!(
            r.warnings(),
            [DecodeWarning::TimeRangeParseFailure { .. }]
        ));
    }

    #[test]
    fn test_acq_channels_are_aligned() {
        let r = IscRecord::from_bytes(cv_bytes(
            "",
            "10:00:00-10:05:00",
            Some(&[20.0, 21.0, 22.0, 23.0, 24.0, 25.0]),
        ))
        .unwrap();
        assert_eq!(r.acq_status(), &AcqStatus::Decoded);
        let channel = r.acq_channel("Temperature").unwrap();
        assert_eq!(channel.unit, "C");
        assert_eq!(channel.values, vec![22.0, 23.0, 24.0, 25.0]);

        let r = IscRecord::from_bytes(cv_bytes("", "10:00:00-10:05:00", Some(&[20.0, 21.0])))
            .unwrap();
        assert_eq!(
            r.acq_channel("Temperature").unwrap().values,
            vec![20.0, 21.0, 21.0, 21.0]
        );
    }

    #[test]
    fn test_bad_channel_count_keeps_primary_tracks() {
        let values = [20.0, 21.0, 22.0, 23.0];
        let mut bytes = cv_bytes("", "10:00:00-10:05:00", Some(&values));
        let count_at = bytes.len() - values.len() * 8 - 2;
        bytes[count_at..count_at + 2].copy_from_slice(&33i16.to_be_bytes());

        let r = IscRecord::from_bytes(bytes).unwrap();
        assert_eq!(r.voltage(), &[0.0, 0.5, 1.0, -1.0]);
        assert_eq!(r.current(), &[1e-6, 2e-6, 3e-6, 4e-6]);
        assert!(matches!(
            r.acq_status(),
            AcqStatus::Failed(DecodeWarning::AcqDecodeFailure { .. })
        ));
        assert!(r.acq_channels().is_empty());
        assert!(r
            .warnings()
            .iter()
            .any(|w| matches!(w, DecodeWarning::AcqDecodeFailure { .. })));
    }

    #[test]
    fn test_truncated_cv() {
        let mut bytes = cv_bytes("", "", None);
        bytes.truncate(17 * 8 + 3);
        assert!(matches!(
            IscRecord::from_bytes(bytes),
            Err(DecodeError::TruncatedData { .. })
        ));
    }
}
