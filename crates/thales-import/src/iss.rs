//! Current/voltage polarization curves (`.iss`).

use chrono::NaiveDateTime;
use serde::Serialize;
use thales_io::{ReadError, ThalesReader};

use crate::error::{DecodeError, DecodeWarning};
use crate::popf::{PopfLayout, PotentialScaling};
use crate::scan::{resolve_span, ScanMetadata};
use crate::source::{read_sample_count, SourceFile, ThalesFile};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PolarizationParameters {
    pub edge_potentials: [f64; 4],
    pub resolution: f64,
    pub variable_a: f64,
    pub variable_b: f64,
    pub relative_tolerance: f64,
    pub absolute_tolerance: f64,
    pub ohmic_drop: f64,
}

impl PolarizationParameters {
    fn read(reader: &mut ThalesReader<'_>) -> Result<Self, ReadError> {
        Ok(Self {
            edge_potentials: [
                reader.read_f8()?,
                reader.read_f8()?,
                reader.read_f8()?,
                reader.read_f8()?,
            ],
            resolution: reader.read_f8()?,
            variable_a: reader.read_f8()?,
            variable_b: reader.read_f8()?,
            relative_tolerance: reader.read_f8()?,
            absolute_tolerance: reader.read_f8()?,
            ohmic_drop: reader.read_f8()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct IssRecord {
    source: SourceFile,
    parameters: PolarizationParameters,
    voltage: Vec<f64>,
    current: Vec<f64>,
    time: Vec<f64>,
    metadata: ScanMetadata,
    scaling: PotentialScaling,
    span: Option<(NaiveDateTime, NaiveDateTime)>,
    warnings: Vec<DecodeWarning>,
}

impl ThalesFile for IssRecord {
    const EXTENSION: &'static str = "iss";

    fn decode(source: SourceFile) -> Result<Self, DecodeError> {
        let mut reader = ThalesReader::new(source.content());

        let parameters = PolarizationParameters::read(&mut reader)?;
        let m = read_sample_count(&mut reader)?;
        let codes = reader.read_i2_array(m)?;
        let current = reader.read_f8_array(m)?;
        let time = reader.read_f8_array(m)?;
        let metadata = ScanMetadata::read(&mut reader)?;

        let scaling = PotentialScaling::parse(&metadata.popf, PopfLayout::Polarization);
        let voltage = scaling.scale(&codes);

        let mut warnings = Vec::new();
        let span = resolve_span(&metadata, &mut warnings);
        log::debug!("Decoded {} with {} samples", source.file_name(), m);

        Ok(Self {
            source,
            parameters,
            voltage,
            current,
            time,
            metadata,
            scaling,
            span,
            warnings,
        })
    }

    fn source(&self) -> &SourceFile {
        &self.source
    }
}

impl IssRecord {
    pub fn parameters(&self) -> &PolarizationParameters {
        &self.parameters
    }

    pub fn number_of_samples(&self) -> usize {
        self.current.len()
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

    pub fn warnings(&self) -> &[DecodeWarning] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::popf::ScalingSource;
    use thales_io::ThalesWriter;

    fn iss_bytes(popf: &str) -> Vec<u8> {
        let mut w = ThalesWriter::buffer();
        w.write_f8_array(&[-1.0, 0.0, 1.0, 0.5, 0.01, 0.0, 0.0, 1e-3, 1e-9, 0.0])
            .unwrap();
        w.write_i6(2).unwrap();
        w.write_i2_array(&[-8000, 0, 8000]).unwrap();
        w.write_f8_array(&[-1e-3, 0.0, 1e-3]).unwrap();
        w.write_f8_array(&[0.0, 1.5, 3.0]).unwrap();
        for s in ["010124", "IM6", "25 C", "08:00:00-08:00:03", ""] {
            w.write_string(s).unwrap();
        }
        for _ in 0..5 {
            w.write_string("").unwrap();
        }
        w.write_string("").unwrap();
        w.write_string(popf).unwrap();
        w.into_inner()
    }

    #[test]
    fn test_decode_polarization() {
        let r = IssRecord::from_bytes(iss_bytes("1.0, 2.0 PO PF Imax 5, 0.5, 0.1")).unwrap();
        assert_eq!(r.file_name(), "FromBytes.iss");
        assert_eq!(r.parameters().edge_potentials, [-1.0, 0.0, 1.0, 0.5]);
        assert_eq!(r.parameters().absolute_tolerance, 1e-9);
        assert_eq!(r.scaling().source, ScalingSource::Primary);
        assert_eq!(r.voltage(), &[-1.0, 1.0, 3.0]);
        assert_eq!(r.time(), &[0.0, 1.5, 3.0]);
        assert_eq!(r.current(), &[-1e-3, 0.0, 1e-3]);
        assert!(r.measurement_start() < r.measurement_end());
        assert!(r.warnings().is_empty());
    }

    #[test]
    fn test_cv_annotation_falls_back() {
        // the CV layout has no Ima... part, so only the fallback matches
        let r = IssRecord::from_bytes(iss_bytes("1.0, 2.0 PO PF 0.5, 0.1")).unwrap();
        assert_eq!(r.scaling().source, ScalingSource::Fallback);
        assert_eq!(r.voltage(), &[-1.0, 1.0, 3.0]);
    }
}
