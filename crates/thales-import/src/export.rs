//! `.ism` encoder.
//!
//! Writes the layout read by [`IsmSpectrum`] from plain arrays. Timestamps
//! become the sample index, significance is fixed at 1000 and the
//! acquisition flag is cleared, so ACQ tracks are never written.

use std::fs;
use std::io;
use std::path::Path;

use thales_io::{encode_date, fallback_date, ThalesWriter, WriteError};
use thiserror::Error;

use crate::ism::{IsmMetadata, IsmSpectrum, DEFAULT_SIGNIFICANCE, K_VALUE_COUNT};

/// Version field of exported files, written as `00 00 FF FF FF FE`.
pub const EXPORT_VERSION: i64 = -2;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("encoding error: {0}")]
    Write(#[from] WriteError),
}

/// Scalar metadata written after the sample arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportMetadata {
    /// Measurement date; 1970-01-01 when absent.
    pub date: Option<chrono::NaiveDateTime>,
    pub system: String,
    pub potential: String,
    pub current: String,
    pub temperature: String,
    pub time: String,
    pub comments: [String; 4],
    pub electrode_area: String,
    pub serial_quantity: String,
    pub k_values: [f64; K_VALUE_COUNT],
}

impl From<&IsmMetadata> for ExportMetadata {
    fn from(m: &IsmMetadata) -> Self {
        Self {
            date: Some(m.measurement_date),
            system: m.system.clone(),
            potential: m.potential.clone(),
            current: m.current.clone(),
            temperature: m.temperature.clone(),
            time: m.time.clone(),
            comments: m.comments.clone(),
            electrode_area: m.electrode_area.clone(),
            serial_quantity: m.serial_quantity.clone(),
            k_values: m.k_values,
        }
    }
}

/// Encoded spectrum held in memory.
#[derive(Debug, Clone)]
pub struct IsmExport {
    content: Vec<u8>,
    number_of_samples: usize,
}

impl IsmExport {
    /// Encode the first `min(len)` samples of the three arrays.
    pub fn new(
        frequency: &[f64],
        impedance: &[f64],
        phase: &[f64],
        metadata: &ExportMetadata,
        trailing: &[u8],
    ) -> Result<Self, ExportError> {
        let n = frequency.len().min(impedance.len()).min(phase.len());
        let mut w = ThalesWriter::buffer();

        w.write_i6(EXPORT_VERSION)?;
        w.write_i6(n as i64 - 1)?;
        w.write_f8_array(&frequency[..n])?;
        w.write_f8_array(&impedance[..n])?;
        w.write_f8_array(&phase[..n])?;
        for i in 0..n {
            w.write_f8(i as f64)?;
        }
        w.write_i2_array(&vec![DEFAULT_SIGNIFICANCE; n])?;

        let date = metadata.date.unwrap_or_else(fallback_date);
        w.write_string(&encode_date(&date))?;
        for field in [
            &metadata.system,
            &metadata.potential,
            &metadata.current,
            &metadata.temperature,
            &metadata.time,
        ] {
            w.write_string(field)?;
        }
        for comment in &metadata.comments {
            w.write_string(comment)?;
        }
        w.write_string(&metadata.electrode_area)?;
        w.write_string(&metadata.serial_quantity)?;
        w.write_i2(0)?;
        w.write_f8_array(&metadata.k_values)?;
        w.write_bytes(trailing)?;

        log::debug!("Encoded {} samples", n);
        Ok(Self {
            content: w.into_inner(),
            number_of_samples: n,
        })
    }

    /// Encode the normalized sweep of a decoded spectrum, keeping its
    /// metadata and trailing bytes.
    ///
    /// Impedance and phase are written as magnitude and angle of the complex
    /// impedance, so a negative magnitude or a phase outside `(-π, π]` is
    /// folded into the canonical polar form.
    pub fn from_spectrum(spectrum: &IsmSpectrum) -> Result<Self, ExportError> {
        let metadata = spectrum
            .metadata()
            .map(ExportMetadata::from)
            .unwrap_or_default();
        let (impedance, phase): (Vec<f64>, Vec<f64>) = spectrum
            .complex_impedance()
            .into_iter()
            .map(|z| (z.norm(), z.arg()))
            .unzip();
        Self::new(
            &spectrum.frequency(),
            &impedance,
            &phase,
            &metadata,
            spectrum.trailing_metadata(),
        )
    }

    pub fn number_of_samples(&self) -> usize {
        self.number_of_samples
    }

    pub fn binary_content(&self) -> &[u8] {
        &self.content
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.content
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ExportError> {
        let path = path.as_ref();
        fs::write(path, &self.content)?;
        log::info!("Wrote {} ({} bytes)", path.display(), self.content.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ism::tests::Fixture;
    use crate::source::ThalesFile;

    #[test]
    fn test_magic_and_count() {
        let export = IsmExport::new(
            &[1.0, 2.0],
            &[3.0, 4.0, 5.0],
            &[0.1, 0.2],
            &ExportMetadata::default(),
            &[],
        )
        .unwrap();
        let bytes = export.binary_content();
        assert_eq!(&bytes[..6], &[0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFE]);
        assert_eq!(&bytes[6..12], &[0, 0, 0, 0, 0, 1]);
        assert_eq!(export.number_of_samples(), 2);
    }

    #[test]
    fn test_decodes_back() {
        let export = IsmExport::new(
            &[10.0, 20.0, 30.0],
            &[1.0, 2.0, 3.0],
            &[-0.1, -0.2, -0.3],
            &ExportMetadata::default(),
            &[7, 7],
        )
        .unwrap();
        let s = IsmSpectrum::from_bytes(export.into_bytes()).unwrap();
        assert_eq!(s.frequency(), vec![10.0, 20.0, 30.0]);
        assert_eq!(s.impedance(), vec![1.0, 2.0, 3.0]);
        assert_eq!(s.phase(), vec![-0.1, -0.2, -0.3]);
        assert_eq!(s.significance(), vec![DEFAULT_SIGNIFICANCE; 3]);
        assert_eq!(s.version(), EXPORT_VERSION);
        assert_eq!(s.measurement_date(), Some(fallback_date()));
        assert!(s.acq_channels().is_empty());
        assert_eq!(s.trailing_metadata(), &[7, 7]);
    }

    #[test]
    fn test_empty_export() {
        let export =
            IsmExport::new(&[], &[], &[], &ExportMetadata::default(), &[]).unwrap();
        let s = IsmSpectrum::from_bytes(export.into_bytes()).unwrap();
        assert_eq!(s.number_of_samples(), 0);
        assert!(s.warnings().is_empty());
    }

    #[test]
    fn test_from_spectrum_keeps_metadata() {
        let mut k_values = [0.0; K_VALUE_COUNT];
        k_values[25] = 10.0;
        let source = Fixture {
            frequency: vec![100.0, 10.0, 1.0],
            k_values,
            ..Default::default()
        }
        .decode();
        let export = IsmExport::from_spectrum(&source).unwrap();
        let s = IsmSpectrum::from_bytes(export.into_bytes()).unwrap();

        assert_eq!(s.frequency(), source.frequency());
        for (a, b) in s.impedance().iter().zip(source.impedance()) {
            assert!((a - b).abs() < 1e-9 * b.abs());
        }
        for (a, b) in s.phase().iter().zip(source.phase()) {
            assert!((a - b).abs() < 1e-12);
        }
        assert!(!s.range().swap_necessary);
        assert_eq!(s.amplitude(), Some(0.01));
        assert_eq!(s.metadata().unwrap().system, "IM6");
        assert_eq!(s.measurement_date(), source.measurement_date());
    }

    #[test]
    fn test_from_spectrum_writes_polar_form() {
        let export = IsmExport::new(
            &[1.0, 10.0, 100.0],
            &[-2.0, 3.0, 4.0],
            &[0.5, 0.25, 7.0],
            &ExportMetadata::default(),
            &[],
        )
        .unwrap();
        let source = IsmSpectrum::from_bytes(export.into_bytes()).unwrap();
        assert_eq!(source.impedance()[0], -2.0);

        let s = IsmSpectrum::from_bytes(IsmExport::from_spectrum(&source).unwrap().into_bytes())
            .unwrap();
        let impedance = s.impedance();
        let phase = s.phase();

        // -2·e^{j0.5} = 2·e^{j(0.5 - π)}
        assert!((impedance[0] - 2.0).abs() < 1e-12);
        assert!((phase[0] - (0.5 - std::f64::consts::PI)).abs() < 1e-12);
        assert!((impedance[1] - 3.0).abs() < 1e-12);
        assert!((phase[1] - 0.25).abs() < 1e-12);
        // 7 rad wraps into (-π, π]
        assert!((phase[2] - (7.0 - 2.0 * std::f64::consts::PI)).abs() < 1e-12);
        for (a, b) in s.complex_impedance().iter().zip(source.complex_impedance()) {
            assert!((a - b).norm() < 1e-9);
        }
    }
}
