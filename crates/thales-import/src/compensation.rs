//! Short/open/load setup compensation.
//!
//! Removes the impedance of cables and fixtures from a measured spectrum:
//!
//! ```text
//!       (Zshort - Zmeas) · (Zload - Zopen)
//! Z = ------------------------------------ · Zref
//!       (Zmeas - Zopen) · (Zshort - Zload)
//! ```
//!
//! Each calibration term is either a constant or a measured spectrum. Measured
//! terms are smoothed and then interpolated onto the frequencies of the
//! spectrum being corrected.

use num_complex::Complex64;
use thiserror::Error;

use crate::ism::IsmSpectrum;
use crate::smoothing::{smooth_spectrum, SmoothingError};
use crate::source::ThalesFile;

pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;
pub const DEFAULT_SMOOTHING_POLY_ORDER: usize = 3;
/// Open impedance assumed when none is given.
pub const DEFAULT_OPEN_IMPEDANCE: f64 = 1.0e15;

#[derive(Error, Debug)]
pub enum CompensationError {
    #[error("load and reference data must be given together")]
    IncompleteLoad,
    #[error("calibration spectrum {0} has no samples")]
    EmptyCalibration(String),
    #[error("smoothing failed: {0}")]
    Smoothing(#[from] SmoothingError),
}

/// One calibration term.
#[derive(Debug, Clone)]
pub enum CompensationData {
    Constant(Complex64),
    Measured(Box<IsmSpectrum>),
}

impl From<Complex64> for CompensationData {
    fn from(z: Complex64) -> Self {
        CompensationData::Constant(z)
    }
}

impl From<f64> for CompensationData {
    fn from(z: f64) -> Self {
        CompensationData::Constant(Complex64::new(z, 0.0))
    }
}

impl From<IsmSpectrum> for CompensationData {
    fn from(spectrum: IsmSpectrum) -> Self {
        CompensationData::Measured(Box::new(spectrum))
    }
}

#[derive(Debug, Clone)]
pub struct SetupCompensation {
    short: CompensationData,
    open: CompensationData,
    load: CompensationData,
    reference: CompensationData,
    smoothing_window: usize,
    smoothing_poly_order: usize,
}

impl SetupCompensation {
    /// Missing terms default to a zero short, a 1e15 Ω open and a unit
    /// load/reference pair. Load and reference must be given together.
    pub fn new(
        short: Option<CompensationData>,
        open: Option<CompensationData>,
        load: Option<CompensationData>,
        reference: Option<CompensationData>,
    ) -> Result<Self, CompensationError> {
        let (load, reference) = match (load, reference) {
            (Some(l), Some(r)) => (l, r),
            (None, None) => (1.0.into(), 1.0.into()),
            _ => return Err(CompensationError::IncompleteLoad),
        };
        Ok(Self {
            short: short.unwrap_or_else(|| 0.0.into()),
            open: open.unwrap_or_else(|| DEFAULT_OPEN_IMPEDANCE.into()),
            load,
            reference,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            smoothing_poly_order: DEFAULT_SMOOTHING_POLY_ORDER,
        })
    }

    /// Smoothing applied to measured calibration spectra.
    pub fn with_smoothing(mut self, window: usize, poly_order: usize) -> Self {
        self.smoothing_window = window;
        self.smoothing_poly_order = poly_order;
        self
    }

    pub fn smoothing_window(&self) -> usize {
        self.smoothing_window
    }

    pub fn smoothing_poly_order(&self) -> usize {
        self.smoothing_poly_order
    }

    /// Compensated copy of `spectrum` over its normalized sweep.
    ///
    /// `conjugate_short` conjugates the short term, for setups whose short
    /// measurement was recorded with the opposite phase sign.
    pub fn compensate(
        &self,
        spectrum: &IsmSpectrum,
        conjugate_short: bool,
    ) -> Result<IsmSpectrum, CompensationError> {
        let frequency = spectrum.frequency();
        let measured = spectrum.complex_impedance();

        let mut short = self.resolve(&self.short, &frequency)?;
        if conjugate_short {
            short.iter_mut().for_each(|z| *z = z.conj());
        }
        let open = self.resolve(&self.open, &frequency)?;
        let load = self.resolve(&self.load, &frequency)?;
        let reference = self.resolve(&self.reference, &frequency)?;

        let (impedance, phase): (Vec<f64>, Vec<f64>) = measured
            .iter()
            .enumerate()
            .map(|(i, &zm)| {
                let (zs, zo, zl, zr) = (short[i], open[i], load[i], reference[i]);
                ((zs - zm) * (zl - zo)) / ((zm - zo) * (zs - zl)) * zr
            })
            .map(|z| z.to_polar())
            .unzip();

        log::info!(
            "Compensated {} ({} samples)",
            spectrum.file_name(),
            impedance.len()
        );
        Ok(spectrum.with_samples(frequency, impedance, phase))
    }

    fn resolve(
        &self,
        data: &CompensationData,
        frequency: &[f64],
    ) -> Result<Vec<Complex64>, CompensationError> {
        match data {
            CompensationData::Constant(z) => Ok(vec![*z; frequency.len()]),
            CompensationData::Measured(spectrum) => {
                let smoothed =
                    smooth_spectrum(spectrum, self.smoothing_window, self.smoothing_poly_order)?;
                interpolate_impedance(&smoothed, frequency)
            }
        }
    }
}

/// Linear interpolation of the complex impedance of `spectrum` at
/// `frequency`, clamped to the end values outside the measured range.
pub fn interpolate_impedance(
    spectrum: &IsmSpectrum,
    frequency: &[f64],
) -> Result<Vec<Complex64>, CompensationError> {
    let xp = spectrum.frequency();
    let fp = spectrum.complex_impedance();
    if xp.is_empty() {
        return Err(CompensationError::EmptyCalibration(
            spectrum.file_name().to_string(),
        ));
    }
    Ok(frequency.iter().map(|&x| interpolate(x, &xp, &fp)).collect())
}

fn interpolate(x: f64, xp: &[f64], fp: &[Complex64]) -> Complex64 {
    let last = xp.len() - 1;
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[last] {
        return fp[last];
    }
    // first index with xp[i] > x, in 1..=last
    let i = xp.partition_point(|&v| v <= x);
    let (x0, x1) = (xp[i - 1], xp[i]);
    if x1 == x0 {
        return fp[i];
    }
    let w = (x - x0) / (x1 - x0);
    fp[i - 1] * (1.0 - w) + fp[i] * w
}
