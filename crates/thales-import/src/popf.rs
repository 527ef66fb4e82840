//! Voltage scaling from the power-of-potential-factor (POPF) annotation.
//!
//! Voltages of CV and polarization records are stored as ADC codes. The
//! annotation string carries the offset and factor needed to turn a code into
//! volts: `V = code * (factor / 8000) + offset`.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Full-scale ADC code.
pub const ADC_VOLTAGE_DIVISOR: f64 = 8000.0;

const CV_PATTERN: &str = r"^\s*(.*?),\s*(.*?)\s*PO.PF *(.*?), *(.*)$";
const POLARIZATION_PATTERN: &str = r"^\s*(.*?),\s*(.*?)\s*PO.PF.*Ima.*?,(.*?), *(.*)$";
const FALLBACK_PATTERN: &str = r"^\s*(.*?),\s*(.*?)\s*PO.PF.*";

/// Which record family wrote the annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopfLayout {
    Cv,
    Polarization,
}

/// How the scaling was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScalingSource {
    Primary,
    Fallback,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PotentialScaling {
    pub offset: f64,
    pub factor: f64,
    pub power_of_potential_scaling: Option<f64>,
    pub extra_offset_x: Option<f64>,
    pub source: ScalingSource,
}

impl Default for PotentialScaling {
    fn default() -> Self {
        Self {
            offset: 0.0,
            factor: 1.0,
            power_of_potential_scaling: None,
            extra_offset_x: None,
            source: ScalingSource::Default,
        }
    }
}

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static POPF pattern compiles"))
}

fn primary_regex(layout: PopfLayout) -> &'static Regex {
    static CV: OnceLock<Regex> = OnceLock::new();
    static POLARIZATION: OnceLock<Regex> = OnceLock::new();
    match layout {
        PopfLayout::Cv => compiled(&CV, CV_PATTERN),
        PopfLayout::Polarization => compiled(&POLARIZATION, POLARIZATION_PATTERN),
    }
}

fn fallback_regex() -> &'static Regex {
    static FALLBACK: OnceLock<Regex> = OnceLock::new();
    compiled(&FALLBACK, FALLBACK_PATTERN)
}

fn number(text: &str) -> Option<f64> {
    text.trim().parse().ok()
}

impl PotentialScaling {
    /// Parse an annotation. Captures that are not numbers count as no match.
    pub fn parse(annotation: &str, layout: PopfLayout) -> Self {
        if let Some(caps) = primary_regex(layout).captures(annotation) {
            let parsed = (
                number(&caps[1]),
                number(&caps[2]),
                number(&caps[3]),
                number(&caps[4]),
            );
            if let (Some(offset), Some(factor), Some(power), Some(extra)) = parsed {
                return Self {
                    offset,
                    factor,
                    power_of_potential_scaling: Some(power),
                    extra_offset_x: Some(extra),
                    source: ScalingSource::Primary,
                };
            }
        }

        if let Some(caps) = fallback_regex().captures(annotation) {
            if let (Some(offset), Some(factor)) = (number(&caps[1]), number(&caps[2])) {
                return Self {
                    offset,
                    factor,
                    power_of_potential_scaling: None,
                    extra_offset_x: None,
                    source: ScalingSource::Fallback,
                };
            }
        }

        log::debug!("No POPF scaling in {:?}, using offset 0 and factor 1", annotation);
        Self::default()
    }

    pub fn volts(&self, code: i16) -> f64 {
        f64::from(code) * (self.factor / ADC_VOLTAGE_DIVISOR) + self.offset
    }

    pub fn scale(&self, codes: &[i16]) -> Vec<f64> {
        codes.iter().map(|&c| self.volts(c)).collect()
    }
}
