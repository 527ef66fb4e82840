//! String block shared by the CV (`.isc`) and polarization (`.iss`) records.

use chrono::NaiveDateTime;
use serde::Serialize;
use thales_io::{ReadError, ThalesReader};

use crate::error::DecodeWarning;

const SPAN_FORMAT: &str = "%d%m%y%H:%M:%S";

/// The twelve strings following the sample arrays, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanMetadata {
    pub date: String,
    pub system: String,
    pub temperature: String,
    /// `HH:MM:SS-HH:MM:SS` start and end of the measurement.
    pub time: String,
    pub slew_rate: String,
    pub comments: [String; 5],
    pub electrode_area: String,
    /// Power-of-potential-factor annotation, see [`crate::popf`].
    pub popf: String,
}

impl ScanMetadata {
    pub(crate) fn read(reader: &mut ThalesReader<'_>) -> Result<Self, ReadError> {
        Ok(Self {
            date: reader.read_string()?,
            system: reader.read_string()?,
            temperature: reader.read_string()?,
            time: reader.read_string()?,
            slew_rate: reader.read_string()?,
            comments: [
                reader.read_string()?,
                reader.read_string()?,
                reader.read_string()?,
                reader.read_string()?,
                reader.read_string()?,
            ],
            electrode_area: reader.read_string()?,
            popf: reader.read_string()?,
        })
    }

    /// Start and end of the measurement, combining the date with both halves
    /// of the time field.
    pub fn measurement_span(&self) -> Result<(NaiveDateTime, NaiveDateTime), DecodeWarning> {
        let failure = || DecodeWarning::TimeRangeParseFailure {
            raw: format!("{} {}", self.date, self.time),
        };
        let parse = |clock: &str| {
            NaiveDateTime::parse_from_str(&format!("{}{}", self.date.trim(), clock.trim()), SPAN_FORMAT)
                .map_err(|_| failure())
        };

        let (start, end) = self.time.split_once('-').ok_or_else(failure)?;
        Ok((parse(start)?, parse(end)?))
    }
}

/// Resolve the measurement span, logging and recording a failure.
pub(crate) fn resolve_span(
    metadata: &ScanMetadata,
    warnings: &mut Vec<DecodeWarning>,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    match metadata.measurement_span() {
        Ok(span) => Some(span),
        Err(warning) => {
            log::warn!("{}", warning);
            warnings.push(warning);
            None
        }
    }
}
