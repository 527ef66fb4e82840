//! Instrument timestamps and two-digit measurement dates.
//!
//! Per-sample timestamps are `f8` seconds counted from 1980-01-01 00:00:00
//! with no time zone attached. Measurement dates are stored as `DDMMYY`
//! text; only the last two year digits survive, so years below 70 belong to
//! the 2000s and the rest to the 1900s.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Seconds between 1970-01-01 and the instrument epoch 1980-01-01.
pub const THALES_EPOCH_UNIX_SECONDS: i64 = 315_532_800;

/// Two-digit years below this pivot are in the 21st century.
pub const CENTURY_PIVOT: u32 = 70;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed measurement date {raw:?} (expected DDMMYY)")]
pub struct DateParseError {
    pub raw: String,
}

/// 1980-01-01T00:00:00, origin of all per-sample timestamps.
pub fn thales_epoch() -> NaiveDateTime {
    NaiveDateTime::default() + Duration::seconds(THALES_EPOCH_UNIX_SECONDS)
}

/// Date substituted when a record's `DDMMYY` field cannot be parsed.
pub fn fallback_date() -> NaiveDateTime {
    NaiveDateTime::default()
}

/// Convert an instrument timestamp to a calendar date-time.
///
/// The sign is discarded. Values are rounded to microseconds; NaN maps to
/// the epoch and values beyond the calendar range saturate.
pub fn decode_timestamp(raw: f64) -> NaiveDateTime {
    let micros = (raw.abs() * 1.0e6).round();
    if micros.is_nan() {
        return thales_epoch();
    }
    // `as` saturates for out-of-range floats
    let delta = Duration::microseconds(micros as i64);
    thales_epoch()
        .checked_add_signed(delta)
        .unwrap_or(NaiveDateTime::MAX)
}

fn two_digits(date: &str, at: usize) -> Option<u32> {
    let field = date.get(at..at + 2)?;
    if field.bytes().all(|b| b.is_ascii_digit()) {
        field.parse().ok()
    } else {
        None
    }
}

/// Expand a two-digit year.
pub fn expand_year(yy: u32) -> i32 {
    if yy < CENTURY_PIVOT {
        2000 + yy as i32
    } else {
        1900 + yy as i32
    }
}

/// Parse the leading `DDMMYY` of a measurement date field.
pub fn decode_date(raw: &str) -> Result<NaiveDateTime, DateParseError> {
    let err = || DateParseError {
        raw: raw.to_string(),
    };

    let date = raw.get(0..6).ok_or_else(err)?;
    let day = two_digits(date, 0).ok_or_else(err)?;
    let month = two_digits(date, 2).ok_or_else(err)?;
    let year = two_digits(date, 4).ok_or_else(err)?;

    NaiveDate::from_ymd_opt(expand_year(year), month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(err)
}

/// Format a date the way [`decode_date`] expects it.
pub fn encode_date(date: &NaiveDateTime) -> String {
    date.format("%d%m%y").to_string()
}
