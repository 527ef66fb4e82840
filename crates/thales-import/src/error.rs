use serde::Serialize;
use std::io;
use thales_io::{DateParseError, ReadError};
use thiserror::Error;

/// Fatal decode failure: the primary fields of a record are unusable.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("data truncated at offset {offset}: expected {expected} bytes, got {available}")]
    TruncatedData {
        offset: usize,
        expected: usize,
        available: usize,
    },
    #[error("invalid encoding at offset {offset}: {detail}")]
    InvalidEncoding { offset: usize, detail: String },
    #[error("invalid sample count {0}")]
    InvalidSampleCount(i64),
    #[error("invalid channel count {0}")]
    InvalidChannelCount(i64),
    #[error("line {line}: expected {expected} columns, found {found}")]
    MalformedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}, column {column}: cannot parse {value:?} as a number")]
    InvalidNumber {
        line: usize,
        column: usize,
        value: String,
    },
}

impl From<ReadError> for DecodeError {
    fn from(e: ReadError) -> Self {
        match e {
            ReadError::Truncated {
                offset,
                expected,
                available,
            } => DecodeError::TruncatedData {
                offset,
                expected,
                available,
            },
            ReadError::InvalidEncoding { offset, byte } => DecodeError::InvalidEncoding {
                offset,
                detail: format!("non-ASCII byte 0x{:02x}", byte),
            },
        }
    }
}

/// Non-fatal decode problem recorded on the returned record.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum DecodeWarning {
    #[error("measurement date {raw:?} is not DDMMYY, using 1970-01-01")]
    DateParseFailure { raw: String },
    #[error("metadata block could not be decoded: {reason}")]
    MetadataParseFailure { reason: String },
    #[error("ACQ channel block could not be decoded: {reason}")]
    AcqDecodeFailure { reason: String },
    #[error("measurement time range {raw:?} could not be parsed")]
    TimeRangeParseFailure { raw: String },
}

impl From<DateParseError> for DecodeWarning {
    fn from(e: DateParseError) -> Self {
        DecodeWarning::DateParseFailure { raw: e.raw }
    }
}
