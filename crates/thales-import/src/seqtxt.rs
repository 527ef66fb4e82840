//! Sequence text exports (`.txt`): a header line of track names followed by
//! whitespace-separated numeric rows.

use crate::error::DecodeError;
use crate::source::{SourceFile, ThalesFile};

#[derive(Debug, Clone)]
pub struct SeqTxtRecord {
    source: SourceFile,
    track_names: Vec<String>,
    tracks: Vec<Vec<f64>>,
}

impl ThalesFile for SeqTxtRecord {
    const EXTENSION: &'static str = "txt";

    fn decode(source: SourceFile) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(source.content()).map_err(|e| {
            DecodeError::InvalidEncoding {
                offset: e.valid_up_to(),
                detail: "invalid UTF-8".to_string(),
            }
        })?;

        let mut lines = text.lines();
        let track_names: Vec<String> = lines
            .next()
            .map(|header| header.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let mut tracks = vec![Vec::new(); track_names.len()];

        for (i, line) in lines.enumerate() {
            let line_number = i + 2;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() != track_names.len() {
                return Err(DecodeError::MalformedRow {
                    line: line_number,
                    expected: track_names.len(),
                    found: fields.len(),
                });
            }
            for (column, (field, track)) in fields.iter().zip(tracks.iter_mut()).enumerate() {
                let value: f64 = field.parse().map_err(|_| DecodeError::InvalidNumber {
                    line: line_number,
                    column: column + 1,
                    value: field.to_string(),
                })?;
                track.push(value);
            }
        }

        log::debug!(
            "Decoded {} with {} tracks",
            source.file_name(),
            track_names.len()
        );
        Ok(Self {
            source,
            track_names,
            tracks,
        })
    }

    fn source(&self) -> &SourceFile {
        &self.source
    }
}

impl SeqTxtRecord {
    pub fn track_names(&self) -> &[String] {
        &self.track_names
    }

    pub fn track(&self, name: &str) -> Option<&[f64]> {
        self.track_names
            .iter()
            .position(|n| n == name)
            .map(|i| self.tracks[i].as_slice())
    }

    pub fn tracks(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.track_names
            .iter()
            .map(String::as_str)
            .zip(self.tracks.iter().map(Vec::as_slice))
    }

    pub fn number_of_rows(&self) -> usize {
        self.tracks.first().map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_sequence() {
        let text = "Time/s  Voltage/V\tCurrent/A\r\n0 1.5 -1e-3\r\n\r\n1   1.6 -2E-3\r\n";
        let r = SeqTxtRecord::from_bytes(text.as_bytes()).unwrap();
        assert_eq!(r.track_names(), &["Time/s", "Voltage/V", "Current/A"]);
        assert_eq!(r.track("Voltage/V").unwrap(), &[1.5, 1.6]);
        assert_eq!(r.track("Current/A").unwrap(), &[-1e-3, -2e-3]);
        assert_eq!(r.number_of_rows(), 2);
        assert!(r.track("Temperature").is_none());
        assert_eq!(r.tracks().count(), 3);
    }

    #[test]
    fn test_malformed_row() {
        let err = SeqTxtRecord::from_bytes("a b\n1 2\n3\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MalformedRow {
                line: 3,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_invalid_number() {
        let err = SeqTxtRecord::from_bytes("a b\n1 x\n".as_bytes()).unwrap_err();
        match err {
            DecodeError::InvalidNumber { line, column, value } => {
                assert_eq!((line, column, value.as_str()), (2, 2, "x"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8() {
        let err = SeqTxtRecord::from_bytes(vec![b'a', 0xFF, b'\n']).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidEncoding { offset: 1, .. }));
    }

    #[test]
    fn test_empty_text() {
        let r = SeqTxtRecord::from_bytes(Vec::<u8>::new()).unwrap();
        assert!(r.track_names().is_empty());
        assert_eq!(r.number_of_rows(), 0);
    }
}
