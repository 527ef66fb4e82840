//! Frequency-range normalization.
//!
//! Spectra are recorded as sweeps that may include points outside the
//! monotonic part and may run from high to low frequency. The range keeps the
//! samples between the minimum and the maximum frequency and flags whether
//! they must be reversed to ascend.

use serde::Serialize;

/// Half-open index window `[from_index, to_index)` of the monotonic sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrequencyRange {
    pub from_index: usize,
    pub to_index: usize,
    pub swap_necessary: bool,
}

/// Which samples an accessor returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Span {
    /// Only the normalized window.
    #[default]
    Trimmed,
    /// Every sample, still reversed if the sweep descends.
    Full,
}

impl FrequencyRange {
    pub fn from_frequencies(frequency: &[f64]) -> Self {
        let (Some(min_index), Some(max_index)) = (argmin(frequency), argmax(frequency)) else {
            return Self {
                from_index: 0,
                to_index: 0,
                swap_necessary: false,
            };
        };

        if min_index <= max_index {
            Self {
                from_index: min_index,
                to_index: max_index + 1,
                swap_necessary: false,
            }
        } else {
            Self {
                from_index: max_index,
                to_index: min_index + 1,
                swap_necessary: true,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.to_index - self.from_index
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply the window (or not, for [`Span::Full`]) and the swap to `data`.
    pub fn select<T: Clone>(&self, data: &[T], span: Span) -> Vec<T> {
        let slice = match span {
            Span::Trimmed => {
                let to = self.to_index.min(data.len());
                &data[self.from_index.min(to)..to]
            }
            Span::Full => data,
        };
        if self.swap_necessary {
            slice.iter().rev().cloned().collect()
        } else {
            slice.to_vec()
        }
    }
}

/// Index of the first smallest value, NaNs skipped.
fn argmin(values: &[f64]) -> Option<usize> {
    extreme_index(values, |candidate, best| candidate < best)
}

/// Index of the first largest value, NaNs skipped.
fn argmax(values: &[f64]) -> Option<usize> {
    extreme_index(values, |candidate, best| candidate > best)
}

fn extreme_index(values: &[f64], better: impl Fn(f64, f64) -> bool) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if !better(v, b) => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascending() {
        let r = FrequencyRange::from_frequencies(&[1.0, 10.0, 100.0]);
        assert_eq!(
            r,
            FrequencyRange {
                from_index: 0,
                to_index: 3,
                swap_necessary: false
            }
        );
    }

    #[test]
    fn test_descending_sweep_is_swapped() {
        let f = [100.0, 10.0, 1.0];
        let r = FrequencyRange::from_frequencies(&f);
        assert_eq!((r.from_index, r.to_index, r.swap_necessary), (0, 3, true));
        assert_eq!(r.select(&f, Span::Trimmed), vec![1.0, 10.0, 100.0]);
    }

    #[test]
    fn test_trims_outside_points() {
        // two repeated points before the sweep and one after
        let f = [50.0, 50.0, 1.0, 10.0, 100.0, 20.0];
        let r = FrequencyRange::from_frequencies(&f);
        assert_eq!((r.from_index, r.to_index, r.swap_necessary), (2, 5, false));
        assert_eq!(r.select(&f, Span::Trimmed), vec![1.0, 10.0, 100.0]);
        assert_eq!(r.select(&f, Span::Full), f.to_vec());
    }

    #[test]
    fn test_first_occurrence_wins() {
        let r = FrequencyRange::from_frequencies(&[5.0, 1.0, 1.0, 9.0, 9.0]);
        assert_eq!((r.from_index, r.to_index), (1, 4));
    }

    #[test]
    fn test_nan_ignored() {
        let r = FrequencyRange::from_frequencies(&[f64::NAN, 3.0, 1.0, f64::NAN]);
        assert_eq!((r.from_index, r.to_index, r.swap_necessary), (1, 3, true));
    }

    #[test]
    fn test_empty() {
        let r = FrequencyRange::from_frequencies(&[]);
        assert!(r.is_empty());
        assert_eq!(r.select::<f64>(&[], Span::Trimmed), Vec::<f64>::new());
        assert!(FrequencyRange::from_frequencies(&[f64::NAN]).is_empty());
    }

    #[test]
    fn test_bounds_hold() {
        let sweeps: [&[f64]; 4] = [
            &[3.0, 2.0, 7.0, 1.0, 9.0],
            &[1.0],
            &[4.0, 4.0, 4.0],
            &[8.0, 2.0, 6.0, 5.0],
        ];
        for f in sweeps {
            let r = FrequencyRange::from_frequencies(f);
            assert!(r.from_index <= r.to_index && r.to_index <= f.len());
            let selected = r.select(f, Span::Trimmed);
            let min = f.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = f.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            assert_eq!(selected.first(), Some(&min));
            assert_eq!(selected.last(), Some(&max));
        }
    }
}
