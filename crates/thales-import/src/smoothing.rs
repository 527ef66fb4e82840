//! Savitzky–Golay smoothing.
//!
//! Each output point is the value at that point of a least-squares polynomial
//! fitted over a window of neighbours. Near the edges the window is held
//! against the end of the data and the polynomial is evaluated off-centre,
//! so no padding is invented.

use thiserror::Error;

use crate::ism::IsmSpectrum;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SmoothingError {
    #[error("window length {0} must be odd")]
    EvenWindow(usize),
    #[error("polynomial order {polyorder} must be less than window length {window}")]
    PolyOrderTooLarge { window: usize, polyorder: usize },
    #[error("window length {window} exceeds the {len} available samples")]
    WindowTooLong { window: usize, len: usize },
    #[error("least-squares system is singular")]
    SingularFit,
}

/// Solve `matrix · x = rhs` by Gaussian elimination with partial pivoting.
fn solve(mut matrix: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Option<Vec<f64>> {
    let n = rhs.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))?;
        if matrix[pivot][col] == 0.0 {
            return None;
        }
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);
        for row in col + 1..n {
            let f = matrix[row][col] / matrix[col][col];
            for k in col..n {
                matrix[row][k] -= f * matrix[col][k];
            }
            rhs[row] -= f * rhs[col];
        }
    }
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| matrix[row][k] * x[k]).sum();
        x[row] = (rhs[row] - tail) / matrix[row][row];
    }
    Some(x)
}

/// Filter weights for every evaluation offset `-half..=half` in a window.
fn window_weights(window: usize, polyorder: usize) -> Option<Vec<Vec<f64>>> {
    let half = window / 2;
    // abscissae scaled to [-1, 1]
    let scale = half.max(1) as f64;
    let t: Vec<f64> = (0..window).map(|j| (j as f64 - half as f64) / scale).collect();
    let terms = polyorder + 1;
    let design: Vec<Vec<f64>> = t
        .iter()
        .map(|&tj| (0..terms).map(|k| tj.powi(k as i32)).collect())
        .collect();
    let gram: Vec<Vec<f64>> = (0..terms)
        .map(|a| {
            (0..terms)
                .map(|b| design.iter().map(|row| row[a] * row[b]).sum())
                .collect()
        })
        .collect();

    (0..window)
        .map(|e| {
            let at = (e as f64 - half as f64) / scale;
            let basis: Vec<f64> = (0..terms).map(|k| at.powi(k as i32)).collect();
            let y = solve(gram.clone(), basis)?;
            Some(
                design
                    .iter()
                    .map(|row| row.iter().zip(&y).map(|(a, b)| a * b).sum())
                    .collect(),
            )
        })
        .collect()
}

/// Smooth `data` with an odd `window` and `polyorder < window <= data.len()`.
pub fn savgol_filter(data: &[f64], window: usize, polyorder: usize) -> Result<Vec<f64>, SmoothingError> {
    if window % 2 == 0 {
        return Err(SmoothingError::EvenWindow(window));
    }
    if polyorder >= window {
        return Err(SmoothingError::PolyOrderTooLarge { window, polyorder });
    }
    if window > data.len() {
        return Err(SmoothingError::WindowTooLong {
            window,
            len: data.len(),
        });
    }

    let half = window / 2;
    let weights = window_weights(window, polyorder).ok_or(SmoothingError::SingularFit)?;
    let n = data.len();
    Ok((0..n)
        .map(|i| {
            let start = i.saturating_sub(half).min(n - window);
            let w = &weights[i - start];
            w.iter().zip(&data[start..start + window]).map(|(a, b)| a * b).sum()
        })
        .collect())
}

/// Smooth impedance magnitude and phase of the normalized sweep.
pub fn smooth_spectrum(
    spectrum: &IsmSpectrum,
    window: usize,
    polyorder: usize,
) -> Result<IsmSpectrum, SmoothingError> {
    let impedance = savgol_filter(&spectrum.impedance(), window, polyorder)?;
    let phase = savgol_filter(&spectrum.phase(), window, polyorder)?;
    log::debug!(
        "Smoothed {} samples (window {}, order {})",
        impedance.len(),
        window,
        polyorder
    );
    Ok(spectrum.with_samples(spectrum.frequency(), impedance, phase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ism::tests::Fixture;

    fn assert_close(a: &[f64], b: &[f64], tol: f64) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < tol, "{} != {}", x, y);
        }
    }

    #[test]
    fn test_reference_values() {
        let x = [2.0, 2.0, 5.0, 2.0, 1.0, 0.0, 1.0, 4.0, 9.0];
        let y = savgol_filter(&x, 5, 2).unwrap();
        let expected = [
            1.657142857142857,
            3.171428571428571,
            3.542857142857143,
            2.857142857142857,
            0.657142857142857,
            0.171428571428571,
            1.0,
            4.0,
            9.0,
        ];
        assert_close(&y, &expected, 1e-9);
    }

    #[test]
    fn test_polynomials_are_preserved() {
        let x: Vec<f64> = (0..12).map(|i| 0.5 * (i * i) as f64 - 3.0 * i as f64 + 1.0).collect();
        assert_close(&savgol_filter(&x, 7, 2).unwrap(), &x, 1e-9);
        assert_close(&savgol_filter(&x, 5, 3).unwrap(), &x, 1e-9);
    }

    #[test]
    fn test_trivial_window() {
        let x = [3.0, -1.0, 4.0];
        assert_close(&savgol_filter(&x, 1, 0).unwrap(), &x, 1e-12);
    }

    #[test]
    fn test_invalid_arguments() {
        let x = [1.0; 4];
        assert_eq!(savgol_filter(&x, 4, 1), Err(SmoothingError::EvenWindow(4)));
        assert_eq!(
            savgol_filter(&x, 3, 3),
            Err(SmoothingError::PolyOrderTooLarge {
                window: 3,
                polyorder: 3
            })
        );
        assert_eq!(
            savgol_filter(&x, 5, 2),
            Err(SmoothingError::WindowTooLong { window: 5, len: 4 })
        );
    }

    #[test]
    fn test_smooth_spectrum_is_a_new_record() {
        let spectrum = Fixture {
            frequency: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            ..Default::default()
        }
        .decode();
        let smoothed = smooth_spectrum(&spectrum, 5, 3).unwrap();
        // impedance and phase are linear in frequency, so smoothing keeps them
        assert_close(&smoothed.impedance(), &spectrum.impedance(), 1e-9);
        assert_close(&smoothed.phase(), &spectrum.phase(), 1e-9);
        assert_eq!(smoothed.frequency(), spectrum.frequency());
        assert!(smooth_spectrum(&spectrum, 7, 3).is_err());
    }
}
