//! Window functions used for FIR design.

use core::f64::consts::PI;

/// Hamming window of length `n`.
///
/// `sym = true` gives the symmetric window used for filter design;
/// `sym = false` gives the periodic window used for spectral analysis.
///
/// ```
/// use approx::assert_abs_diff_eq;
/// use ssp_rs::signal::windows::hamming;
///
/// let w = hamming(5, true);
/// assert_abs_diff_eq!(w[0], 0.08, epsilon = 1e-12);
/// assert_abs_diff_eq!(w[2], 1.0, epsilon = 1e-12);
/// ```
pub fn hamming(n: usize, sym: bool) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let denom = if sym { (n - 1) as f64 } else { n as f64 };
            (0..n)
                .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / denom).cos())
                .collect()
        }
    }
}
