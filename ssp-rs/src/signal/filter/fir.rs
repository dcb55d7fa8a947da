use super::design::{filter_length_samples, firwin_bandpass, FilterBand};
use super::ext::odd_ext;
use crate::{Error, Result};
use ndarray::ArrayView1;
use ssp_rs_core::num_rs::{convolve, ConvolveMode};

///
/// Apply a symmetric (linear-phase) FIR filter without phase distortion.
///
/// The group delay of `(h.len() - 1) / 2` samples is compensated so the
/// output lines up with the input. Both ends are extended by an odd
/// reflection of up to half the filter length before convolving, which
/// keeps step-like edges from ringing into the signal.
///
/// ```
/// use approx::assert_abs_diff_eq;
/// use ssp_rs::signal::filter::fir_zero_phase;
///
/// let x = [0.0, 0.0, 1.0, 0.0, 0.0];
/// let y = fir_zero_phase(&x, &[0.25, 0.5, 0.25]).unwrap();
/// assert_abs_diff_eq!(y[1], 0.25, epsilon = 1e-12);
/// assert_abs_diff_eq!(y[2], 0.5, epsilon = 1e-12);
/// assert_abs_diff_eq!(y[3], 0.25, epsilon = 1e-12);
/// ```
pub fn fir_zero_phase(x: &[f64], h: &[f64]) -> Result<Vec<f64>> {
    if x.is_empty() {
        return Err(Error::invalid_arg("x", "input must be non-empty."));
    }
    if h.is_empty() || h.len() % 2 == 0 {
        return Err(Error::invalid_arg("h", "filter must have an odd number of taps."));
    }
    let n = x.len();
    let half = (h.len() - 1) / 2;
    let padlen = half.min(n - 1);
    let ext = odd_ext(padlen, x)?;
    let y = convolve(ArrayView1::from(&ext), ArrayView1::from(h), ConvolveMode::Full)?;
    let start = padlen + half;
    Ok(y.iter().skip(start).take(n).copied().collect())
}

///
/// Zero-phase FIR band-pass filter of a single channel.
///
/// `l_freq = None` gives a low-pass, `h_freq = None` a high-pass and both
/// `None` returns the input unchanged. `filter_length` is in seconds and is
/// clipped to the signal length.
///
pub fn band_pass_filter(
    x: &[f64],
    sfreq: f64,
    l_freq: Option<f64>,
    h_freq: Option<f64>,
    filter_length: f64,
) -> Result<Vec<f64>> {
    match FilterBand::from_cutoffs(l_freq, h_freq, sfreq)? {
        None => Ok(x.to_vec()),
        Some(band) => {
            let numtaps = filter_length_samples(filter_length, sfreq, x.len())?;
            let h = firwin_bandpass(band, sfreq, numtaps)?;
            fir_zero_phase(x, &h)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use core::f64::consts::PI;

    #[test]
    fn output_is_aligned_with_input() {
        let sfreq = 200.0;
        let x: Vec<f64> = (0..2000)
            .map(|i| (2.0 * PI * 10.0 * i as f64 / sfreq).sin())
            .collect();
        let y = band_pass_filter(&x, sfreq, Some(5.0), Some(20.0), 2.0).unwrap();
        assert_eq!(y.len(), x.len());
        for i in 400..1600 {
            assert_abs_diff_eq!(y[i], x[i], epsilon = 1e-2);
        }
    }

    #[test]
    fn removes_slow_drift_and_fast_tone() {
        let sfreq = 200.0;
        let x: Vec<f64> = (0..4000)
            .map(|i| {
                let t = i as f64 / sfreq;
                3.0 + (2.0 * PI * 60.0 * t).sin()
            })
            .collect();
        let y = band_pass_filter(&x, sfreq, Some(2.0), Some(30.0), 4.0).unwrap();
        for v in &y[800..3200] {
            assert!(v.abs() < 1e-2, "residual {v}");
        }
    }

    #[test]
    fn no_cutoffs_is_identity() {
        let x = [1.0, -2.0, 3.5];
        assert_eq!(band_pass_filter(&x, 100.0, None, None, 10.0).unwrap(), x.to_vec());
    }

    #[test]
    fn single_sample_signal() {
        let y = fir_zero_phase(&[2.0], &[0.25, 0.5, 0.25]).unwrap();
        assert_abs_diff_eq!(y[0], 1.0, epsilon = 1e-12);
    }
}
