//! Window-method FIR design for low-, high- and band-pass responses.

use crate::signal::windows::hamming;
use crate::{Error, Result};
use core::f64::consts::PI;

/// Pass-band shape implied by a pair of optional cut-offs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterBand {
    /// Keep frequencies below `h_freq`.
    Lowpass {
        /// Upper cut-off in Hz.
        h_freq: f64,
    },
    /// Keep frequencies above `l_freq`.
    Highpass {
        /// Lower cut-off in Hz.
        l_freq: f64,
    },
    /// Keep frequencies between `l_freq` and `h_freq`.
    Bandpass {
        /// Lower cut-off in Hz.
        l_freq: f64,
        /// Upper cut-off in Hz.
        h_freq: f64,
    },
}

impl FilterBand {
    /// Classify a pair of optional cut-offs, validating them against `sfreq`.
    ///
    /// Returns `Ok(None)` when both are absent, meaning no filtering.
    pub fn from_cutoffs(l_freq: Option<f64>, h_freq: Option<f64>, sfreq: f64) -> Result<Option<Self>> {
        if !(sfreq.is_finite() && sfreq > 0.0) {
            return Err(Error::invalid_arg("sfreq", "sampling rate must be positive."));
        }
        let nyq = sfreq / 2.0;
        let check = |arg: &str, f: f64| {
            if f.is_finite() && f > 0.0 && f < nyq {
                Ok(f)
            } else {
                Err(Error::invalid_arg(
                    arg,
                    format!("cut-off {f} Hz must lie strictly between 0 and Nyquist ({nyq} Hz)."),
                ))
            }
        };
        let band = match (l_freq, h_freq) {
            (None, None) => None,
            (None, Some(h)) => Some(FilterBand::Lowpass {
                h_freq: check("h_freq", h)?,
            }),
            (Some(l), None) => Some(FilterBand::Highpass {
                l_freq: check("l_freq", l)?,
            }),
            (Some(l), Some(h)) => {
                let (l, h) = (check("l_freq", l)?, check("h_freq", h)?);
                if l >= h {
                    return Err(Error::ConflictArg {
                        reason: format!("l_freq ({l} Hz) must be below h_freq ({h} Hz)."),
                    });
                }
                Some(FilterBand::Bandpass {
                    l_freq: l,
                    h_freq: h,
                })
            }
        };
        Ok(band)
    }
}

/// Odd number of taps for a filter spanning `filter_length` seconds.
///
/// The length is clipped to the largest odd count not exceeding `n_times`
/// so the filter never outgrows the signal it is applied to.
pub fn filter_length_samples(filter_length: f64, sfreq: f64, n_times: usize) -> Result<usize> {
    if !(filter_length.is_finite() && filter_length > 0.0) {
        return Err(Error::invalid_arg(
            "filter_length",
            "filter length must be a positive number of seconds.",
        ));
    }
    if n_times == 0 {
        return Err(Error::invalid_arg("n_times", "signal must be non-empty."));
    }
    let mut n = (filter_length * sfreq).round().max(1.0) as usize;
    if n % 2 == 0 {
        n += 1;
    }
    if n > n_times {
        n = if n_times % 2 == 1 { n_times } else { n_times - 1 };
    }
    Ok(n.max(1))
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Hamming-windowed sinc low-pass normalised to unit DC gain.
fn lowpass_taps(cutoff: f64, sfreq: f64, numtaps: usize) -> Vec<f64> {
    let fc = 2.0 * cutoff / sfreq;
    let center = (numtaps - 1) as f64 / 2.0;
    let window = hamming(numtaps, true);
    let mut h: Vec<f64> = window
        .iter()
        .enumerate()
        .map(|(i, w)| w * fc * sinc(fc * (i as f64 - center)))
        .collect();
    let gain: f64 = h.iter().sum();
    if gain != 0.0 {
        h.iter_mut().for_each(|v| *v /= gain);
    }
    h
}

/// Design a linear-phase FIR filter with the window method.
///
/// High-pass and band-pass responses are obtained by spectral inversion and
/// by differencing two low-pass designs, so `numtaps` must be odd.
///
/// ```
/// use approx::assert_abs_diff_eq;
/// use ssp_rs::signal::filter::{firwin_bandpass, FilterBand};
///
/// let h = firwin_bandpass(FilterBand::Lowpass { h_freq: 10.0 }, 100.0, 51).unwrap();
/// assert_eq!(h.len(), 51);
/// assert_abs_diff_eq!(h.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
/// ```
pub fn firwin_bandpass(band: FilterBand, sfreq: f64, numtaps: usize) -> Result<Vec<f64>> {
    if numtaps == 0 || numtaps % 2 == 0 {
        return Err(Error::invalid_arg("numtaps", "numtaps must be odd and positive."));
    }
    let center = (numtaps - 1) / 2;
    let taps = match band {
        FilterBand::Lowpass { h_freq } => lowpass_taps(h_freq, sfreq, numtaps),
        FilterBand::Highpass { l_freq } => {
            let mut h = lowpass_taps(l_freq, sfreq, numtaps);
            h.iter_mut().for_each(|v| *v = -*v);
            h[center] += 1.0;
            h
        }
        FilterBand::Bandpass { l_freq, h_freq } => {
            let low = lowpass_taps(l_freq, sfreq, numtaps);
            lowpass_taps(h_freq, sfreq, numtaps)
                .into_iter()
                .zip(low)
                .map(|(hi, lo)| hi - lo)
                .collect()
        }
    };
    Ok(taps)
}
