//! Trait-first kernel wrappers for FIR design and zero-phase filtering.

use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D, Write1D};
use crate::signal::traits::{BandPass1D, FirWinDesign};

use super::{filter_length_samples, fir_zero_phase, firwin_bandpass, FilterBand};

fn copy_checked(src: &[f64], out: &mut [f64]) -> Result<(), ExecInvariantViolation> {
    if out.len() != src.len() {
        return Err(ExecInvariantViolation::LengthMismatch {
            arg: "out",
            expected: src.len(),
            got: out.len(),
        });
    }
    out.copy_from_slice(src);
    Ok(())
}

/// Constructor config for [`FirWinKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirWinConfig {
    /// Number of filter taps, odd.
    pub numtaps: usize,
    /// Pass-band.
    pub band: FilterBand,
    /// Sample rate in Hz.
    pub sfreq: f64,
}

/// Trait-first FIR design kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirWinKernel {
    numtaps: usize,
    band: FilterBand,
    sfreq: f64,
}

impl KernelLifecycle for FirWinKernel {
    type Config = FirWinConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if config.numtaps == 0 || config.numtaps % 2 == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "numtaps",
                reason: "numtaps must be odd and positive",
            });
        }
        validate_band(config.band, config.sfreq)?;
        Ok(Self {
            numtaps: config.numtaps,
            band: config.band,
            sfreq: config.sfreq,
        })
    }
}

impl FirWinDesign<f64> for FirWinKernel {
    fn run_into<O>(&self, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        O: Write1D<f64> + ?Sized,
    {
        let coeffs = self.run_alloc()?;
        let out_slice = out
            .write_slice_mut()
            .map_err(ExecInvariantViolation::from)?;
        copy_checked(&coeffs, out_slice)
    }

    fn run_alloc(&self) -> Result<Vec<f64>, ExecInvariantViolation> {
        firwin_bandpass(self.band, self.sfreq, self.numtaps).map_err(|_| {
            ExecInvariantViolation::InvalidState {
                reason: "firwin kernel execution failed",
            }
        })
    }
}

fn validate_band(band: FilterBand, sfreq: f64) -> Result<(), ConfigError> {
    let (l, h) = match band {
        FilterBand::Lowpass { h_freq } => (None, Some(h_freq)),
        FilterBand::Highpass { l_freq } => (Some(l_freq), None),
        FilterBand::Bandpass { l_freq, h_freq } => (Some(l_freq), Some(h_freq)),
    };
    FilterBand::from_cutoffs(l, h, sfreq)
        .map(|_| ())
        .map_err(|_| ConfigError::InvalidArgument {
            arg: "band",
            reason: "cut-offs must be ordered and lie between 0 and Nyquist",
        })
}

/// Constructor config for [`BandPassKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandPassConfig {
    /// Sample rate in Hz.
    pub sfreq: f64,
    /// Lower cut-off, `None` for a low-pass.
    pub l_freq: Option<f64>,
    /// Upper cut-off, `None` for a high-pass.
    pub h_freq: Option<f64>,
    /// Filter length in seconds.
    pub filter_length: f64,
}

/// Stateless zero-phase FIR band-pass kernel.
///
/// Taps are designed per call since the tap count is clipped to the length
/// of each input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandPassKernel {
    sfreq: f64,
    band: Option<FilterBand>,
    filter_length: f64,
}

impl KernelLifecycle for BandPassKernel {
    type Config = BandPassConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if !(config.filter_length.is_finite() && config.filter_length > 0.0) {
            return Err(ConfigError::InvalidArgument {
                arg: "filter_length",
                reason: "filter length must be a positive number of seconds",
            });
        }
        let band = FilterBand::from_cutoffs(config.l_freq, config.h_freq, config.sfreq).map_err(
            |_| ConfigError::InvalidArgument {
                arg: "l_freq/h_freq",
                reason: "cut-offs must be ordered and lie between 0 and Nyquist",
            },
        )?;
        Ok(Self {
            sfreq: config.sfreq,
            band,
            filter_length: config.filter_length,
        })
    }
}

impl BandPassKernel {
    /// Whether the kernel leaves its input untouched.
    pub fn is_passthrough(&self) -> bool {
        self.band.is_none()
    }
}

impl BandPass1D<f64> for BandPassKernel {
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
        O: Write1D<f64> + ?Sized,
    {
        let y = self.run_alloc(input)?;
        let out_slice = out
            .write_slice_mut()
            .map_err(ExecInvariantViolation::from)?;
        copy_checked(&y, out_slice)
    }

    fn run_alloc<I>(&self, input: &I) -> Result<Vec<f64>, ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
    {
        let input = input.read_slice().map_err(ExecInvariantViolation::from)?;
        let Some(band) = self.band else {
            return Ok(input.to_vec());
        };
        if input.is_empty() {
            return Err(ExecInvariantViolation::InvalidState {
                reason: "cannot filter an empty signal",
            });
        }
        let numtaps = filter_length_samples(self.filter_length, self.sfreq, input.len())
            .map_err(|_| ExecInvariantViolation::InvalidState {
                reason: "filter length could not be resolved",
            })?;
        let design = FirWinKernel::try_new(FirWinConfig {
            numtaps,
            band,
            sfreq: self.sfreq,
        })
        .map_err(|_| ExecInvariantViolation::InvalidState {
            reason: "resolved tap count or band rejected by the designer",
        })?;
        let h = design.run_alloc()?;
        fir_zero_phase(input, &h).map_err(|_| ExecInvariantViolation::InvalidState {
            reason: "zero-phase filter execution failed",
        })
    }
}
