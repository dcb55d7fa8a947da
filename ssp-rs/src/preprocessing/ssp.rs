//! Cardiac and ocular SSP vectors from continuous recordings.

use super::ecg::{find_ecg_events, EcgEventOptions, QrsThreshold};
use super::eog::{find_eog_events, EogEventOptions};
use crate::epochs::{Epochs, EpochsOptions, Event, RejectCriteria};
use crate::info::{pick_types, Exclude, PickOptions};
use crate::kernel::{ConfigError, KernelLifecycle};
use crate::proj::{compute_proj_epochs, compute_proj_evoked, make_eeg_average_ref_proj, Projection};
use crate::raw::Raw;
use crate::Result;
use tracing::{info, warn};

/// Artifact the projections target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExgMode {
    /// Heartbeats.
    Ecg,
    /// Blinks.
    Eog,
}

impl ExgMode {
    /// Upper-case label used in log lines and projection names.
    pub fn label(self) -> &'static str {
        match self {
            ExgMode::Ecg => "ECG",
            ExgMode::Eog => "EOG",
        }
    }
}

/// Settings of an SSP computation. Start from [`ExgProjConfig::ecg`] or
/// [`ExgProjConfig::eog`] and override fields as needed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExgProjConfig {
    /// Epoch start relative to each event, seconds.
    pub tmin: f64,
    /// Epoch end relative to each event, seconds.
    pub tmax: f64,
    /// Gradiometer components to keep.
    pub n_grad: usize,
    /// Magnetometer components to keep.
    pub n_mag: usize,
    /// EEG components to keep.
    pub n_eeg: usize,
    /// Low cut-off applied to the data before epoching.
    pub l_freq: Option<f64>,
    /// High cut-off applied to the data before epoching.
    pub h_freq: Option<f64>,
    /// Decompose the average instead of the concatenated epochs.
    pub average: bool,
    /// Filter length in seconds.
    pub filter_length: f64,
    /// Worker threads for filtering and covariance.
    pub n_jobs: usize,
    /// Channel to detect events on instead of the default choice.
    pub ch_name: Option<String>,
    /// Peak-to-peak rejection limits.
    pub reject: Option<RejectCriteria>,
    /// Flatness rejection limits.
    pub flat: Option<RejectCriteria>,
    /// Extra channels to treat as bad.
    pub bads: Vec<String>,
    /// Add an average EEG reference projection.
    pub avg_ref: bool,
    /// Ignore the projections already attached to the recording.
    pub no_proj: bool,
    /// Id of the detected events.
    pub event_id: i32,
    /// Low cut-off of the event detection band.
    pub exg_l_freq: f64,
    /// High cut-off of the event detection band.
    pub exg_h_freq: f64,
    /// Seconds skipped before event detection starts.
    pub tstart: f64,
    /// QRS detection threshold; unused for blinks.
    pub qrs_threshold: QrsThreshold,
}

impl ExgProjConfig {
    /// Defaults for heartbeat projections.
    pub fn ecg() -> Self {
        Self {
            tmin: -0.2,
            tmax: 0.4,
            n_grad: 2,
            n_mag: 2,
            n_eeg: 2,
            l_freq: Some(1.0),
            h_freq: Some(35.0),
            average: false,
            filter_length: 10.0,
            n_jobs: 1,
            ch_name: None,
            reject: Some(RejectCriteria::ecg_default()),
            flat: None,
            bads: Vec::new(),
            avg_ref: false,
            no_proj: false,
            event_id: super::ecg::ECG_EVENT_ID,
            exg_l_freq: 5.0,
            exg_h_freq: 35.0,
            tstart: 0.0,
            qrs_threshold: QrsThreshold::Value(0.6),
        }
    }

    /// Defaults for blink projections.
    pub fn eog() -> Self {
        Self {
            tmax: 0.2,
            reject: Some(RejectCriteria::eog_default()),
            event_id: super::eog::EOG_EVENT_ID,
            exg_l_freq: 1.0,
            exg_h_freq: 10.0,
            ..Self::ecg()
        }
    }
}

/// Projections and the events they were computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExgProjections {
    /// Existing plus new projections; `None` when no event or no clean epoch
    /// was found.
    pub projs: Option<Vec<Projection>>,
    /// Detected events on the absolute sample axis.
    pub events: Vec<Event>,
}

/// Validated SSP computation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExgProjKernel {
    config: ExgProjConfig,
}

impl KernelLifecycle for ExgProjKernel {
    type Config = ExgProjConfig;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        let invalid = |arg, reason| Err(ConfigError::InvalidArgument { arg, reason });
        if config.tmin >= config.tmax {
            return invalid("tmin/tmax", "tmin must be smaller than tmax");
        }
        if config.n_jobs == 0 {
            return invalid("n_jobs", "at least one job is required");
        }
        if !(config.filter_length.is_finite() && config.filter_length > 0.0) {
            return invalid("filter_length", "filter length must be a positive number of seconds");
        }
        if config.exg_l_freq <= 0.0 || config.exg_l_freq >= config.exg_h_freq {
            return invalid("exg_l_freq/exg_h_freq", "detection band must be ordered and positive");
        }
        if config.tstart < 0.0 {
            return invalid("tstart", "tstart must not be negative");
        }
        if let QrsThreshold::Value(v) = config.qrs_threshold {
            if v.is_nan() || v <= 0.0 || v > 1.0 {
                return invalid("qrs_threshold", "threshold must lie in (0, 1]");
            }
        }
        Ok(Self { config })
    }
}

impl ExgProjKernel {
    /// The validated settings.
    pub fn config(&self) -> &ExgProjConfig {
        &self.config
    }

    ///
    /// Compute `mode` projections for `raw`.
    ///
    /// Events are detected on `raw_event` when given, on `raw` otherwise.
    /// `raw` is band-passed in place before epoching.
    ///
    pub fn run(&self, mode: ExgMode, raw: &mut Raw, raw_event: Option<&Raw>) -> Result<ExgProjections> {
        let cfg = &self.config;
        let label = mode.label();

        let mut projs = if cfg.no_proj {
            Vec::new()
        } else {
            let projs = raw.info().projs.clone();
            info!("Including {} SSP projectors from raw file", projs.len());
            projs
        };
        if cfg.avg_ref {
            projs.push(make_eeg_average_ref_proj(raw.info(), true)?);
        }

        info!("Running {label} SSP computation");
        let events = {
            let source = raw_event.unwrap_or(raw);
            match mode {
                ExgMode::Ecg => {
                    find_ecg_events(
                        source,
                        &EcgEventOptions {
                            event_id: cfg.event_id,
                            ch_name: cfg.ch_name.clone(),
                            tstart: cfg.tstart,
                            l_freq: cfg.exg_l_freq,
                            h_freq: cfg.exg_h_freq,
                            qrs_threshold: cfg.qrs_threshold,
                            filter_length: cfg.filter_length,
                        },
                    )?
                    .events
                }
                ExgMode::Eog => find_eog_events(
                    source,
                    &EogEventOptions {
                        event_id: cfg.event_id,
                        l_freq: cfg.exg_l_freq,
                        h_freq: cfg.exg_h_freq,
                        filter_length: cfg.filter_length,
                        ch_name: cfg.ch_name.clone().map(|c| vec![c]),
                        tstart: cfg.tstart,
                    },
                )?,
            }
        };
        if events.is_empty() {
            warn!("No {label} events found, returning None for projs");
            return Ok(ExgProjections { projs: None, events });
        }

        info!("Computing projector");
        let mut my_info = raw.info().clone();
        for bad in &cfg.bads {
            if !my_info.bads.contains(bad) {
                my_info.bads.push(bad.clone());
            }
        }
        let reject = cfg.reject.map(|r| r.without_missing_types(&my_info));
        let flat = cfg.flat.map(|f| f.without_missing_types(&my_info));
        let picks = pick_types(
            &my_info,
            &PickOptions {
                eeg: true,
                eog: true,
                ref_meg: false,
                exclude: Exclude::Bads,
                ..PickOptions::default()
            },
        );

        raw.filter(cfg.l_freq, cfg.h_freq, Some(&picks), cfg.filter_length, cfg.n_jobs)?;

        let epochs = Epochs::new(
            raw,
            &events,
            &EpochsOptions {
                event_id: Some(cfg.event_id),
                tmin: cfg.tmin,
                tmax: cfg.tmax,
                picks: Some(picks),
                reject,
                flat,
                proj: true,
            },
        )?;
        if epochs.is_empty() {
            warn!("No good epochs found, returning None for projs");
            return Ok(ExgProjections { projs: None, events });
        }

        let new_projs = if cfg.average {
            compute_proj_evoked(&epochs.average()?, cfg.n_grad, cfg.n_mag, cfg.n_eeg)?
        } else {
            compute_proj_epochs(&epochs, cfg.n_grad, cfg.n_mag, cfg.n_eeg, cfg.n_jobs)?
        };
        projs.extend(new_projs.into_iter().map(|p| Projection {
            desc: format!("{label}-{}", p.desc),
            ..p
        }));
        info!("Done.");

        Ok(ExgProjections {
            projs: Some(projs),
            events,
        })
    }
}

/// Heartbeat projections for `raw`; see [`ExgProjKernel::run`].
pub fn compute_proj_ecg(
    raw: &mut Raw,
    config: &ExgProjConfig,
    raw_event: Option<&Raw>,
) -> Result<ExgProjections> {
    ExgProjKernel::try_new(config.clone())?.run(ExgMode::Ecg, raw, raw_event)
}

/// Blink projections for `raw`; see [`ExgProjKernel::run`].
pub fn compute_proj_eog(
    raw: &mut Raw,
    config: &ExgProjConfig,
    raw_event: Option<&Raw>,
) -> Result<ExgProjections> {
    ExgProjKernel::try_new(config.clone())?.run(ExgMode::Eog, raw, raw_event)
}
