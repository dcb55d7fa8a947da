//! Events, epoch extraction with artifact rejection, and averaged responses.

use crate::info::{pick_types, ChannelKind, Info, PickOptions};
use crate::proj::make_projector_info;
use crate::raw::Raw;
use crate::{Error, Result};
use ndarray::{s, Array2, Array3, Axis};
use tracing::{debug, info};

/// A marker on the absolute sample axis of a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event {
    /// Absolute sample index, i.e. including the recording's `first_samp`.
    pub sample: usize,
    /// Value of the trigger channel before the event.
    pub previous: i32,
    /// Event id.
    pub id: i32,
}

///
/// Events every `duration` seconds from `start` to `stop` (end of the
/// recording when `None`).
///
/// ```
/// use ndarray::Array2;
/// use ssp_rs::epochs::make_fixed_length_events;
/// use ssp_rs::info::{ChannelInfo, ChannelKind, Info};
/// use ssp_rs::raw::Raw;
///
/// let info = Info::new(vec![ChannelInfo::new("EEG 001", ChannelKind::Eeg)], 10.0).unwrap();
/// let raw = Raw::new(info, Array2::zeros((1, 35)), 100).unwrap();
/// let events = make_fixed_length_events(&raw, 1, 0.0, None, 1.0).unwrap();
/// let samples: Vec<usize> = events.iter().map(|e| e.sample).collect();
/// assert_eq!(samples, vec![100, 110, 120, 130]);
/// ```
pub fn make_fixed_length_events(
    raw: &Raw,
    id: i32,
    start: f64,
    stop: Option<f64>,
    duration: f64,
) -> Result<Vec<Event>> {
    if !(duration.is_finite() && duration > 0.0) {
        return Err(Error::invalid_arg("duration", "must be a positive number of seconds."));
    }
    let step = (duration * raw.sfreq()).round() as usize;
    if step == 0 {
        return Err(Error::invalid_arg("duration", "shorter than one sample."));
    }
    let first = raw.first_samp() + raw.time_as_index(start);
    let last = raw.first_samp()
        + stop
            .map_or(raw.n_times(), |t| raw.time_as_index(t))
            .min(raw.n_times());
    Ok((first..last)
        .step_by(step)
        .map(|sample| Event {
            sample,
            previous: 0,
            id,
        })
        .collect())
}

/// Peak-to-peak amplitude limits per sensor type.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RejectCriteria {
    /// Gradiometers, T/m.
    pub grad: Option<f64>,
    /// Magnetometers, T.
    pub mag: Option<f64>,
    /// EEG, V.
    pub eeg: Option<f64>,
    /// EOG, V.
    pub eog: Option<f64>,
}

impl RejectCriteria {
    /// Rejection limits used when computing cardiac projections.
    pub fn ecg_default() -> Self {
        Self {
            grad: Some(2000e-13),
            mag: Some(3000e-15),
            eeg: Some(50e-6),
            eog: Some(250e-6),
        }
    }

    /// Rejection limits used when computing ocular projections.
    pub fn eog_default() -> Self {
        Self {
            grad: Some(2000e-13),
            mag: Some(3000e-15),
            eeg: Some(500e-6),
            eog: None,
        }
    }

    /// Limit for channels of `kind`.
    pub fn limit(&self, kind: ChannelKind) -> Option<f64> {
        match kind {
            ChannelKind::Grad => self.grad,
            ChannelKind::Mag => self.mag,
            ChannelKind::Eeg => self.eeg,
            ChannelKind::Eog => self.eog,
            _ => None,
        }
    }

    /// Copy without the limits for types that have no good channel in `info`.
    pub fn without_missing_types(&self, info: &Info) -> Self {
        let present = |kind: ChannelKind| {
            info.chs()
                .iter()
                .enumerate()
                .any(|(i, ch)| ch.kind == kind && !info.is_bad(i))
        };
        let keep = |kind: ChannelKind, limit: Option<f64>| limit.filter(|_| present(kind));
        Self {
            grad: keep(ChannelKind::Grad, self.grad),
            mag: keep(ChannelKind::Mag, self.mag),
            eeg: keep(ChannelKind::Eeg, self.eeg),
            eog: keep(ChannelKind::Eog, self.eog),
        }
    }
}

/// Options for [`Epochs::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct EpochsOptions {
    /// Keep only events with this id; `None` keeps all of them.
    pub event_id: Option<i32>,
    /// Start of each epoch relative to its event, seconds.
    pub tmin: f64,
    /// End of each epoch relative to its event (inclusive), seconds.
    pub tmax: f64,
    /// Channels to keep; `None` keeps good data channels.
    pub picks: Option<Vec<usize>>,
    /// Drop epochs whose peak-to-peak amplitude exceeds a limit.
    pub reject: Option<RejectCriteria>,
    /// Drop epochs whose peak-to-peak amplitude is below a limit.
    pub flat: Option<RejectCriteria>,
    /// Apply the recording's projections to each epoch.
    pub proj: bool,
}

impl Default for EpochsOptions {
    fn default() -> Self {
        Self {
            event_id: None,
            tmin: -0.2,
            tmax: 0.5,
            picks: None,
            reject: None,
            flat: None,
            proj: true,
        }
    }
}

/// Data segments cut around events.
#[derive(Debug, Clone, PartialEq)]
pub struct Epochs {
    info: Info,
    data: Array3<f64>,
    events: Vec<Event>,
    tmin: f64,
    tmax: f64,
    event_id: i32,
}

impl Epochs {
    ///
    /// Cut `[tmin, tmax]` windows around `events` out of `raw`.
    ///
    /// Windows running off either end of the recording are skipped. Each
    /// kept window is projected (if asked) and then checked against the
    /// rejection limits; no baseline correction is applied.
    ///
    pub fn new(raw: &Raw, events: &[Event], opts: &EpochsOptions) -> Result<Self> {
        if opts.tmin > opts.tmax {
            return Err(Error::ConflictArg {
                reason: format!("tmin ({}) must not exceed tmax ({})", opts.tmin, opts.tmax),
            });
        }
        let sfreq = raw.sfreq();
        let start_off = (opts.tmin * sfreq).round() as i64;
        let stop_off = (opts.tmax * sfreq).round() as i64;
        let n_times = (stop_off - start_off + 1) as usize;

        let picks = match &opts.picks {
            Some(p) => p.clone(),
            None => pick_types(
                raw.info(),
                &PickOptions {
                    eeg: true,
                    eog: true,
                    ecg: true,
                    ..PickOptions::default()
                },
            ),
        };
        if picks.is_empty() {
            return Err(Error::invalid_arg("picks", "no channels selected."));
        }
        let info = raw.info().pick(&picks)?;
        let projector = if opts.proj && !info.projs.is_empty() {
            Some(make_projector_info(&info)?).filter(|p| p.nproj > 0)
        } else {
            None
        };

        let event_id = opts
            .event_id
            .or_else(|| events.first().map(|e| e.id))
            .unwrap_or(1);
        let matching: Vec<&Event> = events
            .iter()
            .filter(|e| opts.event_id.map_or(true, |id| id == e.id))
            .collect();
        info!("{} matching events found", matching.len());

        let raw_data = raw.data();
        let total = raw.n_times() as i64;
        let mut kept = Vec::with_capacity(matching.len());
        let mut segments = Vec::with_capacity(matching.len());
        for ev in matching {
            let center = ev.sample as i64 - raw.first_samp() as i64;
            let (start, stop) = (center + start_off, center + stop_off);
            if start < 0 || stop >= total {
                debug!("Epoch at sample {} runs off the recording", ev.sample);
                continue;
            }
            let window = raw_data.slice(s![.., start as usize..=stop as usize]);
            let mut epoch = window.select(Axis(0), &picks);
            if let Some(p) = &projector {
                epoch = p.apply(epoch.view())?;
            }
            let verdict = rejection(&epoch, &info, opts.reject.as_ref(), opts.flat.as_ref());
            if let Some((kind, names)) = verdict {
                info!("    Rejecting epoch based on {kind} : {names:?}");
                continue;
            }
            kept.push(*ev);
            segments.push(epoch);
        }

        let mut data = Array3::zeros((segments.len(), picks.len(), n_times));
        for (mut slot, seg) in data.outer_iter_mut().zip(&segments) {
            slot.assign(seg);
        }
        info!("{} epochs kept", kept.len());

        Ok(Self {
            info,
            data,
            events: kept,
            tmin: start_off as f64 / sfreq,
            tmax: stop_off as f64 / sfreq,
            event_id,
        })
    }

    /// Measurement info of the picked channels.
    pub fn info(&self) -> &Info {
        &self.info
    }

    /// Epoch data, `[n_epochs, nchan, n_times]`.
    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    /// Events of the kept epochs.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Time of the first sample relative to the event, seconds.
    pub fn tmin(&self) -> f64 {
        self.tmin
    }

    /// Time of the last sample relative to the event, seconds.
    pub fn tmax(&self) -> f64 {
        self.tmax
    }

    /// Id of the epoched events.
    pub fn event_id(&self) -> i32 {
        self.event_id
    }

    /// Number of kept epochs.
    pub fn len(&self) -> usize {
        self.data.shape()[0]
    }

    /// Whether every epoch was dropped.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Average of the kept epochs.
    pub fn average(&self) -> Result<Evoked> {
        let data = self
            .data
            .mean_axis(Axis(0))
            .ok_or_else(|| Error::invalid_arg("epochs", "cannot average an empty set of epochs."))?;
        Ok(Evoked {
            info: self.info.clone(),
            data,
            tmin: self.tmin,
            tmax: self.tmax,
            nave: self.len(),
        })
    }
}

/// Sensor type name and offending channels of the first violated limit.
fn rejection(
    epoch: &Array2<f64>,
    info: &Info,
    reject: Option<&RejectCriteria>,
    flat: Option<&RejectCriteria>,
) -> Option<(&'static str, Vec<String>)> {
    const KINDS: [(ChannelKind, &str); 4] = [
        (ChannelKind::Grad, "grad"),
        (ChannelKind::Mag, "mag"),
        (ChannelKind::Eeg, "eeg"),
        (ChannelKind::Eog, "eog"),
    ];
    let ptp: Vec<f64> = epoch
        .rows()
        .into_iter()
        .map(|row| {
            let (lo, hi) = row
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
            hi - lo
        })
        .collect();

    let offending = |criteria: &RejectCriteria, too_big: bool| {
        KINDS.iter().find_map(|&(kind, name)| {
            let limit = criteria.limit(kind)?;
            let names: Vec<String> = info
                .chs()
                .iter()
                .zip(&ptp)
                .filter(|(ch, _)| ch.kind == kind)
                .filter(|(_, p)| if too_big { **p > limit } else { **p < limit })
                .map(|(ch, _)| ch.name.clone())
                .collect();
            (!names.is_empty()).then_some((name, names))
        })
    };
    reject
        .and_then(|r| offending(r, true))
        .or_else(|| flat.and_then(|f| offending(f, false)))
}

/// Average of a set of epochs.
#[derive(Debug, Clone, PartialEq)]
pub struct Evoked {
    /// Measurement info of the channels.
    pub info: Info,
    /// Averaged data, `[nchan, n_times]`.
    pub data: Array2<f64>,
    /// Time of the first sample, seconds.
    pub tmin: f64,
    /// Time of the last sample, seconds.
    pub tmax: f64,
    /// Number of averaged epochs.
    pub nave: usize,
}
