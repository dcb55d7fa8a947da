//! Heartbeat detection on an ECG channel or a synthetic one built from MEG.

use crate::epochs::Event;
use crate::info::{pick_types, MegPick, PickOptions};
use crate::raw::Raw;
use crate::signal::filter::band_pass_filter;
use crate::stats::{mean, median, rms, stdev};
use crate::{Error, Result};
use ndarray::Axis;
use tracing::info;

/// Event id of detected heartbeats.
pub const ECG_EVENT_ID: i32 = 999;

/// Heart rates outside this range (beats per minute) are considered implausible.
const PLAUSIBLE_BPM: (f64, f64) = (40.0, 160.0);
/// Rate assumed when no threshold gives a plausible one.
const FALLBACK_BPM: f64 = 80.0;

/// Detection threshold, as a fraction of the initial peak amplitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QrsThreshold {
    /// A fixed fraction in `(0, 1]`.
    Value(f64),
    /// Try fractions 0.30 to 1.05 and keep the most plausible heart rate.
    Auto,
}

impl QrsThreshold {
    fn ratios(self) -> Vec<f64> {
        match self {
            QrsThreshold::Value(v) => vec![v],
            QrsThreshold::Auto => (0..16).map(|k| 0.3 + 0.05 * k as f64).collect(),
        }
    }
}

/// Options for [`qrs_detector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QrsOptions {
    /// Detection threshold.
    pub thresh: QrsThreshold,
    /// Beats whose window RMS exceeds `mean + levels * std` are dropped.
    pub levels: f64,
    /// Beats with this many threshold crossings or more are dropped.
    pub n_thresh: usize,
    /// Low cut-off of the QRS band, Hz.
    pub l_freq: f64,
    /// High cut-off of the QRS band, Hz.
    pub h_freq: f64,
    /// Seconds skipped at the start of the signal.
    pub tstart: f64,
    /// Filter length in seconds.
    pub filter_length: f64,
}

impl Default for QrsOptions {
    fn default() -> Self {
        Self {
            thresh: QrsThreshold::Value(0.6),
            levels: 2.5,
            n_thresh: 3,
            l_freq: 5.0,
            h_freq: 35.0,
            tstart: 0.0,
            filter_length: 10.0,
        }
    }
}

///
/// Sample indices of the QRS complexes in `ecg`.
///
/// The signal is band-passed around the QRS band and rectified. The
/// threshold is a fraction of the mean of the peaks of the first three
/// seconds. Scanning forward, each sample above threshold opens a window
/// of half a second at 120 bpm; the window maximum is a beat candidate and
/// the scan jumps past the window. Candidates with an unusually large RMS
/// or too many threshold crossings are dropped.
///
/// # Errors
/// Fewer than three seconds of signal after `tstart`, or invalid filter
/// settings.
///
pub fn qrs_detector(sfreq: f64, ecg: &[f64], opts: &QrsOptions) -> Result<Vec<usize>> {
    let win_size = (60.0 * sfreq / 120.0).round() as usize;
    let filtered = band_pass_filter(
        ecg,
        sfreq,
        Some(opts.l_freq),
        Some(opts.h_freq),
        opts.filter_length,
    )?;
    let n_start = (sfreq * opts.tstart).max(0.0) as usize;
    let absecg: Vec<f64> = filtered.iter().skip(n_start).map(|v| v.abs()).collect();

    let init = sfreq as usize;
    if win_size == 0 || absecg.len() < 3 * init {
        return Err(Error::invalid_arg(
            "ecg",
            "at least three seconds of signal are needed after tstart.",
        ));
    }
    let peaks: Vec<f64> = absecg[..3 * init]
        .chunks(init)
        .map(|c| c.iter().copied().fold(f64::NEG_INFINITY, f64::max))
        .collect();
    let (init_max, _): (f64, usize) = mean(peaks.iter());

    let runs: Vec<Vec<usize>> = opts
        .thresh
        .ratios()
        .into_iter()
        .map(|ratio| scan(&absecg, init_max * ratio, win_size, opts))
        .map(|beats| beats.into_iter().map(|b| b + n_start).collect())
        .collect();

    if runs.len() == 1 {
        return Ok(runs.into_iter().flatten().collect());
    }
    let minutes = ecg.len() as f64 / sfreq / 60.0;
    let rates: Vec<f64> = runs.iter().map(|r| r.len() as f64 / minutes).collect();
    let plausible: Vec<f64> = rates
        .iter()
        .copied()
        .filter(|r| (PLAUSIBLE_BPM.0..=PLAUSIBLE_BPM.1).contains(r))
        .collect();
    let ideal = if plausible.is_empty() {
        FALLBACK_BPM
    } else {
        median::<_, f64>(plausible.iter()).0
    };
    let best = rates
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - ideal).abs().total_cmp(&(*b - ideal).abs()))
        .map_or(0, |(i, _)| i);
    Ok(runs.into_iter().nth(best).unwrap_or_default())
}

/// One threshold pass over the rectified signal.
fn scan(absecg: &[f64], thresh: f64, win_size: usize, opts: &QrsOptions) -> Vec<usize> {
    let mut times = Vec::new();
    let mut crossings = Vec::new();
    let mut rms_values: Vec<f64> = Vec::new();

    let mut ii = 0;
    while ii + win_size < absecg.len() {
        if absecg[ii] <= thresh {
            ii += 1;
            continue;
        }
        let window = &absecg[ii..ii + win_size];
        let argmax = window
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
            .0;
        times.push(ii + argmax);
        crossings.push(
            window
                .windows(2)
                .filter(|w| (w[0] > thresh) != (w[1] > thresh))
                .count(),
        );
        rms_values.push(rms(window.iter()));
        ii += win_size;
    }
    if times.is_empty() {
        return times;
    }

    let (rms_mean, _): (f64, usize) = mean(rms_values.iter());
    let (rms_std, _): (f64, usize) = stdev(rms_values.iter());
    let rms_thresh = rms_mean + opts.levels * rms_std;
    times
        .into_iter()
        .zip(crossings.into_iter().zip(rms_values))
        .filter(|(_, (nc, r))| *r <= rms_thresh && *nc < opts.n_thresh)
        .map(|(t, _)| t)
        .collect()
}

/// Options for [`find_ecg_events`].
#[derive(Debug, Clone, PartialEq)]
pub struct EcgEventOptions {
    /// Id given to the detected events.
    pub event_id: i32,
    /// Channel to use as ECG; `None` picks the ECG channel or synthesizes one.
    pub ch_name: Option<String>,
    /// Seconds skipped at the start of the recording.
    pub tstart: f64,
    /// Low cut-off of the QRS band, Hz.
    pub l_freq: f64,
    /// High cut-off of the QRS band, Hz.
    pub h_freq: f64,
    /// Detection threshold.
    pub qrs_threshold: QrsThreshold,
    /// Filter length in seconds.
    pub filter_length: f64,
}

impl Default for EcgEventOptions {
    fn default() -> Self {
        Self {
            event_id: ECG_EVENT_ID,
            ch_name: None,
            tstart: 0.0,
            l_freq: 5.0,
            h_freq: 35.0,
            qrs_threshold: QrsThreshold::Value(0.6),
            filter_length: 10.0,
        }
    }
}

/// Detected heartbeats.
#[derive(Debug, Clone, PartialEq)]
pub struct EcgEvents {
    /// One event per beat, on the absolute sample axis.
    pub events: Vec<Event>,
    /// Channel the beats were found on, `None` for a synthetic channel.
    pub ch_index: Option<usize>,
    /// Mean heart rate in beats per minute.
    pub average_pulse: f64,
}

///
/// Find heartbeats in `raw`.
///
/// The ECG trace is the named channel, the first good ECG channel, or, when
/// the recording has none, the mean of the good magnetometers (or
/// gradiometers).
///
pub fn find_ecg_events(raw: &Raw, opts: &EcgEventOptions) -> Result<EcgEvents> {
    let info = raw.info();
    let data = raw.data();
    let (ch_index, ecg) = match &opts.ch_name {
        Some(name) => {
            let idx = info
                .channel_index(name)
                .ok_or_else(|| Error::MissingChannel { name: name.clone() })?;
            (Some(idx), data.row(idx).to_vec())
        }
        None => {
            let ecg_picks = pick_types(
                info,
                &PickOptions {
                    ecg: true,
                    ..PickOptions::meg(MegPick::None)
                },
            );
            match ecg_picks.first() {
                Some(&idx) => (Some(idx), data.row(idx).to_vec()),
                None => {
                    let mut meg = pick_types(info, &PickOptions::meg(MegPick::Mag));
                    if meg.is_empty() {
                        meg = pick_types(info, &PickOptions::meg(MegPick::Grad));
                    }
                    if meg.is_empty() {
                        return Err(Error::invalid_arg(
                            "raw",
                            "no ECG channel and no MEG channels to synthesize one from.",
                        ));
                    }
                    info!("No ECG channel found, synthesizing one from {} MEG channels", meg.len());
                    let synthetic = data
                        .select(Axis(0), &meg)
                        .mean_axis(Axis(0))
                        .ok_or_else(|| Error::invalid_arg("raw", "no MEG channels to average."))?;
                    (None, synthetic.to_vec())
                }
            }
        }
    };

    let beats = qrs_detector(
        raw.sfreq(),
        &ecg,
        &QrsOptions {
            thresh: opts.qrs_threshold,
            l_freq: opts.l_freq,
            h_freq: opts.h_freq,
            tstart: opts.tstart,
            filter_length: opts.filter_length,
            ..QrsOptions::default()
        },
    )?;
    let events: Vec<Event> = beats
        .into_iter()
        .map(|b| Event {
            sample: b + raw.first_samp(),
            previous: 0,
            id: opts.event_id,
        })
        .collect();
    let average_pulse = events.len() as f64 * 60.0 / (raw.n_times() as f64 / raw.sfreq());
    info!(
        "Number of ECG events detected : {} (average pulse {:.1} / min.)",
        events.len(),
        average_pulse
    );
    Ok(EcgEvents {
        events,
        ch_index,
        average_pulse,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::{ChannelInfo, ChannelKind, Info};
    use ndarray::Array2;

    const SFREQ: f64 = 200.0;

    /// Narrow pulses every `period` seconds starting at `onset`, plus a slow sway.
    fn heartbeat(n: usize, onset: f64, period: f64) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64 / SFREQ;
                let phase = (t - onset).rem_euclid(period);
                let d = phase.min(period - phase);
                (-(d * d) / (2.0 * 0.01f64.powi(2))).exp()
                    + 0.05 * (2.0 * core::f64::consts::PI * 0.3 * t).sin()
            })
            .collect()
    }

    fn beats_near(found: &[usize], onset: f64, period: f64) -> bool {
        found.iter().all(|&s| {
            let t = s as f64 / SFREQ;
            let phase = (t - onset).rem_euclid(period);
            phase.min(period - phase) < 0.03
        })
    }

    #[test]
    fn detects_regular_beats() {
        let ecg = heartbeat(2000, 0.35, 0.8);
        let beats = qrs_detector(SFREQ, &ecg, &QrsOptions::default()).expect("beats");
        assert!((11..=13).contains(&beats.len()), "{} beats", beats.len());
        assert!(beats_near(&beats, 0.35, 0.8));
        assert!(beats.windows(2).all(|w| w[1] - w[0] >= 100));
    }

    #[test]
    fn automatic_threshold_finds_a_plausible_rate() {
        let ecg = heartbeat(2000, 0.35, 0.8);
        let beats = qrs_detector(
            SFREQ,
            &ecg,
            &QrsOptions {
                thresh: QrsThreshold::Auto,
                ..QrsOptions::default()
            },
        )
        .expect("beats");
        let bpm = beats.len() as f64 * 6.0;
        assert!((40.0..=160.0).contains(&bpm), "{bpm} bpm");
        assert!(beats_near(&beats, 0.35, 0.8));
    }

    #[test]
    fn tstart_skips_the_beginning() {
        let ecg = heartbeat(2000, 0.35, 0.8);
        let beats = qrs_detector(
            SFREQ,
            &ecg,
            &QrsOptions {
                tstart: 2.0,
                ..QrsOptions::default()
            },
        )
        .expect("beats");
        assert!(!beats.is_empty());
        assert!(beats.iter().all(|&b| b >= 400));
        assert!(beats_near(&beats, 0.35, 0.8));
    }

    #[test]
    fn short_signal_is_an_error() {
        let ecg = heartbeat(500, 0.35, 0.8);
        assert!(qrs_detector(SFREQ, &ecg, &QrsOptions::default()).is_err());
    }

    fn raw(with_ecg: bool) -> Raw {
        let mut chs = vec![
            ChannelInfo::new("MEG 0111", ChannelKind::Mag),
            ChannelInfo::new("MEG 0121", ChannelKind::Mag),
        ];
        if with_ecg {
            chs.push(ChannelInfo::new("ECG 063", ChannelKind::Ecg));
        }
        let n = 2000;
        let beat = heartbeat(n, 0.35, 0.8);
        let data = Array2::from_shape_fn((chs.len(), n), |(c, t)| match c {
            2 => beat[t] * 1e-3,
            _ => beat[t] * 1e-12 * (c + 1) as f64,
        });
        let info = Info::new(chs, SFREQ).expect("info");
        Raw::new(info, data, 1000).expect("raw")
    }

    #[test]
    fn events_use_the_ecg_channel_and_first_samp() {
        let found = find_ecg_events(&raw(true), &EcgEventOptions::default()).expect("events");
        assert_eq!(found.ch_index, Some(2));
        assert!(found.events.iter().all(|e| e.id == ECG_EVENT_ID && e.sample >= 1000));
        assert!((60.0..=100.0).contains(&found.average_pulse));
    }

    #[test]
    fn synthetic_channel_from_magnetometers() {
        let found = find_ecg_events(&raw(false), &EcgEventOptions::default()).expect("events");
        assert_eq!(found.ch_index, None);
        assert!(!found.events.is_empty());
    }

    #[test]
    fn named_channel_must_exist() {
        let opts = EcgEventOptions {
            ch_name: Some("ECG 999".into()),
            ..EcgEventOptions::default()
        };
        assert_eq!(
            find_ecg_events(&raw(true), &opts),
            Err(Error::MissingChannel {
                name: "ECG 999".into()
            })
        );
    }
}
