//! Blink detection on the EOG channels.

use crate::epochs::Event;
use crate::info::{pick_types, MegPick, PickOptions};
use crate::raw::Raw;
use crate::signal::filter::band_pass_filter;
use crate::signal::peak::{peak_finder, Extrema};
use crate::stats::mean;
use crate::{Error, Result};
use tracing::info;

/// Event id of detected blinks.
pub const EOG_EVENT_ID: i32 = 998;

/// Options for [`find_eog_events`].
#[derive(Debug, Clone, PartialEq)]
pub struct EogEventOptions {
    /// Id given to the detected events.
    pub event_id: i32,
    /// Low cut-off of the blink band, Hz.
    pub l_freq: f64,
    /// High cut-off of the blink band, Hz.
    pub h_freq: f64,
    /// Filter length in seconds.
    pub filter_length: f64,
    /// Channels to search; `None` uses every good EOG channel.
    pub ch_name: Option<Vec<String>>,
    /// Seconds skipped at the start of the recording.
    pub tstart: f64,
}

impl Default for EogEventOptions {
    fn default() -> Self {
        Self {
            event_id: EOG_EVENT_ID,
            l_freq: 1.0,
            h_freq: 10.0,
            filter_length: 10.0,
            ch_name: None,
            tstart: 0.0,
        }
    }
}

fn eog_channels(raw: &Raw, names: Option<&[String]>) -> Result<Vec<usize>> {
    let info = raw.info();
    let picks = match names {
        Some(names) => names
            .iter()
            .map(|name| {
                info.channel_index(name)
                    .ok_or_else(|| Error::MissingChannel { name: name.clone() })
            })
            .collect::<Result<Vec<_>>>()?,
        None => pick_types(
            info,
            &PickOptions {
                eog: true,
                ..PickOptions::meg(MegPick::None)
            },
        ),
    };
    if picks.is_empty() {
        return Err(Error::invalid_arg("raw", "No EOG channels found"));
    }
    let names: Vec<&str> = picks.iter().map(|&i| info.chs()[i].name.as_str()).collect();
    info!("Using channel(s) {names:?} as EOG");
    Ok(picks)
}

///
/// Find blinks in `raw`.
///
/// Every candidate channel is band-passed broadly and the one carrying the
/// most energy is kept. That channel is band-passed to the blink band and
/// its polarity is taken from the larger excursion around the mean; the
/// blink peaks are then located with [`peak_finder`].
///
pub fn find_eog_events(raw: &Raw, opts: &EogEventOptions) -> Result<Vec<Event>> {
    let picks = eog_channels(raw, opts.ch_name.as_deref())?;
    let sfreq = raw.sfreq();
    let data = raw.data();

    let fmax = f64::min(45.0, sfreq / 2.0 - 0.75);
    let mut best = (picks[0], f64::NEG_INFINITY);
    for &ch in &picks {
        let row = data.row(ch).to_vec();
        let broad = band_pass_filter(&row, sfreq, Some(2.0), Some(fmax), opts.filter_length)?;
        let energy = broad.iter().map(|v| v * v).sum::<f64>().sqrt();
        if energy > best.1 {
            best = (ch, energy);
        }
    }

    let row = data.row(best.0).to_vec();
    let filtered = band_pass_filter(
        &row,
        sfreq,
        Some(opts.l_freq),
        Some(opts.h_freq),
        opts.filter_length,
    )?;
    let (avg, _): (f64, usize) = mean(filtered.iter());
    let (lo, hi) = filtered
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v - avg), hi.max(v - avg))
        });
    let extrema = if hi.abs() > lo.abs() {
        Extrema::Maxima
    } else {
        Extrema::Minima
    };

    let n_start = ((sfreq * opts.tstart).max(0.0) as usize).min(filtered.len());
    let peaks = peak_finder(&filtered[n_start..], None, extrema);
    let events: Vec<Event> = peaks
        .indices
        .iter()
        .map(|&i| Event {
            sample: i + n_start + raw.first_samp(),
            previous: 0,
            id: opts.event_id,
        })
        .collect();
    info!("Number of EOG events detected : {}", events.len());
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::{ChannelInfo, ChannelKind, Info};
    use ndarray::Array2;

    const SFREQ: f64 = 200.0;
    const BLINKS: [f64; 4] = [1.0, 2.3, 3.6, 7.1];

    fn blinks(n: usize, sign: f64) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64 / SFREQ;
                let bump: f64 = BLINKS
                    .iter()
                    .map(|b| (-(t - b).powi(2) / (2.0 * 0.03f64.powi(2))).exp())
                    .sum();
                sign * 150e-6 * bump + 5e-6 * (2.0 * core::f64::consts::PI * 17.0 * t).sin()
            })
            .collect()
    }

    fn raw(sign: f64) -> Raw {
        let info = Info::new(
            vec![
                ChannelInfo::new("EOG 061", ChannelKind::Eog),
                ChannelInfo::new("EOG 062", ChannelKind::Eog),
                ChannelInfo::new("EEG 001", ChannelKind::Eeg),
            ],
            SFREQ,
        )
        .expect("info");
        let n = 2000;
        let strong = blinks(n, sign);
        let data = Array2::from_shape_fn((3, n), |(c, t)| match c {
            0 => 0.1 * strong[t],
            1 => strong[t],
            _ => 0.0,
        });
        Raw::new(info, data, 300).expect("raw")
    }

    fn near_blinks(events: &[Event], first_samp: usize) -> bool {
        events.iter().all(|e| {
            let t = (e.sample - first_samp) as f64 / SFREQ;
            BLINKS.iter().any(|b| (t - b).abs() < 0.05)
        })
    }

    #[test]
    fn finds_each_blink() {
        let events = find_eog_events(&raw(1.0), &EogEventOptions::default()).expect("events");
        assert_eq!(events.len(), BLINKS.len());
        assert!(near_blinks(&events, 300));
        assert!(events.iter().all(|e| e.id == EOG_EVENT_ID));
    }

    #[test]
    fn negative_blinks_are_found_as_minima() {
        let events = find_eog_events(&raw(-1.0), &EogEventOptions::default()).expect("events");
        assert_eq!(events.len(), BLINKS.len());
        assert!(near_blinks(&events, 300));
    }

    #[test]
    fn tstart_drops_early_blinks() {
        let opts = EogEventOptions {
            tstart: 1.9,
            ..EogEventOptions::default()
        };
        let events = find_eog_events(&raw(1.0), &opts).expect("events");
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.sample >= 300 + 380));
    }

    #[test]
    fn channel_lookup() {
        let opts = EogEventOptions {
            ch_name: Some(vec!["EOG 061".into()]),
            ..EogEventOptions::default()
        };
        assert_eq!(find_eog_events(&raw(1.0), &opts).expect("events").len(), 4);

        let opts = EogEventOptions {
            ch_name: Some(vec!["EOG 999".into()]),
            ..EogEventOptions::default()
        };
        assert!(matches!(
            find_eog_events(&raw(1.0), &opts),
            Err(Error::MissingChannel { .. })
        ));

        let info = Info::new(vec![ChannelInfo::new("EEG 001", ChannelKind::Eeg)], SFREQ)
            .expect("info");
        let no_eog = Raw::new(info, Array2::zeros((1, 2000)), 0).expect("raw");
        assert!(find_eog_events(&no_eog, &EogEventOptions::default()).is_err());
    }
}
