//! Deterministic synthetic MEG/EEG recording with heartbeats and blinks.

#![allow(dead_code)]

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ssp_rs::info::{ChannelInfo, ChannelKind, Info};
use ssp_rs::proj::{ProjData, ProjKind, Projection};
use ssp_rs::raw::Raw;

pub const SFREQ: f64 = 200.0;
pub const DURATION: f64 = 12.0;
pub const FIRST_SAMP: usize = 1000;
pub const BAD_CHANNEL: &str = "MEG 2443";

/// First QRS complex and beat period, seconds (75 bpm).
pub const HEART_ONSET: f64 = 0.35;
pub const HEART_PERIOD: f64 = 0.8;
/// Blink times in the first ten seconds.
pub const BLINKS: [f64; 4] = [1.0, 2.3, 3.6, 7.1];

struct Mix {
    name: &'static str,
    kind: ChannelKind,
    heart: f64,
    blink: f64,
    noise: f64,
}

const fn ch(name: &'static str, kind: ChannelKind, heart: f64, blink: f64, noise: f64) -> Mix {
    Mix {
        name,
        kind,
        heart,
        blink,
        noise,
    }
}

use ChannelKind::{Ecg, Eeg, Eog, Grad, Mag, Stim};

const CHANNELS: [Mix; 19] = [
    ch("MEG 0113", Grad, 4e-12, 1.5e-12, 2e-13),
    ch("MEG 0112", Grad, -3e-12, 1e-12, 2e-13),
    ch("MEG 0111", Mag, 2e-13, 1e-13, 2e-14),
    ch("MEG 0122", Grad, 2.5e-12, -2e-12, 2e-13),
    ch("MEG 0123", Grad, 5e-12, 0.5e-12, 2e-13),
    ch("MEG 0121", Mag, -3e-13, 0.5e-13, 2e-14),
    ch("MEG 1532", Grad, -4.5e-12, 1e-12, 2e-13),
    ch("MEG 1533", Grad, 3.5e-12, -1.5e-12, 2e-13),
    ch("MEG 1531", Mag, 6e-13, 1e-14, 2e-14),
    ch("MEG 2442", Grad, 2e-12, 2e-12, 2e-13),
    ch(BAD_CHANNEL, Grad, 3e-12, 0.0, 2e-9),
    ch("MEG 2441", Mag, 4e-13, -1e-13, 2e-14),
    ch("EEG 001", Eeg, 3e-6, 8e-6, 5e-7),
    ch("EEG 002", Eeg, -2e-6, 6e-6, 5e-7),
    ch("EEG 003", Eeg, 2.5e-6, -3e-6, 5e-7),
    ch("EEG 004", Eeg, 1.5e-6, 2e-6, 5e-7),
    ch("STI 014", Stim, 0.0, 0.0, 0.0),
    ch("EOG 061", Eog, 3e-6, 150e-6, 1.5e-6),
    ch("ECG 063", Ecg, 1e-3, 0.0, 2e-5),
];

/// Narrow QRS pulse train.
pub fn heart(t: f64) -> f64 {
    let phase = (t - HEART_ONSET).rem_euclid(HEART_PERIOD);
    let d = phase.min(HEART_PERIOD - phase);
    (-(d * d) / (2.0 * 0.01f64.powi(2))).exp()
}

/// Sum of short blink bumps.
pub fn blink(t: f64) -> f64 {
    BLINKS
        .iter()
        .map(|b| (-(t - b).powi(2) / (2.0 * 0.03f64.powi(2))).exp())
        .sum()
}

/// The recording, before any cropping.
pub fn raw() -> Raw {
    let n_times = (DURATION * SFREQ) as usize + 1;
    let mut rng = StdRng::seed_from_u64(0x5350);
    let mut data = Array2::zeros((CHANNELS.len(), n_times));
    for (c, mix) in CHANNELS.iter().enumerate() {
        for t in 0..n_times {
            let tt = t as f64 / SFREQ;
            let noise = (rng.random::<f64>() - 0.5) * 2.0 * mix.noise;
            data[[c, t]] = mix.heart * heart(tt) + mix.blink * blink(tt) + noise;
        }
    }
    let chs = CHANNELS
        .iter()
        .map(|m| ChannelInfo::new(m.name, m.kind))
        .collect();
    let mut info = Info::new(chs, SFREQ).expect("valid info");
    info.projs.push(magnetometer_proj());
    Raw::new(info, data, FIRST_SAMP).expect("valid raw")
}

/// The first ten seconds of the recording.
pub fn raw_10s() -> Raw {
    let mut raw = raw();
    raw.crop(0.0, Some(10.0)).expect("crop");
    raw
}

/// Uniform field over the magnetometers, attached to the recording.
pub fn magnetometer_proj() -> Projection {
    let mags: Vec<String> = CHANNELS
        .iter()
        .filter(|m| m.kind == Mag)
        .map(|m| m.name.to_string())
        .collect();
    let n = mags.len();
    Projection {
        desc: "PCA-v1".into(),
        kind: ProjKind::Field,
        active: false,
        data: ProjData {
            col_names: mags,
            row_names: None,
            data: Array2::from_elem((1, n), 1.0 / (n as f64).sqrt()),
        },
    }
}
