//! Continuous multichannel recordings held in memory.

use crate::info::{pick_types, Info, PickOptions};
use crate::kernel::KernelLifecycle;
use crate::parallel::map_jobs;
use crate::proj::{activate_proj, make_projector_info, Projection};
use crate::signal::filter::{BandPassConfig, BandPassKernel};
use crate::signal::traits::BandPass1D;
use crate::{Error, Result};
use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use tracing::info;

/// A continuous recording: measurement info plus `[nchan, n_times]` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Raw {
    info: Info,
    data: Array2<f64>,
    first_samp: usize,
}

impl Raw {
    ///
    /// Wrap `data` recorded with `info`.
    ///
    /// `first_samp` is the absolute index of the first sample; event samples
    /// are expressed on that absolute axis.
    ///
    /// # Errors
    /// When the number of rows differs from the number of channels or there
    /// are no samples.
    ///
    pub fn new(info: Info, data: Array2<f64>, first_samp: usize) -> Result<Self> {
        if data.nrows() != info.nchan() {
            return Err(Error::invalid_arg(
                "data",
                format!(
                    "{} rows for {} channels in info.",
                    data.nrows(),
                    info.nchan()
                ),
            ));
        }
        if data.ncols() == 0 {
            return Err(Error::invalid_arg("data", "recording holds no samples."));
        }
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Ok(Self {
            info,
            data,
            first_samp,
        })
    }

    /// Measurement info.
    pub fn info(&self) -> &Info {
        &self.info
    }

    /// Mutable measurement info, e.g. to mark bad channels.
    pub fn info_mut(&mut self) -> &mut Info {
        &mut self.info
    }

    /// Samples, `[nchan, n_times]`.
    pub fn data(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Sampling rate in Hz.
    pub fn sfreq(&self) -> f64 {
        self.info.sfreq()
    }

    /// Number of samples per channel.
    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    /// Absolute index of the first sample.
    pub fn first_samp(&self) -> usize {
        self.first_samp
    }

    /// Absolute index of the last sample.
    pub fn last_samp(&self) -> usize {
        self.first_samp + self.n_times() - 1
    }

    /// Sample times in seconds relative to the first sample.
    pub fn times(&self) -> Array1<f64> {
        let sfreq = self.sfreq();
        Array1::from_shape_fn(self.n_times(), |i| i as f64 / sfreq)
    }

    /// Nearest sample index of time `t` (seconds from the first sample).
    pub fn time_as_index(&self, t: f64) -> usize {
        (t * self.sfreq()).round().max(0.0) as usize
    }

    ///
    /// Keep only the samples from `tmin` to `tmax` seconds, both included.
    ///
    /// `tmax = None` keeps everything up to the end. `first_samp` moves with
    /// the new start.
    ///
    pub fn crop(&mut self, tmin: f64, tmax: Option<f64>) -> Result<()> {
        let duration = (self.n_times() - 1) as f64 / self.sfreq();
        let tmax = tmax.unwrap_or(duration);
        if tmin < 0.0 || tmin > tmax || tmax > duration + 0.5 / self.sfreq() {
            return Err(Error::invalid_arg(
                "tmin/tmax",
                format!("need 0 <= tmin <= tmax <= {duration}, got {tmin} and {tmax}."),
            ));
        }
        let smin = self.time_as_index(tmin);
        let smax = self.time_as_index(tmax).min(self.n_times() - 1);
        self.data = self.data.slice(s![.., smin..=smax]).to_owned();
        self.first_samp += smin;
        Ok(())
    }

    ///
    /// Copy of the samples `start..stop` of the channels at `picks` (all
    /// channels when `None`).
    ///
    pub fn get_data(
        &self,
        picks: Option<&[usize]>,
        start: usize,
        stop: Option<usize>,
    ) -> Result<Array2<f64>> {
        let stop = stop.unwrap_or(self.n_times());
        if start >= stop || stop > self.n_times() {
            return Err(Error::invalid_arg(
                "start/stop",
                format!("bad span {start}..{stop} for {} samples.", self.n_times()),
            ));
        }
        let span = self.data.slice(s![.., start..stop]);
        match picks {
            None => Ok(span.to_owned()),
            Some(p) => {
                if let Some(&bad) = p.iter().find(|&&i| i >= self.info.nchan()) {
                    return Err(Error::invalid_arg("picks", format!("channel index {bad} out of range.")));
                }
                Ok(span.select(Axis(0), p))
            }
        }
    }

    /// Attach projection items, optionally dropping the current ones first.
    pub fn add_proj(&mut self, projs: &[Projection], remove_existing: bool) {
        if remove_existing {
            self.info.projs.clear();
        }
        self.info.projs.extend_from_slice(projs);
        info!("{} projection items attached", self.info.projs.len());
    }

    /// Apply the attached projections to the data and mark them active.
    pub fn apply_proj(&mut self) -> Result<()> {
        let projector = make_projector_info(&self.info)?;
        if projector.nproj > 0 {
            self.data = projector.apply(self.data.view())?;
        }
        self.info.projs = activate_proj(&self.info.projs);
        Ok(())
    }

    ///
    /// Zero-phase band-pass filter the channels at `picks` in place.
    ///
    /// `picks = None` filters the good MEG and EEG channels. Channels run on
    /// `n_jobs` workers. Nothing happens when both cut-offs are `None`.
    ///
    pub fn filter(
        &mut self,
        l_freq: Option<f64>,
        h_freq: Option<f64>,
        picks: Option<&[usize]>,
        filter_length: f64,
        n_jobs: usize,
    ) -> Result<()> {
        let kernel = BandPassKernel::try_new(BandPassConfig {
            sfreq: self.sfreq(),
            l_freq,
            h_freq,
            filter_length,
        })?;
        if kernel.is_passthrough() {
            return Ok(());
        }
        let picks = match picks {
            Some(p) => p.to_vec(),
            None => pick_types(
                &self.info,
                &PickOptions {
                    eeg: true,
                    ..PickOptions::default()
                },
            ),
        };
        if let Some(&bad) = picks.iter().find(|&&i| i >= self.info.nchan()) {
            return Err(Error::invalid_arg("picks", format!("channel index {bad} out of range.")));
        }
        info!(
            "Filtering {} channels ({:?} - {:?} Hz)",
            picks.len(),
            l_freq,
            h_freq
        );

        let data = &self.data;
        let filtered = map_jobs(n_jobs, &picks, |&ch| kernel.run_alloc(&data.row(ch)));
        for (&ch, y) in picks.iter().zip(filtered) {
            let y = y?;
            self.data.row_mut(ch).assign(&Array1::from(y));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::{ChannelInfo, ChannelKind};
    use crate::proj::{ProjData, ProjKind};
    use approx::assert_abs_diff_eq;
    use core::f64::consts::PI;
    use ndarray::array;

    fn info() -> Info {
        Info::new(
            vec![
                ChannelInfo::new("MEG 0111", ChannelKind::Mag),
                ChannelInfo::new("EEG 001", ChannelKind::Eeg),
                ChannelInfo::new("STI 014", ChannelKind::Stim),
            ],
            100.0,
        )
        .expect("info")
    }

    #[test]
    fn shape_is_checked() {
        assert!(Raw::new(info(), Array2::zeros((2, 10)), 0).is_err());
        assert!(Raw::new(info(), Array2::zeros((3, 0)), 0).is_err());
        let raw = Raw::new(info(), Array2::zeros((3, 10)), 5).expect("raw");
        assert_eq!(raw.last_samp(), 14);
        assert_abs_diff_eq!(raw.times()[9], 0.09);
    }

    #[test]
    fn crop_moves_first_samp() {
        let data = Array2::from_shape_fn((3, 1001), |(_, t)| t as f64);
        let mut raw = Raw::new(info(), data, 100).expect("raw");
        raw.crop(1.0, Some(5.0)).expect("crop");
        assert_eq!(raw.n_times(), 401);
        assert_eq!(raw.first_samp(), 200);
        assert_abs_diff_eq!(raw.data()[[0, 0]], 100.0);
        assert!(raw.crop(3.0, Some(2.0)).is_err());
        assert!(raw.crop(0.0, Some(10.0)).is_err());
    }

    #[test]
    fn get_data_picks_and_slices() {
        let data = Array2::from_shape_fn((3, 20), |(c, t)| (c * 100 + t) as f64);
        let raw = Raw::new(info(), data, 0).expect("raw");
        let sub = raw.get_data(Some(&[2, 0]), 5, Some(8)).expect("data");
        assert_eq!(sub, array![[205.0, 206.0, 207.0], [5.0, 6.0, 7.0]]);
        assert!(raw.get_data(Some(&[3]), 0, None).is_err());
        assert!(raw.get_data(None, 8, Some(8)).is_err());
    }

    #[test]
    fn apply_proj_activates_items() {
        let data = Array2::from_shape_fn((3, 20), |(c, t)| (c + 1) as f64 * t as f64);
        let mut raw = Raw::new(info(), data, 0).expect("raw");
        raw.add_proj(
            &[Projection {
                desc: "mag".into(),
                kind: ProjKind::Field,
                active: false,
                data: ProjData {
                    col_names: vec!["MEG 0111".into()],
                    row_names: None,
                    data: array![[2.0]],
                },
            }],
            true,
        );
        raw.apply_proj().expect("apply");
        assert!(raw.info().projs.iter().all(|p| p.active));
        assert_abs_diff_eq!(raw.data()[[0, 7]], 0.0);
        assert_abs_diff_eq!(raw.data()[[1, 7]], 14.0);
    }

    #[test]
    fn filter_touches_only_picked_channels() {
        let sfreq = 100.0;
        let data = Array2::from_shape_fn((3, 1000), |(_, t)| {
            let tt = t as f64 / sfreq;
            1.0 + (2.0 * PI * 10.0 * tt).sin()
        });
        let mut raw = Raw::new(info(), data.clone(), 0).expect("raw");
        raw.filter(Some(1.0), None, None, 2.0, 2).expect("filter");
        // stim left alone, DC removed from the data channels
        assert_eq!(raw.data().row(2), data.row(2));
        let mid = raw.data().slice(s![0, 300..700]).to_owned();
        assert_abs_diff_eq!(mid.mean().unwrap_or(f64::NAN), 0.0, epsilon = 1e-2);

        let before = raw.clone();
        raw.filter(None, None, None, 2.0, 1).expect("no-op");
        assert_eq!(raw, before);
        assert!(raw.filter(Some(60.0), None, None, 2.0, 1).is_err());
    }
}
