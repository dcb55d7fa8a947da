use super::{ProjData, ProjKind, Projection};
use crate::epochs::{make_fixed_length_events, Epochs, EpochsOptions, Evoked, RejectCriteria};
use crate::info::{pick_types, Info, MegPick, PickOptions};
use crate::linalg::thin_svd;
use crate::parallel::map_jobs;
use crate::raw::Raw;
use crate::{Error, Result};
use ndarray::{s, Array2, ArrayView2, Axis};
use tracing::info;

/// Event id given to the fixed-length events of [`compute_proj_raw`].
const RAW_EVENT_ID: i32 = 999;

///
/// SSP vectors from the covariance of every epoch.
///
/// The per-epoch `X Xᵀ` products run on `n_jobs` workers and are summed in
/// epoch order, so the result does not depend on `n_jobs`.
///
/// # Errors
/// Empty epochs, or more components requested than channels of a type.
///
pub fn compute_proj_epochs(
    epochs: &Epochs,
    n_grad: usize,
    n_mag: usize,
    n_eeg: usize,
    n_jobs: usize,
) -> Result<Vec<Projection>> {
    let cov = epochs_covariance(epochs, n_jobs)?;
    let prefix = format!(
        "{}-{:.3}-{:.3}",
        epochs.event_id(),
        epochs.tmin(),
        epochs.tmax()
    );
    compute_proj(cov.view(), epochs.info(), n_grad, n_mag, n_eeg, &prefix)
}

/// SSP vectors from the outer product of an averaged response.
pub fn compute_proj_evoked(
    evoked: &Evoked,
    n_grad: usize,
    n_mag: usize,
    n_eeg: usize,
) -> Result<Vec<Projection>> {
    let cov = evoked.data.dot(&evoked.data.t());
    let prefix = format!("{:.3}-{:.3}", evoked.tmin, evoked.tmax);
    compute_proj(cov.view(), &evoked.info, n_grad, n_mag, n_eeg, &prefix)
}

/// Options for [`compute_proj_raw`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawProjOptions {
    /// Start of the span in seconds.
    pub start: f64,
    /// End of the span in seconds, `None` for the end of the recording.
    pub stop: Option<f64>,
    /// Split the span in epochs of this many seconds, `None` for one block.
    pub duration: Option<f64>,
    /// Number of gradiometer components.
    pub n_grad: usize,
    /// Number of magnetometer components.
    pub n_mag: usize,
    /// Number of EEG components.
    pub n_eeg: usize,
    /// Peak-to-peak rejection applied to the fixed-length epochs.
    pub reject: Option<RejectCriteria>,
    /// Flatness rejection applied to the fixed-length epochs.
    pub flat: Option<RejectCriteria>,
    /// Worker threads for the covariance.
    pub n_jobs: usize,
}

impl Default for RawProjOptions {
    fn default() -> Self {
        Self {
            start: 0.0,
            stop: None,
            duration: Some(1.0),
            n_grad: 2,
            n_mag: 2,
            n_eeg: 0,
            reject: None,
            flat: None,
            n_jobs: 1,
        }
    }
}

///
/// SSP vectors from a span of continuous data.
///
/// With a `duration` the span is cut into fixed-length epochs that go
/// through the usual rejection; otherwise the covariance of the whole span
/// is used.
///
pub fn compute_proj_raw(raw: &Raw, opts: &RawProjOptions) -> Result<Vec<Projection>> {
    let sfreq = raw.sfreq();
    let (cov, info, start, stop) = match opts.duration {
        Some(duration) => {
            let events =
                make_fixed_length_events(raw, RAW_EVENT_ID, opts.start, opts.stop, duration)?;
            let picks = pick_types(
                raw.info(),
                &PickOptions {
                    eeg: true,
                    eog: true,
                    ecg: true,
                    ..PickOptions::default()
                },
            );
            let epochs = Epochs::new(
                raw,
                &events,
                &EpochsOptions {
                    event_id: Some(RAW_EVENT_ID),
                    tmin: 0.0,
                    tmax: duration,
                    picks: Some(picks),
                    reject: opts.reject.clone(),
                    flat: opts.flat.clone(),
                    ..EpochsOptions::default()
                },
            )?;
            let cov = epochs_covariance(&epochs, opts.n_jobs)?;
            let stop = opts.stop.unwrap_or(raw.n_times() as f64 / sfreq);
            (cov, epochs.info().clone(), opts.start, stop)
        }
        None => {
            let start = raw.time_as_index(opts.start);
            let stop = opts
                .stop
                .map_or(raw.n_times(), |t| raw.time_as_index(t))
                .min(raw.n_times());
            if stop <= start {
                return Err(Error::ConflictArg {
                    reason: format!("empty span: start sample {start}, stop sample {stop}"),
                });
            }
            let data = raw.data().slice_move(s![.., start..stop]);
            let cov = data.dot(&data.t());
            (
                cov,
                raw.info().clone(),
                start as f64 / sfreq,
                stop as f64 / sfreq,
            )
        }
    };
    let prefix = format!("Raw-{start:.3}-{stop:.3}");
    compute_proj(
        cov.view(),
        &info,
        opts.n_grad,
        opts.n_mag,
        opts.n_eeg,
        &prefix,
    )
}

fn epochs_covariance(epochs: &Epochs, n_jobs: usize) -> Result<Array2<f64>> {
    if epochs.is_empty() {
        return Err(Error::invalid_arg("epochs", "no epochs to compute a covariance from."));
    }
    let data = epochs.data();
    let nchan = data.shape()[1];
    let idx: Vec<usize> = (0..epochs.len()).collect();
    let parts = map_jobs(n_jobs, &idx, |&e| {
        let x = data.index_axis(Axis(0), e);
        x.dot(&x.t())
    });
    Ok(parts
        .into_iter()
        .fold(Array2::zeros((nchan, nchan)), |acc, c| acc + c))
}

/// Principal components of `cov` per sensor type.
pub(crate) fn compute_proj(
    cov: ArrayView2<f64>,
    info: &Info,
    n_grad: usize,
    n_mag: usize,
    n_eeg: usize,
    desc_prefix: &str,
) -> Result<Vec<Projection>> {
    let nchan = info.nchan();
    if cov.dim() != (nchan, nchan) {
        return Err(Error::invalid_arg(
            "cov",
            format!("expected a {nchan}x{nchan} matrix, got {:?}.", cov.dim()),
        ));
    }
    let names = info.ch_names();
    let groups = [
        ("planar", n_grad, PickOptions::meg(MegPick::Grad)),
        ("axial", n_mag, PickOptions::meg(MegPick::Mag)),
        ("eeg", n_eeg, PickOptions::eeg()),
    ];

    let mut projs = Vec::new();
    for (desc, n, opts) in groups {
        if n == 0 {
            continue;
        }
        let ind = pick_types(info, &opts);
        if ind.is_empty() {
            info!("No channels '{desc}' found. Skipping.");
            continue;
        }
        if n > ind.len() {
            return Err(Error::invalid_arg(
                desc,
                format!("{n} components requested but only {} channels", ind.len()),
            ));
        }
        let block = cov.select(Axis(0), &ind).select(Axis(1), &ind);
        let svd = thin_svd(block.view())?;
        let col_names: Vec<String> = ind.iter().map(|&i| names[i].clone()).collect();
        for (k, u) in svd.u.columns().into_iter().take(n).enumerate() {
            let desc = format!("{desc}-{desc_prefix}-PCA-{:02}", k + 1);
            info!("Adding projection: {desc}");
            projs.push(Projection {
                desc,
                kind: ProjKind::Field,
                active: false,
                data: ProjData {
                    col_names: col_names.clone(),
                    row_names: None,
                    data: u.to_owned().insert_axis(Axis(0)),
                },
            });
        }
    }
    Ok(projs)
}
