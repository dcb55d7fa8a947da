use super::{ProjData, ProjKind, Projection};
use crate::info::{pick_types, Info, PickOptions};
use crate::linalg::thin_svd;
use crate::{Error, Result};
use itertools::Itertools;
use ndarray::{s, Array2, ArrayView2};
use tracing::info;

/// Singular values below this fraction of the largest are dropped.
const RANK_TOL: f64 = 1e-2;

/// Orthogonal projector `P = I - U Uᵀ` onto the complement of the
/// projection vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Projector {
    /// The `[nchan, nchan]` operator.
    pub matrix: Array2<f64>,
    /// Number of independent vectors removed.
    pub nproj: usize,
    /// Orthonormal basis of the removed subspace, `[nchan, nproj]`.
    pub basis: Array2<f64>,
}

impl Projector {
    /// Projector that leaves every channel untouched.
    pub fn identity(nchan: usize) -> Self {
        Self {
            matrix: Array2::eye(nchan),
            nproj: 0,
            basis: Array2::zeros((nchan, 0)),
        }
    }

    /// Apply the projector to `[nchan, n_times]` data.
    pub fn apply(&self, data: ArrayView2<f64>) -> Result<Array2<f64>> {
        if data.nrows() != self.matrix.ncols() {
            return Err(Error::invalid_arg(
                "data",
                format!(
                    "expected {} channels, got {}.",
                    self.matrix.ncols(),
                    data.nrows()
                ),
            ));
        }
        Ok(self.matrix.dot(&data))
    }
}

///
/// Build the projector for `projs` over `ch_names`, including active items.
///
/// See [`make_projector_with`].
///
pub fn make_projector(projs: &[Projection], ch_names: &[String], bads: &[String]) -> Result<Projector> {
    make_projector_with(projs, ch_names, bads, true)
}

///
/// Build the projector for `projs` over `ch_names`.
///
/// Each vector is restricted to the good channels present in both its
/// column names and `ch_names`, normalised, and the set is
/// re-orthogonalised with a thin SVD. Items that are already active are
/// skipped unless `include_active` is set. With nothing to project the
/// identity is returned.
///
/// ```
/// use approx::assert_abs_diff_eq;
/// use ndarray::array;
/// use ssp_rs::proj::{make_projector, ProjData, ProjKind, Projection};
///
/// let names: Vec<String> = ["A", "B"].iter().map(|s| s.to_string()).collect();
/// let proj = Projection {
///     desc: "common mode".into(),
///     kind: ProjKind::Field,
///     active: false,
///     data: ProjData {
///         col_names: names.clone(),
///         row_names: None,
///         data: array![[1.0, 1.0]],
///     },
/// };
/// let p = make_projector(&[proj], &names, &[]).unwrap();
/// assert_eq!(p.nproj, 1);
/// let y = p.matrix.dot(&array![3.0, 3.0]);
/// assert_abs_diff_eq!(y[0], 0.0, epsilon = 1e-12);
/// assert_abs_diff_eq!(y[1], 0.0, epsilon = 1e-12);
/// ```
pub fn make_projector_with(
    projs: &[Projection],
    ch_names: &[String],
    bads: &[String],
    include_active: bool,
) -> Result<Projector> {
    let nchan = ch_names.len();
    if nchan == 0 {
        return Err(Error::invalid_arg("ch_names", "No channel names specified"));
    }

    let selected: Vec<(usize, &Projection)> = projs
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.active || include_active)
        .collect();
    if selected.is_empty() {
        return Ok(Projector::identity(nchan));
    }

    let nvec: usize = selected.iter().map(|(_, p)| p.data.nrow()).sum();
    let mut vecs = Array2::<f64>::zeros((nchan, nvec));
    let mut nonzero = 0;
    let mut col = 0;
    for (k, p) in selected {
        let ProjData {
            col_names, data, ..
        } = &p.data;
        if !col_names.iter().all_unique() {
            return Err(Error::invalid_arg(
                "projs",
                format!("Channel name list in projection item {k} contains duplicate items"),
            ));
        }
        if data.ncols() != col_names.len() {
            return Err(Error::invalid_arg(
                "projs",
                format!(
                    "projection item {k} has {} columns but {} channel names",
                    data.ncols(),
                    col_names.len()
                ),
            ));
        }
        // (row in vecs, column in the item) for every usable channel
        let matched: Vec<(usize, usize)> = ch_names
            .iter()
            .enumerate()
            .filter(|(_, name)| !bads.contains(name))
            .filter_map(|(c, name)| col_names.iter().position(|n| n == name).map(|v| (c, v)))
            .collect();

        for row in data.rows() {
            for &(c, v) in &matched {
                vecs[[c, col]] = row[v];
            }
            let norm = vecs.column(col).dot(&vecs.column(col)).sqrt();
            if norm > 0.0 {
                vecs.column_mut(col).mapv_inplace(|x| x / norm);
                nonzero += 1;
            }
            col += 1;
        }
    }
    if nonzero == 0 {
        return Ok(Projector::identity(nchan));
    }

    let svd = thin_svd(vecs.view())?;
    let s0 = svd.s[0];
    let nproj = svd.s.iter().take_while(|&&s| s / s0 > RANK_TOL).count();
    let basis = svd.u.slice(s![.., ..nproj]).to_owned();
    let matrix = Array2::eye(nchan) - basis.dot(&basis.t());
    Ok(Projector {
        matrix,
        nproj,
        basis,
    })
}

/// Projector for the items attached to `info`, over its channels and bads.
pub fn make_projector_info(info: &Info) -> Result<Projector> {
    make_projector(&info.projs, &info.ch_names(), &info.bads)
}

/// Copy of `projs` with every item marked active.
pub fn activate_proj(projs: &[Projection]) -> Vec<Projection> {
    let out: Vec<Projection> = projs
        .iter()
        .cloned()
        .map(|p| Projection { active: true, ..p })
        .collect();
    info!("{} projection items activated", out.len());
    out
}

///
/// Average EEG reference as a projection over the good EEG channels.
///
/// # Errors
/// When `info` holds no good EEG channel.
///
pub fn make_eeg_average_ref_proj(info: &Info, activate: bool) -> Result<Projection> {
    let picks = pick_types(info, &PickOptions::eeg());
    if picks.is_empty() {
        return Err(Error::invalid_arg(
            "info",
            "Cannot create EEG average reference projector (no EEG data found)",
        ));
    }
    info!("Adding average EEG reference projection.");
    let n = picks.len();
    let names = info.ch_names();
    Ok(Projection {
        desc: "Average EEG reference".into(),
        kind: ProjKind::EegAverageRef,
        active: activate,
        data: ProjData {
            col_names: picks.iter().map(|&i| names[i].clone()).collect(),
            row_names: None,
            data: Array2::from_elem((1, n), 1.0 / n as f64),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::{ChannelInfo, ChannelKind};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn field(desc: &str, cols: &[&str], data: Array2<f64>) -> Projection {
        Projection {
            desc: desc.into(),
            kind: ProjKind::Field,
            active: false,
            data: ProjData {
                col_names: names(cols),
                row_names: None,
                data,
            },
        }
    }

    #[test]
    fn empty_channel_list_is_an_error() {
        assert!(make_projector(&[], &[], &[]).is_err());
    }

    #[test]
    fn no_items_gives_identity() {
        let p = make_projector(&[], &names(&["A", "B", "C"]), &[]).expect("projector");
        assert_eq!(p.nproj, 0);
        assert_eq!(p.matrix, Array2::<f64>::eye(3));
    }

    #[test]
    fn projector_is_idempotent_and_symmetric() {
        let ch = names(&["A", "B", "C", "D"]);
        let projs = vec![
            field("one", &["A", "B", "C", "D"], array![[1.0, 2.0, 0.0, -1.0]]),
            field("two", &["D", "B"], array![[1.0, 1.0]]),
        ];
        let p = make_projector(&projs, &ch, &[]).expect("projector");
        assert_eq!(p.nproj, 2);
        let pp = p.matrix.dot(&p.matrix);
        for i in 0..4 {
            for j in 0..4 {
                assert_abs_diff_eq!(pp[[i, j]], p.matrix[[i, j]], epsilon = 1e-12);
                assert_abs_diff_eq!(p.matrix[[i, j]], p.matrix[[j, i]], epsilon = 1e-12);
            }
        }
        let v = p.matrix.dot(&array![1.0, 2.0, 0.0, -1.0]);
        assert_abs_diff_eq!(v.dot(&v), 0.0, epsilon = 1e-20);
    }

    #[test]
    fn dependent_vectors_collapse() {
        let ch = names(&["A", "B", "C"]);
        let projs = vec![field("dup", &["A", "B", "C"], array![[1.0, 1.0, 0.0], [2.0, 2.0, 0.0]])];
        let p = make_projector(&projs, &ch, &[]).expect("projector");
        assert_eq!(p.nproj, 1);
        assert_eq!(p.basis.dim(), (3, 1));
    }

    #[test]
    fn bad_channels_are_left_out() {
        let ch = names(&["A", "B"]);
        let projs = vec![field("bad only", &["A"], array![[1.0]])];
        let p = make_projector(&projs, &ch, &names(&["A"])).expect("projector");
        assert_eq!(p.nproj, 0);
        assert_eq!(p.matrix, Array2::<f64>::eye(2));
    }

    #[test]
    fn active_items_can_be_skipped() {
        let ch = names(&["A", "B"]);
        let projs = activate_proj(&[field("x", &["A", "B"], array![[1.0, 0.0]])]);
        assert!(projs[0].active);
        assert_eq!(make_projector_with(&projs, &ch, &[], false).expect("p").nproj, 0);
        assert_eq!(make_projector_with(&projs, &ch, &[], true).expect("p").nproj, 1);
    }

    #[test]
    fn duplicate_column_names_are_rejected() {
        let ch = names(&["A", "B"]);
        let projs = vec![field("x", &["A", "A"], array![[1.0, 0.0]])];
        assert!(matches!(
            make_projector(&projs, &ch, &[]),
            Err(Error::InvalidArg { .. })
        ));
    }

    #[test]
    fn average_reference_removes_the_mean() {
        let mut info = Info::new(
            vec![
                ChannelInfo::new("EEG 001", ChannelKind::Eeg),
                ChannelInfo::new("EEG 002", ChannelKind::Eeg),
                ChannelInfo::new("EEG 003", ChannelKind::Eeg),
                ChannelInfo::new("MEG 0111", ChannelKind::Mag),
            ],
            100.0,
        )
        .expect("info");
        let proj = make_eeg_average_ref_proj(&info, false).expect("avg ref");
        assert_eq!(proj.kind.code(), 10);
        assert_eq!(proj.data.ncol(), 3);
        assert_abs_diff_eq!(proj.data.data[[0, 0]], 1.0 / 3.0, epsilon = 1e-15);

        info.projs.push(proj);
        let p = make_projector_info(&info).expect("projector");
        let y = p.matrix.dot(&array![1.0, 2.0, 6.0, 5.0]);
        assert_abs_diff_eq!(y[0], -2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y[1], -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y[2], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y[3], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn average_reference_needs_eeg() {
        let info = Info::new(vec![ChannelInfo::new("MEG 0111", ChannelKind::Mag)], 100.0)
            .expect("info");
        assert!(make_eeg_average_ref_proj(&info, true).is_err());
    }
}
