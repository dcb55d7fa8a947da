//! Signal Space Projection (SSP) for MEG/EEG recordings.
//!
//! Cardiac and ocular artifacts are located on the ECG/EOG channels, the
//! data around them is epoched, and the dominant spatial components per
//! sensor type become projection vectors. [`proj::make_projector`] turns any
//! set of projections into the operator that removes them.
//!
//! ```no_run
//! use ssp_rs::preprocessing::{compute_proj_ecg, ExgProjConfig};
//! use ssp_rs::proj::{activate_proj, make_projector};
//! # fn demo(mut raw: ssp_rs::raw::Raw) -> ssp_rs::Result<()> {
//! let found = compute_proj_ecg(&mut raw, &ExgProjConfig::ecg(), None)?;
//! if let Some(projs) = found.projs {
//!     let projector = make_projector(&activate_proj(&projs), &raw.info().ch_names(), &raw.info().bads)?;
//!     println!("{} components removed", projector.nproj);
//! }
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]

pub mod kernel;
pub mod linalg;
pub mod signal;
pub mod stats;

pub mod epochs;
pub mod info;
pub mod parallel;
pub mod preprocessing;
pub mod proj;
pub mod raw;

pub use ssp_rs_core::{Error, Result};
