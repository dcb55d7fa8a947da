//! Physiological artifact detection and SSP computation.

pub mod ecg;
pub mod eog;
pub mod ssp;

pub use ecg::{find_ecg_events, qrs_detector, EcgEventOptions, EcgEvents, QrsOptions, QrsThreshold};
pub use eog::{find_eog_events, EogEventOptions};
pub use ssp::{compute_proj_ecg, compute_proj_eog, ExgMode, ExgProjConfig, ExgProjKernel, ExgProjections};
