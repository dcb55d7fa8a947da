//! Signal processing primitives: FIR filtering, windows and peak detection.

pub mod filter;
pub mod peak;
pub mod traits;
pub mod windows;
