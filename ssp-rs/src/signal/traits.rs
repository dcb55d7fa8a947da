//! Trait interfaces for signal-processing capabilities.
//!
//! These traits define the trait-first API shape used by the filter kernels.

use crate::kernel::{ExecInvariantViolation, Read1D, Write1D};

/// FIR window-method design capability.
pub trait FirWinDesign<T> {
    /// Design taps into a caller-provided output buffer.
    fn run_into<O>(&self, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        O: Write1D<T> + ?Sized;

    /// Design taps and allocate output.
    fn run_alloc(&self) -> Result<Vec<T>, ExecInvariantViolation>;
}

/// 1D zero-phase band-pass capability.
pub trait BandPass1D<T> {
    /// Run filtering into a caller-provided output buffer.
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized,
        O: Write1D<T> + ?Sized;

    /// Run filtering and allocate output.
    fn run_alloc<I>(&self, input: &I) -> Result<Vec<T>, ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized;
}
