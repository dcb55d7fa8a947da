//! Numpy-flavoured numeric routines.

mod convolve;

pub use convolve::*;
