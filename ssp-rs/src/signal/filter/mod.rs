//! Window-method FIR design and zero-phase application.

mod design;
mod ext;
mod fir;
mod kernels;

pub use design::*;
pub use fir::*;
pub use kernels::*;
