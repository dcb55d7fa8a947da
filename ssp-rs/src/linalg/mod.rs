//! Dense linear-algebra helpers bridging ndarray and nalgebra.

mod svd;

pub use svd::*;
