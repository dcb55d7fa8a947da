//! Core types shared by the `ssp-rs` crates.
//!
//! Holds the crate-wide [`Error`] type and numeric primitives that have no
//! notion of channels or recordings.

#![deny(missing_docs)]

mod error;
pub mod num_rs;

pub use error::*;
