//! Projection items and the projector operators built from them.

mod compute;
mod projector;

pub use compute::*;
pub use projector::*;

use ndarray::Array2;

/// Kind of a projection item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjKind {
    /// Field vectors, e.g. SSP components.
    Field,
    /// Average EEG reference.
    EegAverageRef,
}

impl ProjKind {
    /// Numeric code of the kind as stored in measurement files.
    pub fn code(self) -> i32 {
        match self {
            ProjKind::Field => 1,
            ProjKind::EegAverageRef => 10,
        }
    }
}

/// Vectors of a projection item over named channels.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjData {
    /// Channel names, one per column of `data`.
    pub col_names: Vec<String>,
    /// Optional row labels.
    pub row_names: Option<Vec<String>>,
    /// Vectors, shape `[nrow, ncol]`.
    pub data: Array2<f64>,
}

impl ProjData {
    /// Number of vectors.
    pub fn nrow(&self) -> usize {
        self.data.nrows()
    }

    /// Number of channels.
    pub fn ncol(&self) -> usize {
        self.data.ncols()
    }
}

/// A named set of vectors to project out of the data.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Human readable description, e.g. `ECG-planar-999--0.200-0.400-PCA-01`.
    pub desc: String,
    /// Item kind.
    pub kind: ProjKind,
    /// Whether the item has been applied to the data.
    pub active: bool,
    /// The vectors.
    pub data: ProjData,
}
