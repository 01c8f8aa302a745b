//! Error type for topology and decomposition failures.
use crate::topology::Axis3;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecompError {
    /// Process grid, coordinate or communicator handed to a constructor is
    /// inconsistent.
    #[error("invalid process topology: {0}")]
    InvalidTopology(String),

    /// The reduced per-rank extents do not add up to the global size. This
    /// indicates that more (or fewer) than one rank contributed per slot.
    #[error("local extents along {axis} sum to {found}, but the global size is {expected}")]
    InconsistentLocalSizes {
        axis: Axis3,
        expected: usize,
        found: usize,
    },

    /// An array or coordinate sequence disagrees with the declared global
    /// size.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Array data can only be partitioned along the first two axes.
    #[error("array data cannot be split along the third axis (process grid is {0}x{1}x{2})")]
    UnsupportedSplit(usize, usize, usize),
}

pub type Result<T> = std::result::Result<T, DecompError>;
