//! Error types for multidim-threshold.
//!
//! Every fallible operation in the crate returns [`Result`]. Classification
//! outcomes of a diagonal search are not errors; they are reported through
//! [`SearchResultType`].

use std::fmt;

use thiserror::Error;

/// Outcome of a binary search along a rectangle's diagonal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchResultType {
    /// The top corner is already false: no crossing inside the rectangle.
    TriviallyFalse,
    /// The bottom corner is already true: no crossing inside the rectangle.
    TriviallyTrue,
    /// The diagonal crosses the boundary.
    NonTrivial,
}

impl SearchResultType {
    /// Returns true if the diagonal crosses the boundary.
    pub fn is_crossing(&self) -> bool {
        matches!(self, Self::NonTrivial)
    }

    /// Returns true if monotonicity alone resolves the whole rectangle.
    pub fn is_trivial(&self) -> bool {
        !self.is_crossing()
    }
}

impl fmt::Display for SearchResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TriviallyFalse => write!(f, "trivially false"),
            Self::TriviallyTrue => write!(f, "trivially true"),
            Self::NonTrivial => write!(f, "non-trivial"),
        }
    }
}

/// Errors that can occur while learning or comparing boundaries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThresholdError {
    #[error("Invalid bounds: bottom corner exceeds top corner in dimension {dim}")]
    InvalidBounds { dim: usize },

    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Projection direction must be non-negative with at least one positive component")]
    DegenerateDirection,

    #[error("Threshold function does not intersect {rect}")]
    NoCrossing { rect: String },

    #[error("No boundary crossing found after {expansions} expansions")]
    BoundaryNotFound { expansions: usize },

    #[error("Refinement queue exhausted")]
    EmptyQueue,
}

/// Result type alias for threshold operations.
pub type Result<T> = std::result::Result<T, ThresholdError>;
