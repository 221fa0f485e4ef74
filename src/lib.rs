//! # multidim-threshold: learning monotone threshold boundaries
//!
//! Approximates, with as few oracle calls as possible, the surface where a
//! monotone black-box function flips from false to true over an
//! n-dimensional box, and bounds the Hausdorff distance between two such
//! surfaces.
//!
//! ## Overview
//!
//! An *oracle* is any `Fn(&[f64]) -> bool` (membership) or
//! `Fn(&[f64]) -> f64` (robustness score, member iff `>= 0`) that is
//! monotone non-decreasing in every coordinate. Monotonicity is what lets a
//! single binary search along a rectangle's diagonal classify whole regions:
//! everything dominating a member is a member, everything dominated by a
//! non-member is not.
//!
//! The crate provides:
//!
//! - [`learn_region::BoundarySearch`]: repeated diagonal search with
//!   cone/incomparable decomposition, yielding boundary points.
//! - [`projection`]: joint sampling of several oracles along shared rays.
//! - [`refine::GuidedRefinement`]: cost-driven refinement of a rectangle
//!   cover of the boundary, seeded with [`refine::bounding_box`].
//! - [`hausdorff`]: shrinking interval bounds on the Hausdorff distance
//!   between two oracles' boundaries.
//!
//! Every engine is a pull-based producer: call `advance` (or iterate) for
//! one more unit of work and stop whenever the result is good enough.
//!
//! ## Example
//!
//! ```
//! use multidim_threshold::learn_region::multidim_search;
//!
//! let mut search = multidim_search(&[0.0, 0.0], &[1.0, 1.0], |x: &[f64]| x[0] + x[1] >= 1.0)?;
//! let points: Vec<_> = search.by_ref().take(10).collect();
//! assert!(points.iter().all(|p| (p[0] + p[1] - 1.0).abs() < 1e-5));
//! # Ok::<(), multidim_threshold::ThresholdError>(())
//! ```

pub mod decompose;
pub mod error;
pub mod hausdorff;
pub mod learn_region;
pub mod projection;
pub mod queue;
pub mod rectangle;
pub mod refine;
pub mod search;
pub mod trace;
pub mod types;

// Re-export main types
pub use error::{Result, SearchResultType, ThresholdError};
pub use learn_region::{multidim_search, BoundarySearch};
pub use queue::CandidateQueue;
pub use rectangle::{Interval, Point, Rectangle};
pub use refine::GuidedRefinement;
pub use search::{DiagSearch, SearchResult};
pub use types::{Oracle, OracleKind, SharedOracle, ThresholdOptions, Verdict};
