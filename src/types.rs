//! Core type definitions: oracles, options and callback signatures.

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, ThresholdError};
use crate::rectangle::Rectangle;

// ──────────────────────────────────────────────────────────────────────────────
// Oracles
// ──────────────────────────────────────────────────────────────────────────────

/// Value returned by an oracle for one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// Plain membership.
    Bool(bool),
    /// Robustness score; the point is a member iff the score is `>= 0`.
    Score(f64),
}

impl Verdict {
    /// Membership reading of the verdict.
    pub fn is_member(&self) -> bool {
        match *self {
            Self::Bool(b) => b,
            Self::Score(s) => s >= 0.0,
        }
    }

    /// The scalar score, with booleans mapped to `±1`.
    pub fn score(&self) -> f64 {
        match *self {
            Self::Bool(true) => 1.0,
            Self::Bool(false) => -1.0,
            Self::Score(s) => s,
        }
    }

    /// Which kind of oracle produced this verdict.
    pub fn kind(&self) -> OracleKind {
        match self {
            Self::Bool(_) => OracleKind::Boolean,
            Self::Score(_) => OracleKind::Scalar,
        }
    }
}

impl From<bool> for Verdict {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Verdict {
    fn from(s: f64) -> Self {
        Self::Score(s)
    }
}

/// Whether an oracle answers with booleans or robustness scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OracleKind {
    Boolean,
    Scalar,
}

impl fmt::Display for OracleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "boolean"),
            Self::Scalar => write!(f, "scalar"),
        }
    }
}

/// A membership (or robustness) function over points of the search box.
///
/// Oracles are assumed monotone non-decreasing in every coordinate: every
/// point dominating a member is a member. Nothing in the crate checks this;
/// a non-monotone oracle silently yields wrong classifications.
///
/// Any `Fn(&[f64]) -> bool` or `Fn(&[f64]) -> f64` closure is an oracle.
pub trait Oracle: Send + Sync {
    fn query(&self, x: &[f64]) -> Verdict;
}

impl<F, V> Oracle for F
where
    F: Fn(&[f64]) -> V + Send + Sync,
    V: Into<Verdict>,
{
    fn query(&self, x: &[f64]) -> Verdict {
        self(x).into()
    }
}

/// Shared oracle handle used by all engines.
pub type SharedOracle = Arc<dyn Oracle>;

/// Cost of a candidate rectangle; lower cost is refined first.
pub type CostFn = dyn Fn(&Rectangle) -> f64 + Send + Sync;

/// Returns `true` for a child rectangle that should not be queued.
pub type PruneFn = dyn Fn(&Rectangle) -> bool + Send + Sync;

// ──────────────────────────────────────────────────────────────────────────────
// Options
// ──────────────────────────────────────────────────────────────────────────────

/// Configuration shared by the search and refinement engines.
#[derive(Debug, Clone)]
pub struct ThresholdOptions {
    /// Diagonal searches stop once the bracket is at most this fraction of
    /// the diagonal. Must lie in [`f64::EPSILON`, 1).
    /// Default: 1e-6.
    pub tolerance: f64,

    /// Treat any rectangle whose diagonal does not cross the boundary as a
    /// fatal error during refinement.
    /// Default: false.
    pub pedantic: bool,

    /// How many times `find_boundaries` may grow the initial box before
    /// giving up.
    /// Default: 32.
    pub max_expansions: usize,

    /// Run independent diagonal searches (bounding-box edges, axis
    /// intercepts) in parallel using rayon.
    /// Results are identical to the serial path; only the order in which
    /// the oracle is called changes.
    pub parallel: bool,

    /// Smallest batch of searches worth handing to rayon. Below this the
    /// serial path is used even if `parallel` is `true`.
    /// Default: 4.
    pub min_parallel_searches: usize,

    /// Points sampled per rectangle when discretizing a rectangle set for
    /// the tolerance-driven Hausdorff estimate.
    /// Default: 3.
    pub samples_per_rect: usize,

    /// Starting edge-length tolerance for the tolerance-driven Hausdorff
    /// estimate; halved every round.
    /// Default: 0.1.
    pub initial_eps: f64,
}

impl Default for ThresholdOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            pedantic: false,
            max_expansions: 32,
            parallel: false,
            min_parallel_searches: 4,
            samples_per_rect: 3,
            initial_eps: 0.1,
        }
    }
}

impl ThresholdOptions {
    /// Reject option combinations no engine can run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance >= f64::EPSILON && self.tolerance < 1.0) {
            return Err(ThresholdError::InvalidArgs(format!(
                "tolerance must lie in [f64::EPSILON, 1), got {}",
                self.tolerance
            )));
        }
        if self.samples_per_rect == 0 {
            return Err(ThresholdError::InvalidArgs(
                "samples_per_rect must be > 0".into(),
            ));
        }
        if !(self.initial_eps > 0.0 && self.initial_eps.is_finite()) {
            return Err(ThresholdError::InvalidArgs(format!(
                "initial_eps must be positive, got {}",
                self.initial_eps
            )));
        }
        Ok(())
    }

    /// Whether a batch of `count` searches should go through rayon.
    pub(crate) fn use_parallel(&self, count: usize) -> bool {
        self.parallel && count >= self.min_parallel_searches.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = ThresholdOptions::default();
        assert_eq!(opts.tolerance, 1e-6);
        assert!(!opts.pedantic);
        assert_eq!(opts.max_expansions, 32);
        assert!(!opts.parallel);
        assert_eq!(opts.min_parallel_searches, 4);
        assert_eq!(opts.samples_per_rect, 3);
        assert_eq!(opts.initial_eps, 0.1);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_tolerance() {
        for tol in [0.0, 1.0, -0.5, f64::NAN, 1e-18] {
            let opts = ThresholdOptions {
                tolerance: tol,
                ..Default::default()
            };
            assert!(
                matches!(opts.validate(), Err(ThresholdError::InvalidArgs(_))),
                "tolerance {} should be rejected",
                tol
            );
        }
    }

    #[test]
    fn test_validate_rejects_zero_samples() {
        let opts = ThresholdOptions {
            samples_per_rect: 0,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_use_parallel_threshold() {
        let opts = ThresholdOptions {
            parallel: true,
            ..Default::default()
        };
        assert!(!opts.use_parallel(3));
        assert!(opts.use_parallel(4));
        assert!(!ThresholdOptions::default().use_parallel(100));
    }

    #[test]
    fn test_closures_are_oracles() {
        let boolean = |x: &[f64]| x[0] >= 0.5;
        let scalar = |x: &[f64]| x[0] - 0.5;
        assert_eq!(boolean.query(&[0.7]), Verdict::Bool(true));
        assert_eq!(scalar.query(&[0.25]), Verdict::Score(-0.25));
        assert!(scalar.query(&[0.5]).is_member());
        assert_eq!(boolean.query(&[0.0]).kind(), OracleKind::Boolean);
        assert_eq!(scalar.query(&[0.0]).kind(), OracleKind::Scalar);
    }

    #[test]
    fn test_verdict_score() {
        assert_eq!(Verdict::Bool(true).score(), 1.0);
        assert_eq!(Verdict::Bool(false).score(), -1.0);
        assert_eq!(Verdict::Score(0.25).score(), 0.25);
    }
}
