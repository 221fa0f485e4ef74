//! Binary searches along a rectangle's diagonal and the oracle-kind adapter.
//!
//! Every search parametrizes the diagonal as `f(t) = bot + t * (top - bot)`
//! for `t` in `[0, 1]` and relies on monotonicity: if `f(0)` is already a
//! member the whole rectangle is, and if `f(1)` is not, none of it is.
//! Otherwise the bracket `[lo, hi]` keeps `f(lo)` outside and `f(hi)` inside
//! until it is at most `tolerance` wide, or until the bracket ends are
//! adjacent floats.

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use crate::error::{Result, SearchResultType, ThresholdError};
use crate::rectangle::{Point, Rectangle};
use crate::types::{Oracle, OracleKind, SharedOracle};

/// Classification of a diagonal plus the tightened segment.
///
/// For a crossing the segment runs from the last non-member to the first
/// member found. A trivially true rectangle reports `[bot, bot]`, a trivially
/// false one `[top, top]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub kind: SearchResultType,
    pub segment: Rectangle,
}

impl SearchResult {
    fn trivially_true(rect: &Rectangle) -> Self {
        Self {
            kind: SearchResultType::TriviallyTrue,
            segment: Rectangle::point(rect.bot().clone()),
        }
    }

    fn trivially_false(rect: &Rectangle) -> Self {
        Self {
            kind: SearchResultType::TriviallyFalse,
            segment: Rectangle::point(rect.top().clone()),
        }
    }

    pub fn low(&self) -> &Point {
        self.segment.bot()
    }

    pub fn high(&self) -> &Point {
        self.segment.top()
    }

    /// Center of the crossing segment, or `low` when there is no crossing.
    pub fn mid(&self) -> Point {
        if self.kind.is_crossing() {
            self.segment.center()
        } else {
            self.low().clone()
        }
    }
}

/// Bisection along the diagonal for a boolean oracle.
pub fn binsearch(rect: &Rectangle, oracle: &dyn Oracle, tolerance: f64) -> SearchResult {
    let member = |t: f64| oracle.query(&rect.lerp(t)).is_member();

    if member(0.0) {
        return SearchResult::trivially_true(rect);
    }
    if !member(1.0) {
        return SearchResult::trivially_false(rect);
    }

    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    while hi - lo > tolerance {
        let mid = lo + (hi - lo) / 2.0;
        if mid <= lo || mid >= hi {
            break;
        }
        if member(mid) {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    SearchResult {
        kind: SearchResultType::NonTrivial,
        segment: Rectangle::from_corners(rect.lerp(lo), rect.lerp(hi)),
    }
}

/// Regula falsi along the diagonal for a scalar (robustness) oracle.
///
/// The next probe interpolates the scores at the bracket ends, clamped to the
/// middle half of the bracket so each probe removes at least a quarter of it.
pub fn weighted_binsearch(rect: &Rectangle, oracle: &dyn Oracle, tolerance: f64) -> SearchResult {
    let score = |t: f64| oracle.query(&rect.lerp(t)).score();

    let mut f_lo = score(0.0);
    if f_lo >= 0.0 {
        return SearchResult::trivially_true(rect);
    }
    let mut f_hi = score(1.0);
    if !(f_hi >= 0.0) {
        return SearchResult::trivially_false(rect);
    }

    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    while hi - lo > tolerance {
        let frac = -f_lo / (f_hi - f_lo);
        let frac = if frac.is_finite() {
            frac.clamp(0.25, 0.75)
        } else {
            0.5
        };
        let mid = lo + (hi - lo) * frac;
        if mid <= lo || mid >= hi {
            break;
        }
        let f_mid = score(mid);
        if f_mid >= 0.0 {
            hi = mid;
            f_hi = f_mid;
        } else {
            lo = mid;
            f_lo = f_mid;
        }
    }

    SearchResult {
        kind: SearchResultType::NonTrivial,
        segment: Rectangle::from_corners(rect.lerp(lo), rect.lerp(hi)),
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Diagonal search adapter
// ──────────────────────────────────────────────────────────────────────────────

/// An oracle bound to the diagonal search matching its kind.
#[derive(Clone)]
pub struct DiagSearch {
    oracle: SharedOracle,
    kind: OracleKind,
    tolerance: f64,
}

impl DiagSearch {
    /// Detect the oracle kind with a single call at `probe`.
    pub fn learn(oracle: SharedOracle, probe: &[f64], tolerance: f64) -> Self {
        let kind = oracle.query(probe).kind();
        debug!("learned {} oracle from probe {:?}", kind, probe);
        Self::with_kind(oracle, kind, tolerance)
    }

    /// Bind without probing.
    pub fn with_kind(oracle: SharedOracle, kind: OracleKind, tolerance: f64) -> Self {
        Self {
            oracle,
            kind,
            tolerance,
        }
    }

    pub fn kind(&self) -> OracleKind {
        self.kind
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn oracle(&self) -> &SharedOracle {
        &self.oracle
    }

    pub fn search(&self, rect: &Rectangle) -> SearchResult {
        match self.kind {
            OracleKind::Boolean => binsearch(rect, self.oracle.as_ref(), self.tolerance),
            OracleKind::Scalar => weighted_binsearch(rect, self.oracle.as_ref(), self.tolerance),
        }
    }
}

impl fmt::Debug for DiagSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagSearch")
            .field("kind", &self.kind)
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

/// Adapter for `oracle`, probing it at the low corner of the search box.
pub fn learn_search(oracle: SharedOracle, lo: &[f64], tolerance: f64) -> DiagSearch {
    DiagSearch::learn(oracle, lo, tolerance)
}

/// Convenience wrapper for callers holding a concrete oracle.
pub fn learn_search_for<O: Oracle + 'static>(oracle: O, lo: &[f64], tolerance: f64) -> DiagSearch {
    learn_search(Arc::new(oracle), lo, tolerance)
}

// ──────────────────────────────────────────────────────────────────────────────
// Bootstrap
// ──────────────────────────────────────────────────────────────────────────────

/// Grow `rect` until its diagonal crosses the boundary.
///
/// A trivially true box moves its bottom corner down by one diagonal, a
/// trivially false box moves its top corner up. Axes of zero extent grow by
/// the longest edge (or 1 for a point). Fails after `max_expansions` growths.
pub fn find_boundaries(
    rect: &Rectangle,
    search: &DiagSearch,
    max_expansions: usize,
) -> Result<Rectangle> {
    let mut rect = rect.clone();
    for expansion in 0..=max_expansions {
        let result = search.search(&rect);
        if result.kind.is_crossing() {
            if expansion > 0 {
                debug!("boundary bracketed after {} expansions: {}", expansion, rect);
            }
            return Ok(rect);
        }
        if expansion == max_expansions {
            break;
        }

        let longest = rect.longest_edge();
        let fallback = if longest > 0.0 { longest } else { 1.0 };
        let step: Vec<f64> = rect
            .diag()
            .into_iter()
            .map(|d| if d > 0.0 { d } else { fallback })
            .collect();

        let (bot, top): (Point, Point) = match result.kind {
            SearchResultType::TriviallyTrue => (
                rect.bot().iter().zip(&step).map(|(b, s)| b - s).collect(),
                rect.top().clone(),
            ),
            _ => (
                rect.bot().clone(),
                rect.top().iter().zip(&step).map(|(t, s)| t + s).collect(),
            ),
        };
        warn!(
            "search box is {}, expanding to [{}, {}]",
            result.kind, bot, top
        );
        rect = Rectangle::from_corners(bot, top);
    }
    Err(ThresholdError::BoundaryNotFound {
        expansions: max_expansions,
    })
}
