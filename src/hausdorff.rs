//! Hausdorff distance bounds between two learned boundaries.
//!
//! Two estimators build on the refinement machinery:
//!
//! - [`HausdorffApproxes`] refines only the rectangles that witness the
//!   current bound, and also feeds their corners back in as point
//!   rectangles. Cheap, but the interval is a heuristic bound: it assumes
//!   every rectangle still holds a piece of its boundary.
//! - [`OracleHausdorffBounds2`] drives two edge-length-guided engines to a
//!   shared tolerance that halves every round, and pads the distance of the
//!   sampled rectangles with each side's recorded error.
//!
//! Both are unbounded; callers pull as many rounds as they can afford.

use std::collections::HashSet;
use std::sync::Arc;

use log::debug;

use crate::error::{Result, ThresholdError};
use crate::queue::CandidateQueue;
use crate::rectangle::{Interval, Point, Rectangle};
use crate::refine::{bounding_box, edge_length_guided_refinement, refine, GuidedRefinement};
use crate::search::{learn_search, DiagSearch};
use crate::trace::TraceWriter;
use crate::trace_write;
use crate::types::{SharedOracle, ThresholdOptions};

// ──────────────────────────────────────────────────────────────────────────────
// Metrics
// ──────────────────────────────────────────────────────────────────────────────

fn directed_hausdorff(xs: &[Point], ys: &[Point]) -> f64 {
    xs.iter()
        .map(|x| ys.iter().map(|y| x.dist(y)).fold(f64::INFINITY, f64::min))
        .fold(0.0, f64::max)
}

/// Euclidean Hausdorff distance between two finite point clouds.
///
/// Zero for two empty clouds, infinite when exactly one is empty.
pub fn pointwise_hausdorff(xs: &[Point], ys: &[Point]) -> f64 {
    match (xs.is_empty(), ys.is_empty()) {
        (true, true) => 0.0,
        (true, false) | (false, true) => f64::INFINITY,
        _ => directed_hausdorff(xs, ys).max(directed_hausdorff(ys, xs)),
    }
}

/// Distance range from each rectangle of `xs` to its nearest rectangle of `ys`.
fn nearest_ranges(xs: &[Rectangle], ys: &[Rectangle]) -> Vec<(f64, f64)> {
    xs.iter()
        .map(|a| {
            ys.iter().fold((f64::INFINITY, f64::INFINITY), |(lo, hi), b| {
                (lo.min(a.min_dist(b)), hi.min(a.max_dist(b)))
            })
        })
        .collect()
}

/// Flags the rectangles of `xs` that can realize the bound, plus the
/// rectangles of `ys` close enough to them to matter.
fn mark_witnesses(
    xs: &[Rectangle],
    ys: &[Rectangle],
    ranges: &[(f64, f64)],
    lower: f64,
    marks_x: &mut [bool],
    marks_y: &mut [bool],
) {
    for (i, (a, &(_, hi))) in xs.iter().zip(ranges).enumerate() {
        if hi < lower {
            continue;
        }
        marks_x[i] = true;
        for (j, b) in ys.iter().enumerate() {
            if a.min_dist(b) <= hi {
                marks_y[j] = true;
            }
        }
    }
}

fn select(rects: &[Rectangle], marks: &[bool]) -> Vec<Rectangle> {
    rects
        .iter()
        .zip(marks)
        .filter(|(_, m)| **m)
        .map(|(r, _)| r.clone())
        .collect()
}

/// Bounds on the Hausdorff distance between the boundaries covered by two
/// rectangle sets, assuming every rectangle holds a piece of its boundary.
///
/// Returns the interval and the witness rectangles of each set: those whose
/// refinement can still move either end of the interval.
pub fn hausdorff_bounds(
    recs1: &[Rectangle],
    recs2: &[Rectangle],
) -> (Interval, (Vec<Rectangle>, Vec<Rectangle>)) {
    match (recs1.is_empty(), recs2.is_empty()) {
        (true, true) => return (Interval::from_ordered(0.0, 0.0), (Vec::new(), Vec::new())),
        (true, false) | (false, true) => {
            let inf = Interval::from_ordered(f64::INFINITY, f64::INFINITY);
            return (inf, (recs1.to_vec(), recs2.to_vec()));
        }
        _ => {}
    }

    let r12 = nearest_ranges(recs1, recs2);
    let r21 = nearest_ranges(recs2, recs1);
    let max_of = |ranges: &[(f64, f64)], pick: fn(&(f64, f64)) -> f64| {
        ranges.iter().map(pick).fold(0.0, f64::max)
    };
    let lower = max_of(&r12, |r| r.0).max(max_of(&r21, |r| r.0));
    let upper = max_of(&r12, |r| r.1).max(max_of(&r21, |r| r.1));

    let mut marks1 = vec![false; recs1.len()];
    let mut marks2 = vec![false; recs2.len()];
    mark_witnesses(recs1, recs2, &r12, lower, &mut marks1, &mut marks2);
    mark_witnesses(recs2, recs1, &r21, lower, &mut marks2, &mut marks1);

    (
        Interval::from_ordered(lower, upper),
        (select(recs1, &marks1), select(recs2, &marks2)),
    )
}

// ──────────────────────────────────────────────────────────────────────────────
// Witness-driven estimator
// ──────────────────────────────────────────────────────────────────────────────

/// Refine every witness one step, then add the witnesses' corners as points.
fn refine_witnesses(witnesses: &[Rectangle], search: &DiagSearch) -> Result<Vec<Rectangle>> {
    let mut seen = HashSet::new();
    let mut next = Vec::new();
    for w in witnesses {
        for child in refine(w, search, false)? {
            if seen.insert(child.clone()) {
                next.push(child);
            }
        }
    }
    for w in witnesses {
        let error = w.error() + w.diag_norm();
        for corner in [w.bot(), w.top()] {
            let p = Rectangle::point(corner.clone()).with_error(error);
            if seen.insert(p.clone()) {
                next.push(p);
            }
        }
    }
    Ok(next)
}

/// Witness-driven Hausdorff bounds between two oracles' boundaries.
#[derive(Debug)]
pub struct HausdorffApproxes {
    search1: DiagSearch,
    search2: DiagSearch,
    recs1: Vec<Rectangle>,
    recs2: Vec<Rectangle>,
    rounds: usize,
    tracer: Option<Arc<TraceWriter>>,
}

impl HausdorffApproxes {
    /// Start from the bounding boxes of `r1` under the first search and
    /// `r2` under the second.
    pub fn new(
        r1: &Rectangle,
        r2: &Rectangle,
        search1: DiagSearch,
        search2: DiagSearch,
        options: &ThresholdOptions,
    ) -> Result<Self> {
        options.validate()?;
        if r1.dim() != r2.dim() {
            return Err(ThresholdError::DimensionMismatch {
                expected: r1.dim(),
                found: r2.dim(),
            });
        }
        let recs1 = vec![bounding_box(r1, &search1, options)];
        let recs2 = vec![bounding_box(r2, &search2, options)];
        Ok(Self {
            search1,
            search2,
            recs1,
            recs2,
            rounds: 0,
            tracer: None,
        })
    }

    pub fn with_tracer(mut self, tracer: Arc<TraceWriter>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Bound the current sets, then refine their witnesses for the next round.
    pub fn advance(&mut self) -> Result<Interval> {
        let (bounds, (w1, w2)) = hausdorff_bounds(&self.recs1, &self.recs2);
        debug!(
            "hausdorff round {}: {} ({} + {} witnesses)",
            self.rounds,
            bounds,
            w1.len(),
            w2.len()
        );
        trace_write!(
            self.tracer,
            "TRACE HAUSDORFF round={} lo={} hi={}",
            self.rounds,
            bounds.lo(),
            bounds.hi()
        );

        self.recs1 = refine_witnesses(&w1, &self.search1)?;
        self.recs2 = refine_witnesses(&w2, &self.search2)?;
        self.rounds += 1;
        Ok(bounds)
    }

    /// Rectangle sets the next round will bound.
    pub fn rectangles(&self) -> (&[Rectangle], &[Rectangle]) {
        (&self.recs1, &self.recs2)
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }
}

impl Iterator for HausdorffApproxes {
    type Item = Result<Interval>;

    fn next(&mut self) -> Option<Result<Interval>> {
        Some(self.advance())
    }
}

/// Witness-driven bounds for `f1` and `f2` over the same box `r`.
pub fn oracle_hausdorff_bounds(
    r: &Rectangle,
    f1: SharedOracle,
    f2: SharedOracle,
    options: &ThresholdOptions,
) -> Result<HausdorffApproxes> {
    let search1 = learn_search(f1, r.bot(), options.tolerance);
    let search2 = learn_search(f2, r.bot(), options.tolerance);
    HausdorffApproxes::new(r, r, search1, search2, options)
}

// ──────────────────────────────────────────────────────────────────────────────
// Tolerance-driven estimator
// ──────────────────────────────────────────────────────────────────────────────

/// Largest `error + diagonal` over a rectangle set: how far any sample of a
/// rectangle may sit from the boundary piece it holds.
fn set_error(recs: &[Rectangle]) -> f64 {
    recs.iter()
        .map(|r| r.error() + r.diag_norm())
        .fold(0.0, f64::max)
}

fn sample(recs: &[Rectangle], k: usize) -> Vec<Point> {
    recs.iter().flat_map(|r| r.discretize(k)).collect()
}

/// Tolerance-driven Hausdorff bounds.
///
/// Round 0 bounds the input sets as given. Every later round first refines
/// both sides until no queued rectangle has a shortest edge above `eps`,
/// then halves `eps`. Each round yields `[max(d - e, 0), d + e]` where `d`
/// is the distance between the sampled sets and `e` the sum, over both
/// sides, of the largest `error + |diag|` of any rectangle.
#[derive(Debug)]
pub struct OracleHausdorffBounds2 {
    engine1: GuidedRefinement,
    engine2: GuidedRefinement,
    recs1: Vec<Rectangle>,
    recs2: Vec<Rectangle>,
    eps: f64,
    samples_per_rect: usize,
    rounds: usize,
    tracer: Option<Arc<TraceWriter>>,
}

impl OracleHausdorffBounds2 {
    pub fn with_tracer(mut self, tracer: Arc<TraceWriter>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    pub fn advance(&mut self) -> Result<Interval> {
        if self.rounds > 0 {
            let eps = self.eps;
            let done = |q: &CandidateQueue| q.peek_cost().map_or(true, |c| -c <= eps);
            let recs1 = self.engine1.refine_until(done)?;
            let recs2 = self.engine2.refine_until(done)?;
            self.recs1 = recs1;
            self.recs2 = recs2;
            self.eps /= 2.0;
        }

        let xs = sample(&self.recs1, self.samples_per_rect);
        let ys = sample(&self.recs2, self.samples_per_rect);
        let d = pointwise_hausdorff(&xs, &ys);
        let error = set_error(&self.recs1) + set_error(&self.recs2);
        let bounds = Interval::from_ordered((d - error).max(0.0), d + error);

        debug!(
            "hausdorff round {}: d = {:.6e}, error = {:.6e}, {} / {} rectangles",
            self.rounds,
            d,
            error,
            self.recs1.len(),
            self.recs2.len()
        );
        trace_write!(
            self.tracer,
            "TRACE HAUSDORFF round={} lo={} hi={}",
            self.rounds,
            bounds.lo(),
            bounds.hi()
        );
        self.rounds += 1;
        Ok(bounds)
    }

    /// Tolerance the next refining round will drive both sides to.
    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn rectangles(&self) -> (&[Rectangle], &[Rectangle]) {
        (&self.recs1, &self.recs2)
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }
}

impl Iterator for OracleHausdorffBounds2 {
    type Item = Result<Interval>;

    fn next(&mut self) -> Option<Result<Interval>> {
        Some(self.advance())
    }
}

/// Tolerance-driven bounds between `f1` on `recs1` and `f2` on `recs2`,
/// starting at `options.initial_eps`.
pub fn oracle_hausdorff_bounds2(
    recs1: Vec<Rectangle>,
    recs2: Vec<Rectangle>,
    f1: SharedOracle,
    f2: SharedOracle,
    options: &ThresholdOptions,
) -> Result<OracleHausdorffBounds2> {
    options.validate()?;
    let engine1 = edge_length_guided_refinement(recs1.clone(), f1, options)?;
    let engine2 = edge_length_guided_refinement(recs2.clone(), f2, options)?;
    Ok(OracleHausdorffBounds2 {
        engine1,
        engine2,
        recs1,
        recs2,
        eps: options.initial_eps,
        samples_per_rect: options.samples_per_rect,
        rounds: 0,
        tracer: None,
    })
}
