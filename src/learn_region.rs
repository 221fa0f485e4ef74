//! Multi-dimensional threshold discovery by repeated diagonal binary search.
//!
//! The engine keeps a queue of rectangles that may still contain boundary
//! points, largest volume first. Each step searches the diagonal of the
//! largest rectangle, records the crossing point it finds, and queues the
//! incomparable regions around that point; the two cones are resolved by
//! monotonicity and dropped.

use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, trace};

use crate::decompose::subdivide;
use crate::error::Result;
use crate::queue::CandidateQueue;
use crate::rectangle::{Point, Rectangle};
use crate::search::{find_boundaries, learn_search, DiagSearch};
use crate::trace::TraceWriter;
use crate::types::{Oracle, SharedOracle, ThresholdOptions};
use crate::trace_write;

/// State after one refinement step, borrowed from the engine.
#[derive(Debug)]
pub struct SearchSnapshot<'a> {
    /// Every boundary point discovered so far.
    pub boundary: &'a HashSet<Point>,
    /// Rectangles still waiting to be searched.
    pub queue: &'a CandidateQueue,
    /// The point recorded by this step.
    pub latest: &'a Point,
}

/// Lazy, unbounded approximation of a single oracle's boundary.
///
/// Callers drive it with [`BoundarySearch::advance`] (or as an iterator of
/// newly discovered points) and stop after a number of rounds or once the
/// queue's volume is small enough.
#[derive(Debug)]
pub struct BoundarySearch {
    search: DiagSearch,
    queue: CandidateQueue,
    boundary: HashSet<Point>,
    latest: Option<Point>,
    initial_volume: f64,
    rounds: usize,
    tracer: Option<Arc<TraceWriter>>,
}

impl BoundarySearch {
    /// Search the box `[lo, hi]`, detecting the oracle kind at `lo`.
    pub fn new<O: Oracle + 'static>(
        lo: &[f64],
        hi: &[f64],
        oracle: O,
        options: &ThresholdOptions,
    ) -> Result<Self> {
        Self::from_shared(lo, hi, Arc::new(oracle), options)
    }

    pub fn from_shared(
        lo: &[f64],
        hi: &[f64],
        oracle: SharedOracle,
        options: &ThresholdOptions,
    ) -> Result<Self> {
        options.validate()?;
        let search = learn_search(oracle, lo, options.tolerance);
        Self::with_search(lo, hi, search, options)
    }

    /// Search the box `[lo, hi]` with a pre-bound diagonal search.
    pub fn with_search(
        lo: &[f64],
        hi: &[f64],
        search: DiagSearch,
        options: &ThresholdOptions,
    ) -> Result<Self> {
        let rect = Rectangle::new(lo, hi)?;
        let rect = find_boundaries(&rect, &search, options.max_expansions)?;

        let initial_volume = rect.volume();
        let mut queue = CandidateQueue::new();
        queue.push(-initial_volume, rect);
        debug!(
            "boundary search over {} (volume {:.6e})",
            queue.peek().map(|(_, r)| r.to_string()).unwrap_or_default(),
            initial_volume
        );

        Ok(Self {
            search,
            queue,
            boundary: HashSet::new(),
            latest: None,
            initial_volume,
            rounds: 0,
            tracer: None,
        })
    }

    /// Record step events into `tracer` (with the `trace` feature).
    pub fn with_tracer(mut self, tracer: Arc<TraceWriter>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Run one refinement step. Returns `None` once no candidates remain.
    ///
    /// `latest` is the crossing found in the popped rectangle, or its low
    /// corner when the diagonal does not cross the boundary.
    pub fn advance(&mut self) -> Option<SearchSnapshot<'_>> {
        let (_, rect) = self.queue.pop()?;
        let result = self.search.search(&rect);
        let mid = result.mid();

        let (_, _, incomparables) = subdivide(result.low(), &mid, result.high(), &rect);
        for r in incomparables {
            self.queue.push(-r.volume(), r);
        }

        trace!(
            "round {}: {} on {} -> {}",
            self.rounds,
            result.kind,
            rect,
            mid
        );
        trace_write!(
            self.tracer,
            "TRACE LEARN round={} mid={} queue={}",
            self.rounds,
            mid,
            self.queue.len()
        );

        self.boundary.insert(mid.clone());
        self.latest = Some(mid);
        self.rounds += 1;

        Some(SearchSnapshot {
            boundary: &self.boundary,
            queue: &self.queue,
            latest: self.latest.as_ref()?,
        })
    }

    pub fn boundary(&self) -> &HashSet<Point> {
        &self.boundary
    }

    pub fn queue(&self) -> &CandidateQueue {
        &self.queue
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn search(&self) -> &DiagSearch {
        &self.search
    }

    /// Fraction of the bracketed box still unclassified.
    pub fn unknown_fraction(&self) -> f64 {
        if self.initial_volume > 0.0 {
            self.queue.total_volume() / self.initial_volume
        } else {
            0.0
        }
    }
}

impl Iterator for BoundarySearch {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        self.advance().map(|s| s.latest.clone())
    }
}

/// Generator-style entry point: boundary search of `oracle` over `[lo, hi]`.
pub fn multidim_search<O: Oracle + 'static>(
    lo: &[f64],
    hi: &[f64],
    oracle: O,
) -> Result<BoundarySearch> {
    BoundarySearch::new(lo, hi, oracle, &ThresholdOptions::default())
}
