//! Bounding boxes, single-step refinement and the guided refinement engine.
//!
//! Unlike [`crate::learn_region`], which records individual boundary points,
//! refinement keeps a set of rectangles that together cover the boundary and
//! shrinks them step by step. Every rectangle carries an `error` so bounds
//! computed from the set stay sound after corner collapses.

use std::fmt;
use std::sync::Arc;

use log::{debug, trace};
use rayon::prelude::*;

use crate::decompose::{backward_cone, forward_cone, incomparables_between};
use crate::error::{Result, SearchResultType, ThresholdError};
use crate::queue::CandidateQueue;
use crate::rectangle::{Point, Rectangle};
use crate::search::{learn_search, DiagSearch};
use crate::trace::TraceWriter;
use crate::trace_write;
use crate::types::{CostFn, PruneFn, SharedOracle, ThresholdOptions};

// ──────────────────────────────────────────────────────────────────────────────
// Bounding box
// ──────────────────────────────────────────────────────────────────────────────

/// All `n * 2^(n-1)` one-dimensional edges of `r`.
///
/// Edges are grouped by the axis they vary along: the first `2^(n-1)` vary
/// along axis 0, the next along axis 1, and so on. Within a group, bit `j`
/// of the index puts the `j`-th remaining axis at `top` instead of `bot`.
pub fn box_edges(r: &Rectangle) -> Vec<Rectangle> {
    let n = r.dim();
    let per_axis = 1usize << (n - 1);
    let mut edges = Vec::with_capacity(n * per_axis);

    for axis in 0..n {
        for mask in 0..per_axis {
            let mut bot = Vec::with_capacity(n);
            let mut top = Vec::with_capacity(n);
            let mut bit = 0;
            for i in 0..n {
                if i == axis {
                    bot.push(r.bot()[i]);
                    top.push(r.top()[i]);
                    continue;
                }
                let v = if mask & (1 << bit) != 0 {
                    r.top()[i]
                } else {
                    r.bot()[i]
                };
                bot.push(v);
                top.push(v);
                bit += 1;
            }
            edges.push(Rectangle::from_corners(Point::new(bot), Point::new(top)));
        }
    }
    edges
}

/// Tighter enclosing box of the boundary inside `r`.
///
/// Every edge is searched; per axis the largest crossing coordinate (the top
/// of each edge's segment) becomes the new top corner, `bot` is kept. An
/// edge that never crosses contributes its own end: `r.top` if it stays
/// false, `r.bot` if it is already true.
pub fn bounding_box(r: &Rectangle, search: &DiagSearch, options: &ThresholdOptions) -> Rectangle {
    let edges = box_edges(r);
    let per_axis = edges.len() / r.dim();

    let crossing = |(k, edge): (usize, &Rectangle)| -> f64 {
        let axis = k / per_axis;
        search.search(edge).high()[axis]
    };
    let tops: Vec<f64> = if options.use_parallel(edges.len()) {
        edges.par_iter().enumerate().map(crossing).collect()
    } else {
        edges.iter().enumerate().map(crossing).collect()
    };

    let top: Point = tops
        .chunks(per_axis)
        .map(|group| group.iter().copied().fold(f64::NEG_INFINITY, f64::max))
        .collect();
    let bbox = Rectangle::from_corners(r.bot().clone(), top).with_error(r.error());

    debug!("bounding box of {} is {}", r, bbox);
    bbox
}

// ──────────────────────────────────────────────────────────────────────────────
// Single-step refinement
// ──────────────────────────────────────────────────────────────────────────────

/// Split of a rectangle with a single free axis into its two halves.
fn split_edge(rect: &Rectangle) -> Vec<Rectangle> {
    let center = rect.center();
    vec![
        backward_cone(&center, rect).with_error(rect.error()),
        forward_cone(&center, rect).with_error(rect.error()),
    ]
}

/// One refinement step on `rect`.
///
/// - a point is returned unchanged;
/// - a rectangle with a single free axis is halved without calling the
///   oracle;
/// - otherwise the diagonal is searched. A trivially false rectangle
///   collapses to its bottom corner, a trivially true one to its top corner,
///   each recording `error + |diag|`. A crossing yields the incomparable
///   regions around the crossing segment (the segment itself in 1-D).
///
/// With `pedantic`, a searched rectangle whose diagonal does not cross the
/// boundary is an error.
pub fn refine(rect: &Rectangle, search: &DiagSearch, pedantic: bool) -> Result<Vec<Rectangle>> {
    if rect.is_point() {
        return Ok(vec![rect.clone()]);
    }
    if rect.dim() > 1 && rect.free_axes().len() == 1 {
        return Ok(split_edge(rect));
    }

    let result = search.search(rect);
    if pedantic && result.kind.is_trivial() {
        return Err(ThresholdError::NoCrossing {
            rect: rect.to_string(),
        });
    }

    let collapsed = rect.error() + rect.diag_norm();
    let children = match result.kind {
        SearchResultType::TriviallyFalse => {
            vec![Rectangle::point(rect.bot().clone()).with_error(collapsed)]
        }
        SearchResultType::TriviallyTrue => {
            vec![Rectangle::point(rect.top().clone()).with_error(collapsed)]
        }
        SearchResultType::NonTrivial if rect.dim() == 1 => {
            vec![result.segment.clone().with_error(rect.error())]
        }
        SearchResultType::NonTrivial => incomparables_between(result.low(), result.high(), rect),
    };
    Ok(children)
}

/// Length of the shortest edge of `r`.
pub fn shortest_edge(r: &Rectangle) -> f64 {
    r.shortest_edge()
}

// ──────────────────────────────────────────────────────────────────────────────
// Guided refinement
// ──────────────────────────────────────────────────────────────────────────────

/// Adaptive refinement of a rectangle set, cheapest rectangle first.
///
/// The queue is seeded with the bounding box of every initial rectangle.
/// The first call to [`advance`](Self::advance) exposes that seeded queue;
/// every later call pops the lowest-cost rectangle, refines it and pushes
/// every child the prune predicate keeps.
pub struct GuidedRefinement {
    search: DiagSearch,
    queue: CandidateQueue,
    cost: Box<CostFn>,
    prune: Box<PruneFn>,
    pedantic: bool,
    started: bool,
    steps: usize,
    tracer: Option<Arc<TraceWriter>>,
}

impl GuidedRefinement {
    /// Refine `rects` against `oracle`, probing its kind at the first
    /// rectangle's bottom corner.
    pub fn new<C>(
        rects: impl IntoIterator<Item = Rectangle>,
        oracle: SharedOracle,
        cost: C,
        options: &ThresholdOptions,
    ) -> Result<Self>
    where
        C: Fn(&Rectangle) -> f64 + Send + Sync + 'static,
    {
        options.validate()?;
        let rects: Vec<Rectangle> = rects.into_iter().collect();
        let probe = rects
            .first()
            .ok_or_else(|| ThresholdError::InvalidArgs("at least one rectangle is required".into()))?
            .bot()
            .clone();
        let search = learn_search(oracle, &probe, options.tolerance);
        Self::with_search(rects, search, cost, options)
    }

    /// Refine `rects` with a pre-bound diagonal search.
    pub fn with_search<C>(
        rects: impl IntoIterator<Item = Rectangle>,
        search: DiagSearch,
        cost: C,
        options: &ThresholdOptions,
    ) -> Result<Self>
    where
        C: Fn(&Rectangle) -> f64 + Send + Sync + 'static,
    {
        options.validate()?;
        let mut queue = CandidateQueue::new();
        for rect in rects {
            let bbox = bounding_box(&rect, &search, options);
            queue.push(cost(&bbox), bbox);
        }
        debug!("guided refinement seeded with {} rectangles", queue.len());

        Ok(Self {
            search,
            queue,
            cost: Box::new(cost),
            prune: Box::new(|_: &Rectangle| false),
            pedantic: options.pedantic,
            started: false,
            steps: 0,
            tracer: None,
        })
    }

    /// Drop children for which `prune` returns `true` instead of queueing them.
    pub fn with_prune<P>(mut self, prune: P) -> Self
    where
        P: Fn(&Rectangle) -> bool + Send + Sync + 'static,
    {
        self.prune = Box::new(prune);
        self
    }

    pub fn with_tracer(mut self, tracer: Arc<TraceWriter>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Run one step and expose the queue. `Ok(None)` once the queue is empty.
    pub fn advance(&mut self) -> Result<Option<&CandidateQueue>> {
        if !self.started {
            self.started = true;
            return Ok(Some(&self.queue));
        }
        let Some((_, rect)) = self.queue.pop() else {
            return Ok(None);
        };

        let children = refine(&rect, &self.search, self.pedantic)?;
        trace!("step {}: {} -> {} children", self.steps, rect, children.len());
        trace_write!(
            self.tracer,
            "TRACE REFINE rect={} children={}",
            rect,
            children.len()
        );

        for child in children {
            if (self.prune)(&child) {
                continue;
            }
            let cost = (self.cost)(&child);
            self.queue.push(cost, child);
        }
        self.steps += 1;
        Ok(Some(&self.queue))
    }

    /// Advance until `done` accepts the queue, then return its rectangles.
    ///
    /// Fails with [`ThresholdError::EmptyQueue`] if the queue runs dry first.
    pub fn refine_until<F>(&mut self, mut done: F) -> Result<Vec<Rectangle>>
    where
        F: FnMut(&CandidateQueue) -> bool,
    {
        loop {
            match self.advance()? {
                Some(queue) if done(queue) => return Ok(queue.rectangles()),
                Some(_) => {}
                None => return Err(ThresholdError::EmptyQueue),
            }
        }
    }

    pub fn queue(&self) -> &CandidateQueue {
        &self.queue
    }

    /// Number of refinement steps taken (the initial exposure excluded).
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn search(&self) -> &DiagSearch {
        &self.search
    }
}

impl fmt::Debug for GuidedRefinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuidedRefinement")
            .field("search", &self.search)
            .field("queue", &self.queue.len())
            .field("pedantic", &self.pedantic)
            .field("steps", &self.steps)
            .finish()
    }
}

/// Largest volume first.
pub fn volume_guided_refinement(
    rects: impl IntoIterator<Item = Rectangle>,
    oracle: SharedOracle,
    options: &ThresholdOptions,
) -> Result<GuidedRefinement> {
    GuidedRefinement::new(rects, oracle, |r: &Rectangle| -r.volume(), options)
}

/// Longest shortest edge first.
pub fn edge_length_guided_refinement(
    rects: impl IntoIterator<Item = Rectangle>,
    oracle: SharedOracle,
    options: &ThresholdOptions,
) -> Result<GuidedRefinement> {
    GuidedRefinement::new(rects, oracle, |r: &Rectangle| -shortest_edge(r), options)
}
