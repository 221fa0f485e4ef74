//! Joint sampling of several oracle boundaries along projection rays.
//!
//! Instead of decomposing the box, rays are shot from the low faces of the
//! box towards its far faces and each oracle's crossing is located on every
//! ray. Because all oracles are searched on the same rays, their boundary
//! samples are directly comparable.

use std::collections::HashSet;
use std::sync::Arc;

use log::debug;
use rand::Rng;
use rayon::prelude::*;

use crate::error::{Result, ThresholdError};
use crate::rectangle::{Point, Rectangle};
use crate::search::{learn_search, DiagSearch};
use crate::types::{SharedOracle, ThresholdOptions};

/// A ray: `root + t * direction` for `t >= 0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProjVec {
    pub root: Point,
    pub direction: Point,
}

impl ProjVec {
    pub fn new(root: impl Into<Point>, direction: impl Into<Point>) -> Self {
        Self {
            root: root.into(),
            direction: direction.into(),
        }
    }
}

fn check_direction(direction: &[f64]) -> Result<()> {
    let valid = direction.iter().all(|&d| d >= 0.0) && direction.iter().any(|&d| d > 0.0);
    if valid {
        Ok(())
    } else {
        Err(ThresholdError::DegenerateDirection)
    }
}

/// Clip without validation: axes with a zero direction component never
/// constrain the ray and keep the root's coordinate.
fn clip_point(ray: &ProjVec, hi: &[f64]) -> Point {
    let t = ray
        .direction
        .iter()
        .zip(ray.root.iter())
        .zip(hi)
        .filter(|((d, _), _)| **d > 0.0)
        .map(|((&d, &r), &h)| (h - r) / d)
        .fold(f64::INFINITY, f64::min);
    let t = if t.is_finite() { t.max(0.0) } else { 0.0 };

    ray.root
        .iter()
        .zip(ray.direction.iter())
        .zip(hi)
        .map(|((&r, &d), &h)| if d > 0.0 { (r + t * d).min(h.max(r)) } else { r })
        .collect()
}

/// Intersect the ray with the far faces of the box below `hi`.
///
/// Returns `root + t * direction` for the largest `t >= 0` that keeps every
/// coordinate at or below `hi`. Zero direction components leave their axis
/// unconstrained; a direction with a negative component, or with no positive
/// one, is rejected.
pub fn clip_rec(ray: &ProjVec, hi: &[f64]) -> Result<Point> {
    if ray.direction.dim() != hi.len() || ray.root.dim() != hi.len() {
        return Err(ThresholdError::DimensionMismatch {
            expected: hi.len(),
            found: ray.direction.dim().min(ray.root.dim()),
        });
    }
    check_direction(&ray.direction)?;
    Ok(clip_point(ray, hi))
}

/// The segment of `ray` inside the box below `hi`, as a rectangle.
fn ray_segment(ray: &ProjVec, hi: &[f64]) -> Rectangle {
    Rectangle::from_corners(ray.root.clone(), clip_point(ray, hi))
}

/// Conservative upper corner for ray roots.
///
/// For every axis, every oracle is searched along the box edge leaving `lo`
/// in that axis direction; the smallest crossing coordinate across oracles
/// becomes the corner's coordinate on that axis.
pub fn generate_axes_intersects(
    lo: &[f64],
    hi: &[f64],
    searches: &[DiagSearch],
    options: &ThresholdOptions,
) -> Result<Point> {
    if searches.is_empty() {
        return Err(ThresholdError::InvalidArgs("at least one oracle is required".into()));
    }
    Rectangle::new(lo, hi)?;
    let n = lo.len();

    let crossing = |(axis, search): (usize, &DiagSearch)| -> f64 {
        let mut end = lo.to_vec();
        end[axis] = hi[axis];
        let edge = Rectangle::from_corners(Point::from(lo), Point::new(end));
        search.search(&edge).high()[axis]
    };

    let jobs: Vec<(usize, &DiagSearch)> = (0..n)
        .flat_map(|axis| searches.iter().map(move |s| (axis, s)))
        .collect();
    let crossings: Vec<f64> = if options.use_parallel(jobs.len()) {
        jobs.par_iter().map(|&job| crossing(job)).collect()
    } else {
        jobs.iter().map(|&job| crossing(job)).collect()
    };

    let axes_hi: Point = crossings
        .chunks(searches.len())
        .map(|per_oracle| per_oracle.iter().copied().fold(f64::INFINITY, f64::min))
        .collect();
    debug!("axis intercepts: {}", axes_hi);
    Ok(axes_hi)
}

fn project_along_axes(lo: &[f64], mid: &[f64]) -> Vec<Point> {
    (0..lo.len())
        .map(|i| {
            let mut root = lo.to_vec();
            root[i] = mid[i];
            Point::new(root)
        })
        .collect()
}

fn default_direction(lo: &[f64], hi: &[f64], direction: Option<&[f64]>) -> Result<Point> {
    let direction: Point = match direction {
        Some(d) => Point::from(d),
        None => hi.iter().zip(lo).map(|(h, l)| h - l).collect(),
    };
    if direction.dim() != lo.len() {
        return Err(ThresholdError::DimensionMismatch {
            expected: lo.len(),
            found: direction.dim(),
        });
    }
    check_direction(&direction)?;
    Ok(direction)
}

// ──────────────────────────────────────────────────────────────────────────────
// Ray generators
// ──────────────────────────────────────────────────────────────────────────────

/// Deterministic, ever-refining grid of rays.
///
/// Starts with the ray from `lo` along `direction`. Each following
/// generation takes the midpoint of every previous ray's clipped segment and
/// re-roots one ray per axis at `lo` with only that axis moved to the
/// midpoint's coordinate.
#[derive(Debug, Clone)]
pub struct ProjVecs {
    lo: Point,
    hi: Point,
    direction: Point,
    generation: Vec<ProjVec>,
    cursor: usize,
}

impl ProjVecs {
    fn next_generation(&self) -> Vec<ProjVec> {
        self.generation
            .iter()
            .flat_map(|v| {
                let mid = v.root.midpoint(&clip_point(v, &self.hi));
                project_along_axes(&self.lo, &mid)
            })
            .map(|root| ProjVec {
                root,
                direction: self.direction.clone(),
            })
            .collect()
    }
}

impl Iterator for ProjVecs {
    type Item = ProjVec;

    fn next(&mut self) -> Option<ProjVec> {
        if self.cursor == self.generation.len() {
            self.generation = self.next_generation();
            self.cursor = 0;
        }
        let v = self.generation.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(v)
    }
}

/// Grid rays between `lo` and `hi`, along `hi - lo` unless a direction is given.
pub fn generate_proj_vecs(lo: &[f64], hi: &[f64], direction: Option<&[f64]>) -> Result<ProjVecs> {
    Rectangle::new(lo, hi)?;
    let direction = default_direction(lo, hi, direction)?;
    let lo = Point::from(lo);
    Ok(ProjVecs {
        generation: vec![ProjVec {
            root: lo.clone(),
            direction: direction.clone(),
        }],
        lo,
        hi: Point::from(hi),
        direction,
        cursor: 0,
    })
}

/// Randomized rays sharing one direction.
///
/// After the ray from `lo`, every root is drawn uniformly from the slab
/// between `lo` and `hi` with one randomly chosen axis pinned to `lo`.
#[derive(Debug, Clone)]
pub struct RandomProjVecs<R> {
    lo: Point,
    hi: Point,
    direction: Point,
    rng: R,
    started: bool,
}

impl<R: Rng> RandomProjVecs<R> {
    fn random_root(&mut self) -> Point {
        let dim = self.lo.dim();
        let root_axis = self.rng.gen_range(0..dim);
        (0..dim)
            .map(|i| {
                if i == root_axis {
                    self.lo[i]
                } else {
                    self.lo[i] + (self.hi[i] - self.lo[i]) * self.rng.gen::<f64>()
                }
            })
            .collect()
    }
}

impl<R: Rng> Iterator for RandomProjVecs<R> {
    type Item = ProjVec;

    fn next(&mut self) -> Option<ProjVec> {
        let root = if self.started {
            self.random_root()
        } else {
            self.started = true;
            self.lo.clone()
        };
        Some(ProjVec {
            root,
            direction: self.direction.clone(),
        })
    }
}

/// Random rays between `lo` and `hi` drawn from `rng`.
pub fn generate_t_proj_vecs<R: Rng>(
    lo: &[f64],
    hi: &[f64],
    direction: Option<&[f64]>,
    rng: R,
) -> Result<RandomProjVecs<R>> {
    Rectangle::new(lo, hi)?;
    let direction = default_direction(lo, hi, direction)?;
    Ok(RandomProjVecs {
        lo: Point::from(lo),
        hi: Point::from(hi),
        direction,
        rng,
        started: false,
    })
}

// ──────────────────────────────────────────────────────────────────────────────
// Projections
// ──────────────────────────────────────────────────────────────────────────────

/// Per-ray crossing points, one per oracle, in oracle order.
///
/// A ray that never reaches an oracle's boundary reports its clipped end
/// point; a ray starting inside the member region reports its root.
#[derive(Debug, Clone)]
pub struct Projections<I> {
    hi: Point,
    rays: I,
    searches: Vec<DiagSearch>,
}

impl<I: Iterator<Item = ProjVec>> Projections<I> {
    /// Project along `rays` with pre-bound searches, clipping at `hi`.
    pub fn new(hi: impl Into<Point>, rays: I, searches: Vec<DiagSearch>) -> Self {
        Self {
            hi: hi.into(),
            rays,
            searches,
        }
    }

    pub fn searches(&self) -> &[DiagSearch] {
        &self.searches
    }
}

impl<I: Iterator<Item = ProjVec>> Iterator for Projections<I> {
    type Item = Vec<Point>;

    fn next(&mut self) -> Option<Vec<Point>> {
        let ray = self.rays.next()?;
        let segment = ray_segment(&ray, &self.hi);
        Some(self.searches.iter().map(|s| s.search(&segment).mid()).collect())
    }
}

fn learn_searches(lo: &[f64], oracles: &[SharedOracle], options: &ThresholdOptions) -> Vec<DiagSearch> {
    oracles
        .iter()
        .map(|f| learn_search(Arc::clone(f), lo, options.tolerance))
        .collect()
}

/// Grid-ray projections of every oracle over `[lo, hi]`.
///
/// Ray roots are confined below the axis intercepts of the oracles
/// ([`generate_axes_intersects`]); rays are clipped at `hi`.
pub fn generate_projections(
    lo: &[f64],
    hi: &[f64],
    oracles: &[SharedOracle],
    direction: Option<&[f64]>,
    options: &ThresholdOptions,
) -> Result<Projections<ProjVecs>> {
    options.validate()?;
    let searches = learn_searches(lo, oracles, options);
    let axes_hi = generate_axes_intersects(lo, hi, &searches, options)?;
    // The intercepts bound the roots; the rays themselves still run along hi - lo.
    let direction = default_direction(lo, hi, direction)?;
    let rays = generate_proj_vecs(lo, &axes_hi, Some(&direction))?;
    Ok(Projections::new(hi, rays, searches))
}

/// Random-ray projections of every oracle over `[lo, hi]`.
pub fn generate_random_projections<R: Rng>(
    lo: &[f64],
    hi: &[f64],
    oracles: &[SharedOracle],
    direction: Option<&[f64]>,
    rng: R,
    options: &ThresholdOptions,
) -> Result<Projections<RandomProjVecs<R>>> {
    options.validate()?;
    let searches = learn_searches(lo, oracles, options);
    let axes_hi = generate_axes_intersects(lo, hi, &searches, options)?;
    let direction = default_direction(lo, hi, direction)?;
    let rays = generate_t_proj_vecs(lo, &axes_hi, Some(&direction), rng)?;
    Ok(Projections::new(hi, rays, searches))
}

// ──────────────────────────────────────────────────────────────────────────────
// Boundary approximations
// ──────────────────────────────────────────────────────────────────────────────

/// Growing per-oracle sets of boundary points, one ray at a time.
#[derive(Debug, Clone)]
pub struct BoundaryApproxes<I> {
    projections: Projections<I>,
    boundaries: Vec<HashSet<Point>>,
}

impl<I: Iterator<Item = ProjVec>> BoundaryApproxes<I> {
    pub fn from_projections(projections: Projections<I>) -> Self {
        let boundaries = vec![HashSet::new(); projections.searches.len()];
        Self {
            projections,
            boundaries,
        }
    }

    /// Project one more ray and return the updated boundary sets.
    pub fn advance(&mut self) -> Option<&[HashSet<Point>]> {
        let points = self.projections.next()?;
        for (boundary, p) in self.boundaries.iter_mut().zip(points) {
            boundary.insert(p);
        }
        Some(&self.boundaries)
    }

    pub fn boundaries(&self) -> &[HashSet<Point>] {
        &self.boundaries
    }
}

/// Grid-ray boundary approximations of every oracle over `[lo, hi]`.
pub fn generate_boundary_approxes(
    lo: &[f64],
    hi: &[f64],
    oracles: &[SharedOracle],
    direction: Option<&[f64]>,
    options: &ThresholdOptions,
) -> Result<BoundaryApproxes<ProjVecs>> {
    let projections = generate_projections(lo, hi, oracles, direction, options)?;
    Ok(BoundaryApproxes::from_projections(projections))
}
