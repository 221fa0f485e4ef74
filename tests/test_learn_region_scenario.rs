//! End-to-end boundary search scenarios.
//!
//! The reference case is the unit square with the boolean oracle
//! `x + y >= 1`: every point the engine records must sit on the line, and the
//! number of oracle calls per round is fixed by the search tolerance.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use multidim_threshold::learn_region::{multidim_search, BoundarySearch};
use multidim_threshold::search::learn_search;
use multidim_threshold::{SharedOracle, ThresholdError, ThresholdOptions};

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

struct EvalCounter {
    count: AtomicUsize,
}

impl EvalCounter {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            count: AtomicUsize::new(0),
        })
    }

    fn get(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

fn counted_line(counter: &Arc<EvalCounter>) -> SharedOracle {
    let c = Arc::clone(counter);
    Arc::new(move |x: &[f64]| {
        c.count.fetch_add(1, Ordering::Relaxed);
        x[0] + x[1] >= 1.0
    })
}

fn dist_to_line(p: &[f64]) -> f64 {
    (p[0] + p[1] - 1.0).abs() / 2f64.sqrt()
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenarios
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_nearest_point_converges_to_line() {
    let mut search =
        multidim_search(&[0.0, 0.0], &[1.0, 1.0], |x: &[f64]| x[0] + x[1] >= 1.0).unwrap();

    for k in 1..=12 {
        let snapshot = search.advance().unwrap();
        let nearest = snapshot
            .boundary
            .iter()
            .min_by(|a, b| {
                let da = (a[0] - 0.5).hypot(a[1] - 0.5);
                let db = (b[0] - 0.5).hypot(b[1] - 0.5);
                da.total_cmp(&db)
            })
            .unwrap();
        assert!(
            dist_to_line(nearest) <= 0.5f64.powi(k),
            "round {}: nearest point {} too far from the line",
            k,
            nearest
        );
    }
}

#[test]
fn test_oracle_calls_per_round() {
    let counter = EvalCounter::new();
    let opts = ThresholdOptions::default();
    let mut search =
        BoundarySearch::from_shared(&[0.0, 0.0], &[1.0, 1.0], counted_line(&counter), &opts)
            .unwrap();

    // One probe to learn the oracle kind, then one full diagonal search to
    // confirm the box brackets the boundary: 2 endpoint calls + 20 halvings
    // to get below 1e-6.
    assert_eq!(counter.get(), 1 + 22);

    for k in 1..=10 {
        search.advance().unwrap();
        assert_eq!(counter.get(), 23 + 22 * k);
    }
}

#[test]
fn test_three_dimensional_plane() {
    let plane = |x: &[f64]| x[0] + x[1] + x[2] >= 1.5;
    let mut search = multidim_search(&[0.0; 3], &[1.0; 3], plane).unwrap();

    let first = search.next().unwrap();
    assert!((first[0] - 0.5).abs() < 1e-5);
    // Six incomparable regions around the first crossing.
    assert_eq!(search.queue().len(), 6);

    let points: Vec<_> = search.by_ref().take(40).collect();
    assert_eq!(points.len(), 40);
    for p in &points {
        assert!((p[0] + p[1] + p[2] - 1.5).abs() < 1e-5, "{} off the plane", p);
    }
    assert!(search.unknown_fraction() < 1.0);
}

#[test]
fn test_bootstrap_grows_box_around_boundary() {
    // The whole unit square is a member; the boundary lies below it.
    let mut search =
        multidim_search(&[0.0, 0.0], &[1.0, 1.0], |x: &[f64]| x[0] + x[1] >= -0.5).unwrap();
    let p = search.next().unwrap();
    assert!((p[0] + p[1] + 0.5).abs() < 1e-5);
}

#[test]
fn test_bootstrap_gives_up() {
    let opts = ThresholdOptions {
        max_expansions: 4,
        ..Default::default()
    };
    let err = BoundarySearch::new(&[0.0, 0.0], &[1.0, 1.0], |_: &[f64]| false, &opts).unwrap_err();
    assert_eq!(err, ThresholdError::BoundaryNotFound { expansions: 4 });
}

#[test]
fn test_prebound_search_reused() {
    let counter = EvalCounter::new();
    let search = learn_search(counted_line(&counter), &[0.0, 0.0], 1e-3);
    assert_eq!(counter.get(), 1);

    let mut engine = BoundarySearch::with_search(
        &[0.0, 0.0],
        &[1.0, 1.0],
        search,
        &ThresholdOptions::default(),
    )
    .unwrap();
    let p = engine.next().unwrap();
    // Coarser tolerance: the crossing is only located to within 1e-3 of the diagonal.
    assert!(dist_to_line(&p) < 2e-3);
}
