//! Verify parallel mode produces the same results as serial mode.
//!
//! Bounding-box edges and axis intercepts are independent diagonal searches;
//! with `parallel = true` they run on rayon, but results are collected in
//! edge order so every downstream step is identical.

use std::sync::Arc;

use multidim_threshold::projection::{generate_axes_intersects, generate_projections};
use multidim_threshold::refine::{bounding_box, volume_guided_refinement};
use multidim_threshold::search::{learn_search, DiagSearch};
use multidim_threshold::{Rectangle, SharedOracle, ThresholdOptions};

fn options(parallel: bool) -> ThresholdOptions {
    ThresholdOptions {
        parallel,
        min_parallel_searches: 1,
        ..Default::default()
    }
}

fn sphere_shell(x: &[f64]) -> bool {
    x.iter().map(|xi| xi * xi).sum::<f64>() >= 0.6
}

fn search_for(f: SharedOracle, lo: &[f64]) -> DiagSearch {
    learn_search(f, lo, 1e-8)
}

#[test]
fn test_bounding_box_parallel_matches_serial() {
    for n in 2..=4 {
        let r = Rectangle::new(vec![0.0; n], vec![1.0; n]).unwrap();
        let search = search_for(Arc::new(sphere_shell), r.bot());
        let serial = bounding_box(&r, &search, &options(false));
        let parallel = bounding_box(&r, &search, &options(true));
        assert_eq!(serial, parallel, "n = {}", n);
    }
}

#[test]
fn test_axes_intersects_parallel_matches_serial() {
    let oracles: Vec<SharedOracle> = vec![
        Arc::new(sphere_shell),
        Arc::new(|x: &[f64]| x[0] + 2.0 * x[1] + 0.5 * x[2] >= 1.0),
    ];
    let lo = [0.0; 3];
    let hi = [1.0; 3];
    let searches: Vec<DiagSearch> = oracles.iter().map(|f| search_for(Arc::clone(f), &lo)).collect();
    let serial = generate_axes_intersects(&lo, &hi, &searches, &options(false)).unwrap();
    let parallel = generate_axes_intersects(&lo, &hi, &searches, &options(true)).unwrap();
    assert_eq!(serial, parallel);

    let take = |parallel: bool| {
        generate_projections(&lo, &hi, &oracles, None, &options(parallel))
            .unwrap()
            .take(10)
            .collect::<Vec<_>>()
    };
    assert_eq!(take(false), take(true));
}

#[test]
fn test_guided_refinement_parallel_matches_serial() {
    let run = |parallel: bool| {
        let r = Rectangle::new(vec![0.0; 3], vec![1.0; 3]).unwrap();
        let mut g = volume_guided_refinement(vec![r], Arc::new(sphere_shell), &options(parallel))
            .unwrap();
        for _ in 0..15 {
            g.advance().unwrap();
        }
        g.queue().rectangles()
    };
    assert_eq!(run(false), run(true));
}
