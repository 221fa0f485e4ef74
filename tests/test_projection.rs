//! Joint projection sampling of several oracles.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use multidim_threshold::projection::{
    clip_rec, generate_boundary_approxes, generate_projections, generate_random_projections,
    ProjVec,
};
use multidim_threshold::{Point, SharedOracle, ThresholdError, ThresholdOptions};

fn shifted_line(offset: f64) -> SharedOracle {
    Arc::new(move |x: &[f64]| x[0] + x[1] >= 1.0 + offset)
}

#[test]
fn test_random_projections_are_reproducible() {
    let oracles = [shifted_line(0.0), shifted_line(0.2)];
    let opts = ThresholdOptions::default();
    let run = || -> Vec<Vec<Point>> {
        generate_random_projections(
            &[0.0, 0.0],
            &[1.0, 1.0],
            &oracles,
            None,
            StdRng::seed_from_u64(42),
            &opts,
        )
        .unwrap()
        .take(12)
        .collect()
    };
    let a = run();
    assert_eq!(a, run());
    assert_eq!(a.len(), 12);
    for per_ray in &a {
        assert_eq!(per_ray.len(), 2);
    }
}

#[test]
fn test_shifted_oracles_keep_their_order() {
    // On a shared ray the stricter oracle never crosses before the looser one.
    let oracles = [shifted_line(0.0), shifted_line(0.3)];
    let projections = generate_projections(
        &[0.0, 0.0],
        &[1.0, 1.0],
        &oracles,
        None,
        &ThresholdOptions::default(),
    )
    .unwrap();
    for per_ray in projections.take(20) {
        let (loose, strict) = (&per_ray[0], &per_ray[1]);
        assert!(strict.dominates(loose), "{} vs {}", strict, loose);
    }
}

#[test]
fn test_custom_direction() {
    let oracles = [shifted_line(0.0)];
    let mut projections = generate_projections(
        &[0.0, 0.0],
        &[1.0, 1.0],
        &oracles,
        Some(&[1.0, 0.0][..]),
        &ThresholdOptions::default(),
    )
    .unwrap();
    // First ray runs along the x axis from the origin and meets x = 1.
    let first = projections.next().unwrap();
    assert!((first[0][0] - 1.0).abs() < 1e-5);
    assert_eq!(first[0][1], 0.0);
}

#[test]
fn test_degenerate_direction_rejected() {
    let oracles = [shifted_line(0.0)];
    let err = generate_projections(
        &[0.0, 0.0],
        &[1.0, 1.0],
        &oracles,
        Some(&[0.0, 0.0][..]),
        &ThresholdOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err, ThresholdError::DegenerateDirection);

    let ray = ProjVec::new(vec![0.0, 0.0], vec![-1.0, 1.0]);
    assert!(clip_rec(&ray, &[1.0, 1.0]).is_err());
}

#[test]
fn test_boundary_approxes_stay_on_boundary() {
    let oracles = [shifted_line(0.0), shifted_line(0.2)];
    let mut approx = generate_boundary_approxes(
        &[0.0, 0.0],
        &[1.0, 1.0],
        &oracles,
        None,
        &ThresholdOptions::default(),
    )
    .unwrap();

    let mut sizes = Vec::new();
    for _ in 0..7 {
        let sets = approx.advance().unwrap();
        assert_eq!(sets.len(), 2);
        sizes.push(sets[0].len());
    }
    assert!(sizes.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(sizes[6], 7);

    for p in &approx.boundaries()[0] {
        assert!((p[0] + p[1] - 1.0).abs() < 1e-5, "{}", p);
    }
    for p in &approx.boundaries()[1] {
        assert!((p[0] + p[1] - 1.2).abs() < 1e-5, "{}", p);
    }
}
