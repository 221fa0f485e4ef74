//! Benchmarks for multidim-threshold

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use multidim_threshold::hausdorff::oracle_hausdorff_bounds2;
use multidim_threshold::learn_region::multidim_search;
use multidim_threshold::refine::{bounding_box, edge_length_guided_refinement};
use multidim_threshold::search::learn_search;
use multidim_threshold::{Rectangle, SharedOracle, ThresholdOptions};

fn plane(x: &[f64]) -> bool {
    x.iter().sum::<f64>() >= 0.5 * x.len() as f64
}

fn unit(n: usize) -> Rectangle {
    Rectangle::new(vec![0.0; n], vec![1.0; n]).unwrap()
}

fn boundary_search_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("boundary_search_100_rounds");
    for n in [2usize, 3, 4] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let search = multidim_search(&vec![0.0; n], &vec![1.0; n], plane).unwrap();
                black_box(search.take(100).count())
            })
        });
    }
    group.finish();
}

fn bounding_box_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("bounding_box");
    for parallel in [false, true] {
        let opts = ThresholdOptions {
            parallel,
            ..Default::default()
        };
        let r = unit(6);
        let search = learn_search(Arc::new(plane), r.bot(), opts.tolerance);
        let label = if parallel { "parallel" } else { "serial" };
        group.bench_function(label, |b| {
            b.iter(|| black_box(bounding_box(&r, &search, &opts)))
        });
    }
    group.finish();
}

fn guided_refinement_benchmark(c: &mut Criterion) {
    let oracle: SharedOracle = Arc::new(plane);
    let opts = ThresholdOptions::default();
    c.bench_function("edge_length_refine_to_0.01", |b| {
        b.iter(|| {
            let mut g =
                edge_length_guided_refinement(vec![unit(2)], Arc::clone(&oracle), &opts).unwrap();
            let rects = g
                .refine_until(|q| q.peek_cost().map_or(true, |c| -c <= 0.01))
                .unwrap();
            black_box(rects.len())
        })
    });
}

fn hausdorff_benchmark(c: &mut Criterion) {
    let f1: SharedOracle = Arc::new(plane);
    let f2: SharedOracle = Arc::new(|x: &[f64]| x[0] + x[1] >= 1.2);
    let opts = ThresholdOptions::default();
    c.bench_function("hausdorff_bounds2_4_rounds", |b| {
        b.iter(|| {
            let bounds = oracle_hausdorff_bounds2(
                vec![unit(2)],
                vec![unit(2)],
                Arc::clone(&f1),
                Arc::clone(&f2),
                &opts,
            )
            .unwrap();
            black_box(bounds.take(4).last())
        })
    });
}

criterion_group!(
    benches,
    boundary_search_benchmark,
    bounding_box_benchmark,
    guided_refinement_benchmark,
    hausdorff_benchmark
);
criterion_main!(benches);
