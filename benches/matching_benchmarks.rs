//! Matching and evaluation benchmarks using Criterion.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use evalplatform_rs::object::group_by_frame;
use evalplatform_rs::{
    evaluate_sequence, find_correspondence, DetectedObject, EvaluationConfig, EvaluationMode,
    MaskBounds, ObjectMask,
};

/// Objects on a grid, shifted by `offset` pixels. Every tenth object is left out of the shifted set.
fn create_grid(frame: usize, n: usize, offset: f64) -> Vec<DetectedObject> {
    (0..n)
        .filter(|i| offset == 0.0 || i % 10 != 0)
        .map(|i| {
            let x = (i % 50) as f64 * 40.0 + offset;
            let y = (i / 50) as f64 * 40.0 + offset;
            DetectedObject::new(frame, i as i64 + 1, x, y).with_track_id(i as i64 + 1)
        })
        .collect()
}

fn with_square_masks(objects: Vec<DetectedObject>) -> Vec<DetectedObject> {
    objects
        .into_iter()
        .map(|o| {
            let bounds = MaskBounds::new(o.position.y as usize, o.position.x as usize, 10, 10);
            let mask = ObjectMask::from_fn(bounds, |_, _| true);
            o.with_mask(mask)
        })
        .collect()
}

fn benchmark_find_correspondence(c: &mut Criterion) {
    let config = EvaluationConfig::default();
    let mut group = c.benchmark_group("find_correspondence");

    for n in [10, 100, 500] {
        let gt = create_grid(1, n, 0.0);
        let res = create_grid(1, n, 3.0);
        let gt_refs: Vec<&DetectedObject> = gt.iter().collect();
        let res_refs: Vec<&DetectedObject> = res.iter().collect();

        group.bench_with_input(BenchmarkId::new("distance", n), &n, |b, _| {
            b.iter(|| find_correspondence(black_box(&gt_refs), black_box(&res_refs), &config))
        });
    }

    let gt = with_square_masks(create_grid(1, 100, 0.0));
    let res = with_square_masks(create_grid(1, 100, 3.0));
    let gt_refs: Vec<&DetectedObject> = gt.iter().collect();
    let res_refs: Vec<&DetectedObject> = res.iter().collect();
    group.bench_function("overlap/100", |b| {
        b.iter(|| find_correspondence(black_box(&gt_refs), black_box(&res_refs), &config))
    });

    group.finish();
}

fn benchmark_evaluate_sequence(c: &mut Criterion) {
    let config = EvaluationConfig::default();
    let frames = 50;
    let gt = group_by_frame((1..=frames).flat_map(|f| create_grid(f, 100, 0.0)).collect());
    let res = group_by_frame((1..=frames).flat_map(|f| create_grid(f, 100, 2.0)).collect());

    c.bench_function("evaluate_sequence_50_frames_100_objects", |b| {
        b.iter(|| {
            evaluate_sequence(black_box(&gt), black_box(&res), &config, EvaluationMode::Full)
                .map(|report| report.segmentation.summary.f)
        })
    });
}

criterion_group!(benches, benchmark_find_correspondence, benchmark_evaluate_sequence);
criterion_main!(benches);
