use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use detection_fscore::decoder::{GridDecoder, GridDecoderConfig};
use detection_fscore::matching::match_detections;
use detection_fscore::metrics::calculate_iou;
use detection_fscore::nms::{select_by_nms, suppress_and_filter, Detection};
use detection_fscore::stats::RunningTally;
use detection_fscore::types::{BoundingBox, DetectionBox};
use ndarray::Array3;

const NUM_CLASSES: usize = 45;

fn staggered_box(i: usize) -> BoundingBox {
    let offset = (i % 50) as f64 * 0.015;
    BoundingBox::new(0.1 + offset, 0.1 + offset, 0.1, 0.1)
}

fn bench_iou_calculation(c: &mut Criterion) {
    let bbox1 = BoundingBox::new(0.5, 0.5, 0.2, 0.2);
    let bbox2 = BoundingBox::new(0.55, 0.55, 0.2, 0.2);

    c.bench_function("iou_single", |b| {
        b.iter(|| calculate_iou(black_box(&bbox1), black_box(&bbox2)));
    });
}

fn bench_nms(c: &mut Criterion) {
    let mut group = c.benchmark_group("nms");

    for num_boxes in [10, 50, 100, 500].iter() {
        let detections: Vec<Detection> = (0..*num_boxes)
            .map(|i| Detection {
                bbox: staggered_box(i),
                score: 0.9 - (i as f64) * 0.001,
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(num_boxes), num_boxes, |b, _| {
            b.iter(|| select_by_nms(black_box(&detections), black_box(0.45), Some(200)));
        });
    }
    group.finish();
}

fn bench_per_class_suppression(c: &mut Criterion) {
    let mut group = c.benchmark_group("suppress_and_filter");

    for num_boxes in [10, 50, 200].iter() {
        let boxes: Vec<DetectionBox> = (0..*num_boxes)
            .map(|i| {
                DetectionBox::single_class(staggered_box(i), i % NUM_CLASSES, 0.5 + (i % 7) as f64 * 0.07, NUM_CLASSES)
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(num_boxes), num_boxes, |b, _| {
            b.iter(|| suppress_and_filter(black_box(boxes.clone()), 0.2, 0.6));
        });
    }
    group.finish();
}

fn bench_grid_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_decode");
    let decoder = match GridDecoder::new(GridDecoderConfig::new(NUM_CLASSES)) {
        Ok(decoder) => decoder,
        Err(e) => panic!("invalid benchmark decoder: {e}"),
    };

    for cells in [7usize, 13].iter() {
        let channels = decoder.expected_channels();
        let raw = Array3::from_shape_fn((channels, *cells, *cells), |(c, y, x)| {
            ((c * 31 + y * 7 + x * 3) % 17) as f32 / 4.0 - 2.0
        })
        .into_dyn();

        group.bench_with_input(BenchmarkId::from_parameter(cells), cells, |b, _| {
            b.iter(|| decoder.decode(black_box(&raw)));
        });
    }
    group.finish();
}

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching");

    for num_objects in [10, 50, 100].iter() {
        let ground_truths: Vec<DetectionBox> = (0..*num_objects)
            .map(|i| DetectionBox::ground_truth(staggered_box(i), i % NUM_CLASSES, NUM_CLASSES))
            .collect();
        let predictions: Vec<DetectionBox> = (0..*num_objects)
            .map(|i| DetectionBox::single_class(staggered_box(i + 1), i % NUM_CLASSES, 0.8, NUM_CLASSES))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(num_objects), num_objects, |b, _| {
            b.iter(|| match_detections(black_box(&predictions), black_box(&ground_truths), 0.6, 0.5));
        });
    }
    group.finish();
}

fn bench_tally_fold(c: &mut Criterion) {
    let ground_truths: Vec<DetectionBox> = (0..5)
        .map(|i| DetectionBox::ground_truth(staggered_box(i * 10), i, NUM_CLASSES))
        .collect();
    let outcomes: Vec<_> = (0..1000)
        .map(|_| match_detections(&ground_truths, &ground_truths, 0.6, 0.5))
        .collect();

    c.bench_function("tally_fold_1000", |b| {
        b.iter(|| RunningTally::new().fold(black_box(&outcomes)));
    });
}

criterion_group!(
    benches,
    bench_iou_calculation,
    bench_nms,
    bench_per_class_suppression,
    bench_grid_decode,
    bench_matching,
    bench_tally_fold
);
criterion_main!(benches);
