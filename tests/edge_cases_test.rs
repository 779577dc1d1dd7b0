//! Comprehensive edge case and boundary condition tests.

mod common;

use common::{evaluator, ssd_raw, ScratchDir};
use detection_fscore::dataset::{discover_images, label_path_for};
use detection_fscore::decoder::{DefaultBox, DefaultBoxDecoder, DefaultBoxDecoderConfig, GridDecoder, GridDecoderConfig};
use detection_fscore::evaluator::EvaluationConfig;
use detection_fscore::loader::parse_labels;
use detection_fscore::metrics::iou::calculate_iou;
use detection_fscore::nms::{select_by_nms, suppress_and_filter, Detection};
use detection_fscore::{match_detections, BoundingBox, DetectionBox};
use ndarray::{Array2, Array3, Axis};
use std::path::Path;

fn gt(x: f64, y: f64, w: f64, h: f64, class_id: usize) -> DetectionBox {
    DetectionBox::ground_truth(BoundingBox::new(x, y, w, h), class_id, 2)
}

fn pred(x: f64, y: f64, w: f64, h: f64, class_id: usize, score: f64) -> DetectionBox {
    DetectionBox::single_class(BoundingBox::new(x, y, w, h), class_id, score, 2)
}

// ============================================================================
// GEOMETRY EDGE CASES
// ============================================================================

#[test]
fn test_touching_boxes_have_zero_iou() {
    let a = BoundingBox::new(0.25, 0.5, 0.5, 0.5);
    let b = BoundingBox::new(0.75, 0.5, 0.5, 0.5);
    assert_eq!(calculate_iou(&a, &b), 0.0);
}

#[test]
fn test_contained_box_iou() {
    let outer = BoundingBox::new(0.5, 0.5, 0.5, 0.5);
    let inner = BoundingBox::new(0.5, 0.5, 0.25, 0.25);
    assert!((calculate_iou(&outer, &inner) - 0.25).abs() < 1e-12);
}

// ============================================================================
// MATCHING EDGE CASES
// ============================================================================

#[test]
fn test_empty_predictions_with_ground_truth() {
    let outcome = match_detections(&[], &[gt(0.5, 0.5, 0.2, 0.2, 0)], 0.6, 0.5);
    assert_eq!(outcome.true_positives, 0);
    assert_eq!(outcome.false_negatives(), 1);
}

#[test]
fn test_empty_ground_truth_with_predictions() {
    let outcome = match_detections(&[pred(0.5, 0.5, 0.2, 0.2, 0, 0.9)], &[], 0.6, 0.5);
    assert_eq!(outcome.counted_predictions, 1);
    assert_eq!(outcome.false_positives(), 1);
}

#[test]
fn test_score_equal_to_threshold_is_not_counted() {
    let outcome = match_detections(&[pred(0.5, 0.5, 0.2, 0.2, 0, 0.6)], &[gt(0.5, 0.5, 0.2, 0.2, 0)], 0.6, 0.5);
    assert_eq!(outcome.counted_predictions, 0);
}

#[test]
fn test_iou_exactly_half_does_not_match() {
    // Same height, prediction covers half the ground truth width plus nothing else:
    // intersection 0.5·A, union A -> IoU 0.5
    let ground_truth = gt(0.5, 0.5, 0.5, 0.25, 0);
    let prediction = pred(0.375, 0.5, 0.25, 0.25, 0, 0.9);
    assert!((calculate_iou(&ground_truth.bbox, &prediction.bbox) - 0.5).abs() < 1e-12);

    let outcome = match_detections(&[prediction], &[ground_truth], 0.6, 0.5);
    assert_eq!(outcome.true_positives, 0);
}

#[test]
fn test_many_predictions_one_ground_truth() {
    let predictions = vec![
        pred(0.50, 0.50, 0.2, 0.2, 0, 0.95),
        pred(0.51, 0.51, 0.2, 0.2, 0, 0.90),
        pred(0.49, 0.49, 0.2, 0.2, 0, 0.85),
    ];
    let outcome = match_detections(&predictions, &[gt(0.5, 0.5, 0.2, 0.2, 0)], 0.6, 0.5);
    assert_eq!(outcome.true_positives, 1);
    assert_eq!(outcome.false_positives(), 2);
}

#[test]
fn test_prediction_claims_next_free_ground_truth() {
    // Two identical ground truths: the second prediction takes the second one.
    let ground_truths = vec![gt(0.5, 0.5, 0.2, 0.2, 0), gt(0.5, 0.5, 0.2, 0.2, 0)];
    let predictions = vec![pred(0.5, 0.5, 0.2, 0.2, 0, 0.9), pred(0.5, 0.5, 0.2, 0.2, 0, 0.8)];
    let outcome = match_detections(&predictions, &ground_truths, 0.6, 0.5);
    assert_eq!(outcome.true_positives, 2);
    assert_eq!(outcome.matched, vec![true, true]);
}

// ============================================================================
// SUPPRESSION EDGE CASES
// ============================================================================

#[test]
fn test_nms_on_identical_boxes_keeps_first() {
    let bbox = BoundingBox::new(0.5, 0.5, 0.2, 0.2);
    let detections: Vec<Detection> = (0..5).map(|_| Detection { bbox, score: 0.9 }).collect();
    assert_eq!(select_by_nms(&detections, 0.2, None).unwrap(), vec![0]);
}

#[test]
fn test_nms_threshold_one_keeps_everything() {
    let detections = vec![
        Detection { bbox: BoundingBox::new(0.5, 0.5, 0.2, 0.2), score: 0.9 },
        Detection { bbox: BoundingBox::new(0.52, 0.5, 0.2, 0.2), score: 0.8 },
    ];
    assert_eq!(select_by_nms(&detections, 1.0, None).unwrap(), vec![0, 1]);
}

#[test]
fn test_suppress_and_filter_empty() {
    assert!(suppress_and_filter(Vec::new(), 0.2, 0.6).unwrap().is_empty());
}

// ============================================================================
// DECODER EDGE CASES
// ============================================================================

#[test]
fn test_grid_with_several_priors() {
    let config = GridDecoderConfig::new(1);
    let decoder = GridDecoder::new(config).unwrap();
    assert_eq!(decoder.expected_channels(), 5 * 6);

    let mut grid = Array3::<f32>::zeros((30, 2, 2));
    for anchor in 0..5 {
        grid.index_axis_mut(Axis(0), anchor * 6 + 4).fill(-20.0);
    }
    // Third prior (2.15 x 2.55 cells) fires in cell (0, 0)
    grid[[2 * 6 + 4, 0, 0]] = 20.0;
    grid[[2 * 6 + 5, 0, 0]] = 20.0;

    let boxes = decoder.decode(&grid.into_dyn()).unwrap();
    assert_eq!(boxes.len(), 1);
    assert!((boxes[0].bbox.width - 2.15 / 2.0).abs() < 1e-6);
    assert!((boxes[0].bbox.height - 2.55 / 2.0).abs() < 1e-6);
}

#[test]
fn test_ssd_background_only_prediction() {
    let decoder = DefaultBoxDecoder::new(DefaultBoxDecoderConfig::new(3)).unwrap();
    // Background confidence 1.0, class confidence 0.0
    let raw = ssd_raw(&[(0, 0.5, 0.5, 0.2, 0.2, 0.0)]);
    assert!(decoder.decode(&raw).unwrap().is_empty());
}

#[test]
fn test_ssd_boxes_are_clipped_to_image() {
    let mut config = DefaultBoxDecoderConfig::new(3);
    config.default_boxes = Some(vec![DefaultBox::new(BoundingBox::new(0.95, 0.5, 0.2, 0.2))]);
    let decoder = DefaultBoxDecoder::new(config).unwrap();

    let raw = Array2::from_shape_vec((1, 7), vec![0.0, 0.0, 0.0, 0.0, 0.05, 0.95, 0.0])
        .unwrap()
        .into_dyn();
    let boxes = decoder.decode(&raw).unwrap();

    assert_eq!(boxes.len(), 1);
    assert!(boxes[0].bbox.right() <= 1.0 + 1e-12);
    assert!((boxes[0].bbox.width - 0.15).abs() < 1e-9);
}

// ============================================================================
// DATA EDGE CASES
// ============================================================================

#[test]
fn test_whitespace_only_label_record() {
    let boxes = parse_labels(" \n\t\n", Path::new("blank.txt"), 2).unwrap();
    assert!(boxes.is_empty());
}

#[test]
fn test_label_without_trailing_newline() {
    let boxes = parse_labels("1 0.5 0.5 0.2 0.2", Path::new("one.txt"), 2).unwrap();
    assert_eq!(boxes.len(), 1);
    assert_eq!(boxes[0].best_class(), Some(1));
}

#[test]
fn test_discover_images_is_sorted_and_flat() {
    let scratch = ScratchDir::new("discover");
    for name in ["c.jpg", "a.jpg", "b.jpg", "a.txt", "d.jpeg", "e.JPG"] {
        std::fs::write(scratch.path.join(name), b"").unwrap();
    }
    std::fs::create_dir_all(scratch.path.join("nested")).unwrap();
    std::fs::write(scratch.path.join("nested").join("f.jpg"), b"").unwrap();

    let images = discover_images(&scratch.path).unwrap();
    let names: Vec<_> = images
        .iter()
        .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
        .collect();
    assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
    assert_eq!(label_path_for(&images[0]), scratch.path.join("a.txt"));
}

// ============================================================================
// STREAMING EDGE CASES
// ============================================================================

#[test]
fn test_chunk_larger_than_image_set() {
    let scratch = ScratchDir::new("big-chunk");
    let images = vec![scratch.image("only", "0 0.5 0.5 0.2 0.2\n")];

    let mut chunks = Vec::new();
    let summary = evaluator(vec![ssd_raw(&[(0, 0.5, 0.5, 0.2, 0.2, 0.9)])], EvaluationConfig::default())
        .run(&images, |c| chunks.push(c.images))
        .unwrap();

    assert_eq!(chunks, vec![1]);
    assert_eq!(summary.chunks, 1);
    assert_eq!(summary.mean_fps, summary.chunk_fps[0]);
}

#[test]
fn test_background_images_only_add_predictions() {
    let scratch = ScratchDir::new("background");
    let images = vec![scratch.image("gt", "0 0.5 0.5 0.2 0.2\n"), scratch.image("bg", "")];
    let outputs = vec![
        ssd_raw(&[(0, 0.5, 0.5, 0.2, 0.2, 0.9)]),
        ssd_raw(&[(1, 0.3, 0.3, 0.2, 0.2, 0.9)]),
    ];

    let summary = evaluator(outputs, EvaluationConfig::default()).run(&images, |_| {}).unwrap();
    assert_eq!(summary.total_ground_truth, 1);
    assert_eq!(summary.total_predictions, 2);
    assert_eq!(summary.precision, 0.5);
    assert_eq!(summary.recall, 1.0);
}
