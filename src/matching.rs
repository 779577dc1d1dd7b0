//! Greedy matching of predictions against ground truth for a single image.

use crate::metrics::iou::calculate_iou;
use crate::threshold::exceeds_threshold;
use crate::types::DetectionBox;
use serde::{Deserialize, Serialize};

/// Per-image result of [`match_detections`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Predictions that claimed a ground-truth box.
    pub true_positives: usize,
    /// Predictions whose best-class score exceeded the detection threshold.
    pub counted_predictions: usize,
    /// Ground-truth boxes of the image.
    pub ground_truth: usize,
    /// `matched[t]` is set once ground-truth box `t` has been claimed.
    pub matched: Vec<bool>,
}

impl MatchOutcome {
    /// Counted predictions that matched nothing.
    pub fn false_positives(&self) -> usize {
        self.counted_predictions - self.true_positives
    }

    /// Ground-truth boxes that were never claimed.
    pub fn false_negatives(&self) -> usize {
        self.ground_truth - self.true_positives
    }
}

/// First-fit greedy matching.
///
/// Predictions are visited in the order given (no re-sorting by score). A
/// prediction whose best-class score does not exceed `detection_threshold` is
/// skipped and not counted. Otherwise ground-truth boxes are scanned in order
/// and the first unclaimed one with `IoU > iou_threshold` and the same argmax
/// class is claimed. Each ground-truth box is claimed at most once.
///
/// # Example
///
/// ```
/// use detection_fscore::matching::match_detections;
/// use detection_fscore::types::{BoundingBox, DetectionBox};
///
/// let bbox = BoundingBox::new(0.5, 0.5, 0.2, 0.2);
/// let predictions = vec![DetectionBox::single_class(bbox, 0, 0.9, 2)];
/// let ground_truth = vec![DetectionBox::ground_truth(bbox, 0, 2)];
///
/// let outcome = match_detections(&predictions, &ground_truth, 0.6, 0.5);
/// assert_eq!(outcome.true_positives, 1);
/// assert_eq!(outcome.matched, vec![true]);
/// ```
pub fn match_detections(
    predictions: &[DetectionBox],
    ground_truths: &[DetectionBox],
    detection_threshold: f64,
    iou_threshold: f64,
) -> MatchOutcome {
    let mut matched = vec![false; ground_truths.len()];
    let mut true_positives = 0;
    let mut counted_predictions = 0;

    for prediction in predictions {
        if !exceeds_threshold(prediction.best_score(), detection_threshold) {
            continue;
        }
        counted_predictions += 1;

        let class_id = prediction.best_class();
        let claim = ground_truths.iter().enumerate().position(|(t, gt)| {
            !matched[t]
                && calculate_iou(&gt.bbox, &prediction.bbox) > iou_threshold
                && gt.best_class() == class_id
        });

        if let Some(t) = claim {
            matched[t] = true;
            true_positives += 1;
        }
    }

    MatchOutcome {
        true_positives,
        counted_predictions,
        ground_truth: ground_truths.len(),
        matched,
    }
}
