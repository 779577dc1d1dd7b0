//! Non-Maximum Suppression (`NMS`) implementation
//!
//! Two greedy flavours share one contract: candidates are visited in
//! descending score order (stable, so equal scores keep input order) and a
//! visited survivor suppresses every later candidate whose `IoU` with it is
//! strictly greater than the threshold.
//!
//! - [`non_maximum_suppression`] / [`select_by_nms`] work on single-class
//!   scored boxes and report which indices survive.
//! - [`suppress_per_class`] works on full class-probability vectors and zeroes
//!   the suppressed class entries in place.

use crate::error::{EvalError, Result};
use crate::metrics::iou::calculate_iou;
use crate::threshold::exceeds_threshold;
use crate::types::{BoundingBox, DetectionBox};
use std::cmp::Ordering;

/// Detection with bounding box and confidence score
#[derive(Debug, Clone)]
pub struct Detection {
    /// Bounding box in center form
    pub bbox: BoundingBox,
    /// Confidence score
    pub score: f64,
}

fn validate_iou_threshold(iou_threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&iou_threshold) {
        return Err(EvalError::InvalidThreshold(format!(
            "IoU threshold must be between 0 and 1, got {iou_threshold}"
        )));
    }
    Ok(())
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Greedy NMS returning the surviving positions in descending score order.
///
/// At most `max_output` detections are selected when a cap is given.
///
/// # Errors
///
/// Returns error if `iou_threshold` is not in range [0.0, 1.0]
///
/// # Examples
///
/// ```
/// # use detection_fscore::nms::{Detection, select_by_nms};
/// # use detection_fscore::types::BoundingBox;
/// let detections = vec![
///     Detection { bbox: BoundingBox::new(0.30, 0.30, 0.4, 0.4), score: 0.9 },
///     Detection { bbox: BoundingBox::new(0.32, 0.32, 0.4, 0.4), score: 0.8 },
///     Detection { bbox: BoundingBox::new(0.80, 0.80, 0.2, 0.2), score: 0.95 },
/// ];
///
/// let keep = select_by_nms(&detections, 0.5, None).unwrap();
/// assert_eq!(keep, vec![2, 0]);
/// ```
pub fn select_by_nms(
    detections: &[Detection],
    iou_threshold: f64,
    max_output: Option<usize>,
) -> Result<Vec<usize>> {
    validate_iou_threshold(iou_threshold)?;

    let n = detections.len();
    let limit = max_output.unwrap_or(n);
    if n == 0 || limit == 0 {
        return Ok(Vec::new());
    }

    let mut suppressed = vec![false; n];
    let mut selected = Vec::new();

    // Sort indices by score (descending), stable
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&a, &b| descending(detections[a].score, detections[b].score));

    for (i, &idx_i) in indices.iter().enumerate() {
        if suppressed[idx_i] {
            continue;
        }

        selected.push(idx_i);
        if selected.len() == limit {
            break;
        }

        // Suppress all subsequent boxes that overlap this one too much
        for &idx_j in &indices[(i + 1)..] {
            if suppressed[idx_j] {
                continue;
            }

            let iou = calculate_iou(&detections[idx_i].bbox, &detections[idx_j].bbox);
            if iou > iou_threshold {
                suppressed[idx_j] = true;
            }
        }
    }

    Ok(selected)
}

/// Apply Non-Maximum Suppression to a set of single-class detections
///
/// # Returns
///
/// Boolean mask (input order) indicating which detections to keep
///
/// # Errors
///
/// Returns error if `iou_threshold` is not in range [0.0, 1.0]
pub fn non_maximum_suppression(detections: &[Detection], iou_threshold: f64) -> Result<Vec<bool>> {
    let selected = select_by_nms(detections, iou_threshold, None)?;
    let mut keep_mask = vec![false; detections.len()];
    for idx in selected {
        keep_mask[idx] = true;
    }
    Ok(keep_mask)
}

/// Greedy per-class suppression over class-probability vectors.
///
/// For each class `c` in index order the boxes are stably re-sorted by
/// `probs[c]` (descending); every box with a non-zero `probs[c]` zeroes
/// `probs[c]` of each later box that overlaps it by more than
/// `iou_threshold`. The slice is left in the order of the last class pass.
///
/// # Errors
///
/// Returns error if `iou_threshold` is not in range [0.0, 1.0]
pub fn suppress_per_class(boxes: &mut [DetectionBox], iou_threshold: f64) -> Result<()> {
    validate_iou_threshold(iou_threshold)?;

    let num_classes = boxes.iter().map(DetectionBox::num_classes).max().unwrap_or(0);

    for class_id in 0..num_classes {
        let score = |b: &DetectionBox| b.probs.get(class_id).copied().unwrap_or(0.0);
        boxes.sort_by(|a, b| descending(score(a), score(b)));

        for i in 0..boxes.len() {
            if score(&boxes[i]) == 0.0 {
                continue;
            }
            let kept = boxes[i].bbox;

            for candidate in &mut boxes[(i + 1)..] {
                if score(&*candidate) == 0.0 {
                    continue;
                }
                if calculate_iou(&kept, &candidate.bbox) > iou_threshold {
                    candidate.probs[class_id] = 0.0;
                }
            }
        }
    }

    Ok(())
}

/// Per-class suppression followed by the confidence filter.
///
/// Boxes whose best remaining class score does not exceed `score_threshold`
/// are dropped; the rest keep their (partially zeroed) probability vectors.
///
/// # Errors
///
/// Returns error if `iou_threshold` is not in range [0.0, 1.0]
///
/// # Examples
///
/// ```
/// # use detection_fscore::nms::suppress_and_filter;
/// # use detection_fscore::types::{BoundingBox, DetectionBox};
/// let boxes = vec![
///     DetectionBox::new(BoundingBox::new(0.30, 0.30, 0.4, 0.4), vec![0.8, 0.0]),
///     DetectionBox::new(BoundingBox::new(0.32, 0.32, 0.4, 0.4), vec![0.9, 0.0]),
/// ];
/// let kept = suppress_and_filter(boxes, 0.2, 0.6).unwrap();
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept[0].probs, vec![0.9, 0.0]);
/// ```
pub fn suppress_and_filter(
    mut boxes: Vec<DetectionBox>,
    iou_threshold: f64,
    score_threshold: f64,
) -> Result<Vec<DetectionBox>> {
    suppress_per_class(&mut boxes, iou_threshold)?;
    boxes.retain(|b| exceeds_threshold(b.best_score(), score_threshold));
    Ok(boxes)
}
