//! Confidence score thresholding utilities.
//!
//! Every confidence comparison in the crate goes through [`exceeds_threshold`]:
//! a score survives only if it is strictly greater than the threshold.

use crate::error::{EvalError, Result};
use crate::types::DetectionBox;

/// Default detection confidence threshold.
pub const DEFAULT_DETECTION_THRESHOLD: f64 = 0.6;

/// Default NMS IoU threshold.
pub const DEFAULT_NMS_THRESHOLD: f64 = 0.2;

/// Default IoU a prediction needs to claim a ground-truth box.
pub const DEFAULT_MATCH_IOU_THRESHOLD: f64 = 0.5;

/// Whether `score` survives `threshold`.
///
/// ```
/// use detection_fscore::threshold::exceeds_threshold;
///
/// assert!(exceeds_threshold(0.61, 0.6));
/// assert!(!exceeds_threshold(0.6, 0.6));
/// ```
#[inline]
#[must_use]
pub fn exceeds_threshold(score: f64, threshold: f64) -> bool {
    score > threshold
}

/// Keep only boxes whose best-class score exceeds `threshold`.
///
/// # Errors
///
/// Returns an error if the threshold is not in the valid range [0.0, 1.0].
///
/// # Example
///
/// ```
/// use detection_fscore::threshold::filter_by_confidence;
/// use detection_fscore::types::{BoundingBox, DetectionBox};
///
/// let bbox = BoundingBox::new(0.5, 0.5, 0.1, 0.1);
/// let boxes = vec![
///     DetectionBox::new(bbox, vec![0.9, 0.0]),
///     DetectionBox::new(bbox, vec![0.0, 0.3]),
/// ];
///
/// let filtered = filter_by_confidence(&boxes, 0.5).unwrap();
/// assert_eq!(filtered.len(), 1);
/// ```
pub fn filter_by_confidence(boxes: &[DetectionBox], threshold: f64) -> Result<Vec<DetectionBox>> {
    validate_threshold(threshold)?;

    Ok(boxes
        .iter()
        .filter(|b| exceeds_threshold(b.best_score(), threshold))
        .cloned()
        .collect())
}

/// Validate that a threshold is in the valid range [0.0, 1.0].
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(EvalError::InvalidThreshold(format!(
            "Threshold must be between 0.0 and 1.0, got {}",
            threshold
        )));
    }
    Ok(())
}
