//! Precision and Recall calculation.

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};

/// Container for precision and recall values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecisionRecall {
    pub precision: f64,
    pub recall: f64,
    pub true_positives: usize,
    pub total_predictions: usize,
    pub total_ground_truth: usize,
}

impl PrecisionRecall {
    /// Predictions that matched nothing.
    pub fn false_positives(&self) -> usize {
        self.total_predictions.saturating_sub(self.true_positives)
    }

    /// Ground-truth boxes that were never matched.
    pub fn false_negatives(&self) -> usize {
        self.total_ground_truth.saturating_sub(self.true_positives)
    }
}

/// Calculate precision from matched and total prediction counts.
///
/// Returns 0.0 when there are no predictions.
///
/// # Example
///
/// ```
/// use detection_fscore::metrics::precision_recall::calculate_precision;
///
/// assert_eq!(calculate_precision(8, 10), 0.8);
/// assert_eq!(calculate_precision(0, 0), 0.0);
/// ```
#[must_use]
pub fn calculate_precision(true_positives: usize, total_predictions: usize) -> f64 {
    if total_predictions == 0 {
        return 0.0;
    }
    true_positives as f64 / total_predictions as f64
}

/// Calculate recall from matched and total ground-truth counts.
///
/// # Errors
///
/// Returns [`EvalError::UndefinedRecall`] when `total_ground_truth` is zero:
/// an evaluation without ground truth is a configuration fault, not a
/// zero-recall run.
///
/// # Example
///
/// ```
/// use detection_fscore::metrics::precision_recall::calculate_recall;
///
/// assert_eq!(calculate_recall(1, 2).unwrap(), 0.5);
/// assert!(calculate_recall(0, 0).is_err());
/// ```
pub fn calculate_recall(true_positives: usize, total_ground_truth: usize) -> Result<f64> {
    if total_ground_truth == 0 {
        return Err(EvalError::UndefinedRecall);
    }
    Ok(true_positives as f64 / total_ground_truth as f64)
}

/// Calculate precision and recall from cumulative counts.
///
/// # Errors
///
/// Fails only if recall is undefined (no ground truth).
pub fn calculate_precision_recall(
    true_positives: usize,
    total_predictions: usize,
    total_ground_truth: usize,
) -> Result<PrecisionRecall> {
    Ok(PrecisionRecall {
        precision: calculate_precision(true_positives, total_predictions),
        recall: calculate_recall(true_positives, total_ground_truth)?,
        true_positives,
        total_predictions,
        total_ground_truth,
    })
}
