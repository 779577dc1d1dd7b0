//! F-score calculation.

use crate::error::Result;
use crate::metrics::precision_recall::{calculate_precision_recall, PrecisionRecall};

/// Calculate the F-score (F1) from precision and recall.
///
/// F1 = 2 × (Precision × Recall) / (Precision + Recall)
///
/// Returns 0.0 if both precision and recall are 0.
///
/// # Example
///
/// ```
/// use detection_fscore::metrics::f1_score::calculate_f1_score;
///
/// let f1 = calculate_f1_score(0.8, 0.6);
/// assert!((f1 - 0.6857).abs() < 0.001);
/// assert_eq!(calculate_f1_score(0.0, 0.0), 0.0);
/// ```
#[must_use]
pub fn calculate_f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        return 0.0;
    }

    2.0 * (precision * recall) / (precision + recall)
}

/// Calculate the F-score from a [`PrecisionRecall`] pair.
#[must_use]
pub fn calculate_f1_from_pr(pr: &PrecisionRecall) -> f64 {
    calculate_f1_score(pr.precision, pr.recall)
}

/// Calculate the F-score directly from cumulative counts.
///
/// # Errors
///
/// Fails if recall is undefined (no ground truth).
///
/// # Example
///
/// ```
/// use detection_fscore::metrics::f1_score::calculate_f1_from_counts;
///
/// // precision 8/10, recall 8/11
/// let f1 = calculate_f1_from_counts(8, 10, 11).unwrap();
/// assert!((f1 - 0.7619).abs() < 0.001);
/// ```
pub fn calculate_f1_from_counts(
    true_positives: usize,
    total_predictions: usize,
    total_ground_truth: usize,
) -> Result<f64> {
    let pr = calculate_precision_recall(true_positives, total_predictions, total_ground_truth)?;
    Ok(calculate_f1_from_pr(&pr))
}
