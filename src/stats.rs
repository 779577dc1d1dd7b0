//! Run-wide accumulators.
//!
//! [`RunningTally`] holds the cumulative match counts of one evaluation run and
//! [`ThroughputMeter`] the per-chunk frame rates. Both start at zero, only grow
//! during a run and are owned by the run that created them.

use crate::error::Result;
use crate::matching::MatchOutcome;
use crate::metrics::f1_score::calculate_f1_score;
use crate::metrics::precision_recall::{
    calculate_precision, calculate_precision_recall, calculate_recall, PrecisionRecall,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cumulative match counts of an evaluation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningTally {
    /// Predictions that claimed a ground-truth box
    pub true_positives: usize,
    /// Predictions that exceeded the detection threshold
    pub total_predictions: usize,
    /// Ground-truth boxes seen
    pub total_ground_truth: usize,
}

impl RunningTally {
    /// A tally with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one image's match outcome into the tally
    pub fn record(&mut self, outcome: &MatchOutcome) {
        self.true_positives += outcome.true_positives;
        self.total_predictions += outcome.counted_predictions;
        self.total_ground_truth += outcome.ground_truth;
    }

    /// Consume the tally and return it with `outcomes` folded in, in order
    pub fn fold<'a, I>(mut self, outcomes: I) -> Self
    where
        I: IntoIterator<Item = &'a MatchOutcome>,
    {
        for outcome in outcomes {
            self.record(outcome);
        }
        self
    }

    /// Precision of the counts so far; 0.0 without predictions
    pub fn precision(&self) -> f64 {
        calculate_precision(self.true_positives, self.total_predictions)
    }

    /// Recall of the counts so far
    ///
    /// # Errors
    ///
    /// [`crate::EvalError::UndefinedRecall`] while no ground truth was seen
    pub fn recall(&self) -> Result<f64> {
        calculate_recall(self.true_positives, self.total_ground_truth)
    }

    /// F-score of the counts so far
    ///
    /// # Errors
    ///
    /// Same as [`RunningTally::recall`]
    pub fn f_score(&self) -> Result<f64> {
        Ok(calculate_f1_score(self.precision(), self.recall()?))
    }

    /// Precision and recall together with the counts
    ///
    /// # Errors
    ///
    /// Same as [`RunningTally::recall`]
    pub fn metrics(&self) -> Result<PrecisionRecall> {
        calculate_precision_recall(
            self.true_positives,
            self.total_predictions,
            self.total_ground_truth,
        )
    }

    /// Get a formatted string summary of the counts
    pub fn summary_string(&self) -> String {
        format!(
            "RunningTally {{ tp: {}, predictions: {}, ground_truth: {} }}",
            self.true_positives, self.total_predictions, self.total_ground_truth
        )
    }
}

/// Per-chunk frame rates of an evaluation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThroughputMeter {
    chunk_fps: Vec<f64>,
}

impl ThroughputMeter {
    /// A meter without recorded chunks
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a chunk of `images` processed in `elapsed`; returns its fps
    pub fn record(&mut self, images: usize, elapsed: Duration) -> f64 {
        let fps = frames_per_second(images, elapsed);
        self.chunk_fps.push(fps);
        fps
    }

    /// Frame rate of every recorded chunk, in order
    pub fn chunk_fps(&self) -> &[f64] {
        &self.chunk_fps
    }

    /// Number of recorded chunks
    pub fn chunks(&self) -> usize {
        self.chunk_fps.len()
    }

    /// Unweighted arithmetic mean of the per-chunk frame rates
    ///
    /// Every chunk counts once regardless of its size; 0.0 before the first chunk.
    pub fn mean_fps(&self) -> f64 {
        if self.chunk_fps.is_empty() {
            return 0.0;
        }
        self.chunk_fps.iter().sum::<f64>() / self.chunk_fps.len() as f64
    }
}

/// Images per second; a zero duration is clamped to one nanosecond.
pub fn frames_per_second(images: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64().max(1e-9);
    images as f64 / secs
}
