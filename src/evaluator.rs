//! Streaming evaluation orchestrator.
//!
//! Images are processed in chunks of [`EvaluationConfig::chunk_size`]. Each
//! chunk is preprocessed in parallel, run through the model in sub-batches of
//! [`EvaluationConfig::batch_size`], decoded and matched per image in
//! parallel, and folded into the run's [`RunningTally`] on a single thread.
//! Running metrics are reported after every chunk.

use crate::dataset::label_path_for;
use crate::decoder::Decoder;
use crate::error::{EvalError, Result};
use crate::loader::load_labels;
use crate::matching::{match_detections, MatchOutcome};
use crate::metrics::f1_score::calculate_f1_from_pr;
use crate::model::InferenceModel;
use crate::preprocess::{load_batch, Preprocess};
use crate::stats::{RunningTally, ThroughputMeter};
use crate::threshold::{
    validate_threshold, DEFAULT_DETECTION_THRESHOLD, DEFAULT_MATCH_IOU_THRESHOLD,
    DEFAULT_NMS_THRESHOLD,
};
use crate::types::RawPrediction;
use ndarray::Axis;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default number of images per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 128;

/// Default number of images per inference call.
pub const DEFAULT_BATCH_SIZE: usize = 16;

/// Tunables of an evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Images accumulated before a flush.
    pub chunk_size: usize,
    /// Images per inference call within a chunk.
    pub batch_size: usize,
    /// τ_det: predictions must exceed it to be counted and matched.
    pub detection_threshold: f64,
    /// τ_nms used by the decoder.
    pub nms_threshold: f64,
    /// IoU a prediction must exceed to claim a ground-truth box.
    pub match_iou_threshold: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            detection_threshold: DEFAULT_DETECTION_THRESHOLD,
            nms_threshold: DEFAULT_NMS_THRESHOLD,
            match_iou_threshold: DEFAULT_MATCH_IOU_THRESHOLD,
        }
    }
}

impl EvaluationConfig {
    /// Check sizes and thresholds.
    ///
    /// # Errors
    ///
    /// [`EvalError::Configuration`] for a zero chunk or batch size and
    /// [`EvalError::InvalidThreshold`] for thresholds outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(EvalError::Configuration(
                "chunk size must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(EvalError::Configuration(
                "batch size must be at least 1".to_string(),
            ));
        }
        validate_threshold(self.detection_threshold)?;
        validate_threshold(self.nms_threshold)?;
        validate_threshold(self.match_iou_threshold)?;
        Ok(())
    }
}

/// What one chunk flush produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkReport {
    /// Zero-based chunk number.
    pub index: usize,
    /// Images in the chunk.
    pub images: usize,
    /// Inference time of the chunk in seconds.
    pub seconds: f64,
    /// Images per second of the chunk.
    pub fps: f64,
    /// Cumulative counts after the chunk.
    pub tally: RunningTally,
    /// Running precision.
    pub precision: f64,
    /// Running recall; `None` while no ground truth has been seen.
    pub recall: Option<f64>,
    /// Running F-score; `None` while recall is undefined.
    pub f_score: Option<f64>,
}

/// Final metrics of a complete run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub images: usize,
    pub chunks: usize,
    pub true_positives: usize,
    pub total_predictions: usize,
    pub total_ground_truth: usize,
    pub precision: f64,
    pub recall: f64,
    pub f_score: f64,
    /// Unweighted mean of [`EvaluationSummary::chunk_fps`].
    pub mean_fps: f64,
    pub chunk_fps: Vec<f64>,
}

impl EvaluationSummary {
    /// Final metrics from the run's accumulators.
    ///
    /// # Errors
    ///
    /// [`EvalError::UndefinedRecall`] if the run saw no ground truth.
    pub fn from_run(images: usize, tally: &RunningTally, meter: &ThroughputMeter) -> Result<Self> {
        let metrics = tally.metrics()?;
        Ok(Self {
            images,
            chunks: meter.chunks(),
            true_positives: metrics.true_positives,
            total_predictions: metrics.total_predictions,
            total_ground_truth: metrics.total_ground_truth,
            precision: metrics.precision,
            recall: metrics.recall,
            f_score: calculate_f1_from_pr(&metrics),
            mean_fps: meter.mean_fps(),
            chunk_fps: meter.chunk_fps().to_vec(),
        })
    }
}

/// Chunked, streaming evaluation of one model over one image set.
pub struct StreamingEvaluator<M, P> {
    model: M,
    preprocessor: P,
    decoder: Decoder,
    config: EvaluationConfig,
}

impl<M: InferenceModel, P: Preprocess> StreamingEvaluator<M, P> {
    /// Assemble an evaluator.
    ///
    /// # Errors
    ///
    /// Fails if `config` does not validate.
    pub fn new(model: M, preprocessor: P, decoder: Decoder, config: EvaluationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            model,
            preprocessor,
            decoder,
            config,
        })
    }

    /// The run configuration.
    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// The inference collaborator.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Evaluate `images` chunk by chunk, calling `on_chunk` after every flush.
    ///
    /// # Errors
    ///
    /// Any preprocessing, ground-truth, inference or decoding failure aborts
    /// the run. [`EvalError::UndefinedRecall`] is returned if no ground truth
    /// was found across the whole image set.
    pub fn run<F>(&mut self, images: &[PathBuf], mut on_chunk: F) -> Result<EvaluationSummary>
    where
        F: FnMut(&ChunkReport),
    {
        if images.is_empty() {
            return Err(EvalError::EmptyDataset("no images to evaluate".to_string()));
        }

        info!(
            images = images.len(),
            chunk_size = self.config.chunk_size,
            batch_size = self.config.batch_size,
            "starting evaluation"
        );

        let mut tally = RunningTally::new();
        let mut meter = ThroughputMeter::new();

        for (index, chunk) in images.chunks(self.config.chunk_size).enumerate() {
            let (next, elapsed) = self.flush_chunk(chunk, tally)?;
            tally = next;

            let fps = meter.record(chunk.len(), elapsed);
            let report = chunk_report(index, chunk.len(), elapsed, fps, tally);

            match (report.recall, report.f_score) {
                (Some(recall), Some(f_score)) => info!(
                    chunk = index,
                    images = report.images,
                    seconds = report.seconds,
                    fps = report.fps,
                    precision = report.precision,
                    recall,
                    f_score,
                    "chunk evaluated"
                ),
                _ => warn!(
                    chunk = index,
                    images = report.images,
                    precision = report.precision,
                    "chunk evaluated; recall undefined until ground truth is seen"
                ),
            }

            on_chunk(&report);
        }

        let summary = EvaluationSummary::from_run(images.len(), &tally, &meter)?;
        info!(
            precision = summary.precision,
            recall = summary.recall,
            f_score = summary.f_score,
            mean_fps = summary.mean_fps,
            "evaluation finished"
        );
        Ok(summary)
    }

    /// Process one chunk and return the tally with its outcomes folded in,
    /// together with the chunk's inference time.
    ///
    /// Nothing is folded unless every image of the chunk succeeds.
    ///
    /// # Errors
    ///
    /// Fails on the first preprocessing, inference, decoding or ground-truth
    /// error of the chunk.
    pub fn flush_chunk(&mut self, paths: &[PathBuf], tally: RunningTally) -> Result<(RunningTally, Duration)> {
        if paths.is_empty() {
            return Ok((tally, Duration::ZERO));
        }

        let batch = load_batch(&self.preprocessor, paths)?;

        let start = Instant::now();
        let mut predictions: Vec<RawPrediction> = Vec::with_capacity(paths.len());
        for sub_batch in batch.axis_chunks_iter(Axis(0), self.config.batch_size) {
            let expected = sub_batch.len_of(Axis(0));
            let outputs = self.model.infer_batch(sub_batch)?;
            if outputs.len() != expected {
                return Err(EvalError::PredictionCount {
                    expected,
                    got: outputs.len(),
                });
            }
            predictions.extend(outputs);
        }
        let elapsed = start.elapsed();

        let decoder = &self.decoder;
        let config = &self.config;
        let outcomes = paths
            .par_iter()
            .zip(predictions.par_iter())
            .map(|(path, raw)| evaluate_image(decoder, config, path, raw))
            .collect::<Result<Vec<MatchOutcome>>>()?;

        let tally = tally.fold(&outcomes);
        debug!(images = paths.len(), tally = %tally.summary_string(), "chunk matched");
        Ok((tally, elapsed))
    }
}

/// Decode, load ground truth and match one image.
fn evaluate_image(
    decoder: &Decoder,
    config: &EvaluationConfig,
    image: &Path,
    raw: &RawPrediction,
) -> Result<MatchOutcome> {
    let predictions = decoder.decode(raw)?;
    let ground_truth = load_labels(label_path_for(image), decoder.num_classes())?;
    Ok(match_detections(
        &predictions,
        &ground_truth,
        config.detection_threshold,
        config.match_iou_threshold,
    ))
}

fn chunk_report(index: usize, images: usize, elapsed: Duration, fps: f64, tally: RunningTally) -> ChunkReport {
    let recall = tally.recall().ok();
    let f_score = tally.f_score().ok();
    ChunkReport {
        index,
        images,
        seconds: elapsed.as_secs_f64(),
        fps,
        tally,
        precision: tally.precision(),
        recall,
        f_score,
    }
}
