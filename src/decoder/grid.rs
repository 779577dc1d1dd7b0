//! Anchor/prior-grid decoding for YOLO-style detectors.
//!
//! The raw prediction is a channels-first tensor `(B·(5+C), H, W)`. For
//! anchor `b` the channels starting at `b·(5+C)` hold
//! `tx, ty, tw, th, tc` followed by `C` class logits.

use crate::error::{EvalError, Result};
use crate::nms::suppress_and_filter;
use crate::threshold::{
    exceeds_threshold, validate_threshold, DEFAULT_DETECTION_THRESHOLD, DEFAULT_NMS_THRESHOLD,
};
use crate::types::{BoundingBox, DetectionBox, RawPrediction};
use ndarray::{ArrayView3, Ix3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Prior `(width, height)` pairs, in grid cells, of the bundled YOLO models.
pub const DEFAULT_PRIORS: [(f64, f64); 5] = [
    (0.9, 1.2),
    (1.05, 1.35),
    (2.15, 2.55),
    (3.25, 3.75),
    (5.35, 5.1),
];

/// Values stored per anchor before the class logits.
const BOX_FIELDS: usize = 5;

/// Configuration of a [`GridDecoder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDecoderConfig {
    /// Prior `(width, height)` pairs in grid-cell units, one per anchor.
    pub priors: Vec<(f64, f64)>,
    /// Number of object classes.
    pub num_classes: usize,
    /// Minimum (exclusive) class score for a box to be emitted.
    pub detection_threshold: f64,
    /// IoU above which a lower-scored box of the same class is suppressed.
    pub nms_threshold: f64,
}

impl GridDecoderConfig {
    /// Default priors and thresholds for `num_classes` classes.
    pub fn new(num_classes: usize) -> Self {
        Self {
            priors: DEFAULT_PRIORS.to_vec(),
            num_classes,
            detection_threshold: DEFAULT_DETECTION_THRESHOLD,
            nms_threshold: DEFAULT_NMS_THRESHOLD,
        }
    }
}

/// Decoder for anchor-grid raw predictions.
#[derive(Debug, Clone)]
pub struct GridDecoder {
    config: GridDecoderConfig,
}

impl GridDecoder {
    /// Create a decoder after validating the configuration.
    ///
    /// # Errors
    ///
    /// Fails on out-of-range thresholds, zero classes, or missing/degenerate priors.
    pub fn new(config: GridDecoderConfig) -> Result<Self> {
        validate_threshold(config.detection_threshold)?;
        validate_threshold(config.nms_threshold)?;

        if config.num_classes == 0 {
            return Err(EvalError::Configuration(
                "Grid decoder needs at least one class".to_string(),
            ));
        }
        if config.priors.is_empty() {
            return Err(EvalError::Configuration(
                "Grid decoder needs at least one prior".to_string(),
            ));
        }
        if let Some((w, h)) = config.priors.iter().find(|(w, h)| !(*w > 0.0 && *h > 0.0)) {
            return Err(EvalError::Configuration(format!(
                "Prior dimensions must be positive, got ({w}, {h})"
            )));
        }

        Ok(Self { config })
    }

    /// The decoder configuration.
    pub fn config(&self) -> &GridDecoderConfig {
        &self.config
    }

    /// Number of channels the raw tensor must carry.
    pub fn expected_channels(&self) -> usize {
        self.config.priors.len() * (BOX_FIELDS + self.config.num_classes)
    }

    /// Decode one image's raw prediction into suppressed, thresholded boxes.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::ShapeMismatch`] if the tensor is not
    /// `(B·(5+C), H, W)` with a non-empty grid.
    pub fn decode(&self, raw: &RawPrediction) -> Result<Vec<DetectionBox>> {
        let grid = raw
            .view()
            .into_dimensionality::<Ix3>()
            .map_err(|_| EvalError::ShapeMismatch {
                expected: format!("3-D grid ({}, H, W)", self.expected_channels()),
                got: format!("{:?}", raw.shape()),
            })?;

        let (channels, rows, cols) = grid.dim();
        if channels != self.expected_channels() || rows == 0 || cols == 0 {
            return Err(EvalError::ShapeMismatch {
                expected: format!("({}, H, W) with H, W > 0", self.expected_channels()),
                got: format!("{:?}", raw.shape()),
            });
        }

        let candidates = self.collect_candidates(grid);
        let total = candidates.len();
        let boxes = suppress_and_filter(
            candidates,
            self.config.nms_threshold,
            self.config.detection_threshold,
        )?;

        debug!(
            grid = %format!("{rows}x{cols}"),
            candidates = total,
            kept = boxes.len(),
            "decoded grid prediction"
        );

        Ok(boxes)
    }

    /// Every (cell, prior) pair with at least one class above threshold.
    fn collect_candidates(&self, grid: ArrayView3<'_, f32>) -> Vec<DetectionBox> {
        let (_, rows, cols) = grid.dim();
        let num_classes = self.config.num_classes;
        let stride = BOX_FIELDS + num_classes;
        let threshold = self.config.detection_threshold;

        let mut candidates = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                for (anchor, &(prior_w, prior_h)) in self.config.priors.iter().enumerate() {
                    let base = anchor * stride;
                    let cell = |k: usize| f64::from(grid[[base + k, row, col]]);

                    let bbox = BoundingBox::new(
                        (col as f64 + sigmoid(cell(0))) / cols as f64,
                        (row as f64 + sigmoid(cell(1))) / rows as f64,
                        cell(2).exp() * prior_w / cols as f64,
                        cell(3).exp() * prior_h / rows as f64,
                    );
                    if !bbox.is_valid() {
                        continue;
                    }

                    let confidence = sigmoid(cell(4));
                    let logits: Vec<f64> = (0..num_classes).map(|k| cell(BOX_FIELDS + k)).collect();
                    let probs: Vec<f64> = softmax(&logits)
                        .into_iter()
                        .map(|p| p * confidence)
                        .map(|p| if exceeds_threshold(p, threshold) { p } else { 0.0 })
                        .collect();

                    if probs.iter().any(|&p| p > 0.0) {
                        candidates.push(DetectionBox::new(bbox, probs));
                    }
                }
            }
        }
        candidates
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        exps.into_iter().map(|e| e / sum).collect()
    } else {
        vec![0.0; logits.len()]
    }
}
