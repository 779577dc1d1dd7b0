//! Default-box decoding for SSD-style detectors.
//!
//! Each row of the raw prediction describes one default box:
//!
//! ```text
//! [ loc(4) | conf(C, background included) | prior xmin ymin xmax ymax | variances(4) ]
//! ```
//!
//! When the network does not emit the prior columns the decoder can be
//! configured with the default boxes up front, and rows are `[loc | conf]`.

use crate::error::{EvalError, Result};
use crate::nms::{select_by_nms, Detection};
use crate::threshold::{
    exceeds_threshold, validate_threshold, DEFAULT_DETECTION_THRESHOLD, DEFAULT_NMS_THRESHOLD,
};
use crate::types::{BoundingBox, DetectionBox, RawPrediction};
use ndarray::{ArrayView1, Ix2};
use serde::{Deserialize, Serialize};
use tracing::debug;

const LOC_FIELDS: usize = 4;
const PRIOR_FIELDS: usize = 8;

/// Default variances of the SSD300 box encoding.
pub const DEFAULT_VARIANCES: [f64; 4] = [0.1, 0.1, 0.2, 0.2];

/// A default box and the variances used to encode offsets against it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefaultBox {
    pub bbox: BoundingBox,
    pub variances: [f64; 4],
}

impl DefaultBox {
    /// Default box with the standard SSD variances.
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            variances: DEFAULT_VARIANCES,
        }
    }
}

/// Configuration of a [`DefaultBoxDecoder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultBoxDecoderConfig {
    /// Number of confidence columns, background included.
    pub num_classes: usize,
    /// Confidence column of the background class.
    pub background_label: usize,
    /// Minimum (exclusive) confidence for a box to enter per-class NMS.
    pub confidence_threshold: f64,
    /// IoU above which a lower-scored box of the same class is suppressed.
    pub nms_threshold: f64,
    /// Maximum boxes kept per class by NMS.
    pub top_k: usize,
    /// Maximum detections emitted per image.
    pub keep_top_k: usize,
    /// Default boxes for networks whose output omits the prior columns.
    pub default_boxes: Option<Vec<DefaultBox>>,
}

impl DefaultBoxDecoderConfig {
    /// Defaults for `num_classes` confidence columns with background at 0.
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            background_label: 0,
            confidence_threshold: DEFAULT_DETECTION_THRESHOLD,
            nms_threshold: DEFAULT_NMS_THRESHOLD,
            top_k: 400,
            keep_top_k: 200,
            default_boxes: None,
        }
    }
}

/// Decoder for SSD-style default-box raw predictions.
#[derive(Debug, Clone)]
pub struct DefaultBoxDecoder {
    config: DefaultBoxDecoderConfig,
}

impl DefaultBoxDecoder {
    /// Create a decoder after validating the configuration.
    ///
    /// # Errors
    ///
    /// Fails on out-of-range thresholds, fewer than two classes, or a
    /// background label outside the class range.
    pub fn new(config: DefaultBoxDecoderConfig) -> Result<Self> {
        validate_threshold(config.confidence_threshold)?;
        validate_threshold(config.nms_threshold)?;

        if config.num_classes < 2 {
            return Err(EvalError::Configuration(format!(
                "Default-box decoder needs background plus at least one class, got {}",
                config.num_classes
            )));
        }
        if config.background_label >= config.num_classes {
            return Err(EvalError::Configuration(format!(
                "Background label {} is outside {} classes",
                config.background_label, config.num_classes
            )));
        }

        Ok(Self { config })
    }

    /// The decoder configuration.
    pub fn config(&self) -> &DefaultBoxDecoderConfig {
        &self.config
    }

    /// Number of classes in the emitted probability vectors (background removed).
    pub fn num_output_classes(&self) -> usize {
        self.config.num_classes - 1
    }

    /// Decode one image's raw prediction into per-class suppressed detections,
    /// ordered by confidence.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::ShapeMismatch`] if the tensor is not 2-D with
    /// `4 + C + 8` columns (or `4 + C` columns and one row per configured
    /// default box).
    pub fn decode(&self, raw: &RawPrediction) -> Result<Vec<DetectionBox>> {
        let rows = raw
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| self.shape_error(raw.shape()))?;

        let num_classes = self.config.num_classes;
        let (num_rows, num_cols) = rows.dim();

        let embedded = num_cols == LOC_FIELDS + num_classes + PRIOR_FIELDS;
        let decoded: Vec<Option<BoundingBox>> = if embedded {
            rows.outer_iter()
                .map(|row| {
                    let prior = embedded_default_box(row, LOC_FIELDS + num_classes);
                    decode_offsets(row, &prior)
                })
                .collect()
        } else {
            match &self.config.default_boxes {
                Some(defaults)
                    if num_cols == LOC_FIELDS + num_classes && defaults.len() == num_rows =>
                {
                    rows.outer_iter()
                        .zip(defaults)
                        .map(|(row, prior)| decode_offsets(row, prior))
                        .collect()
                }
                _ => return Err(self.shape_error(raw.shape())),
            }
        };

        // (output class, score, box) across all foreground classes
        let mut selected: Vec<(usize, f64, BoundingBox)> = Vec::new();
        for class_id in (0..num_classes).filter(|&c| c != self.config.background_label) {
            let candidates: Vec<Detection> = decoded
                .iter()
                .enumerate()
                .filter_map(|(index, bbox)| {
                    let bbox = (*bbox)?;
                    let score = f64::from(rows[[index, LOC_FIELDS + class_id]]);
                    exceeds_threshold(score, self.config.confidence_threshold)
                        .then_some(Detection { bbox, score })
                })
                .collect();

            if candidates.is_empty() {
                continue;
            }

            let out_class = self.output_class(class_id);
            let kept = select_by_nms(&candidates, self.config.nms_threshold, Some(self.config.top_k))?;
            for idx in kept {
                let det = &candidates[idx];
                selected.push((out_class, det.score, det.bbox));
            }
        }

        selected.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        selected.truncate(self.config.keep_top_k);

        debug!(
            default_boxes = num_rows,
            kept = selected.len(),
            "decoded default-box prediction"
        );

        let num_out = self.num_output_classes();
        Ok(selected
            .into_iter()
            .map(|(class_id, score, bbox)| DetectionBox::single_class(bbox, class_id, score, num_out))
            .collect())
    }

    /// Position of a confidence column once the background column is removed.
    fn output_class(&self, class_id: usize) -> usize {
        if class_id > self.config.background_label {
            class_id - 1
        } else {
            class_id
        }
    }

    fn shape_error(&self, shape: &[usize]) -> EvalError {
        let c = self.config.num_classes;
        EvalError::ShapeMismatch {
            expected: format!(
                "(N, {}) or (N, {}) with configured default boxes",
                LOC_FIELDS + c + PRIOR_FIELDS,
                LOC_FIELDS + c
            ),
            got: format!("{:?}", shape),
        }
    }
}

fn embedded_default_box(row: ArrayView1<'_, f32>, offset: usize) -> DefaultBox {
    let at = |k: usize| f64::from(row[offset + k]);
    DefaultBox {
        bbox: BoundingBox::from_corners(at(0), at(1), at(2), at(3)),
        variances: [at(4), at(5), at(6), at(7)],
    }
}

/// Apply the location offsets of `row` to `prior`, clip to the image and
/// return `None` for degenerate results.
fn decode_offsets(row: ArrayView1<'_, f32>, prior: &DefaultBox) -> Option<BoundingBox> {
    let loc = |k: usize| f64::from(row[k]);
    let p = &prior.bbox;
    let v = &prior.variances;

    let cx = loc(0) * p.width * v[0] + p.x;
    let cy = loc(1) * p.height * v[1] + p.y;
    let w = (loc(2) * v[2]).exp() * p.width;
    let h = (loc(3) * v[3]).exp() * p.height;

    let clip = |value: f64| value.clamp(0.0, 1.0);
    let bbox = BoundingBox::from_corners(
        clip(cx - w / 2.0),
        clip(cy - h / 2.0),
        clip(cx + w / 2.0),
        clip(cy + h / 2.0),
    );

    bbox.is_valid().then_some(bbox)
}
