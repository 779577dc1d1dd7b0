//! Core data types for detections, ground truth and raw model output.

use serde::{Deserialize, Serialize};

/// Raw per-image output of a detector, before decoding.
///
/// The layout depends on the detector family, see [`crate::decoder`].
pub type RawPrediction = ndarray::ArrayD<f32>;

/// Axis-aligned bounding box in center form.
///
/// Coordinates are normalized to the image (0..1) once decoded:
/// - x: center x
/// - y: center y
/// - width: box width
/// - height: box height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box from its center and size.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Create a bounding box from corner coordinates.
    pub fn from_corners(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            x: 0.5 * (xmin + xmax),
            y: 0.5 * (ymin + ymax),
            width: xmax - xmin,
            height: ymax - ymin,
        }
    }

    /// Get the area of the bounding box.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Left edge.
    pub fn left(&self) -> f64 {
        self.x - self.width / 2.0
    }

    /// Top edge.
    pub fn top(&self) -> f64 {
        self.y - self.height / 2.0
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Check if the bounding box is valid (finite, positive dimensions).
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// A detected or ground-truth object instance.
///
/// Ground truth carries a one-hot `probs` vector; predictions carry the
/// decoder's per-class scores, with suppressed classes zeroed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionBox {
    pub bbox: BoundingBox,
    pub probs: Vec<f64>,
}

impl DetectionBox {
    /// Create a box with explicit class scores.
    pub fn new(bbox: BoundingBox, probs: Vec<f64>) -> Self {
        Self { bbox, probs }
    }

    /// Create a ground-truth box: weight 1.0 at `class_id`, 0 elsewhere.
    ///
    /// `class_id` must be below `num_classes`.
    pub fn ground_truth(bbox: BoundingBox, class_id: usize, num_classes: usize) -> Self {
        let mut probs = vec![0.0; num_classes];
        probs[class_id] = 1.0;
        Self { bbox, probs }
    }

    /// Create a single-class detection with `score` at `class_id`.
    pub fn single_class(bbox: BoundingBox, class_id: usize, score: f64, num_classes: usize) -> Self {
        let mut probs = vec![0.0; num_classes];
        probs[class_id] = score;
        Self { bbox, probs }
    }

    /// Number of class slots.
    pub fn num_classes(&self) -> usize {
        self.probs.len()
    }

    /// Index of the highest class score; the first one wins ties.
    pub fn best_class(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &p) in self.probs.iter().enumerate() {
            match best {
                Some((_, b)) if p <= b => {}
                _ => best = Some((i, p)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Highest class score, 0.0 for an empty vector.
    pub fn best_score(&self) -> f64 {
        self.best_class().map_or(0.0, |i| self.probs[i])
    }
}

/// Input geometry expected by a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageShape {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl ImageShape {
    /// Three-channel input of the given size.
    pub fn rgb(height: usize, width: usize) -> Self {
        Self {
            channels: 3,
            height,
            width,
        }
    }
}
