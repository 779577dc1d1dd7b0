//! Shared fixtures: a scripted model, a no-op preprocessor, SSD and grid
//! raw-output builders and scratch directories for label files.

#![allow(dead_code)]

use detection_fscore::decoder::{Decoder, GridDecoder, GridDecoderConfig};
use detection_fscore::evaluator::{EvaluationConfig, StreamingEvaluator};
use detection_fscore::{InferenceModel, ModelKind, Preprocess, RawPrediction, Result};
use ndarray::{Array2, Array3, ArrayView4, Axis};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Object classes used by the fixtures (SSD adds a background column).
pub const NUM_CLASSES: usize = 2;

/// Replays one canned prediction per image, in call order.
pub struct ScriptedModel {
    outputs: VecDeque<RawPrediction>,
    pub batch_sizes: Vec<usize>,
}

impl ScriptedModel {
    pub fn new(outputs: Vec<RawPrediction>) -> Self {
        Self {
            outputs: outputs.into(),
            batch_sizes: Vec::new(),
        }
    }
}

impl InferenceModel for ScriptedModel {
    fn infer_batch(&mut self, batch: ArrayView4<'_, f32>) -> Result<Vec<RawPrediction>> {
        let n = batch.len_of(Axis(0));
        self.batch_sizes.push(n);
        Ok((0..n).filter_map(|_| self.outputs.pop_front()).collect())
    }
}

/// Preprocessor that never touches the file system.
pub struct BlankImages;

impl Preprocess for BlankImages {
    fn load(&self, _path: &Path) -> Result<Array3<f32>> {
        Ok(Array3::zeros((4, 4, 3)))
    }
}

/// One SSD detection: `(class, cx, cy, w, h, score)`.
pub type SsdDetection = (usize, f32, f32, f32, f32, f32);

/// SSD raw output with embedded default boxes and zero offsets, so every
/// decoded box equals its default box.
pub fn ssd_raw(detections: &[SsdDetection]) -> RawPrediction {
    let conf_cols = NUM_CLASSES + 1;
    let cols = 4 + conf_cols + 8;
    let mut raw = Array2::<f32>::zeros((detections.len().max(1), cols));

    for (row, &(class_id, cx, cy, w, h, score)) in detections.iter().enumerate() {
        raw[[row, 4]] = 1.0 - score;
        raw[[row, 4 + 1 + class_id]] = score;
        let prior = [
            cx - w / 2.0,
            cy - h / 2.0,
            cx + w / 2.0,
            cy + h / 2.0,
            0.1,
            0.1,
            0.2,
            0.2,
        ];
        for (k, &v) in prior.iter().enumerate() {
            raw[[row, 4 + conf_cols + k]] = v;
        }
    }
    raw.into_dyn()
}

pub fn ssd_decoder(config: &EvaluationConfig) -> Decoder {
    Decoder::for_model(
        ModelKind::Ssd,
        NUM_CLASSES,
        config.detection_threshold,
        config.nms_threshold,
    )
    .unwrap()
}

pub fn evaluator(
    outputs: Vec<RawPrediction>,
    config: EvaluationConfig,
) -> StreamingEvaluator<ScriptedModel, BlankImages> {
    StreamingEvaluator::new(ScriptedModel::new(outputs), BlankImages, ssd_decoder(&config), config).unwrap()
}

/// Cells per side of the fixture grid.
pub const GRID_CELLS: usize = 5;

/// Two identical one-cell priors, so both anchors of a cell decode to the
/// same box.
pub const GRID_PRIORS: [(f64, f64); 2] = [(1.0, 1.0), (1.0, 1.0)];

/// One grid detection: `(class, anchor, row, col)`.
pub type GridDetection = (usize, usize, usize, usize);

/// Grid raw output `(B·(5+C), H, W)` with zero box offsets. A detection at
/// `(row, col)` decodes to a 0.2 x 0.2 box centered on that cell with
/// confidence and class probability close to 1; every other anchor is off.
pub fn grid_raw(detections: &[GridDetection]) -> RawPrediction {
    let stride = 5 + NUM_CLASSES;
    let mut raw = Array3::<f32>::zeros((GRID_PRIORS.len() * stride, GRID_CELLS, GRID_CELLS));
    for anchor in 0..GRID_PRIORS.len() {
        raw.index_axis_mut(Axis(0), anchor * stride + 4).fill(-20.0);
    }
    for &(class_id, anchor, row, col) in detections {
        let base = anchor * stride;
        raw[[base + 4, row, col]] = 20.0;
        raw[[base + 5 + class_id, row, col]] = 20.0;
    }
    raw.into_dyn()
}

pub fn grid_decoder(config: &EvaluationConfig) -> Decoder {
    let mut grid = GridDecoderConfig::new(NUM_CLASSES);
    grid.priors = GRID_PRIORS.to_vec();
    grid.detection_threshold = config.detection_threshold;
    grid.nms_threshold = config.nms_threshold;
    GridDecoder::new(grid).unwrap().into()
}

pub fn grid_evaluator(
    outputs: Vec<RawPrediction>,
    config: EvaluationConfig,
) -> StreamingEvaluator<ScriptedModel, BlankImages> {
    StreamingEvaluator::new(ScriptedModel::new(outputs), BlankImages, grid_decoder(&config), config).unwrap()
}

/// Scratch directory under the system temp dir, removed on drop.
pub struct ScratchDir {
    pub path: PathBuf,
}

impl ScratchDir {
    pub fn new(name: &str) -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "detection-fscore-{name}-{}-{n}",
            std::process::id()
        ));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    /// Create `<stem>.txt` with `labels` and return the matching `.jpg` path.
    pub fn image(&self, stem: &str, labels: &str) -> PathBuf {
        let image = self.path.join(format!("{stem}.jpg"));
        std::fs::write(image.with_extension("txt"), labels).unwrap();
        image
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}
