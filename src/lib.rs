//! # detection-fscore
//!
//! A Rust library for evaluating object detectors by precision, recall,
//! F-score and throughput over a labeled image set.
//!
//! The library covers the whole path from raw network output to metrics:
//! - **Decoding** of YOLO-style anchor grids and SSD-style default boxes
//! - **Non-maximum suppression** (greedy, per class)
//! - **Matching** of predictions to ground truth (first-fit, IoU > 0.5 and same class)
//! - **Streaming aggregation** of running precision/recall/F-score over chunks
//! - **Throughput** in frames per second per chunk
//!
//! ## Features
//!
//! - Built-in class lists for `TT100K_detection` and `Udacity`
//! - Plain-text ground-truth records (`class cx cy w h` per line)
//! - Pluggable inference via the [`model::InferenceModel`] trait, with an
//!   optional ONNX Runtime backend (`onnx` feature)
//! - Parallel preprocessing and matching with `rayon`
//!
//! ## Quick Start
//!
//! ```rust
//! use detection_fscore::matching::match_detections;
//! use detection_fscore::stats::RunningTally;
//! use detection_fscore::types::{BoundingBox, DetectionBox};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bbox = BoundingBox::new(0.5, 0.5, 0.2, 0.2);
//! let predictions = vec![DetectionBox::single_class(bbox, 0, 0.9, 3)];
//! let ground_truth = vec![DetectionBox::ground_truth(bbox, 0, 3)];
//!
//! let outcome = match_detections(&predictions, &ground_truth, 0.6, 0.5);
//! let tally = RunningTally::new().fold([&outcome]);
//!
//! println!("Precision: {:.4}", tally.precision());
//! println!("Recall: {:.4}", tally.recall()?);
//! println!("F-score: {:.4}", tally.f_score()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Running a full evaluation
//!
//! ```rust,no_run
//! use detection_fscore::dataset::{discover_images, Dataset, ModelKind};
//! use detection_fscore::decoder::Decoder;
//! use detection_fscore::evaluator::{EvaluationConfig, StreamingEvaluator};
//! use detection_fscore::model::InferenceModel;
//! use detection_fscore::preprocess::ImagePreprocessor;
//! use detection_fscore::report::format_chunk_report;
//!
//! # fn run(model: impl InferenceModel) -> detection_fscore::Result<()> {
//! let kind = ModelKind::TinyYolo;
//! let config = EvaluationConfig::default();
//! let decoder = Decoder::for_model(
//!     kind,
//!     Dataset::Udacity.num_classes(),
//!     config.detection_threshold,
//!     config.nms_threshold,
//! )?;
//! let preprocessor = ImagePreprocessor::square(320, kind.tensor_layout());
//!
//! let images = discover_images("data/udacity/valid")?;
//! let mut evaluator = StreamingEvaluator::new(model, preprocessor, decoder, config)?;
//! let summary = evaluator.run(&images, |chunk| println!("{}", format_chunk_report(chunk)))?;
//! println!("Final f_score = {}", summary.f_score);
//! # Ok(())
//! # }
//! ```
//!
//! ## Ground-truth format
//!
//! Every `image.jpg` has an `image.txt` next to it with one object per line,
//! coordinates normalized to the image:
//!
//! ```text
//! <class index> <center x> <center y> <width> <height>
//! ```

pub mod dataset;
pub mod decoder;
pub mod error;
pub mod evaluator;
pub mod loader;
pub mod matching;
pub mod metrics;
pub mod model;
pub mod nms;
pub mod preprocess;
pub mod report;
pub mod stats;
pub mod threshold;
pub mod types;

// Re-export commonly used types and functions
pub use dataset::{discover_images, Dataset, ModelKind};
pub use decoder::Decoder;
pub use error::{ErrorKind, EvalError, Result};
pub use evaluator::{ChunkReport, EvaluationConfig, EvaluationSummary, StreamingEvaluator};
pub use matching::{match_detections, MatchOutcome};
pub use model::InferenceModel;
pub use preprocess::{ImagePreprocessor, Preprocess, TensorLayout};
pub use stats::{RunningTally, ThroughputMeter};
pub use types::{BoundingBox, DetectionBox, RawPrediction};
