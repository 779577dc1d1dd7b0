//! Error types for the detection-fscore library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for detection-fscore operations.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Broad classification of an [`EvalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad arguments, unknown dataset/model, empty image directory.
    Configuration,
    /// Missing or malformed ground truth.
    Data,
    /// The model collaborator failed or returned a malformed tensor.
    Inference,
    /// A metric was requested that is undefined for the accumulated counts.
    Arithmetic,
    /// Underlying I/O or codec failure.
    Io,
}

/// Error types that can occur during an evaluation run.
///
/// Every variant is fatal to the run: the aggregate metrics are only
/// meaningful over the complete image set.
#[derive(Error, Debug)]
pub enum EvalError {
    /// Invalid run configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid confidence or IoU threshold.
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// Nothing to evaluate.
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// Ground-truth label record could not be read or parsed.
    #[error("Invalid ground truth in {}: {reason}", path.display())]
    GroundTruth { path: PathBuf, reason: String },

    /// Ground-truth row refers to a class outside the configured class list.
    #[error(
        "Class index {class_index} on line {line} of {} is out of range (dataset has {num_classes} classes)",
        path.display()
    )]
    ClassOutOfRange {
        path: PathBuf,
        line: usize,
        class_index: i64,
        num_classes: usize,
    },

    /// The inference backend failed.
    #[error("Inference error: {0}")]
    Inference(String),

    /// A raw prediction tensor does not have the layout the decoder expects.
    #[error("Prediction shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// The inference backend returned a different number of outputs than inputs.
    #[error("Inference returned {got} predictions for {expected} images")]
    PredictionCount { expected: usize, got: usize },

    /// Recall requested with zero accumulated ground truth.
    #[error("Recall is undefined: no ground-truth boxes were accumulated")]
    UndefinedRecall,

    /// Error during I/O operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error while decoding an image.
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    /// Error during JSON serialization.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error while assembling a tensor.
    #[error("Tensor shape error: {0}")]
    ArrayError(#[from] ndarray::ShapeError),
}

impl EvalError {
    /// The broad kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::Configuration(_)
            | EvalError::InvalidThreshold(_)
            | EvalError::EmptyDataset(_) => ErrorKind::Configuration,
            EvalError::GroundTruth { .. } | EvalError::ClassOutOfRange { .. } => ErrorKind::Data,
            EvalError::Inference(_)
            | EvalError::ShapeMismatch { .. }
            | EvalError::PredictionCount { .. }
            | EvalError::ArrayError(_) => ErrorKind::Inference,
            EvalError::UndefinedRecall => ErrorKind::Arithmetic,
            EvalError::IoError(_) | EvalError::ImageError(_) | EvalError::JsonError(_) => {
                ErrorKind::Io
            }
        }
    }
}
