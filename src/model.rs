//! Inference collaborator.
//!
//! The evaluator treats the network as a black box: given a batch of
//! preprocessed images it returns one [`RawPrediction`] per image, in batch
//! order.

use crate::error::Result;
use crate::types::RawPrediction;
use ndarray::ArrayView4;

/// A detector that turns a batch of images into raw per-image predictions.
pub trait InferenceModel {
    /// Run the model on `batch` (images stacked along axis 0).
    ///
    /// Implementations must return exactly one prediction per image.
    fn infer_batch(&mut self, batch: ArrayView4<'_, f32>) -> Result<Vec<RawPrediction>>;
}

impl<M: InferenceModel + ?Sized> InferenceModel for Box<M> {
    fn infer_batch(&mut self, batch: ArrayView4<'_, f32>) -> Result<Vec<RawPrediction>> {
        (**self).infer_batch(batch)
    }
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxModel;

#[cfg(feature = "onnx")]
mod onnx {
    use super::InferenceModel;
    use crate::error::{EvalError, Result};
    use crate::types::RawPrediction;
    use ndarray::{ArrayD, ArrayView4, Axis, IxDyn};
    use ort::session::Session;
    use ort::value::Tensor;
    use std::path::Path;
    use tracing::debug;

    fn inference_error(e: ort::Error) -> EvalError {
        EvalError::Inference(e.to_string())
    }

    /// ONNX Runtime backend; the first graph output is the raw prediction.
    pub struct OnnxModel {
        session: Session,
    }

    impl OnnxModel {
        /// Load an exported detector from `path`.
        ///
        /// # Errors
        ///
        /// Returns [`EvalError::Inference`] if the runtime cannot load the graph.
        pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
            let path = path.as_ref();
            let session = Session::builder()
                .and_then(|builder| builder.commit_from_file(path))
                .map_err(inference_error)?;

            debug!(weights = %path.display(), "loaded ONNX model");
            Ok(Self { session })
        }
    }

    impl InferenceModel for OnnxModel {
        fn infer_batch(&mut self, batch: ArrayView4<'_, f32>) -> Result<Vec<RawPrediction>> {
            let input = Tensor::from_array(batch.to_owned()).map_err(inference_error)?;
            let outputs = self
                .session
                .run(ort::inputs![input])
                .map_err(inference_error)?;

            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(inference_error)?;

            let dims = shape
                .iter()
                .map(|&d| {
                    usize::try_from(d).map_err(|_| EvalError::ShapeMismatch {
                        expected: "non-negative output dimensions".to_string(),
                        got: format!("{:?}", &shape[..]),
                    })
                })
                .collect::<Result<Vec<usize>>>()?;

            if dims.is_empty() {
                return Err(EvalError::ShapeMismatch {
                    expected: "batched output (N, ...)".to_string(),
                    got: "scalar".to_string(),
                });
            }

            let output = ArrayD::from_shape_vec(IxDyn(&dims), data.to_vec())?;
            Ok(output
                .axis_iter(Axis(0))
                .map(|prediction| prediction.to_owned())
                .collect())
        }
    }
}
