//! Raw-prediction decoders.
//!
//! A decoder turns one image's raw network output into a list of
//! [`DetectionBox`]es with normalized center-form boxes and per-class
//! probabilities. Grid decoders serve the YOLO family, default-box decoders
//! serve SSD.

pub mod default_box;
pub mod grid;

pub use default_box::{DefaultBox, DefaultBoxDecoder, DefaultBoxDecoderConfig};
pub use grid::{GridDecoder, GridDecoderConfig};

use crate::dataset::ModelKind;
use crate::error::Result;
use crate::types::{DetectionBox, RawPrediction};

/// A decoding strategy selected from the detector family.
#[derive(Debug, Clone)]
pub enum Decoder {
    Grid(GridDecoder),
    DefaultBox(DefaultBoxDecoder),
}

impl Decoder {
    /// Decoder for `kind` with the default priors/default-box settings.
    ///
    /// `num_classes` is the number of object classes; for SSD the decoder
    /// expects one extra background column.
    ///
    /// # Errors
    ///
    /// Fails if the thresholds or class count are invalid.
    pub fn for_model(
        kind: ModelKind,
        num_classes: usize,
        detection_threshold: f64,
        nms_threshold: f64,
    ) -> Result<Self> {
        let network_classes = kind.network_classes(num_classes);
        match kind {
            ModelKind::Yolo | ModelKind::TinyYolo => {
                let mut config = GridDecoderConfig::new(network_classes);
                config.detection_threshold = detection_threshold;
                config.nms_threshold = nms_threshold;
                Ok(Decoder::Grid(GridDecoder::new(config)?))
            }
            ModelKind::Ssd => {
                let mut config = DefaultBoxDecoderConfig::new(network_classes);
                config.confidence_threshold = detection_threshold;
                config.nms_threshold = nms_threshold;
                Ok(Decoder::DefaultBox(DefaultBoxDecoder::new(config)?))
            }
        }
    }

    /// Decode one image's raw prediction.
    pub fn decode(&self, raw: &RawPrediction) -> Result<Vec<DetectionBox>> {
        match self {
            Decoder::Grid(decoder) => decoder.decode(raw),
            Decoder::DefaultBox(decoder) => decoder.decode(raw),
        }
    }

    /// Length of the probability vectors this decoder emits.
    pub fn num_classes(&self) -> usize {
        match self {
            Decoder::Grid(decoder) => decoder.config().num_classes,
            Decoder::DefaultBox(decoder) => decoder.num_output_classes(),
        }
    }
}

impl From<GridDecoder> for Decoder {
    fn from(decoder: GridDecoder) -> Self {
        Decoder::Grid(decoder)
    }
}

impl From<DefaultBoxDecoder> for Decoder {
    fn from(decoder: DefaultBoxDecoder) -> Self {
        Decoder::DefaultBox(decoder)
    }
}
