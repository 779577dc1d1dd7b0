use anyhow::{Context, Result};
use clap::Parser;
use detection_fscore::dataset::{discover_images, Dataset, ModelKind};
use detection_fscore::decoder::Decoder;
use detection_fscore::error::EvalError;
use detection_fscore::evaluator::{EvaluationConfig, StreamingEvaluator, DEFAULT_BATCH_SIZE, DEFAULT_CHUNK_SIZE};
use detection_fscore::model::InferenceModel;
use detection_fscore::preprocess::ImagePreprocessor;
use detection_fscore::report::{append_result_record, format_chunk_report, format_final_report, write_summary_json};
use detection_fscore::threshold::{DEFAULT_DETECTION_THRESHOLD, DEFAULT_NMS_THRESHOLD};
use std::path::{Path, PathBuf};
use tracing::info;

/// Evaluate precision, recall, F-score and fps of an object detector
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Detector family: yolo, tiny-yolo or ssd
    model_name: ModelKind,

    /// Dataset: TT100K_detection or Udacity
    dataset_name: Dataset,

    /// Exported model weights
    weights_file: PathBuf,

    /// Directory with the .jpg images and their .txt labels
    path_to_images: PathBuf,

    /// Images accumulated before each inference flush
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE, value_name = "COUNT")]
    chunk_size: usize,

    /// Images per inference call
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, value_name = "COUNT")]
    batch_size: usize,

    /// Detection confidence threshold (0.0 - 1.0)
    #[arg(long, default_value_t = DEFAULT_DETECTION_THRESHOLD, value_name = "THRESHOLD")]
    detection_threshold: f64,

    /// NMS IoU threshold (0.0 - 1.0)
    #[arg(long, default_value_t = DEFAULT_NMS_THRESHOLD, value_name = "THRESHOLD")]
    nms_threshold: f64,

    /// Side of the square model input in pixels
    #[arg(long, default_value_t = 320, value_name = "PIXELS")]
    input_size: usize,

    /// Also write the final summary as JSON
    #[arg(long, value_name = "FILE")]
    summary_json: Option<PathBuf>,
}

#[cfg(feature = "onnx")]
fn load_model(weights: &Path) -> detection_fscore::Result<Box<dyn InferenceModel>> {
    let model = detection_fscore::model::OnnxModel::load(weights)?;
    Ok(Box::new(model))
}

#[cfg(not(feature = "onnx"))]
fn load_model(weights: &Path) -> detection_fscore::Result<Box<dyn InferenceModel>> {
    Err(EvalError::Configuration(format!(
        "cannot load {}: built without an inference backend (rebuild with --features onnx)",
        weights.display()
    )))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = EvaluationConfig {
        chunk_size: args.chunk_size,
        batch_size: args.batch_size,
        detection_threshold: args.detection_threshold,
        nms_threshold: args.nms_threshold,
        ..EvaluationConfig::default()
    };
    config.validate()?;

    if !args.weights_file.is_file() {
        return Err(EvalError::Configuration(format!(
            "weights file {} not found",
            args.weights_file.display()
        ))
        .into());
    }

    let images = discover_images(&args.path_to_images)
        .with_context(|| format!("scanning {}", args.path_to_images.display()))?;

    info!(
        model = %args.model_name,
        dataset = %args.dataset_name,
        classes = args.dataset_name.num_classes(),
        images = images.len(),
        "configuration loaded"
    );

    let decoder = Decoder::for_model(
        args.model_name,
        args.dataset_name.num_classes(),
        config.detection_threshold,
        config.nms_threshold,
    )?;
    let preprocessor = ImagePreprocessor::square(args.input_size, args.model_name.tensor_layout());
    let model = load_model(&args.weights_file)?;

    let mut evaluator = StreamingEvaluator::new(model, preprocessor, decoder, config)?;
    let summary = evaluator.run(&images, |chunk| println!("{}", format_chunk_report(chunk)))?;

    println!("{}", format_final_report(&summary));

    let record = append_result_record(&args.weights_file, &summary)?;
    info!(path = %record.display(), "result record appended");

    if let Some(path) = &args.summary_json {
        write_summary_json(path, &summary)
            .with_context(|| format!("writing summary to {}", path.display()))?;
        info!(path = %path.display(), "summary written");
    }

    Ok(())
}
