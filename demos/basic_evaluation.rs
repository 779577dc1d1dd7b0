//! Basic evaluation example demonstrating core functionality.

use detection_fscore::decoder::{GridDecoder, GridDecoderConfig};
use detection_fscore::evaluator::{EvaluationConfig, StreamingEvaluator};
use detection_fscore::metrics::iou::calculate_iou;
use detection_fscore::report::{format_chunk_report, format_final_report};
use detection_fscore::{
    match_detections, BoundingBox, Decoder, DetectionBox, InferenceModel, Preprocess,
    RawPrediction,
};
use ndarray::{Array3, ArrayView4, Axis};
use std::path::Path;

/// Channels of a one-prior, two-class grid: tx ty tw th tc + 2 logits.
const CHANNELS: usize = 7;
const GRID: usize = 4;

/// Stand-in for a real network: every image gets one confident class-0 box
/// in grid cell (1, 2).
struct FixedDetector;

impl InferenceModel for FixedDetector {
    fn infer_batch(
        &mut self,
        batch: ArrayView4<'_, f32>,
    ) -> detection_fscore::Result<Vec<RawPrediction>> {
        let mut grid = Array3::<f32>::zeros((CHANNELS, GRID, GRID));
        grid.index_axis_mut(Axis(0), 4).fill(-20.0);
        grid[[4, 1, 2]] = 20.0;
        grid[[5, 1, 2]] = 20.0;
        Ok(vec![grid.into_dyn(); batch.len_of(Axis(0))])
    }
}

/// Images are never read; the detector ignores its input.
struct BlankImages;

impl Preprocess for BlankImages {
    fn load(&self, _path: &Path) -> detection_fscore::Result<Array3<f32>> {
        Ok(Array3::zeros((3, 8, 8)))
    }
}

fn grid_decoder() -> detection_fscore::Result<GridDecoder> {
    GridDecoder::new(GridDecoderConfig {
        priors: vec![(1.0, 1.0)],
        ..GridDecoderConfig::new(2)
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Detection F-score Example ===\n");

    // Example 1: IoU Calculation
    println!("1. IoU Calculation");
    let bbox1 = BoundingBox::new(0.30, 0.30, 0.40, 0.40);
    let bbox2 = BoundingBox::new(0.40, 0.40, 0.40, 0.40);
    println!("   IoU between overlapping boxes: {:.4}", calculate_iou(&bbox1, &bbox2));
    println!();

    // Example 2: Decode a raw grid prediction
    println!("2. Decoding a Grid Prediction");
    let decoder = grid_decoder()?;
    let raw = FixedDetector.infer_batch(Array3::<f32>::zeros((1, 1, 1)).insert_axis(Axis(0)).view())?;
    let detections = decoder.decode(&raw[0])?;
    for det in &detections {
        println!(
            "   class {:?} score {:.3} at ({:.3}, {:.3}) size {:.3}x{:.3}",
            det.best_class(),
            det.best_score(),
            det.bbox.x,
            det.bbox.y,
            det.bbox.width,
            det.bbox.height
        );
    }
    println!();

    // Example 3: Match against ground truth
    println!("3. Matching");
    let ground_truth = vec![
        DetectionBox::ground_truth(BoundingBox::new(0.625, 0.375, 0.25, 0.25), 0, 2),
        DetectionBox::ground_truth(BoundingBox::new(0.1, 0.9, 0.1, 0.1), 1, 2),
    ];
    let outcome = match_detections(&detections, &ground_truth, 0.6, 0.5);
    println!("   True positives: {}", outcome.true_positives);
    println!("   False positives: {}", outcome.false_positives());
    println!("   False negatives: {}", outcome.false_negatives());
    println!();

    // Example 4: Streaming evaluation over a labeled directory
    println!("4. Streaming Evaluation");
    let dir = std::env::temp_dir().join(format!("detection-fscore-demo-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    let mut images = Vec::new();
    for i in 0..5 {
        let image = dir.join(format!("frame_{i:03}.jpg"));
        let labels = if i % 2 == 0 {
            "0 0.625 0.375 0.25 0.25\n"
        } else {
            "0 0.625 0.375 0.25 0.25\n1 0.1 0.9 0.1 0.1\n"
        };
        std::fs::write(image.with_extension("txt"), labels)?;
        images.push(image);
    }

    let config = EvaluationConfig {
        chunk_size: 2,
        batch_size: 2,
        ..EvaluationConfig::default()
    };
    let decoder = Decoder::from(grid_decoder()?);
    let mut evaluator = StreamingEvaluator::new(FixedDetector, BlankImages, decoder, config)?;
    let summary = evaluator.run(&images, |chunk| println!("{}\n", format_chunk_report(chunk)))?;
    println!("{}", format_final_report(&summary));

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}
