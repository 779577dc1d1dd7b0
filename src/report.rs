//! Text reports and persisted results.

use crate::error::Result;
use crate::evaluator::{ChunkReport, EvaluationSummary};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File the final result record is appended to, next to the weights file.
pub const RESULT_FILE_NAME: &str = "evaluation.txt";

const RULE: &str = "-----------------------------------";

fn format_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "undefined".to_string(), |v| v.to_string())
}

/// Report printed after every chunk.
///
/// ```
/// use detection_fscore::evaluator::ChunkReport;
/// use detection_fscore::report::format_chunk_report;
/// use detection_fscore::stats::RunningTally;
///
/// let report = ChunkReport {
///     index: 0,
///     images: 4,
///     seconds: 0.5,
///     fps: 8.0,
///     tally: RunningTally::default(),
///     precision: 0.0,
///     recall: None,
///     f_score: None,
/// };
/// let text = format_chunk_report(&report);
/// assert!(text.starts_with("4 images predicted in 0.50000 seconds. 8.00000 fps"));
/// assert!(text.contains("Running Recall     = undefined"));
/// ```
pub fn format_chunk_report(report: &ChunkReport) -> String {
    format!(
        "{} images predicted in {:.5} seconds. {:.5} fps\n\
         Running Precision = {}\n\
         Running Recall     = {}\n\
         Running F-score    = {}",
        report.images,
        report.seconds,
        report.fps,
        report.precision,
        format_metric(report.recall),
        format_metric(report.f_score),
    )
}

/// Report printed once the run is complete.
pub fn format_final_report(summary: &EvaluationSummary) -> String {
    format!(
        "{RULE}\n{RULE}\n{}\n{RULE}\n{RULE}",
        result_lines(summary).join("\n")
    )
}

fn result_lines(summary: &EvaluationSummary) -> [String; 4] {
    [
        format!("Final precision = {}", summary.precision),
        format!("Final recall = {}", summary.recall),
        format!("Final f_score = {}", summary.f_score),
        format!("Average fps = {}", summary.mean_fps),
    ]
}

/// Path of the result record for a weights file.
pub fn result_path_for(weights: &Path) -> PathBuf {
    weights
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(RESULT_FILE_NAME)
}

/// Append the final metrics to `evaluation.txt` next to `weights`.
///
/// Returns the path written to.
///
/// # Errors
///
/// Fails if the file cannot be opened or written.
pub fn append_result_record(weights: &Path, summary: &EvaluationSummary) -> Result<PathBuf> {
    let path = result_path_for(weights);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    for line in result_lines(summary) {
        writeln!(file, "{line}")?;
    }
    Ok(path)
}

/// Serialize `summary` as pretty-printed JSON to `path`.
///
/// # Errors
///
/// Fails if the file cannot be created or written.
pub fn write_summary_json(path: &Path, summary: &EvaluationSummary) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
