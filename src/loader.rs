//! Ground-truth label loading.
//!
//! A label record is a plain-text file with one object per line:
//!
//! ```text
//! <class index> <center x> <center y> <width> <height>
//! ```
//!
//! Coordinates are normalized to the image. An empty file describes an image
//! without objects.

use crate::error::{EvalError, Result};
use crate::types::{BoundingBox, DetectionBox};
use std::fs;
use std::path::Path;

/// Numbers expected on every label line.
const FIELDS_PER_LINE: usize = 5;

/// Load the ground-truth boxes of one image from a label file.
///
/// # Errors
///
/// Returns [`EvalError::GroundTruth`] if the file cannot be read or a line is
/// malformed, and [`EvalError::ClassOutOfRange`] for a class index outside
/// `0..num_classes`.
///
/// # Example
///
/// ```no_run
/// use detection_fscore::loader::load_labels;
///
/// let boxes = load_labels("images/frame_0001.txt", 3).unwrap();
/// println!("Loaded {} ground-truth boxes", boxes.len());
/// ```
pub fn load_labels<P: AsRef<Path>>(path: P, num_classes: usize) -> Result<Vec<DetectionBox>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| EvalError::GroundTruth {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    parse_labels(&text, path, num_classes)
}

/// Parse label text; `path` is only used in error messages.
///
/// Every box becomes a one-hot [`DetectionBox`] over `num_classes` classes,
/// in file order.
///
/// # Errors
///
/// Same as [`load_labels`], minus the read failure.
///
/// # Example
///
/// ```
/// use detection_fscore::loader::parse_labels;
/// use std::path::Path;
///
/// let text = "0 0.5 0.5 0.2 0.2\n2 0.1 0.1 0.05 0.05\n";
/// let boxes = parse_labels(text, Path::new("frame.txt"), 3).unwrap();
/// assert_eq!(boxes.len(), 2);
/// assert_eq!(boxes[1].best_class(), Some(2));
/// ```
pub fn parse_labels(text: &str, path: &Path, num_classes: usize) -> Result<Vec<DetectionBox>> {
    let mut boxes = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        if line.trim().is_empty() {
            continue;
        }

        let malformed = |reason: String| EvalError::GroundTruth {
            path: path.to_path_buf(),
            reason: format!("line {line_no}: {reason}"),
        };

        let values = line
            .split_whitespace()
            .map(|field| {
                field
                    .parse::<f64>()
                    .map_err(|_| malformed(format!("'{field}' is not a number")))
            })
            .collect::<Result<Vec<f64>>>()?;

        if values.len() != FIELDS_PER_LINE {
            return Err(malformed(format!(
                "expected {FIELDS_PER_LINE} values, found {}",
                values.len()
            )));
        }

        let raw_class = values[0];
        if !raw_class.is_finite() || raw_class.fract() != 0.0 {
            return Err(malformed(format!("class index {raw_class} is not an integer")));
        }
        let class_index = raw_class as i64;
        if class_index < 0 || class_index as usize >= num_classes {
            return Err(EvalError::ClassOutOfRange {
                path: path.to_path_buf(),
                line: line_no,
                class_index,
                num_classes,
            });
        }

        let bbox = BoundingBox::new(values[1], values[2], values[3], values[4]);
        if !bbox.is_valid() {
            return Err(malformed(format!(
                "box ({}, {}, {}, {}) needs finite values and positive size",
                bbox.x, bbox.y, bbox.width, bbox.height
            )));
        }

        boxes.push(DetectionBox::ground_truth(bbox, class_index as usize, num_classes));
    }

    Ok(boxes)
}
