//! Built-in datasets, detector families and image discovery.

use crate::error::{EvalError, Result};
use crate::preprocess::TensorLayout;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Traffic-sign classes of the TT100K detection split.
pub const TT100K_CLASSES: [&str; 45] = [
    "i2", "i4", "i5", "il100", "il60", "il80", "io", "ip", "p10", "p11", "p12", "p19", "p23",
    "p26", "p27", "p3", "p5", "p6", "pg", "ph4", "ph4.5", "ph5", "pl100", "pl120", "pl20", "pl30",
    "pl40", "pl5", "pl50", "pl60", "pl70", "pl80", "pm20", "pm30", "pm55", "pn", "pne", "po",
    "pr40", "w13", "w32", "w55", "w57", "w59", "wo",
];

/// Classes of the Udacity driving dataset.
pub const UDACITY_CLASSES: [&str; 3] = ["Car", "Pedestrian", "Truck"];

/// Extension of the images picked up from the image directory.
pub const IMAGE_EXTENSION: &str = "jpg";

/// Extension of the per-image ground-truth records.
pub const LABEL_EXTENSION: &str = "txt";

/// A dataset with a fixed, ordered class list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dataset {
    Tt100kDetection,
    Udacity,
}

impl Dataset {
    /// Class names in label-index order.
    pub fn classes(&self) -> &'static [&'static str] {
        match self {
            Dataset::Tt100kDetection => &TT100K_CLASSES,
            Dataset::Udacity => &UDACITY_CLASSES,
        }
    }

    /// Number of object classes (background excluded).
    pub fn num_classes(&self) -> usize {
        self.classes().len()
    }

    /// Name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Tt100kDetection => "TT100K_detection",
            Dataset::Udacity => "Udacity",
        }
    }
}

impl FromStr for Dataset {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "TT100K_detection" => Ok(Dataset::Tt100kDetection),
            "Udacity" => Ok(Dataset::Udacity),
            other => Err(EvalError::Configuration(format!(
                "Dataset '{other}' not supported (use TT100K_detection or Udacity)"
            ))),
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Detector family; selects the decoding strategy and input layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    Yolo,
    TinyYolo,
    Ssd,
}

impl ModelKind {
    /// Name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Yolo => "yolo",
            ModelKind::TinyYolo => "tiny-yolo",
            ModelKind::Ssd => "ssd",
        }
    }

    /// Whether the raw output is an anchor grid (as opposed to default boxes).
    pub fn is_grid(&self) -> bool {
        matches!(self, ModelKind::Yolo | ModelKind::TinyYolo)
    }

    /// Input layout the family's networks consume.
    pub fn tensor_layout(&self) -> TensorLayout {
        if self.is_grid() {
            TensorLayout::ChannelsFirst
        } else {
            TensorLayout::ChannelsLast
        }
    }

    /// Class slots the network predicts for `dataset_classes` object
    /// classes; SSD adds background.
    pub fn network_classes(&self, dataset_classes: usize) -> usize {
        match self {
            ModelKind::Ssd => dataset_classes + 1,
            ModelKind::Yolo | ModelKind::TinyYolo => dataset_classes,
        }
    }
}

impl FromStr for ModelKind {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "yolo" => Ok(ModelKind::Yolo),
            "tiny-yolo" => Ok(ModelKind::TinyYolo),
            "ssd" => Ok(ModelKind::Ssd),
            other => Err(EvalError::Configuration(format!(
                "Model '{other}' not supported (use yolo, tiny-yolo or ssd)"
            ))),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// List the `.jpg` files directly inside `dir`, sorted by path.
///
/// # Errors
///
/// Fails if the directory cannot be read, or with
/// [`EvalError::EmptyDataset`] if it holds no `.jpg` file.
pub fn discover_images<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut images = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_jpg = path
            .extension()
            .is_some_and(|ext| ext == IMAGE_EXTENSION);
        if is_jpg && path.is_file() {
            images.push(path);
        }
    }

    if images.is_empty() {
        return Err(EvalError::EmptyDataset(format!(
            "{} does not contain any .{IMAGE_EXTENSION} file",
            dir.display()
        )));
    }

    images.sort();
    Ok(images)
}

/// Ground-truth record that belongs to `image`.
pub fn label_path_for(image: &Path) -> PathBuf {
    image.with_extension(LABEL_EXTENSION)
}
