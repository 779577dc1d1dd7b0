//! Image preprocessing collaborator.

use crate::error::{EvalError, Result};
use crate::types::ImageShape;
use image::imageops::FilterType;
use ndarray::{stack, Array3, Array4, ArrayView3, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Memory layout of one preprocessed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TensorLayout {
    /// `(3, H, W)`
    ChannelsFirst,
    /// `(H, W, 3)`
    ChannelsLast,
}

/// Turns an image file into a model input tensor.
///
/// Implementations are shared across worker threads while a chunk is
/// preprocessed.
pub trait Preprocess: Sync {
    /// Load and normalize the image at `path`.
    fn load(&self, path: &Path) -> Result<Array3<f32>>;
}

/// Decode, resize (nearest neighbour) and scale RGB pixels to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePreprocessor {
    pub shape: ImageShape,
    pub layout: TensorLayout,
}

impl ImagePreprocessor {
    /// Square `size x size` RGB input in `layout`.
    pub fn square(size: usize, layout: TensorLayout) -> Self {
        Self {
            shape: ImageShape::rgb(size, size),
            layout,
        }
    }
}

impl Preprocess for ImagePreprocessor {
    fn load(&self, path: &Path) -> Result<Array3<f32>> {
        let ImageShape { height, width, .. } = self.shape;
        let (w, h) = match (u32::try_from(width), u32::try_from(height)) {
            (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
            _ => {
                return Err(EvalError::Configuration(format!(
                    "Invalid model input size {width}x{height}"
                )))
            }
        };

        let rgb = image::open(path)?
            .resize_exact(w, h, FilterType::Nearest)
            .to_rgb8();

        let pixel = |y: usize, x: usize, c: usize| {
            // x < width and y < height, both fit in u32
            f32::from(rgb.get_pixel(x as u32, y as u32)[c]) / 255.0
        };

        Ok(match self.layout {
            TensorLayout::ChannelsFirst => Array3::from_shape_fn((3, height, width), |(c, y, x)| pixel(y, x, c)),
            TensorLayout::ChannelsLast => Array3::from_shape_fn((height, width, 3), |(y, x, c)| pixel(y, x, c)),
        })
    }
}

/// Preprocess `paths` in parallel and stack them into one batch, in input order.
///
/// # Errors
///
/// Fails on the first image that cannot be loaded, or if the images do not
/// share one shape.
pub fn load_batch<P: Preprocess + ?Sized>(preprocessor: &P, paths: &[PathBuf]) -> Result<Array4<f32>> {
    let images = paths
        .par_iter()
        .map(|path| preprocessor.load(path))
        .collect::<Result<Vec<Array3<f32>>>>()?;

    if images.is_empty() {
        return Err(EvalError::EmptyDataset("no images to preprocess".to_string()));
    }

    let views: Vec<ArrayView3<'_, f32>> = images.iter().map(Array3::view).collect();
    Ok(stack(Axis(0), &views)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("detection-fscore-preprocess-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_image(dir: &Path, name: &str, color: [u8; 3]) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(8, 4, Rgb(color)).save(&path).unwrap();
        path
    }

    #[test]
    fn test_layouts() {
        let dir = scratch_dir("layouts");
        let path = write_image(&dir, "red.png", [255, 0, 51]);

        let chw = ImagePreprocessor::square(4, TensorLayout::ChannelsFirst).load(&path).unwrap();
        assert_eq!(chw.dim(), (3, 4, 4));
        assert!((chw[[0, 1, 1]] - 1.0).abs() < 1e-6);
        assert!((chw[[2, 3, 3]] - 0.2).abs() < 1e-6);

        let hwc = ImagePreprocessor::square(4, TensorLayout::ChannelsLast).load(&path).unwrap();
        assert_eq!(hwc.dim(), (4, 4, 3));
        assert_eq!(hwc[[0, 0, 1]], 0.0);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_load_batch_keeps_order() {
        let dir = scratch_dir("order");
        let paths = vec![
            write_image(&dir, "a.png", [0, 0, 0]),
            write_image(&dir, "b.png", [255, 255, 255]),
        ];

        let batch = load_batch(&ImagePreprocessor::square(2, TensorLayout::ChannelsFirst), &paths).unwrap();
        assert_eq!(batch.dim(), (2, 3, 2, 2));
        assert_eq!(batch[[0, 0, 0, 0]], 0.0);
        assert_eq!(batch[[1, 0, 0, 0]], 1.0);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_image() {
        let preprocessor = ImagePreprocessor::square(2, TensorLayout::ChannelsFirst);
        assert!(preprocessor.load(Path::new("/nonexistent/frame.jpg")).is_err());
    }
}
