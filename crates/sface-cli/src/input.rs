//! Turn an aligned face image on disk into the backend's input tensor.

use std::path::Path;

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::RgbImage;
use sface_core::types::{ImageTensor, SFACE_INPUT_SIZE};

/// Load `path`, resize to 112×112 if needed and build a `(1, 112, 112, 3)`
/// BGR tensor in `[0, 1]`.
pub fn load_face(path: &Path) -> Result<ImageTensor> {
    let img = image::open(path)
        .with_context(|| format!("failed to open image {}", path.display()))?
        .to_rgb8();

    let size = SFACE_INPUT_SIZE as u32;
    let img = if img.dimensions() != (size, size) {
        tracing::warn!(
            path = %path.display(),
            width = img.width(),
            height = img.height(),
            "image is not 112x112, resizing; pass an aligned crop for best results"
        );
        image::imageops::resize(&img, size, size, FilterType::Triangle)
    } else {
        img
    };

    Ok(to_tensor(&img))
}

/// RGB pixels → BGR floats in `[0, 1]`, batch of one.
fn to_tensor(img: &RgbImage) -> ImageTensor {
    let (width, height) = img.dimensions();
    ImageTensor::from_shape_fn(
        (1, height as usize, width as usize, 3),
        |(_, y, x, c)| img.get_pixel(x as u32, y as u32)[2 - c] as f32 / 255.0,
    )
}
