use image::{RgbImage, imageops};
use ndarray::Array4;

use super::ProviderError;
use super::config::PreprocessConfig;

/// Center-crop to a square, resize and normalize an RGB image into a `[1, 3, S, S]` tensor layout.
pub fn to_model_input(image: &RgbImage, config: &PreprocessConfig) -> Result<Array4<f32>, ProviderError> {
    let size = config.image.size;
    let square = center_square(image)?;
    let cropped = resize_square(&square, size, config);

    let side = size as usize;
    let mean = config.normalization.mean;
    let std = config.normalization.std;
    let mut input = Array4::<f32>::zeros((1, 3, side, side));

    for (x, y, pixel) in cropped.enumerate_pixels() {
        for c in 0..3 {
            let value = f32::from(pixel[c]) / 255.0;
            input[[0, c, y as usize, x as usize]] = (value - mean[c]) / std[c];
        }
    }

    Ok(input)
}

/// Split a wide image into `views` equal-width strips, left to right.
/// The last strip absorbs any remainder so the strips cover the full width.
pub fn panorama_views(image: &RgbImage, views: u32) -> Vec<RgbImage> {
    let (width, height) = image.dimensions();
    if views <= 1 || width < views {
        return vec![image.clone()];
    }

    let strip = width / views;
    (0..views)
        .map(|i| {
            let x = i * strip;
            let w = if i == views - 1 { width - x } else { strip };
            imageops::crop_imm(image, x, 0, w, height).to_image()
        })
        .collect()
}

/// Largest centered square of the source image. Cropping before resizing keeps
/// the intermediate buffer bounded by `size x size` for any aspect ratio.
fn center_square(image: &RgbImage) -> Result<RgbImage, ProviderError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ProviderError::Preprocessing("image has no pixels".into()));
    }

    let side = width.min(height);
    let x = (width - side) / 2;
    let y = (height - side) / 2;
    Ok(imageops::crop_imm(image, x, y, side, side).to_image())
}

fn resize_square(square: &RgbImage, size: u32, config: &PreprocessConfig) -> RgbImage {
    if square.width() == size {
        return square.clone();
    }
    imageops::resize(square, size, size, config.image.resize_method.filter())
}
