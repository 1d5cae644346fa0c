//! Shared inference utilities.

use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use image::imageops::FilterType;

/// Sigmoid activation function.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Index of the largest value. The first index wins ties; NaN never wins.
#[must_use]
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Converts an image to a `(1, 3, size, size)` tensor scaled to `[0, 1]`.
///
/// The image is converted to RGB and resized with nearest-neighbour
/// sampling, which is what the classifiers saw during training.
///
/// # Errors
///
/// Returns an error if tensor creation fails.
pub fn image_to_batch(image: &image::DynamicImage, size: u32, device: &Device) -> Result<Tensor> {
    let rgb = image
        .resize_exact(size, size, FilterType::Nearest)
        .to_rgb8();

    let data: Vec<f32> = rgb
        .pixels()
        .flat_map(|p| p.0.map(|c| f32::from(c) / 255.0))
        .collect();

    let side = size as usize;
    // Pixels arrive as HWC; convolutions expect NCHW.
    Tensor::from_vec(data, (1, side, side, 3), device)?
        .permute((0, 3, 1, 2))?
        .contiguous()
        .context("Failed to build input tensor")
}
