//! Grayscale conversion and summed-area tables.

use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::integral_image::{integral_image, integral_squared_image};

/// Converts to 8-bit luma with BT.601 weights in 14-bit fixed point.
#[must_use]
pub fn to_gray(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = (u32::from(r) * 4899 + u32::from(g) * 9617 + u32::from(b) * 1868 + 8192) >> 14;
        #[allow(clippy::cast_possible_truncation)]
        Luma([luma.min(255) as u8])
    })
}

/// Integral and squared-integral images of a grayscale image.
///
/// Both tables come from `imageproc` and are `(width + 1) x (height + 1)`
/// with a zero first row and column.
#[derive(Debug, Clone)]
pub struct IntegralImage {
    sum: Table,
    sq_sum: Table,
}

type Table = ImageBuffer<Luma<u64>, Vec<u64>>;

impl IntegralImage {
    /// Builds the tables for `gray`.
    #[must_use]
    pub fn new(gray: &GrayImage) -> Self {
        Self {
            sum: integral_image::<_, u64>(gray),
            sq_sum: integral_squared_image::<_, u64>(gray),
        }
    }

    /// Sum of pixel values in the rectangle.
    #[must_use]
    pub fn sum(&self, x: u32, y: u32, width: u32, height: u32) -> f64 {
        rect(&self.sum, x, y, width, height)
    }

    /// Sum of squared pixel values in the rectangle.
    #[must_use]
    pub fn squared_sum(&self, x: u32, y: u32, width: u32, height: u32) -> f64 {
        rect(&self.sq_sum, x, y, width, height)
    }
}

/// Four-corner lookup over an integral table.
#[allow(clippy::cast_precision_loss)]
fn rect(table: &Table, x: u32, y: u32, width: u32, height: u32) -> f64 {
    let at = |cx: u32, cy: u32| table.get_pixel(cx, cy).0[0];
    let (x1, y1) = (x + width, y + height);
    (at(x1, y1) + at(x, y) - at(x1, y) - at(x, y1)) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use imageproc::integral_image::sum_image_pixels;

    #[test]
    fn test_rect_sums() {
        let gray = GrayImage::from_fn(4, 3, |x, y| Luma([u8::try_from(x + 4 * y).unwrap_or(0)]));
        let ii = IntegralImage::new(&gray);
        // Whole image: 0 + 1 + ... + 11
        assert!((ii.sum(0, 0, 4, 3) - 66.0).abs() < f64::EPSILON);
        // Middle 2x2: 5 + 6 + 9 + 10
        assert!((ii.sum(1, 1, 2, 2) - 30.0).abs() < f64::EPSILON);
        assert!((ii.squared_sum(1, 1, 2, 2) - 242.0).abs() < f64::EPSILON);
        assert!(ii.sum(2, 2, 0, 0).abs() < f64::EPSILON);
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn test_rect_matches_inclusive_pixel_sums() {
        let gray = GrayImage::from_fn(7, 5, |x, y| {
            Luma([u8::try_from((x * 37 + y * 11) % 256).unwrap_or(0)])
        });
        let ii = IntegralImage::new(&gray);
        let table = integral_image::<_, u64>(&gray);
        for (x, y, w, h) in [(0, 0, 7, 5), (2, 1, 3, 4), (6, 4, 1, 1)] {
            let expected = sum_image_pixels(&table, x, y, x + w - 1, y + h - 1)[0];
            assert!((ii.sum(x, y, w, h) - expected as f64).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_gray_weights() {
        let rgb = RgbImage::from_fn(3, 1, |x, _| match x {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            _ => Rgb([255, 255, 255]),
        });
        let gray = to_gray(&DynamicImage::ImageRgb8(rgb));
        assert_eq!(gray.get_pixel(0, 0).0[0], 76);
        assert_eq!(gray.get_pixel(1, 0).0[0], 150);
        assert_eq!(gray.get_pixel(2, 0).0[0], 255);
    }
}
