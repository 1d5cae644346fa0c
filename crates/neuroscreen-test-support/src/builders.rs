//! Synthetic image and record builders for testing.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use neuroscreen_core::domain::{
    AnalysisRecord, AutismLabel, Classification, EmotionLabel,
};

/// Builder for creating synthetic test images.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    /// Creates a uniform gray image (no edges, never contains a face).
    #[must_use]
    pub fn uniform_gray(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([value])))
    }

    /// Creates an image whose left half is white and right half black.
    #[must_use]
    pub fn split(width: u32, height: u32) -> DynamicImage {
        let img = RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    /// Creates a high-contrast checkerboard pattern.
    #[must_use]
    pub fn checkerboard(width: u32, height: u32, cell_size: u32) -> DynamicImage {
        let img = GrayImage::from_fn(width, height, |x, y| {
            if (x / cell_size + y / cell_size) % 2 == 0 {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });
        DynamicImage::ImageLuma8(img)
    }

    /// Encodes an image as PNG bytes.
    ///
    /// # Panics
    ///
    /// Panics if encoding fails.
    #[must_use]
    pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
        Self::encode(image, ImageFormat::Png)
    }

    /// Encodes an image as JPEG bytes.
    ///
    /// # Panics
    ///
    /// Panics if encoding fails.
    #[must_use]
    pub fn jpeg_bytes(image: &DynamicImage) -> Vec<u8> {
        Self::encode(&DynamicImage::ImageRgb8(image.to_rgb8()), ImageFormat::Jpeg)
    }

    fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image
            .write_to(&mut buf, format)
            .unwrap_or_else(|e| panic!("failed to encode test image: {e}"));
        buf.into_inner()
    }

    /// Writes an image into `dir` and returns its path.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    #[must_use]
    pub fn write(dir: &Path, name: &str, image: &DynamicImage) -> PathBuf {
        let path = dir.join(name);
        let image = if name.ends_with(".jpg") || name.ends_with(".jpeg") {
            DynamicImage::ImageRgb8(image.to_rgb8())
        } else {
            image.clone()
        };
        image
            .save(&path)
            .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
        path
    }
}

/// Builds a plausible analysis record without running any model.
#[must_use]
pub fn sample_record(upload_name: &str) -> AnalysisRecord {
    AnalysisRecord {
        upload_name: upload_name.to_owned(),
        stored_path: PathBuf::from(format!("/uploads/{upload_name}")),
        face: None,
        face_path: None,
        emotion_path: Some(PathBuf::from(format!("/uploads/{upload_name}"))),
        autism: Classification {
            label: AutismLabel::NotDetected,
            confidence: 12.5,
        },
        emotion: Classification {
            label: EmotionLabel::Neutral,
            confidence: 81.25,
        },
        combined_confidence: 46.88,
        reasoning: neuroscreen_core::domain::reasoning(EmotionLabel::Neutral),
        timestamp: "2024-01-01T00:00:00Z".to_owned(),
    }
}
