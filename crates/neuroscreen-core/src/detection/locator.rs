//! Multi-scale sliding-window face search.

use std::path::Path;

use anyhow::{ensure, Result};
use image::imageops::{self, FilterType};
use image::DynamicImage;

use super::cascade::{Cascade, WindowResult};
use super::grouping::{group_rectangles, Rect, GROUP_EPS};
use super::integral::{to_gray, IntegralImage};
use crate::domain::FaceRegion;
use crate::ports::FaceLocator;

/// Tuning for the pyramid scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Ratio between consecutive pyramid levels. Must be greater than 1.
    pub scale_factor: f64,
    /// Clusters need more than this many raw hits to be kept.
    pub min_neighbors: u32,
    /// Smallest face side in pixels; 0 means the cascade window.
    pub min_size: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            scale_factor: 1.3,
            min_neighbors: 5,
            min_size: 0,
        }
    }
}

/// [`FaceLocator`] backed by a Haar cascade.
#[derive(Debug, Clone)]
pub struct HaarFaceLocator {
    cascade: Cascade,
    config: DetectorConfig,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_u32(v: f64) -> u32 {
    v.round().max(0.0) as u32
}

impl HaarFaceLocator {
    /// Wraps an already-parsed cascade.
    ///
    /// # Errors
    ///
    /// Returns an error if `scale_factor` is not greater than 1.
    pub fn new(cascade: Cascade, config: DetectorConfig) -> Result<Self> {
        ensure!(
            config.scale_factor.is_finite() && config.scale_factor > 1.0,
            "scale_factor must be greater than 1, got {}",
            config.scale_factor
        );
        Ok(Self { cascade, config })
    }

    /// Loads the cascade XML at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cascade cannot be loaded or the config is
    /// invalid.
    pub fn from_file(path: impl AsRef<Path>, config: DetectorConfig) -> Result<Self> {
        let path = path.as_ref();
        let cascade = Cascade::load(path)?;
        tracing::info!(
            path = %path.display(),
            stages = cascade.stage_count(),
            "Loaded face cascade"
        );
        Self::new(cascade, config)
    }

    /// Returns every grouped detection in image coordinates.
    #[must_use]
    pub fn detect_all(&self, image: &DynamicImage) -> Vec<FaceRegion> {
        let gray = to_gray(image);
        let (img_w, img_h) = gray.dimensions();
        let (win_w, win_h) = self.cascade.window_size();
        let mut hits = Vec::new();

        let mut factor = 1.0_f64;
        loop {
            let scaled_w = round_u32(f64::from(img_w) / factor);
            let scaled_h = round_u32(f64::from(img_h) / factor);
            if scaled_w <= win_w || scaled_h <= win_h {
                break;
            }
            let face_w = round_u32(f64::from(win_w) * factor);
            let face_h = round_u32(f64::from(win_h) * factor);
            if face_w > img_w || face_h > img_h {
                break;
            }
            if face_w >= self.config.min_size && face_h >= self.config.min_size {
                let level = if scaled_w == img_w && scaled_h == img_h {
                    gray.clone()
                } else {
                    imageops::resize(&gray, scaled_w, scaled_h, FilterType::Triangle)
                };
                self.scan_level(&level, factor, (face_w, face_h), &mut hits);
            }
            factor *= self.config.scale_factor;
        }

        tracing::debug!(raw = hits.len(), "Cascade scan finished");

        group_rectangles(&hits, self.config.min_neighbors, GROUP_EPS)
            .into_iter()
            .filter_map(|r| {
                let region = FaceRegion::new(
                    u32::try_from(r.x.max(0)).ok()?,
                    u32::try_from(r.y.max(0)).ok()?,
                    u32::try_from(r.width).ok()?,
                    u32::try_from(r.height).ok()?,
                );
                region.clamp_to(img_w, img_h)
            })
            .collect()
    }

    fn scan_level(
        &self,
        level: &image::GrayImage,
        factor: f64,
        (face_w, face_h): (u32, u32),
        hits: &mut Vec<Rect>,
    ) {
        let integral = IntegralImage::new(level);
        let (win_w, win_h) = self.cascade.window_size();
        let range_w = level.width() - win_w;
        let range_h = level.height() - win_h;
        let step = if factor > 2.0 { 1 } else { 2 };

        for y in (0..range_h).step_by(step as usize) {
            let mut x = 0;
            while x < range_w {
                match self.cascade.evaluate(&integral, x, y) {
                    WindowResult::Accepted => {
                        #[allow(clippy::cast_possible_wrap)]
                        hits.push(Rect::new(
                            round_u32(f64::from(x) * factor) as i32,
                            round_u32(f64::from(y) * factor) as i32,
                            face_w as i32,
                            face_h as i32,
                        ));
                    }
                    // Neighbours of a first-stage reject are skipped.
                    WindowResult::RejectedFirstStage => x += step,
                    WindowResult::Rejected => {}
                }
                x += step;
            }
        }
    }
}

impl FaceLocator for HaarFaceLocator {
    fn locate(&self, image: &DynamicImage) -> Result<Option<FaceRegion>> {
        let faces = self.detect_all(image);
        tracing::debug!(faces = faces.len(), "Face detection finished");
        Ok(FaceRegion::largest(faces))
    }
}
