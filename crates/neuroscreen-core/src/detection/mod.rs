//! Haar cascade face detection.
//!
//! A pure-Rust evaluator for OpenCV-trained frontal face cascades: grayscale
//! conversion, an image pyramid, integral images, staged boosted classifiers
//! and OpenCV-compatible rectangle grouping.

mod cascade;
mod grouping;
mod integral;
mod locator;

pub use cascade::{Cascade, WindowResult};
pub use grouping::{group_rectangles, Rect, GROUP_EPS};
pub use integral::{to_gray, IntegralImage};
pub use locator::{DetectorConfig, HaarFaceLocator};
