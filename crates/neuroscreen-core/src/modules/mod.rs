//! Classifier adapters and image helpers.
//!
//! Each adapter owns its preprocessing and turns raw model output into a
//! domain [`Classification`](crate::domain::Classification).

mod autism;
mod emotion;
mod face;

pub use autism::AutismClassifier;
pub use emotion::EmotionClassifier;
pub use face::{crop_face, crop_to_sibling, face_crop_path, load_image};
