//! ML inference engine using Candle.
//!
//! Provides model loading and the two screening networks:
//! - VGG16 binary classifier (autism screen)
//! - small CNN 7-class classifier (facial emotion)

mod device;
mod emotion_cnn;
mod loader;
mod utils;
mod vgg;

pub use device::get_device;
pub use emotion_cnn::{EmotionCnn, INPUT_SIZE as EMOTION_INPUT_SIZE};
pub use loader::{load_model, load_safetensors};
pub use utils::{argmax, image_to_batch, sigmoid};
pub use vgg::{VggBinaryClassifier, INPUT_SIZE as AUTISM_INPUT_SIZE};
