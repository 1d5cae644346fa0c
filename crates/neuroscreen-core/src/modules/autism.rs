//! Autism screening classifier.
//!
//! Wraps a [`BinaryClassifier`] with the image preprocessing and decision
//! rule the model was trained with: nearest-neighbour resize to the model's
//! input size, RGB scaled to `[0, 1]`, positive label strictly above 0.5.

use std::path::Path;

use anyhow::{anyhow, Result};
use candle_core::Device;
use image::DynamicImage;
use tracing::debug;

use super::face::load_image;
use crate::domain::{to_percent, AutismLabel, Classification};
use crate::error::AnalysisError;
use crate::inference::{image_to_batch, load_model, VggBinaryClassifier};
use crate::ports::BinaryClassifier;

const MODEL_NAME: &str = "autism";

/// Binary autism screening classifier.
pub struct AutismClassifier {
    model: Box<dyn BinaryClassifier>,
}

impl AutismClassifier {
    /// Wraps an existing model.
    #[must_use]
    pub fn new(model: Box<dyn BinaryClassifier>) -> Self {
        Self { model }
    }

    /// Loads the VGG16 network from a safetensors file.
    ///
    /// # Errors
    ///
    /// Returns an error naming the file if the weights are missing or invalid.
    pub fn load(weights: impl AsRef<Path>, device: &Device) -> Result<Self> {
        let model = load_model(weights, device, VggBinaryClassifier::new)?;
        Ok(Self::new(Box::new(model)))
    }

    /// Classifies the image stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::BadImage`] if the file cannot be decoded and
    /// [`AnalysisError::Model`] if inference fails.
    pub fn classify_path(
        &self,
        path: &Path,
    ) -> Result<Classification<AutismLabel>, AnalysisError> {
        let image = load_image(path)?;
        self.classify_image(&image)
    }

    /// Classifies a decoded image.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Model`] if inference fails or the model
    /// returns something that is not a probability.
    pub fn classify_image(
        &self,
        image: &DynamicImage,
    ) -> Result<Classification<AutismLabel>, AnalysisError> {
        let probability = self.probability(image).map_err(|source| AnalysisError::Model {
            model: MODEL_NAME,
            source,
        })?;
        let label = AutismLabel::from_probability(probability);
        debug!(probability, %label, "Autism classification");
        Ok(Classification {
            label,
            confidence: to_percent(probability),
        })
    }

    fn probability(&self, image: &DynamicImage) -> Result<f32> {
        let batch = image_to_batch(image, self.model.input_size(), self.model.device())?;
        let p = self.model.predict(&batch)?;
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(anyhow!("model returned {p}, expected a probability"));
        }
        Ok(p)
    }
}
