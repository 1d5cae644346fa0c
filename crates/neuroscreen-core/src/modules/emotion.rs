//! Facial emotion classifier.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use candle_core::Device;
use image::DynamicImage;
use tracing::debug;

use super::face::load_image;
use crate::domain::{to_percent, Classification, EmotionLabel};
use crate::error::AnalysisError;
use crate::inference::{argmax, image_to_batch, load_model, EmotionCnn};
use crate::ports::MultiClassifier;

const MODEL_NAME: &str = "emotion";

/// Seven-class emotion classifier.
///
/// The label is the arg-max class; confidence is that class's probability in
/// percent.
pub struct EmotionClassifier {
    model: Box<dyn MultiClassifier>,
}

impl EmotionClassifier {
    /// Wraps an existing model.
    #[must_use]
    pub fn new(model: Box<dyn MultiClassifier>) -> Self {
        Self { model }
    }

    /// Loads the emotion CNN from a safetensors file.
    ///
    /// # Errors
    ///
    /// Returns an error naming the file if the weights are missing or invalid.
    pub fn load(weights: impl AsRef<Path>, device: &Device) -> Result<Self> {
        let model = load_model(weights, device, EmotionCnn::new)?;
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
    ) -> Result<Classification<EmotionLabel>, AnalysisError> {
        let image = load_image(path)?;
        self.classify_image(&image)
    }

    /// Classifies a decoded image.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Model`] if inference fails, the output is not
    /// 7 values or the winning probability is outside `[0, 1]`.
    pub fn classify_image(
        &self,
        image: &DynamicImage,
    ) -> Result<Classification<EmotionLabel>, AnalysisError> {
        self.predict(image).map_err(|source| AnalysisError::Model {
            model: MODEL_NAME,
            source,
        })
    }

    fn predict(&self, image: &DynamicImage) -> Result<Classification<EmotionLabel>> {
        let batch = image_to_batch(image, self.model.input_size(), self.model.device())?;
        let probs = self.model.predict(&batch)?;
        ensure!(
            probs.len() == EmotionLabel::COUNT,
            "expected {} class probabilities, got {}",
            EmotionLabel::COUNT,
            probs.len()
        );

        let index = argmax(&probs).context("model returned no usable probability")?;
        let label = EmotionLabel::from_index(index).context("class index out of range")?;
        let confidence = probs[index];
        ensure!(
            confidence.is_finite() && (0.0..=1.0).contains(&confidence),
            "class probability {confidence} is outside [0, 1]"
        );
        debug!(%label, confidence, "Emotion classification");

        Ok(Classification {
            label,
            confidence: to_percent(confidence),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Tensor;
    use image::RgbImage;

    struct Fixed(Vec<f32>, Device);

    impl MultiClassifier for Fixed {
        fn input_size(&self) -> u32 {
            4
        }

        fn device(&self) -> &Device {
            &self.1
        }

        fn predict(&self, batch: &Tensor) -> Result<Vec<f32>> {
            assert_eq!(batch.dims(), &[1, 3, 4, 4]);
            Ok(self.0.clone())
        }
    }

    fn classify(probs: Vec<f32>) -> Result<Classification<EmotionLabel>, AnalysisError> {
        EmotionClassifier::new(Box::new(Fixed(probs, Device::Cpu)))
            .classify_image(&DynamicImage::ImageRgb8(RgbImage::new(9, 9)))
    }

    #[test]
    fn test_argmax_label() {
        let result = classify(vec![0.05, 0.05, 0.05, 0.6, 0.1, 0.1, 0.05])
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(result.label, EmotionLabel::Happiness);
        assert!((result.confidence - 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_tie_picks_lowest_index() {
        let result = classify(vec![0.1, 0.3, 0.3, 0.1, 0.1, 0.05, 0.05])
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(result.label, EmotionLabel::Fear);
    }

    #[test]
    fn test_wrong_class_count_is_model_error() {
        let err = classify(vec![0.5, 0.5]);
        assert!(matches!(err, Err(AnalysisError::Model { model: "emotion", .. })));
    }

    #[test]
    fn test_all_nan_is_model_error() {
        assert!(classify(vec![f32::NAN; 7]).is_err());
    }

    #[test]
    fn test_out_of_range_probability_is_model_error() {
        for winner in [1.5, f32::INFINITY] {
            let err = classify(vec![winner, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
            assert!(
                matches!(err, Err(AnalysisError::Model { model: "emotion", .. })),
                "{winner}"
            );
        }
        let err = classify(vec![-0.2, -0.5, -0.5, -0.5, -0.5, -0.5, -0.5]);
        assert!(matches!(err, Err(AnalysisError::Model { model: "emotion", .. })));
    }

    #[test]
    fn test_certain_prediction_is_full_confidence() {
        let result = classify(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0])
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(result.label, EmotionLabel::Neutral);
        assert!((result.confidence - 100.0).abs() < 1e-6);
    }
}
