//! Classifier ports.
//!
//! Both traits take a preprocessed `(1, 3, S, S)` tensor with values in
//! `[0, 1]`, where `S` is [`input_size`](BinaryClassifier::input_size).

use candle_core::{Device, Tensor};

/// A model producing the probability of a single positive class.
pub trait BinaryClassifier: Send + Sync {
    /// Side length of the square input image.
    fn input_size(&self) -> u32;

    /// Device the input tensor must live on.
    fn device(&self) -> &Device;

    /// Returns the positive-class probability for a single-image batch.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn predict(&self, batch: &Tensor) -> anyhow::Result<f32>;
}

/// A model producing a probability distribution over a fixed set of classes.
pub trait MultiClassifier: Send + Sync {
    /// Side length of the square input image.
    fn input_size(&self) -> u32;

    /// Device the input tensor must live on.
    fn device(&self) -> &Device;

    /// Returns one probability per class for a single-image batch.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn predict(&self, batch: &Tensor) -> anyhow::Result<Vec<f32>>;
}
