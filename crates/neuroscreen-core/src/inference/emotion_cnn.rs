//! Seven-class facial emotion CNN.
//!
//! Small convolutional network trained on 100x100 RGB face crops:
//!
//! ```text
//! conv 32 -> bn -> conv 32 -> pool
//! conv 64 -> bn -> conv 64 -> pool
//! conv 128 -> bn -> pool
//! flatten -> dense 256 -> dense 7 (softmax)
//! ```
//!
//! Convolutions are unpadded and apply ReLU before batch normalization.

// Allow common ML code patterns
#![allow(clippy::cast_possible_truncation)]

use anyhow::{ensure, Result};
use candle_core::{Device, Module, ModuleT, Tensor};
use candle_nn::{batch_norm, conv2d, linear, BatchNorm, Conv2d, Conv2dConfig, Linear, VarBuilder};

use crate::domain::EmotionLabel;
use crate::ports::MultiClassifier;

/// Input width and height.
pub const INPUT_SIZE: usize = 100;

/// Batch normalization epsilon used during training.
const BN_EPS: f64 = 1e-3;

/// Spatial size before flattening:
/// 100 -> 98 -> 96 -> 48 -> 46 -> 44 -> 22 -> 20 -> 10.
const FEATURE_SIZE: usize = (((INPUT_SIZE - 4) / 2 - 4) / 2 - 2) / 2;

/// Flattened feature count: 10 * 10 * 128.
const FLAT_FEATURES: usize = FEATURE_SIZE * FEATURE_SIZE * 128;

/// Emotion classifier network.
pub struct EmotionCnn {
    conv1: Conv2d,
    bn1: BatchNorm,
    conv2: Conv2d,
    conv3: Conv2d,
    bn2: BatchNorm,
    conv4: Conv2d,
    conv5: Conv2d,
    bn3: BatchNorm,
    fc1: Linear,
    fc2: Linear,
    device: Device,
}

impl EmotionCnn {
    /// Builds the network from weights.
    ///
    /// # Errors
    ///
    /// Returns an error if a tensor is missing or has the wrong shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let device = vb.device().clone();
        let valid = Conv2dConfig::default();

        Ok(Self {
            conv1: conv2d(3, 32, 3, valid, vb.pp("conv1"))?,
            bn1: batch_norm(32, BN_EPS, vb.pp("bn1"))?,
            conv2: conv2d(32, 32, 3, valid, vb.pp("conv2"))?,
            conv3: conv2d(32, 64, 3, valid, vb.pp("conv3"))?,
            bn2: batch_norm(64, BN_EPS, vb.pp("bn2"))?,
            conv4: conv2d(64, 64, 3, valid, vb.pp("conv4"))?,
            conv5: conv2d(64, 128, 3, valid, vb.pp("conv5"))?,
            bn3: batch_norm(128, BN_EPS, vb.pp("bn3"))?,
            fc1: linear(FLAT_FEATURES, 256, vb.pp("fc1"))?,
            fc2: linear(256, EmotionLabel::COUNT, vb.pp("fc2"))?,
            device,
        })
    }
}

impl Module for EmotionCnn {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let x = self.conv1.forward(x)?.relu()?;
        let x = self.bn1.forward_t(&x, false)?;
        let x = self.conv2.forward(&x)?.relu()?;
        let x = x.max_pool2d(2)?;

        let x = self.conv3.forward(&x)?.relu()?;
        let x = self.bn2.forward_t(&x, false)?;
        let x = self.conv4.forward(&x)?.relu()?;
        let x = x.max_pool2d(2)?;

        let x = self.conv5.forward(&x)?.relu()?;
        let x = self.bn3.forward_t(&x, false)?;
        let x = x.max_pool2d(2)?;

        // Channel-last flatten to match the trained dense layer.
        let x = x.permute((0, 2, 3, 1))?.flatten_from(1)?;
        let x = self.fc1.forward(&x)?.relu()?;
        let x = self.fc2.forward(&x)?;

        candle_nn::ops::softmax(&x, 1)
    }
}

impl MultiClassifier for EmotionCnn {
    fn input_size(&self) -> u32 {
        INPUT_SIZE as u32
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn predict(&self, batch: &Tensor) -> Result<Vec<f32>> {
        let probs = self.forward(batch)?.flatten_all()?.to_vec1::<f32>()?;
        ensure!(
            probs.len() == EmotionLabel::COUNT,
            "expected {} class probabilities, got {}",
            EmotionLabel::COUNT,
            probs.len()
        );
        Ok(probs)
    }
}
