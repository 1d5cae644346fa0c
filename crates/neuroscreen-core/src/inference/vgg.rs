//! VGG16-based binary classifier for the autism screen.
//!
//! The backbone is the standard VGG16 convolutional stack (13 3x3
//! convolutions in five blocks, each block followed by a 2x2 max pool)
//! topped with a two-layer dense head ending in a single sigmoid unit.
//!
//! Weights are read from safetensors in candle layout (convolution kernels
//! `OIHW`, dense kernels `out x in`). Tensor names follow the usual VGG16
//! naming: `block{b}_conv{i}.{weight,bias}`, then `fc1` and `fc2` for the head.

// Allow common ML code patterns
#![allow(clippy::cast_possible_truncation)]

use anyhow::{Context, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{conv2d, linear, Conv2d, Conv2dConfig, Linear, VarBuilder};

use super::sigmoid;
use crate::ports::BinaryClassifier;

/// Input width and height.
pub const INPUT_SIZE: usize = 224;

/// `(output channels, convolutions)` per VGG16 block.
const BLOCKS: [(usize, usize); 5] = [(64, 2), (128, 2), (256, 3), (512, 3), (512, 3)];

/// Units in the hidden dense layer.
const HIDDEN_UNITS: usize = 256;

/// Spatial size after the five pooling stages: 224 / 2^5.
const FEATURE_SIZE: usize = INPUT_SIZE >> BLOCKS.len();

/// Flattened backbone output: 7 * 7 * 512.
const FLAT_FEATURES: usize = FEATURE_SIZE * FEATURE_SIZE * 512;

/// VGG16 backbone with a binary dense head.
pub struct VggBinaryClassifier {
    blocks: Vec<Vec<Conv2d>>,
    fc1: Linear,
    fc2: Linear,
    device: Device,
}

impl VggBinaryClassifier {
    /// Builds the network from weights.
    ///
    /// # Errors
    ///
    /// Returns an error if a tensor is missing or has the wrong shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let device = vb.device().clone();
        let same = Conv2dConfig {
            padding: 1,
            ..Conv2dConfig::default()
        };

        let mut blocks = Vec::with_capacity(BLOCKS.len());
        let mut in_channels = 3;
        for (b, &(out_channels, convs)) in BLOCKS.iter().enumerate() {
            let mut layers = Vec::with_capacity(convs);
            for i in 0..convs {
                let name = format!("block{}_conv{}", b + 1, i + 1);
                layers.push(
                    conv2d(in_channels, out_channels, 3, same, vb.pp(&name))
                        .with_context(|| format!("Failed to load {name}"))?,
                );
                in_channels = out_channels;
            }
            blocks.push(layers);
        }

        let fc1 = linear(FLAT_FEATURES, HIDDEN_UNITS, vb.pp("fc1"))?;
        let fc2 = linear(HIDDEN_UNITS, 1, vb.pp("fc2"))?;

        Ok(Self {
            blocks,
            fc1,
            fc2,
            device,
        })
    }
}

impl Module for VggBinaryClassifier {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let mut x = x.clone();
        for block in &self.blocks {
            for conv in block {
                x = conv.forward(&x)?.relu()?;
            }
            x = x.max_pool2d(2)?;
        }

        // The head was trained on channel-last features, so flatten in HWC order.
        let x = x.permute((0, 2, 3, 1))?.flatten_from(1)?;

        let x = self.fc1.forward(&x)?.relu()?;

        // Logit output; dropout is inactive at inference.
        self.fc2.forward(&x)
    }
}

impl BinaryClassifier for VggBinaryClassifier {
    fn input_size(&self) -> u32 {
        INPUT_SIZE as u32
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn predict(&self, batch: &Tensor) -> Result<f32> {
        let logits = self.forward(batch)?.flatten_all()?.to_vec1::<f32>()?;
        let logit = logits
            .first()
            .copied()
            .context("Classifier returned no output")?;
        Ok(sigmoid(logit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_dimensions() {
        // 224 -> 112 -> 56 -> 28 -> 14 -> 7
        assert_eq!(FEATURE_SIZE, 7);
        assert_eq!(FLAT_FEATURES, 25_088);
    }

    #[test]
    fn test_block_layout_is_vgg16() {
        let convs: usize = BLOCKS.iter().map(|(_, n)| n).sum();
        assert_eq!(convs, 13);
        assert_eq!(BLOCKS.last().map(|(c, _)| *c), Some(512));
    }
}
