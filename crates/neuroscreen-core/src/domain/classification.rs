//! Classifier labels and results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Probability above which the autism classifier reports a positive label.
pub const AUTISM_DECISION_THRESHOLD: f32 = 0.5;

/// A single classifier outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification<L> {
    /// Predicted label.
    pub label: L,
    /// Confidence as a percentage in `[0, 100]`, rounded to two decimals.
    pub confidence: f64,
}

/// Output label of the autism classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutismLabel {
    /// Probability strictly above the decision threshold.
    #[serde(rename = "Autism Detected")]
    Detected,
    /// Probability at or below the decision threshold.
    #[serde(rename = "No Autism Detected")]
    NotDetected,
}

impl AutismLabel {
    /// Maps a raw sigmoid probability to a label.
    #[must_use]
    pub fn from_probability(probability: f32) -> Self {
        if probability > AUTISM_DECISION_THRESHOLD {
            Self::Detected
        } else {
            Self::NotDetected
        }
    }

    /// Human-readable label text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Detected => "Autism Detected",
            Self::NotDetected => "No Autism Detected",
        }
    }
}

impl fmt::Display for AutismLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output label of the 7-class emotion classifier.
///
/// The discriminant order is the class index order the network was trained
/// with. Reordering variants silently mislabels every prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmotionLabel {
    /// Class 0.
    Surprise,
    /// Class 1.
    Fear,
    /// Class 2.
    Disgust,
    /// Class 3.
    Happiness,
    /// Class 4.
    Sadness,
    /// Class 5.
    Anger,
    /// Class 6.
    Neutral,
}

impl EmotionLabel {
    /// All labels, indexed by network output position.
    pub const ALL: [Self; 7] = [
        Self::Surprise,
        Self::Fear,
        Self::Disgust,
        Self::Happiness,
        Self::Sadness,
        Self::Anger,
        Self::Neutral,
    ];

    /// Number of emotion classes.
    pub const COUNT: usize = Self::ALL.len();

    /// Returns the label for a network output index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns the network output index of this label.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Label text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Surprise => "Surprise",
            Self::Fear => "Fear",
            Self::Disgust => "Disgust",
            Self::Happiness => "Happiness",
            Self::Sadness => "Sadness",
            Self::Anger => "Anger",
            Self::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rounds to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Converts a `[0, 1]` probability to a percentage rounded to two decimals.
#[must_use]
pub fn to_percent(probability: f32) -> f64 {
    round2(f64::from(probability) * 100.0)
}

/// Arithmetic mean of two percentage confidences, rounded to two decimals.
#[must_use]
pub fn combined_confidence(first: f64, second: f64) -> f64 {
    round2((first + second) / 2.0)
}
