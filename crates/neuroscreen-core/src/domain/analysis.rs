//! The combined result of one upload analysis.

use std::path::PathBuf;

use serde::Serialize;

use super::{AutismLabel, Classification, EmotionLabel, FaceRegion};

/// Result of analyzing one uploaded image with both classifiers.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRecord {
    /// Filename shown to the user.
    pub upload_name: String,
    /// Where the upload was stored.
    pub stored_path: PathBuf,
    /// Largest face found, in upload pixel coordinates.
    pub face: Option<FaceRegion>,
    /// Cropped face written next to the upload, if one was saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_path: Option<PathBuf>,
    /// File the emotion classifier read; `None` when it read an in-memory
    /// crop.
    pub emotion_path: Option<PathBuf>,
    /// Autism classifier outcome.
    pub autism: Classification<AutismLabel>,
    /// Emotion classifier outcome.
    pub emotion: Classification<EmotionLabel>,
    /// Mean of the two confidences, in percent.
    pub combined_confidence: f64,
    /// Explanation shown alongside the result.
    pub reasoning: String,
    /// Analysis time (RFC 3339).
    pub timestamp: String,
}

impl AnalysisRecord {
    /// Whether a face was found in the upload.
    #[must_use]
    pub const fn face_detected(&self) -> bool {
        self.face.is_some()
    }
}

/// Fixed explanation text referencing the detected emotion.
#[must_use]
pub fn reasoning(emotion: EmotionLabel) -> String {
    format!(
        "The detected emotion is {emotion}. \
         Using both emotion and facial markers provides better interpretability for the analysis."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasoning_mentions_label() {
        let text = reasoning(EmotionLabel::Happiness);
        assert!(text.starts_with("The detected emotion is Happiness. Using both"));
        assert!(text.ends_with("for the analysis."));
    }
}
