//! Error taxonomy for the analysis pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while validating, storing or analyzing an upload.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The caller supplied an unacceptable upload. The message is safe to
    /// show to the client.
    #[error("{0}")]
    InvalidUpload(String),

    /// The stored file could not be decoded as an image.
    #[error("cannot decode image {}", path.display())]
    BadImage {
        /// File that failed to decode.
        path: PathBuf,
        /// Decoder error.
        #[source]
        source: image::ImageError,
    },

    /// The face detector itself failed (not the same as finding no face).
    #[error("face detection failed")]
    Detector(#[source] anyhow::Error),

    /// A classifier failed to produce a prediction.
    #[error("{model} classifier failed")]
    Model {
        /// Which classifier failed.
        model: &'static str,
        /// Underlying inference error.
        #[source]
        source: anyhow::Error,
    },

    /// Reading or writing the upload area failed.
    #[error("upload storage error")]
    Storage(#[from] std::io::Error),
}

impl AnalysisError {
    /// Whether the error was caused by client input rather than the server.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidUpload(_))
    }
}
