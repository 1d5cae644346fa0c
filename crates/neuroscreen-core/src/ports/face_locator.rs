//! Face localization port.

use crate::domain::FaceRegion;

/// Port for finding the most prominent face in an image.
pub trait FaceLocator: Send + Sync {
    /// Returns the largest face region, or `None` if no face was found.
    ///
    /// Finding no face is a normal outcome and must not be reported as an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error only if the detector itself fails.
    fn locate(&self, image: &image::DynamicImage) -> anyhow::Result<Option<FaceRegion>>;
}
