//! Analysis pipeline: face search, both classifiers and the combined result.

use std::path::{Path, PathBuf};

use candle_core::Device;
use image::DynamicImage;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, debug_span, warn};

use crate::detection::{DetectorConfig, HaarFaceLocator};
use crate::domain::{
    combined_confidence, reasoning, AnalysisRecord, Classification, EmotionLabel, FaceRegion,
};
use crate::error::AnalysisError;
use crate::modules::{crop_face, crop_to_sibling, load_image, AutismClassifier, EmotionClassifier};
use crate::ports::{FaceLocator, ProgressEvent, ProgressSink, ResultOutput};

/// Model files needed to build an [`Analyzer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    /// Autism classifier weights (safetensors).
    pub autism: PathBuf,
    /// Emotion classifier weights (safetensors).
    pub emotion: PathBuf,
    /// Haar cascade XML.
    pub face_cascade: PathBuf,
}

/// Counts from one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Images analyzed successfully.
    pub processed: usize,
    /// Images that failed and were left out of the output.
    pub skipped: usize,
}

/// Runs the full screening pipeline on a stored image.
///
/// All models are loaded up front and shared read-only, so one analyzer can
/// serve concurrent requests.
pub struct Analyzer {
    locator: Box<dyn FaceLocator>,
    autism: AutismClassifier,
    emotion: EmotionClassifier,
    save_crops: bool,
}

impl Analyzer {
    /// Assembles an analyzer from its parts. Face crops are saved by default.
    #[must_use]
    pub fn new(
        locator: Box<dyn FaceLocator>,
        autism: AutismClassifier,
        emotion: EmotionClassifier,
    ) -> Self {
        Self {
            locator,
            autism,
            emotion,
            save_crops: true,
        }
    }

    /// Loads every model from disk.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first file that is missing or invalid.
    pub fn from_files(
        files: &ModelFiles,
        detector: DetectorConfig,
        device: &Device,
    ) -> anyhow::Result<Self> {
        let locator = HaarFaceLocator::from_file(&files.face_cascade, detector)?;
        let autism = AutismClassifier::load(&files.autism, device)?;
        let emotion = EmotionClassifier::load(&files.emotion, device)?;
        Ok(Self::new(Box::new(locator), autism, emotion))
    }

    /// Whether face crops are written next to the analyzed file.
    ///
    /// When disabled the emotion classifier reads the crop from memory.
    #[must_use]
    pub const fn with_save_crops(mut self, save: bool) -> Self {
        self.save_crops = save;
        self
    }

    /// Analyzes the image stored at `stored`.
    ///
    /// `upload_name` is only echoed in the record.
    ///
    /// # Errors
    ///
    /// Fails if the image cannot be decoded, the face detector fails, or
    /// either classifier fails. A face crop that cannot be written is not an
    /// error: the full image is used instead. A crop that is written but
    /// cannot be read back is replaced by the in-memory crop.
    pub fn analyze(
        &self,
        stored: &Path,
        upload_name: &str,
    ) -> Result<AnalysisRecord, AnalysisError> {
        let _span = debug_span!("analyze", upload = upload_name).entered();

        let image = load_image(stored)?;
        debug!(width = image.width(), height = image.height(), "Decoded upload");

        let face = self.locator.locate(&image).map_err(AnalysisError::Detector)?;
        debug!(?face, "Face search finished");

        let (face_path, emotion_path, emotion) = match face {
            Some(region) if self.save_crops => match crop_to_sibling(stored, &image, region) {
                Ok(path) => {
                    let (emotion_path, emotion) = self.classify_saved_crop(&path, &image, region)?;
                    (Some(path), emotion_path, emotion)
                }
                Err(e) => {
                    warn!("Could not save face crop, using full image: {e:#}");
                    let emotion = self.emotion.classify_image(&image)?;
                    (None, Some(stored.to_path_buf()), emotion)
                }
            },
            Some(region) => {
                let input = crop_face(&image, region).unwrap_or_else(|| image.clone());
                (None, None, self.emotion.classify_image(&input)?)
            }
            None => (
                None,
                Some(stored.to_path_buf()),
                self.emotion.classify_image(&image)?,
            ),
        };

        let autism = self.autism.classify_image(&image)?;
        let combined = combined_confidence(autism.confidence, emotion.confidence);

        Ok(AnalysisRecord {
            upload_name: upload_name.to_owned(),
            stored_path: stored.to_path_buf(),
            face,
            face_path,
            emotion_path,
            autism,
            emotion,
            combined_confidence: combined,
            reasoning: reasoning(emotion.label),
            timestamp: now_rfc3339(),
        })
    }

    /// Classifies the crop written at `crop`. If it cannot be read back, the
    /// same region is cropped from `image` in memory instead.
    fn classify_saved_crop(
        &self,
        crop: &Path,
        image: &DynamicImage,
        region: FaceRegion,
    ) -> Result<(Option<PathBuf>, Classification<EmotionLabel>), AnalysisError> {
        match self.emotion.classify_path(crop) {
            Ok(emotion) => Ok((Some(crop.to_path_buf()), emotion)),
            Err(e @ AnalysisError::BadImage { .. }) => {
                warn!("Could not read back face crop, using in-memory crop: {e}");
                let input = crop_face(image, region).unwrap_or_else(|| image.clone());
                Ok((None, self.emotion.classify_image(&input)?))
            }
            Err(e) => Err(e),
        }
    }

    /// Analyzes each file in turn, streaming records to `output`.
    ///
    /// A file that cannot be analyzed is reported to `progress` as skipped
    /// and the batch carries on.
    ///
    /// # Errors
    ///
    /// Returns an error only if `output` fails.
    pub fn analyze_batch(
        &self,
        inputs: &[PathBuf],
        output: &dyn ResultOutput,
        progress: &dyn ProgressSink,
    ) -> anyhow::Result<BatchSummary> {
        let total = Some(inputs.len());
        let mut summary = BatchSummary::default();

        for (index, path) in inputs.iter().enumerate() {
            let name = path.display().to_string();
            progress.on_event(ProgressEvent::Started {
                path: name.clone(),
                index,
                total,
            });

            match self.analyze(path, &name) {
                Ok(record) => {
                    output.write(&record)?;
                    progress.on_event(ProgressEvent::Completed {
                        record: Box::new(record),
                    });
                    summary.processed += 1;
                }
                Err(e) => {
                    debug!("Skipping {name}: {e}");
                    progress.on_event(ProgressEvent::Skipped {
                        path: name,
                        reason: e.to_string(),
                    });
                    summary.skipped += 1;
                }
            }
        }

        output.flush()?;
        progress.on_event(ProgressEvent::Finished {
            processed: summary.processed,
            skipped: summary.skipped,
        });
        Ok(summary)
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
