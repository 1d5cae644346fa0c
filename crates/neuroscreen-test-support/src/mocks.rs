//! Stub models and mock implementations of core port traits.

use std::sync::{Arc, Mutex, PoisonError};

use candle_core::{Device, Tensor};
use image::DynamicImage;
use neuroscreen_core::domain::{AnalysisRecord, FaceRegion};
use neuroscreen_core::modules::{AutismClassifier, EmotionClassifier};
use neuroscreen_core::ports::{
    BinaryClassifier, FaceLocator, MultiClassifier, ProgressEvent, ProgressSink, ResultOutput,
};
use neuroscreen_core::Analyzer;

/// Input side length used by the stub classifiers.
const STUB_INPUT: u32 = 8;

/// Binary classifier that always answers the same probability.
pub struct StubBinaryClassifier {
    probability: f32,
    device: Device,
}

impl StubBinaryClassifier {
    /// Creates a stub answering `probability`.
    #[must_use]
    pub const fn new(probability: f32) -> Self {
        Self {
            probability,
            device: Device::Cpu,
        }
    }
}

impl BinaryClassifier for StubBinaryClassifier {
    fn input_size(&self) -> u32 {
        STUB_INPUT
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn predict(&self, _batch: &Tensor) -> anyhow::Result<f32> {
        Ok(self.probability)
    }
}

/// Multi-class classifier that always answers the same distribution and
/// counts how often it was asked.
pub struct StubMultiClassifier {
    probabilities: Vec<f32>,
    device: Device,
    calls: Arc<Mutex<usize>>,
}

impl StubMultiClassifier {
    /// Creates a stub answering `probabilities`.
    #[must_use]
    pub fn new(probabilities: Vec<f32>) -> Self {
        Self {
            probabilities,
            device: Device::Cpu,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Shared call counter, readable after the stub is moved into a
    /// classifier.
    #[must_use]
    pub fn calls(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.calls)
    }
}

impl MultiClassifier for StubMultiClassifier {
    fn input_size(&self) -> u32 {
        STUB_INPUT
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn predict(&self, _batch: &Tensor) -> anyhow::Result<Vec<f32>> {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(self.probabilities.clone())
    }
}

/// Face locator returning a fixed answer for every image.
pub struct FixedFaceLocator(pub Option<FaceRegion>);

impl FaceLocator for FixedFaceLocator {
    fn locate(&self, _image: &DynamicImage) -> anyhow::Result<Option<FaceRegion>> {
        Ok(self.0)
    }
}

/// Face locator that always fails.
pub struct FailingFaceLocator;

impl FaceLocator for FailingFaceLocator {
    fn locate(&self, _image: &DynamicImage) -> anyhow::Result<Option<FaceRegion>> {
        anyhow::bail!("detector unavailable")
    }
}

/// Builds an analyzer from stubs.
///
/// `emotion` must hold one probability per emotion class.
#[must_use]
pub fn stub_analyzer(
    autism_probability: f32,
    emotion: Vec<f32>,
    face: Option<FaceRegion>,
) -> Analyzer {
    Analyzer::new(
        Box::new(FixedFaceLocator(face)),
        AutismClassifier::new(Box::new(StubBinaryClassifier::new(autism_probability))),
        EmotionClassifier::new(Box::new(StubMultiClassifier::new(emotion))),
    )
}

/// Mock implementation of `ResultOutput` for testing.
///
/// Captures records for later assertions.
pub struct MockResultOutput {
    records: Arc<Mutex<Vec<AnalysisRecord>>>,
    flush_count: Arc<Mutex<usize>>,
}

impl MockResultOutput {
    /// Creates a new mock output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            flush_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns all captured records.
    #[must_use]
    pub fn records(&self) -> Vec<AnalysisRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of times `flush()` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockResultOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultOutput for MockResultOutput {
    fn write(&self, record: &AnalysisRecord) -> anyhow::Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
pub struct MockProgressSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of `Skipped` events.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Skipped { .. }))
            .count()
    }

    /// Returns the final counts from the `Finished` event, if any.
    #[must_use]
    pub fn finished_counts(&self) -> Option<(usize, usize)> {
        self.events().iter().find_map(|e| match e {
            ProgressEvent::Finished { processed, skipped } => Some((*processed, *skipped)),
            _ => None,
        })
    }
}

impl Default for MockProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use neuroscreen_core::domain::EmotionLabel;

    #[test]
    fn test_stub_multi_counts_calls() {
        let stub = StubMultiClassifier::new(vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let calls = stub.calls();
        let batch = Tensor::zeros((1, 3, 8, 8), candle_core::DType::F32, &Device::Cpu).unwrap();
        stub.predict(&batch).unwrap();
        stub.predict(&batch).unwrap();
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[test]
    fn test_stub_analyzer_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.png");
        DynamicImage::new_rgb8(16, 16).save(&path).unwrap();

        let mut probs = vec![0.0; 7];
        probs[EmotionLabel::Anger.index()] = 1.0;
        let record = stub_analyzer(0.2, probs, None).analyze(&path, "x.png").unwrap();
        assert_eq!(record.emotion.label, EmotionLabel::Anger);
        assert!(!record.face_detected());
    }

    #[test]
    fn test_mock_progress_sink() {
        let sink = MockProgressSink::new();
        sink.on_event(ProgressEvent::Skipped {
            path: "a.png".into(),
            reason: "bad".into(),
        });
        sink.on_event(ProgressEvent::Finished {
            processed: 0,
            skipped: 1,
        });
        assert_eq!(sink.skipped_count(), 1);
        assert_eq!(sink.finished_counts(), Some((0, 1)));
    }
}
