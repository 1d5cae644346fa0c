//! Batch analysis through the output and progress ports.

#![allow(clippy::unwrap_used)]

use std::fs;

use neuroscreen_core::modules::{AutismClassifier, EmotionClassifier};
use neuroscreen_core::{Analyzer, BatchSummary, EmotionLabel, FaceRegion, ProgressEvent};
use neuroscreen_test_support::{
    stub_analyzer, FailingFaceLocator, FixedFaceLocator, MockProgressSink, MockResultOutput,
    StubBinaryClassifier, StubMultiClassifier, SyntheticImageBuilder,
};

fn sad() -> Vec<f32> {
    let mut probs = vec![0.0; 7];
    probs[EmotionLabel::Sadness.index()] = 0.6;
    probs[EmotionLabel::Neutral.index()] = 0.4;
    probs
}

#[test]
fn test_batch_skips_undecodable_files() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![
        SyntheticImageBuilder::write(dir.path(), "a.png", &SyntheticImageBuilder::split(32, 32)),
        SyntheticImageBuilder::write(
            dir.path(),
            "b.jpg",
            &SyntheticImageBuilder::checkerboard(32, 32, 4),
        ),
        dir.path().join("broken.png"),
    ];
    fs::write(&inputs[2], b"not an image").unwrap();

    let output = MockResultOutput::new();
    let progress = MockProgressSink::new();
    let summary = stub_analyzer(0.3, sad(), None)
        .analyze_batch(&inputs, &output, &progress)
        .unwrap();

    assert_eq!(
        summary,
        BatchSummary {
            processed: 2,
            skipped: 1
        }
    );
    let records = output.records();
    assert_eq!(records.len(), 2);
    assert!(records
        .iter()
        .all(|r| r.emotion.label == EmotionLabel::Sadness));
    assert_eq!(output.flush_count(), 1);

    assert_eq!(progress.skipped_count(), 1);
    assert_eq!(progress.finished_counts(), Some((2, 1)));
    assert!(matches!(
        progress.events().first(),
        Some(ProgressEvent::Started {
            index: 0,
            total: Some(3),
            ..
        })
    ));
}

#[test]
fn test_detector_failure_skips_before_emotion() {
    let dir = tempfile::tempdir().unwrap();
    let image = SyntheticImageBuilder::uniform_gray(24, 24, 128);
    let inputs = vec![
        SyntheticImageBuilder::write(dir.path(), "one.png", &image),
        SyntheticImageBuilder::write(dir.path(), "two.png", &image),
    ];

    let emotion = StubMultiClassifier::new(sad());
    let calls = emotion.calls();
    let analyzer = Analyzer::new(
        Box::new(FailingFaceLocator),
        AutismClassifier::new(Box::new(StubBinaryClassifier::new(0.5))),
        EmotionClassifier::new(Box::new(emotion)),
    );

    let output = MockResultOutput::new();
    let progress = MockProgressSink::new();
    let summary = analyzer.analyze_batch(&inputs, &output, &progress).unwrap();

    assert_eq!(summary.processed, 0);
    assert_eq!(summary.skipped, 2);
    assert_eq!(*calls.lock().unwrap(), 0);
    assert!(output.records().is_empty());
    assert_eq!(output.flush_count(), 1);
    assert_eq!(progress.finished_counts(), Some((0, 2)));
}

#[test]
fn test_face_crop_written_for_jpeg_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kid.jpeg");
    let image = SyntheticImageBuilder::checkerboard(48, 48, 6);
    fs::write(&path, SyntheticImageBuilder::jpeg_bytes(&image)).unwrap();

    let emotion = StubMultiClassifier::new(sad());
    let calls = emotion.calls();
    let analyzer = Analyzer::new(
        Box::new(FixedFaceLocator(Some(FaceRegion::new(8, 8, 24, 24)))),
        AutismClassifier::new(Box::new(StubBinaryClassifier::new(0.9))),
        EmotionClassifier::new(Box::new(emotion)),
    );

    let output = MockResultOutput::new();
    let progress = MockProgressSink::new();
    analyzer
        .analyze_batch(&[path], &output, &progress)
        .unwrap();

    let records = output.records();
    let crop = dir.path().join("kid_face.jpeg");
    assert_eq!(records[0].face_path.as_deref(), Some(crop.as_path()));
    assert_eq!(records[0].emotion_path.as_deref(), Some(crop.as_path()));
    assert!(crop.exists());
    assert_eq!(*calls.lock().unwrap(), 1);
    assert_eq!(
        image::image_dimensions(&crop).unwrap(),
        (24, 24)
    );
}
