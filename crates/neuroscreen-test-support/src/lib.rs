//! Test support utilities for neuroscreen.
//!
//! Provides stub models, synthetic image builders and a stub chat upstream
//! for testing the analysis pipeline and the HTTP service without real
//! weights or network access.
//!
//! # Example
//!
//! ```
//! use neuroscreen_test_support::{stub_analyzer, SyntheticImageBuilder};
//!
//! let image = SyntheticImageBuilder::split(64, 32);
//! let png = SyntheticImageBuilder::png_bytes(&image);
//! assert!(!png.is_empty());
//!
//! let analyzer = stub_analyzer(0.8, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0], None);
//! # let _ = analyzer;
//! ```

mod builders;
mod mocks;
mod upstream;

pub use builders::{sample_record, SyntheticImageBuilder};
pub use mocks::{
    stub_analyzer, FailingFaceLocator, FixedFaceLocator, MockProgressSink, MockResultOutput,
    StubBinaryClassifier, StubMultiClassifier,
};
pub use upstream::{CapturedRequest, StubUpstream};
