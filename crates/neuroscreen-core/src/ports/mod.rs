//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the domain core and the
//! models, detectors and outputs plugged into it.

mod classifier;
mod face_locator;
mod progress;
mod result_output;

pub use classifier::{BinaryClassifier, MultiClassifier};
pub use face_locator::FaceLocator;
pub use progress::{ProgressEvent, ProgressSink};
pub use result_output::ResultOutput;
