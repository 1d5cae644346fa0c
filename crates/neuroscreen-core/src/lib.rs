//! NeuroScreen Core - Domain logic, models and the analysis pipeline
//!
//! This crate contains the domain types, the ports models plug into, the
//! candle networks for the autism and emotion classifiers, a Haar cascade
//! face locator, the upload analysis pipeline and the rule-based ADHD scorer.

pub mod analyzer;
pub mod chat;
pub mod detection;
pub mod domain;
pub mod error;
pub mod inference;
pub mod modules;
pub mod ports;

pub use analyzer::{Analyzer, BatchSummary, ModelFiles};
pub use chat::{ChatError, PERSONA};
pub use detection::{DetectorConfig, HaarFaceLocator};
pub use domain::{
    AdhdAssessment, AdhdScores, AnalysisRecord, AutismLabel, Classification, EmotionLabel,
    FaceRegion, RiskTier, UploadName,
};
pub use error::AnalysisError;
pub use ports::{ProgressEvent, ProgressSink, ResultOutput};
