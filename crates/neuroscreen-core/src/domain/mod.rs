//! Core domain types for screening analysis.

mod adhd;
mod analysis;
mod classification;
mod face;
mod upload;

pub use adhd::{
    assess, display_probability, score_answers, AdhdAssessment, AdhdScores, QuestionnaireError,
    QuestionnaireScore, RiskTier, LOW_MAX, MAX_ANSWER, MODERATE_MAX, QUESTION_COUNT,
};
pub use analysis::{reasoning, AnalysisRecord};
pub use classification::{
    combined_confidence, round2, to_percent, AutismLabel, Classification, EmotionLabel,
    AUTISM_DECISION_THRESHOLD,
};
pub use face::FaceRegion;
pub use upload::{UploadName, ACCEPTED_EXTENSIONS};
