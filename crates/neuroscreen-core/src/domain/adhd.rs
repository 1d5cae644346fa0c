//! Rule-based ADHD questionnaire scoring.
//!
//! The questionnaire has 15 questions answered on a 0-4 scale. Answers 1-7
//! form the inattention sub-scale, 8-11 hyperactivity and 12-15 impulsivity.
//! The overall score is bucketed into three tiers with fixed breakpoints.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest overall score still reported as low risk.
pub const LOW_MAX: i64 = 20;
/// Highest overall score still reported as moderate risk.
pub const MODERATE_MAX: i64 = 40;

/// Number of questions in the questionnaire.
pub const QUESTION_COUNT: usize = 15;
/// Highest value a single answer may take.
pub const MAX_ANSWER: u8 = 4;

const INATTENTION: std::ops::Range<usize> = 0..7;
const HYPERACTIVITY: std::ops::Range<usize> = 7..11;
const IMPULSIVITY: std::ops::Range<usize> = 11..15;

/// Risk bucket for an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    /// `score <= 20`.
    Low,
    /// `20 < score <= 40`.
    Moderate,
    /// `score > 40`.
    High,
}

impl RiskTier {
    /// Buckets an overall score.
    #[must_use]
    pub const fn from_score(score: i64) -> Self {
        if score <= LOW_MAX {
            Self::Low
        } else if score <= MODERATE_MAX {
            Self::Moderate
        } else {
            Self::High
        }
    }

    /// Message shown to the user for this tier.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Low => "Low probability of ADHD",
            Self::Moderate => "Moderate signs of ADHD. Further evaluation may help.",
            Self::High => "High signs of ADHD. Consider consulting a professional.",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Overall score and sub-scale scores supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdhdScores {
    /// Overall score.
    pub score: i64,
    /// Inattention sub-scale.
    pub inattention: i64,
    /// Hyperactivity sub-scale.
    pub hyperactivity: i64,
    /// Impulsivity sub-scale.
    pub impulsivity: i64,
}

/// Scoring outcome: the tier, its message and the echoed sub-scales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdhdAssessment {
    /// Risk tier.
    pub tier: RiskTier,
    /// Tier message.
    pub result_text: &'static str,
    /// Inattention sub-scale, echoed.
    pub inattention: i64,
    /// Hyperactivity sub-scale, echoed.
    pub hyperactivity: i64,
    /// Impulsivity sub-scale, echoed.
    pub impulsivity: i64,
}

/// Maps scores to an assessment.
#[must_use]
pub const fn assess(scores: AdhdScores) -> AdhdAssessment {
    let tier = RiskTier::from_score(scores.score);
    AdhdAssessment {
        tier,
        result_text: tier.message(),
        inattention: scores.inattention,
        hyperactivity: scores.hyperactivity,
        impulsivity: scores.impulsivity,
    }
}

/// Invalid questionnaire answers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionnaireError {
    /// Wrong number of answers.
    #[error("expected {QUESTION_COUNT} answers, got {0}")]
    WrongCount(usize),
    /// An answer outside `0..=4`.
    #[error("answer {index} is {value}, must be between 0 and {MAX_ANSWER}")]
    OutOfRange {
        /// 1-based question number.
        index: usize,
        /// Offending value.
        value: i64,
    },
}

/// Sub-scale breakdown computed from raw answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestionnaireScore {
    /// Sub-scale and overall scores.
    pub scores: AdhdScores,
    /// Display probability in percent, clamped to `8..=99`.
    pub probability: u8,
}

/// Scores a full set of questionnaire answers.
///
/// # Errors
///
/// Returns an error if there are not exactly [`QUESTION_COUNT`] answers or an
/// answer is outside `0..=4`.
pub fn score_answers(answers: &[i64]) -> Result<QuestionnaireScore, QuestionnaireError> {
    if answers.len() != QUESTION_COUNT {
        return Err(QuestionnaireError::WrongCount(answers.len()));
    }
    if let Some((i, &value)) = answers
        .iter()
        .enumerate()
        .find(|(_, v)| !(0..=i64::from(MAX_ANSWER)).contains(*v))
    {
        return Err(QuestionnaireError::OutOfRange {
            index: i + 1,
            value,
        });
    }

    let inattention: i64 = answers[INATTENTION].iter().sum();
    let hyperactivity: i64 = answers[HYPERACTIVITY].iter().sum();
    let impulsivity: i64 = answers[IMPULSIVITY].iter().sum();
    let score = inattention + hyperactivity + impulsivity;

    Ok(QuestionnaireScore {
        scores: AdhdScores {
            score,
            inattention,
            hyperactivity,
            impulsivity,
        },
        probability: display_probability(score),
    })
}

/// Display probability for an overall score out of 60.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn display_probability(score: i64) -> u8 {
    #[allow(clippy::cast_precision_loss)]
    let raw = (score as f64 / 60.0 * 100.0).round();
    raw.clamp(8.0, 99.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_examples() {
        assert_eq!(RiskTier::from_score(15), RiskTier::Low);
        assert_eq!(RiskTier::from_score(30), RiskTier::Moderate);
        assert_eq!(RiskTier::from_score(55), RiskTier::High);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(RiskTier::from_score(20), RiskTier::Low);
        assert_eq!(RiskTier::from_score(21), RiskTier::Moderate);
        assert_eq!(RiskTier::from_score(40), RiskTier::Moderate);
        assert_eq!(RiskTier::from_score(41), RiskTier::High);
    }

    #[test]
    fn test_negative_score_is_low() {
        assert_eq!(RiskTier::from_score(-5), RiskTier::Low);
    }

    #[test]
    fn test_assess_echoes_subscales() {
        let result = assess(AdhdScores {
            score: 30,
            inattention: 14,
            hyperactivity: 9,
            impulsivity: 7,
        });
        assert_eq!(result.tier, RiskTier::Moderate);
        assert!(result.result_text.starts_with("Moderate"));
        assert_eq!(
            (result.inattention, result.hyperactivity, result.impulsivity),
            (14, 9, 7)
        );
    }

    #[test]
    fn test_messages_mention_tier() {
        assert!(RiskTier::Low.message().contains("Low probability"));
        assert!(RiskTier::High.message().contains("professional"));
    }

    #[test]
    fn test_score_answers_splits_subscales() {
        let answers = [1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3];
        let result = score_answers(&answers).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(result.scores.inattention, 7);
        assert_eq!(result.scores.hyperactivity, 8);
        assert_eq!(result.scores.impulsivity, 12);
        assert_eq!(result.scores.score, 27);
        assert_eq!(result.probability, 45);
    }

    #[test]
    fn test_probability_clamped() {
        assert_eq!(display_probability(0), 8);
        assert_eq!(display_probability(60), 99);
        assert_eq!(display_probability(30), 50);
    }

    #[test]
    fn test_score_answers_rejects_bad_input() {
        assert_eq!(
            score_answers(&[0; 14]),
            Err(QuestionnaireError::WrongCount(14))
        );

        let mut answers = [0_i64; 15];
        answers[3] = 5;
        assert_eq!(
            score_answers(&answers),
            Err(QuestionnaireError::OutOfRange { index: 4, value: 5 })
        );
    }
}
