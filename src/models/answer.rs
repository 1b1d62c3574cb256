//! Answers and user feedback.

use serde::{Deserialize, Serialize};

use crate::error::FeedbackError;

/// Upper bound of the trust score.
pub const MAX_TRUST_SCORE: u32 = 100;

/// Generated answer to a single question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
    pub sources: Vec<String>,
}

impl Answer {
    pub fn new(question: impl Into<String>, answer: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            sources,
        }
    }

    /// Display-only heuristic: answer length plus ten points per source, capped at 100.
    pub fn trust_score(&self) -> u32 {
        trust_score(&self.answer, self.sources.len())
    }

    /// Sources as a single comma-separated label.
    pub fn sources_label(&self) -> String {
        self.sources.join(", ")
    }
}

pub fn trust_score(answer: &str, source_count: usize) -> u32 {
    let length = answer.chars().count();
    let score = length.saturating_add(source_count.saturating_mul(10));
    score.min(MAX_TRUST_SCORE as usize) as u32
}

/// User rating between 1 and 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for Rating {
    type Error = FeedbackError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(FeedbackError::InvalidRating(value))
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// One row of the feedback log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub question: String,
    pub answer: String,
    pub sources: String,
    pub trust_score: u32,
    pub rating: u8,
    pub comment: String,
}

impl FeedbackRecord {
    pub fn new(answer: &Answer, rating: Rating, comment: impl Into<String>) -> Self {
        Self {
            question: answer.question.clone(),
            answer: answer.answer.clone(),
            sources: answer.sources_label(),
            trust_score: answer.trust_score(),
            rating: rating.value(),
            comment: comment.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trust_score_formula() {
        assert_eq!(trust_score("", 0), 0);
        assert_eq!(trust_score("short", 2), 25);
        assert_eq!(trust_score(&"a".repeat(95), 1), 100);
        assert_eq!(trust_score(&"a".repeat(500), 5), 100);
    }

    #[test]
    fn test_trust_score_counts_characters() {
        // Arabic letters are multi-byte but count once each.
        let answer = Answer::new("q", "مرحبا", vec!["a.pdf".to_string()]);
        assert_eq!(answer.trust_score(), 15);
    }

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::try_from(0).is_err());
        assert_eq!(Rating::try_from(1).unwrap().value(), 1);
        assert_eq!(Rating::try_from(5).unwrap().value(), 5);
        assert!(matches!(
            Rating::try_from(6),
            Err(FeedbackError::InvalidRating(6))
        ));
        assert_eq!(Rating::default().value(), 3);
    }

    #[test]
    fn test_feedback_record_from_answer() {
        let answer = Answer::new(
            "What is the audit schedule?",
            "Quarterly.",
            vec!["quality_audit.pdf".to_string(), "plan.txt".to_string()],
        );
        let record = FeedbackRecord::new(&answer, Rating::try_from(4).unwrap(), "useful");
        assert_eq!(record.sources, "quality_audit.pdf, plan.txt");
        assert_eq!(record.trust_score, 30);
        assert_eq!(record.rating, 4);
        assert_eq!(record.comment, "useful");
    }
}
