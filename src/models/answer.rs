use crate::constants::{operations, MAX_SCORE, SKIPPED_ANSWER};
use crate::error::{InterviewError, InterviewResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::question::strip_code_fence;

/// Whether an answer replies to the main prompt or its follow-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    Main,
    FollowUp,
}

/// Per-answer score, every field on a 0-10 scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerScore {
    #[serde(alias = "technicalAccuracy")]
    pub technical_accuracy: f64,
    #[serde(alias = "communicationClarity")]
    pub communication_clarity: f64,
    #[serde(alias = "problemSolvingApproach")]
    pub problem_solving: f64,
    #[serde(alias = "overallScore")]
    pub overall: f64,
    #[serde(default)]
    pub feedback: String,
}

impl AnswerScore {
    /// Score recorded for a skipped question
    pub fn zero(feedback: impl Into<String>) -> Self {
        Self::uniform(0.0, feedback)
    }

    pub fn uniform(score: f64, feedback: impl Into<String>) -> Self {
        Self {
            technical_accuracy: score,
            communication_clarity: score,
            problem_solving: score,
            overall: score,
            feedback: feedback.into(),
        }
    }

    /// Parse a scorer's JSON reply and check every field is within 0-10
    pub fn from_llm_response(raw: &str) -> InterviewResult<Self> {
        let score: AnswerScore = serde_json::from_str(strip_code_fence(raw)).map_err(|e| {
            InterviewError::upstream(
                operations::ANSWER_SCORING,
                format!("Invalid score payload: {e}"),
            )
        })?;
        score.validate()?;
        Ok(score)
    }

    pub fn validate(&self) -> InterviewResult<()> {
        for (field, value) in [
            ("technical_accuracy", self.technical_accuracy),
            ("communication_clarity", self.communication_clarity),
            ("problem_solving", self.problem_solving),
            ("overall", self.overall),
        ] {
            if !(0.0..=MAX_SCORE).contains(&value) {
                return Err(InterviewError::upstream(
                    operations::ANSWER_SCORING,
                    format!("Score field {field} out of range: {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// One recorded submission. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: Uuid,
    pub kind: AnswerKind,
    pub text: String,
    /// `None` on a main answer that led to a follow-up
    pub score: Option<AnswerScore>,
    pub recorded_at: DateTime<Utc>,
}

impl Answer {
    pub fn new(
        question_id: Uuid,
        kind: AnswerKind,
        text: impl Into<String>,
        score: Option<AnswerScore>,
    ) -> Self {
        Self {
            question_id,
            kind,
            text: text.into(),
            score,
            recorded_at: Utc::now(),
        }
    }

    pub fn skipped(question_id: Uuid, kind: AnswerKind) -> Self {
        Self::new(
            question_id,
            kind,
            SKIPPED_ANSWER,
            Some(AnswerScore::zero("Question skipped")),
        )
    }

    pub fn is_skipped(&self) -> bool {
        self.text == SKIPPED_ANSWER
    }
}
