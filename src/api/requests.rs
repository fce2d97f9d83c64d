//! # Request Types
//!
//! Inbound payloads and their boundary validation. Validation happens here so
//! that malformed input is rejected before a credit is touched or a session
//! lock is taken.

use crate::constants::limits::{
    DEFAULT_HISTORY_LIMIT, MAX_ANSWER_LENGTH, MAX_HISTORY_LIMIT, MAX_POSITION_LENGTH,
};
use crate::error::{InterviewError, InterviewResult};
use crate::models::{validate_user_id, DifficultyFilter, InterviewMode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn require_user(user_id: &str) -> InterviewResult<()> {
    validate_user_id(user_id)
}

/// Start a new interview for a position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInterviewRequest {
    pub user_id: String,
    pub position: String,
    /// `easy`, `medium`, `hard` or `mixed`; absent means mixed
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Interview mode such as `quick_assessment`; absent means the configured session size
    #[serde(default)]
    pub mode: Option<String>,
}

impl StartInterviewRequest {
    /// Returns the parsed mode and difficulty filter
    pub fn validate(&self) -> InterviewResult<(InterviewMode, DifficultyFilter)> {
        require_user(&self.user_id)?;

        let position = self.position.trim();
        if position.is_empty() {
            return Err(InterviewError::validation("position", "Position is required"));
        }
        if position.chars().count() > MAX_POSITION_LENGTH {
            return Err(InterviewError::validation(
                "position",
                format!("Position must be at most {MAX_POSITION_LENGTH} characters"),
            ));
        }

        let mode = match self.mode.as_deref() {
            None => InterviewMode::Configured,
            Some(value) => value.parse()?,
        };
        let difficulty = match self.difficulty.as_deref() {
            None => DifficultyFilter::Mixed,
            Some(value) => value.parse()?,
        };
        Ok((mode, difficulty))
    }
}

/// Answer or skip the current question of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub session_id: String,
    pub user_id: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub skip: bool,
}

impl SubmitAnswerRequest {
    /// Returns the parsed session id
    pub fn validate(&self) -> InterviewResult<Uuid> {
        require_user(&self.user_id)?;

        let session_id = Uuid::parse_str(self.session_id.trim()).map_err(|_| {
            InterviewError::validation("session_id", "Session id must be a valid UUID")
        })?;

        if !self.skip {
            if self.answer.trim().is_empty() {
                return Err(InterviewError::validation(
                    "answer",
                    "Answer must not be empty; skip the question instead",
                ));
            }
            if self.answer.chars().count() > MAX_ANSWER_LENGTH {
                return Err(InterviewError::validation(
                    "answer",
                    format!("Answer must be at most {MAX_ANSWER_LENGTH} characters"),
                ));
            }
        }

        Ok(session_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    pub session_id: String,
    pub user_id: String,
}

impl SessionQuery {
    pub fn validate(&self) -> InterviewResult<Uuid> {
        require_user(&self.user_id)?;
        Uuid::parse_str(self.session_id.trim())
            .map_err(|_| InterviewError::validation("session_id", "Session id must be a valid UUID"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub user_id: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl HistoryQuery {
    /// Returns the effective limit
    pub fn validate(&self) -> InterviewResult<usize> {
        require_user(&self.user_id)?;
        match self.limit {
            None => Ok(DEFAULT_HISTORY_LIMIT),
            Some(limit) if (1..=MAX_HISTORY_LIMIT).contains(&limit) => Ok(limit),
            Some(limit) => Err(InterviewError::validation(
                "limit",
                format!("Limit {limit} is outside 1..={MAX_HISTORY_LIMIT}"),
            )),
        }
    }
}
