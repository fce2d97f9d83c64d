//! # Response Types
//!
//! Success envelopes and the error payload returned to callers. Every error is
//! rendered from an [`ErrorClassification`]: the candidate sees the
//! user-facing message, operators get the diagnostic block.

use crate::models::{AnswerScore, InterviewSummary, Progress, Question, Session};
use crate::resilience::{ErrorCategory, ErrorClassification};
use crate::state_machine::{NextAction, SessionStage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// HTTP-style status for an error category
pub fn status_code(category: ErrorCategory) -> u16 {
    match category {
        ErrorCategory::Validation => 400,
        ErrorCategory::InsufficientCredits => 402,
        ErrorCategory::NotFound => 404,
        ErrorCategory::Conflict => 409,
        ErrorCategory::RateLimit => 429,
        ErrorCategory::Upstream => 502,
        ErrorCategory::CircuitOpen => 503,
        ErrorCategory::Persistence | ErrorCategory::Configuration | ErrorCategory::Internal => 500,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Operator-facing detail attached to every error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDiagnostic {
    pub category: ErrorCategory,
    pub detail: String,
    pub retryable: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
    pub diagnostic: ErrorDiagnostic,
}

impl From<&ErrorClassification> for ApiErrorResponse {
    fn from(classification: &ErrorClassification) -> Self {
        Self {
            success: false,
            error: classification.user_message.clone(),
            code: classification.error_code.clone(),
            diagnostic: ErrorDiagnostic {
                category: classification.error_category,
                detail: classification.detail.clone(),
                retryable: classification.is_retryable,
                timestamp: Utc::now(),
            },
        }
    }
}

/// Error returned by the API layer: a status plus the rendered body
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{status} {}: {}", body.code, body.error)]
pub struct ApiError {
    pub status: u16,
    pub body: ApiErrorResponse,
}

impl From<&ErrorClassification> for ApiError {
    fn from(classification: &ErrorClassification) -> Self {
        Self {
            status: status_code(classification.error_category),
            body: classification.into(),
        }
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInterviewResponse {
    pub session_id: Uuid,
    pub position: String,
    pub total_questions: usize,
    pub current_question: Option<Question>,
    pub progress: Progress,
}

impl From<&Session> for StartInterviewResponse {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id,
            position: session.position.clone(),
            total_questions: session.questions.len(),
            current_question: session.current_question().cloned(),
            progress: session.progress(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerResponse {
    pub session_id: Uuid,
    pub stage: SessionStage,
    pub next_action: NextAction,
    pub score: Option<AnswerScore>,
    pub progress: Progress,
    pub overall_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewHistoryResponse {
    pub interviews: Vec<InterviewSummary>,
    pub count: usize,
}
