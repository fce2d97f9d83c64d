use crate::error::{InterviewError, InterviewResult};
use crate::state_machine::SessionStage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account as seen by the interview engine: an id and a credit balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub user_id: String,
    pub credits: i64,
}

impl UserAccount {
    pub fn new(user_id: impl Into<String>, credits: i64) -> Self {
        Self {
            user_id: user_id.into(),
            credits,
        }
    }

    pub fn has_credits(&self) -> bool {
        self.credits > 0
    }
}

/// Characters that would let a user id reach into another user's cache keys
const RESERVED_USER_ID_CHARS: [char; 2] = [':', '*'];

/// Reject empty user ids and ids containing cache key separators
pub fn validate_user_id(user_id: &str) -> InterviewResult<()> {
    if user_id.trim().is_empty() {
        return Err(InterviewError::validation("user_id", "User id is required"));
    }
    if user_id.contains(RESERVED_USER_ID_CHARS) {
        return Err(InterviewError::validation(
            "user_id",
            "User id must not contain ':' or '*'",
        ));
    }
    Ok(())
}

/// Row in a user's interview history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewSummary {
    pub session_id: Uuid,
    pub position: String,
    pub stage: SessionStage,
    pub overall_score: Option<f64>,
    pub question_count: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_rejects_key_separators() {
        assert!(validate_user_id("candidate_1").is_ok());
        assert!(validate_user_id("  ").is_err());
        assert!(validate_user_id("team:u1").is_err());
        assert!(validate_user_id("*").is_err());
    }
}
