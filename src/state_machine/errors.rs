use super::states::SessionStage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateMachineError {
    #[error("Invalid transition from {from} on {event}")]
    InvalidTransition { from: SessionStage, event: String },

    #[error("Guard condition failed: {0}")]
    GuardFailed(#[from] GuardError),

    #[error("Answer '{event}' needs a score before it can be recorded")]
    ScoreRequired { event: String },

    #[error("Internal state machine error: {0}")]
    Internal(String),
}

impl StateMachineError {
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }
}

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Session has no question at index {index} (total {total})")]
    NoCurrentQuestion { index: usize, total: usize },

    #[error("No main answer recorded for question {question_id}")]
    MissingMainAnswer { question_id: String },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Concurrent modification of {entity_id}: expected version {expected_version}, found {actual_version}")]
    ConcurrentModification {
        entity_id: String,
        expected_version: u64,
        actual_version: u64,
    },

    #[error("Entity not found: {entity_id}")]
    NotFound { entity_id: String },

    #[error("Entity already exists: {entity_id}")]
    AlreadyExists { entity_id: String },

    #[error("Storage operation '{operation}' failed: {reason}")]
    StorageFailure { operation: String, reason: String },
}

impl PersistenceError {
    pub fn storage_failure(operation: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::StorageFailure {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
pub type GuardResult<T> = Result<T, GuardError>;
pub type PersistenceResult<T> = Result<T, PersistenceError>;
