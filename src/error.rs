//! # Interview Error Taxonomy
//!
//! Crate-wide error type. Each layer keeps its own `thiserror` enum
//! (`CacheError`, `StateMachineError`, `PersistenceError`, `ConfigurationError`,
//! `CircuitBreakerError<E>`, `DegradationError<E>`) and converts into
//! [`InterviewError`] at the service boundary, where the
//! [`ErrorClassifier`](crate::resilience::ErrorClassifier) turns it into a
//! category, a retry decision and a user-facing message.

use crate::cache::CacheError;
use crate::config::ConfigurationError;
use crate::resilience::{CircuitBreakerError, DegradationError};
use crate::state_machine::{PersistenceError, StateMachineError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum InterviewError {
    #[error("Validation failed for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("User {user_id} has no interview credits left (balance {balance})")]
    InsufficientCredits { user_id: String, balance: i64 },

    #[error("Upstream service '{service}' failed: {message}")]
    Upstream { service: String, message: String },

    #[error("Upstream service '{service}' is rate limiting requests")]
    RateLimited { service: String },

    #[error("Persistence error: {0}")]
    Persistence(PersistenceError),

    #[error("Session {session_id} was modified concurrently")]
    Conflict { session_id: String },

    #[error("Circuit breaker is open for {component}")]
    CircuitOpen { component: String },

    #[error("No fallback registered for service '{service}'")]
    ServiceNotRegistered { service: String },

    #[error(transparent)]
    StateMachine(#[from] StateMachineError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl InterviewError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn session_not_found(session_id: Uuid) -> Self {
        Self::not_found("Session", session_id)
    }

    pub fn upstream(service: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the error came from a dependency outside this process
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::RateLimited { .. })
    }
}

impl From<PersistenceError> for InterviewError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::ConcurrentModification { entity_id, .. } => Self::Conflict {
                session_id: entity_id,
            },
            PersistenceError::NotFound { entity_id } => Self::not_found("Session", entity_id),
            other => Self::Persistence(other),
        }
    }
}

impl From<CircuitBreakerError<InterviewError>> for InterviewError {
    fn from(err: CircuitBreakerError<InterviewError>) -> Self {
        match err {
            CircuitBreakerError::CircuitOpen { component } => Self::CircuitOpen { component },
            CircuitBreakerError::OperationFailed(inner) => inner,
            CircuitBreakerError::ConfigurationError(message) => Self::Internal(message),
        }
    }
}

impl From<DegradationError<InterviewError>> for InterviewError {
    fn from(err: DegradationError<InterviewError>) -> Self {
        match err {
            DegradationError::Primary(inner) => inner,
            DegradationError::NotRegistered { service } => Self::ServiceNotRegistered { service },
            DegradationError::FallbackFailed { service, error } => Self::Upstream {
                service,
                message: format!("Both primary service and fallback failed: {error}"),
            },
        }
    }
}

/// Result alias used across the service layer
pub type InterviewResult<T> = Result<T, InterviewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrent_modification_becomes_conflict() {
        let err: InterviewError = PersistenceError::ConcurrentModification {
            entity_id: "abc".to_string(),
            expected_version: 1,
            actual_version: 2,
        }
        .into();
        assert!(matches!(err, InterviewError::Conflict { ref session_id } if session_id == "abc"));
    }

    #[test]
    fn test_circuit_open_is_flattened() {
        let err: InterviewError = CircuitBreakerError::<InterviewError>::CircuitOpen {
            component: "answer_scoring".to_string(),
        }
        .into();
        assert!(matches!(err, InterviewError::CircuitOpen { .. }));

        let wrapped: InterviewError =
            CircuitBreakerError::OperationFailed(InterviewError::upstream("llm", "boom")).into();
        assert!(wrapped.is_upstream());
    }

    #[test]
    fn test_fallback_failure_message() {
        let err: InterviewError = DegradationError::<InterviewError>::FallbackFailed {
            service: "question_generation".to_string(),
            error: anyhow::anyhow!("bank empty"),
        }
        .into();
        assert!(err
            .to_string()
            .contains("Both primary service and fallback failed"));
    }
}
