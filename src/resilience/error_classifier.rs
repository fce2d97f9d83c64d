//! # Interview Error Classification
//!
//! Maps every [`InterviewError`] to a category, a retry decision, a stable
//! error code and a message that is safe to show to the candidate.
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │ InterviewError  │────▶│ ErrorClassifier │────▶│ Classification  │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! The service layer uses [`ErrorClassifier::is_retryable`] as the retry
//! condition for upstream calls; the API layer uses the full classification to
//! build error responses.

use crate::constants::error_codes;
use crate::error::InterviewError;
use serde::{Deserialize, Serialize};

/// Primary error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Bad input, never retried
    Validation,
    NotFound,
    InsufficientCredits,
    /// Question generation or scoring dependency failed
    Upstream,
    RateLimit,
    Persistence,
    /// Concurrent modification of the same session
    Conflict,
    /// Circuit breaker rejected the call without trying
    CircuitOpen,
    Configuration,
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Validation => write!(f, "Validation"),
            ErrorCategory::NotFound => write!(f, "Not Found"),
            ErrorCategory::InsufficientCredits => write!(f, "Insufficient Credits"),
            ErrorCategory::Upstream => write!(f, "Upstream"),
            ErrorCategory::RateLimit => write!(f, "Rate Limit"),
            ErrorCategory::Persistence => write!(f, "Persistence"),
            ErrorCategory::Conflict => write!(f, "Conflict"),
            ErrorCategory::CircuitOpen => write!(f, "Circuit Open"),
            ErrorCategory::Configuration => write!(f, "Configuration"),
            ErrorCategory::Internal => write!(f, "Internal"),
        }
    }
}

/// What the caller should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    FixInput,
    RetryNow,
    RetryLater,
    ReloadSession,
    PurchaseCredits,
    ContactSupport,
}

/// Result of error classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorClassification {
    pub error_category: ErrorCategory,

    /// Whether an automatic retry may succeed
    pub is_retryable: bool,

    pub recovery_action: RecoveryAction,

    /// Stable code for clients and dashboards
    pub error_code: String,

    /// Message shown to the end user
    pub user_message: String,

    /// Full error text for operators
    pub detail: String,
}

/// Trait for error classification strategies
pub trait ErrorClassifier: Send + Sync {
    fn classify_error(&self, error: &InterviewError) -> ErrorClassification;

    fn classifier_name(&self) -> &'static str;

    fn is_retryable(&self, error: &InterviewError) -> bool {
        self.classify_error(error).is_retryable
    }
}

/// Standard classifier covering every [`InterviewError`] variant
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardErrorClassifier;

impl StandardErrorClassifier {
    pub fn new() -> Self {
        Self
    }

    fn classification(
        category: ErrorCategory,
        is_retryable: bool,
        recovery_action: RecoveryAction,
        error_code: &str,
        user_message: impl Into<String>,
        error: &InterviewError,
    ) -> ErrorClassification {
        ErrorClassification {
            error_category: category,
            is_retryable,
            recovery_action,
            error_code: error_code.to_string(),
            user_message: user_message.into(),
            detail: error.to_string(),
        }
    }
}

impl ErrorClassifier for StandardErrorClassifier {
    fn classify_error(&self, error: &InterviewError) -> ErrorClassification {
        use ErrorCategory as C;
        use RecoveryAction as R;

        match error {
            InterviewError::Validation { message, .. } => Self::classification(
                C::Validation,
                false,
                R::FixInput,
                error_codes::VALIDATION,
                message.clone(),
                error,
            ),
            InterviewError::NotFound { entity, .. } => Self::classification(
                C::NotFound,
                false,
                R::ReloadSession,
                error_codes::NOT_FOUND,
                format!("{entity} not found"),
                error,
            ),
            InterviewError::InsufficientCredits { .. } => Self::classification(
                C::InsufficientCredits,
                false,
                R::PurchaseCredits,
                error_codes::NO_CREDITS,
                "You have no interview credits left. Purchase more to start a new interview.",
                error,
            ),
            InterviewError::Upstream { .. } => Self::classification(
                C::Upstream,
                true,
                R::RetryNow,
                error_codes::UPSTREAM,
                "Our interview assistant is having trouble right now. Please try again.",
                error,
            ),
            InterviewError::RateLimited { .. } => Self::classification(
                C::RateLimit,
                true,
                R::RetryLater,
                error_codes::RATE_LIMITED,
                "Too many requests. Please wait a moment and try again.",
                error,
            ),
            InterviewError::Persistence(_) | InterviewError::Cache(_) => Self::classification(
                C::Persistence,
                false,
                R::RetryLater,
                error_codes::PERSISTENCE,
                "We couldn't save your progress. Please try again shortly.",
                error,
            ),
            InterviewError::Conflict { .. } => Self::classification(
                C::Conflict,
                false,
                R::ReloadSession,
                error_codes::CONFLICT,
                "This interview was updated elsewhere. Reload to continue.",
                error,
            ),
            InterviewError::CircuitOpen { .. } | InterviewError::ServiceNotRegistered { .. } => {
                Self::classification(
                    C::CircuitOpen,
                    false,
                    R::RetryLater,
                    error_codes::CIRCUIT_OPEN,
                    "This service is temporarily unavailable. Please try again in a minute.",
                    error,
                )
            }
            InterviewError::StateMachine(state_error) => {
                let (category, code, action, message) = if state_error.is_invalid_transition() {
                    (
                        C::Validation,
                        error_codes::VALIDATION,
                        R::ReloadSession,
                        "This interview has already been completed.",
                    )
                } else {
                    (
                        C::Internal,
                        error_codes::INTERNAL,
                        R::ContactSupport,
                        "Something went wrong with this interview.",
                    )
                };
                Self::classification(category, false, action, code, message, error)
            }
            InterviewError::Configuration(_) => Self::classification(
                C::Configuration,
                false,
                R::ContactSupport,
                error_codes::CONFIGURATION,
                "The service is misconfigured. Please contact support.",
                error,
            ),
            InterviewError::Internal(_) => Self::classification(
                C::Internal,
                false,
                R::ContactSupport,
                error_codes::INTERNAL,
                "An unexpected error occurred.",
                error,
            ),
        }
    }

    fn classifier_name(&self) -> &'static str {
        "StandardErrorClassifier"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::{PersistenceError, SessionStage, StateMachineError};

    #[test]
    fn test_validation_is_never_retried() {
        let classifier = StandardErrorClassifier::new();
        let error = InterviewError::validation("answer", "Answer must not be empty");

        let classification = classifier.classify_error(&error);

        assert_eq!(classification.error_category, ErrorCategory::Validation);
        assert!(!classification.is_retryable);
        assert_eq!(classification.error_code, "VALIDATION_ERROR");
        assert_eq!(classification.user_message, "Answer must not be empty");
    }

    #[test]
    fn test_upstream_and_rate_limit_are_retryable() {
        let classifier = StandardErrorClassifier::new();
        assert!(classifier.is_retryable(&InterviewError::upstream("question_generation", "timeout")));
        assert!(classifier.is_retryable(&InterviewError::RateLimited {
            service: "answer_scoring".to_string()
        }));
    }

    #[test]
    fn test_circuit_open_fails_fast() {
        let classifier = StandardErrorClassifier::new();
        let classification = classifier.classify_error(&InterviewError::CircuitOpen {
            component: "answer_scoring".to_string(),
        });

        assert_eq!(classification.error_category, ErrorCategory::CircuitOpen);
        assert!(!classification.is_retryable);
        assert_eq!(classification.error_code, "SERVICE_UNAVAILABLE");
    }

    #[test]
    fn test_completed_session_maps_to_validation() {
        let classifier = StandardErrorClassifier::new();
        let error = InterviewError::from(StateMachineError::InvalidTransition {
            from: SessionStage::Completed,
            event: "submit_answer".to_string(),
        });

        let classification = classifier.classify_error(&error);
        assert_eq!(classification.error_category, ErrorCategory::Validation);
        assert_eq!(classification.recovery_action, RecoveryAction::ReloadSession);
    }

    #[test]
    fn test_persistence_detail_keeps_cause() {
        let classifier = StandardErrorClassifier::new();
        let error = InterviewError::from(PersistenceError::StorageFailure {
            operation: "save".to_string(),
            reason: "disk full".to_string(),
        });

        let classification = classifier.classify_error(&error);
        assert_eq!(classification.error_category, ErrorCategory::Persistence);
        assert!(classification.detail.contains("disk full"));
        assert!(!classification.user_message.contains("disk full"));
    }
}
