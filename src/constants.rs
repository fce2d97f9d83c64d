//! # System Constants
//!
//! Sentinels, defaults and cache key prefixes shared by the session engine,
//! the cache helpers and the resilience layer.

use std::time::Duration;

/// Text recorded in place of an answer when the candidate skips a question
pub const SKIPPED_ANSWER: &str = "SKIPPED";

/// Number of questions kept after filtering and shuffling a generated set
pub const DEFAULT_QUESTIONS_PER_SESSION: usize = 8;

/// Difficulty filter value that keeps every question
pub const MIXED_DIFFICULTY: &str = "mixed";

/// Credit balance at or below which the usage report suggests topping up
pub const LOW_CREDIT_THRESHOLD: i64 = 2;

/// Score assigned when every scorer is unavailable
pub const FALLBACK_EVALUATION_SCORE: f64 = 7.5;

/// Upper bound for every per-answer score field
pub const MAX_SCORE: f64 = 10.0;

/// Cache defaults
pub mod cache {
    use super::Duration;

    pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
    pub const DEFAULT_MAX_ENTRIES: usize = 1000;
    /// Longest TTL an entry can carry; larger values are clamped
    pub const MAX_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

    pub const SESSION_TTL: Duration = Duration::from_secs(2 * 60);
    pub const USER_INTERVIEWS_TTL: Duration = Duration::from_secs(5 * 60);
    pub const QUESTIONS_TTL: Duration = Duration::from_secs(30 * 60);

    pub const SESSION_PREFIX: &str = "session";
    pub const USER_INTERVIEWS_PREFIX: &str = "user_interviews";
    pub const QUESTIONS_PREFIX: &str = "questions";
}

/// Names of the circuit breakers and degradable services used by the interview service
pub mod operations {
    pub const QUESTION_GENERATION: &str = "question_generation";
    pub const ANSWER_SCORING: &str = "answer_scoring";
    pub const SESSION_STORE: &str = "session_store";
}

/// Error codes surfaced at the request boundary
pub mod error_codes {
    pub const VALIDATION: &str = "VALIDATION_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const NO_CREDITS: &str = "NO_CREDITS";
    pub const UPSTREAM: &str = "UPSTREAM_ERROR";
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
    pub const PERSISTENCE: &str = "PERSISTENCE_ERROR";
    pub const CONFLICT: &str = "CONFLICT";
    pub const CIRCUIT_OPEN: &str = "SERVICE_UNAVAILABLE";
    pub const CONFIGURATION: &str = "CONFIGURATION_ERROR";
    pub const INTERNAL: &str = "INTERNAL_ERROR";
}

/// Request boundary limits
pub mod limits {
    pub const MAX_ANSWER_LENGTH: usize = 5000;
    pub const MAX_POSITION_LENGTH: usize = 100;
    pub const DEFAULT_HISTORY_LIMIT: usize = 10;
    pub const MAX_HISTORY_LIMIT: usize = 50;
}
