//! # Resilience Module
//!
//! Fault tolerance for calls to the question generator, the answer scorer and
//! the session store.
//!
//! ## Architecture
//!
//! - **Retry**: exponential backoff with a retry condition and a delay cap
//! - **Circuit Breakers**: fail fast once an upstream keeps failing
//! - **Graceful Degradation**: named fallbacks with availability tracking
//! - **Error Classification**: category, retryability and user message per error
//!
//! Upstream calls compose as degradation → retry → circuit breaker → call.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use interview_core::resilience::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let circuit_breaker = CircuitBreaker::new(
//!     "answer_scoring",
//!     CircuitBreakerConfig::new(5, Duration::from_secs(60)),
//! );
//!
//! let score = circuit_breaker
//!     .call(|| async { Ok::<f64, std::io::Error>(7.5) })
//!     .await?;
//! # let _ = score;
//! # Ok(())
//! # }
//! ```

pub mod circuit_breaker;
pub mod config;
pub mod degradation;
pub mod error_classifier;
pub mod manager;
pub mod metrics;
pub mod retry;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerError, CircuitBreakerSnapshot, CircuitState,
};
pub use config::CircuitBreakerConfig;
pub use degradation::{
    DegradationError, DegradationOptions, GracefulDegradationService, ServiceStatusReport,
};
pub use error_classifier::{
    ErrorCategory, ErrorClassification, ErrorClassifier, RecoveryAction,
    StandardErrorClassifier,
};
pub use manager::CircuitBreakerManager;
pub use metrics::{CircuitBreakerMetrics, SystemCircuitBreakerMetrics};
pub use retry::{RetryOptions, RetryPolicy};
