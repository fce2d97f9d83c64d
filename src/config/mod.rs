//! # Interview Configuration System
//!
//! Layered configuration for the interview engine. Values are merged in order:
//!
//! 1. built-in defaults ([`InterviewConfig::default`])
//! 2. `config/interview.yaml`
//! 3. `config/interview.{environment}.yaml`
//! 4. environment variables prefixed `INTERVIEW__`, with `__` between
//!    levels (`INTERVIEW__CACHE__MAX_ENTRIES=500`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use interview_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let per_session = manager.config().session.questions_per_session;
//! let retry = manager.config().retry.max_attempts;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::{cache, DEFAULT_QUESTIONS_PER_SESSION};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring `interview.yaml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InterviewConfig {
    pub cache: CacheConfig,
    pub retry: RetryConfig,
    pub circuit_breakers: CircuitBreakerConfig,
    pub degradation: DegradationConfig,
    pub session: SessionConfig,
    pub scoring: ScoringConfig,
}

/// TTL cache sizing and per-entity TTLs
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub default_ttl_seconds: u64,
    pub session_ttl_seconds: u64,
    pub user_interviews_ttl_seconds: u64,
    pub questions_ttl_seconds: u64,
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds)
    }

    pub fn user_interviews_ttl(&self) -> Duration {
        Duration::from_secs(self.user_interviews_ttl_seconds)
    }

    pub fn questions_ttl(&self) -> Duration {
        Duration::from_secs(self.questions_ttl_seconds)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: cache::DEFAULT_MAX_ENTRIES,
            default_ttl_seconds: cache::DEFAULT_TTL.as_secs(),
            session_ttl_seconds: cache::SESSION_TTL.as_secs(),
            user_interviews_ttl_seconds: cache::USER_INTERVIEWS_TTL.as_secs(),
            questions_ttl_seconds: cache::QUESTIONS_TTL.as_secs(),
        }
    }
}

/// Exponential backoff for upstream calls
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    /// Stretch each backoff by a random fraction up to `jitter_max_percentage`
    pub jitter_enabled: bool,
    pub jitter_max_percentage: f64,
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter_enabled: true,
            jitter_max_percentage: 0.1,
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Whether circuit breakers wrap upstream calls at all
    pub enabled: bool,

    /// Default configuration for new circuit breakers
    pub default_config: CircuitBreakerComponentConfig,

    /// Specific configurations for named components
    pub component_configs: HashMap<String, CircuitBreakerComponentConfig>,
}

impl CircuitBreakerConfig {
    /// Get configuration for a specific component
    pub fn config_for_component(&self, component_name: &str) -> CircuitBreakerComponentConfig {
        self.component_configs
            .get(component_name)
            .cloned()
            .unwrap_or_else(|| self.default_config.clone())
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        let mut component_configs = HashMap::new();
        component_configs.insert(
            crate::constants::operations::SESSION_STORE.to_string(),
            CircuitBreakerComponentConfig {
                failure_threshold: 5,
                timeout_seconds: 30,
                success_threshold: 1,
            },
        );

        Self {
            enabled: true,
            default_config: CircuitBreakerComponentConfig::default(),
            component_configs,
        }
    }
}

/// Circuit breaker configuration for a specific component
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerComponentConfig {
    /// Number of consecutive failures before opening circuit
    pub failure_threshold: u32,

    /// Time to wait in open state before attempting recovery (in seconds)
    pub timeout_seconds: u64,

    /// Number of successful half-open probes needed to close circuit
    pub success_threshold: u32,
}

impl CircuitBreakerComponentConfig {
    /// Convert to resilience module's format
    pub fn to_resilience_config(&self) -> crate::resilience::config::CircuitBreakerConfig {
        crate::resilience::config::CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            timeout: Duration::from_secs(self.timeout_seconds),
            success_threshold: self.success_threshold,
        }
    }
}

impl Default for CircuitBreakerComponentConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout_seconds: 60,
            success_threshold: 1,
        }
    }
}

/// Graceful degradation thresholds
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DegradationConfig {
    pub fallback_after_failures: u32,
    pub health_check_interval_seconds: u64,
}

impl DegradationConfig {
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_seconds)
    }
}

impl Default for DegradationConfig {
    fn default() -> Self {
        Self {
            fallback_after_failures: 3,
            health_check_interval_seconds: 30,
        }
    }
}

/// Interview session shape
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    pub questions_per_session: usize,
    /// Follow-ups allowed per session; `None` means every configured follow-up is asked
    pub max_follow_ups: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            questions_per_session: DEFAULT_QUESTIONS_PER_SESSION,
            max_follow_ups: None,
        }
    }
}

/// How answer scores roll up into the session score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    SimpleAverage,
    CategoryWeighted,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub method: ScoringMethod,
    pub weights: CategoryWeightsConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            method: ScoringMethod::SimpleAverage,
            weights: CategoryWeightsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CategoryWeightsConfig {
    pub behavioral: f64,
    pub technical: f64,
    pub situational: f64,
}

impl Default for CategoryWeightsConfig {
    fn default() -> Self {
        Self {
            behavioral: 1.0,
            technical: 1.0,
            situational: 1.0,
        }
    }
}

impl InterviewConfig {
    /// Validate the merged configuration
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.cache.max_entries == 0 {
            return Err(ConfigurationError::invalid_value(
                "cache.max_entries",
                "0",
                "cache must hold at least one entry",
            ));
        }

        for (field, seconds) in [
            ("cache.default_ttl_seconds", self.cache.default_ttl_seconds),
            ("cache.session_ttl_seconds", self.cache.session_ttl_seconds),
            (
                "cache.user_interviews_ttl_seconds",
                self.cache.user_interviews_ttl_seconds,
            ),
            ("cache.questions_ttl_seconds", self.cache.questions_ttl_seconds),
        ] {
            if seconds == 0 {
                return Err(ConfigurationError::invalid_value(
                    field,
                    "0",
                    "TTL must be greater than 0",
                ));
            }
            if seconds > cache::MAX_TTL.as_secs() {
                return Err(ConfigurationError::invalid_value(
                    field,
                    seconds.to_string(),
                    format!("TTL must not exceed {} seconds", cache::MAX_TTL.as_secs()),
                ));
            }
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "retry.max_attempts",
                "0",
                "at least one attempt is required",
            ));
        }

        if self.retry.backoff_multiplier < 1.0 {
            return Err(ConfigurationError::invalid_value(
                "retry.backoff_multiplier",
                self.retry.backoff_multiplier.to_string(),
                "multiplier must be at least 1.0",
            ));
        }

        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(ConfigurationError::invalid_value(
                "retry.max_delay_ms",
                self.retry.max_delay_ms.to_string(),
                "max delay must not be shorter than the base delay",
            ));
        }

        let jitter = self.retry.jitter_max_percentage;
        if !(0.0..=1.0).contains(&jitter) {
            return Err(ConfigurationError::invalid_value(
                "retry.jitter_max_percentage",
                jitter.to_string(),
                "jitter must be a fraction between 0.0 and 1.0",
            ));
        }

        self.circuit_breakers
            .default_config
            .to_resilience_config()
            .validate()
            .map_err(|e| {
                ConfigurationError::validation_error(format!(
                    "circuit_breakers.default_config: {e}"
                ))
            })?;

        for (name, component) in &self.circuit_breakers.component_configs {
            component.to_resilience_config().validate().map_err(|e| {
                ConfigurationError::validation_error(format!(
                    "circuit_breakers.component_configs.{name}: {e}"
                ))
            })?;
        }

        if self.degradation.fallback_after_failures == 0 {
            return Err(ConfigurationError::invalid_value(
                "degradation.fallback_after_failures",
                "0",
                "threshold must be greater than 0",
            ));
        }

        if self.session.questions_per_session == 0 {
            return Err(ConfigurationError::invalid_value(
                "session.questions_per_session",
                "0",
                "a session needs at least one question",
            ));
        }

        let weights = &self.scoring.weights;
        for (field, weight) in [
            ("scoring.weights.behavioral", weights.behavioral),
            ("scoring.weights.technical", weights.technical),
            ("scoring.weights.situational", weights.situational),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigurationError::invalid_value(
                    field,
                    weight.to_string(),
                    "weights must be finite and non-negative",
                ));
            }
        }

        if self.scoring.method == ScoringMethod::CategoryWeighted
            && weights.behavioral + weights.technical + weights.situational == 0.0
        {
            return Err(ConfigurationError::validation_error(
                "category_weighted scoring needs at least one non-zero weight",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = InterviewConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.session.questions_per_session, 8);
        assert_eq!(config.degradation.fallback_after_failures, 3);
        assert_eq!(config.circuit_breakers.default_config.failure_threshold, 5);
    }

    #[test]
    fn test_component_config_falls_back_to_default() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.config_for_component("session_store").timeout_seconds, 30);
        assert_eq!(
            config.config_for_component("answer_scoring").timeout_seconds,
            60
        );
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = InterviewConfig::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = InterviewConfig::default();
        config.retry.max_delay_ms = 10;
        assert!(config.validate().is_err());

        let mut config = InterviewConfig::default();
        config.retry.jitter_max_percentage = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidValue { ref field, .. }) if field == "retry.jitter_max_percentage"
        ));

        let mut config = InterviewConfig::default();
        config.circuit_breakers.default_config.failure_threshold = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::ValidationError { .. })
        ));

        let mut config = InterviewConfig::default();
        config.scoring.method = ScoringMethod::CategoryWeighted;
        config.scoring.weights = CategoryWeightsConfig {
            behavioral: 0.0,
            technical: 0.0,
            situational: 0.0,
        };
        assert!(config.validate().is_err());
    }
}
