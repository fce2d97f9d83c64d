//! # Retry With Exponential Backoff
//!
//! Re-runs a fallible async operation up to `max_attempts` times. The delay
//! before retry *n* is `base_delay × backoff_multiplier^(n-1)`, capped at
//! `max_delay`. With jitter enabled each sleep is stretched by a random
//! fraction of that delay, up to the configured maximum.

use crate::config::RetryConfig;
use rand::Rng;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

type RetryCondition<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;
type OnRetry<E> = Arc<dyn Fn(u32, &E) + Send + Sync>;

/// Options for a single [`RetryPolicy::execute`] call
pub struct RetryOptions<E> {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Largest extra fraction added to a delay; `None` sleeps exactly
    pub jitter: Option<f64>,
    retry_condition: Option<RetryCondition<E>>,
    on_retry: Option<OnRetry<E>>,
}

impl<E> Clone for RetryOptions<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            base_delay: self.base_delay,
            max_delay: self.max_delay,
            backoff_multiplier: self.backoff_multiplier,
            jitter: self.jitter,
            retry_condition: self.retry_condition.clone(),
            on_retry: self.on_retry.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("jitter", &self.jitter)
            .field("has_retry_condition", &self.retry_condition.is_some())
            .field("has_on_retry", &self.on_retry.is_some())
            .finish()
    }
}

impl<E> Default for RetryOptions<E> {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl<E> RetryOptions<E> {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
            backoff_multiplier: config.backoff_multiplier,
            jitter: config
                .jitter_enabled
                .then(|| config.jitter_max_percentage.clamp(0.0, 1.0)),
            retry_condition: None,
            on_retry: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self, max_fraction: f64) -> Self {
        self.jitter = Some(max_fraction.clamp(0.0, 1.0));
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = None;
        self
    }

    /// Stop retrying as soon as `condition` returns false for an error
    pub fn with_retry_condition<C>(mut self, condition: C) -> Self
    where
        C: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retry_condition = Some(Arc::new(condition));
        self
    }

    /// Called with the failed attempt number before each backoff sleep
    pub fn with_on_retry<C>(mut self, callback: C) -> Self
    where
        C: Fn(u32, &E) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(callback));
        self
    }

    /// Delay to wait after `attempt` (1-based) failed
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.backoff_multiplier.powi(exponent);
        let delay_secs = self.base_delay.as_secs_f64() * factor;

        if !delay_secs.is_finite() || delay_secs >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(delay_secs.max(0.0))
        }
    }

    /// [`delay_for_attempt`](Self::delay_for_attempt) stretched by a random
    /// fraction in `[0, jitter]`
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let delay = self.delay_for_attempt(attempt);
        match self.jitter {
            Some(fraction) if fraction.is_finite() && fraction > 0.0 => {
                let stretch = 1.0 + rand::thread_rng().gen_range(0.0..=fraction);
                Duration::try_from_secs_f64(delay.as_secs_f64() * stretch).unwrap_or(delay)
            }
            _ => delay,
        }
    }

    fn should_retry(&self, error: &E) -> bool {
        self.retry_condition
            .as_ref()
            .map_or(true, |condition| condition(error))
    }
}

/// Stateless retry executor
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryPolicy;

impl RetryPolicy {
    /// Run `operation` until it succeeds, the retry condition rejects the
    /// error, or `max_attempts` invocations have failed. The last error
    /// propagates.
    pub async fn execute<T, E, F, Fut>(mut operation: F, options: &RetryOptions<E>) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt = attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if attempt >= options.max_attempts {
                        warn!(
                            attempts = attempt,
                            error = %error,
                            "Retry attempts exhausted"
                        );
                        return Err(error);
                    }

                    if !options.should_retry(&error) {
                        debug!(
                            attempt = attempt,
                            error = %error,
                            "Error is not retryable, giving up"
                        );
                        return Err(error);
                    }

                    if let Some(on_retry) = &options.on_retry {
                        on_retry(attempt, &error);
                    }

                    let delay = options.jittered_delay(attempt);
                    debug!(
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
