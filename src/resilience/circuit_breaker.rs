//! # Circuit Breaker Implementation
//!
//! Fault isolation for upstream dependencies. Three states:
//! Closed (normal operation), Open (failing fast) and HalfOpen (probing
//! recovery). State and counters are atomics, so the hot path never takes a
//! lock.
//!
//! Transitions:
//!
//! ```text
//! Closed --(failure_threshold consecutive failures)--> Open
//! Open   --(timeout elapsed, next call admitted)-----> HalfOpen
//! HalfOpen --(success_threshold successful probes)---> Closed
//! HalfOpen --(any failure)---------------------------> Open (timer restarted)
//! ```
//!
//! While HalfOpen, only `success_threshold` probes are admitted; every other
//! call is rejected as if the circuit were open. A half-open call whose future is
//! dropped before it finishes reopens the circuit with a fresh timer.

use super::config::CircuitBreakerConfig;
use super::metrics::CircuitBreakerMetrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};

/// Lock-free atomic counters for circuit breaker metrics.
#[derive(Debug)]
struct AtomicCircuitBreakerMetrics {
    total_calls: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    rejected_count: AtomicU64,
    consecutive_failures: AtomicU64,
    half_open_successes: AtomicU64,
    half_open_admitted: AtomicU64,
    total_duration_nanos: AtomicU64,
}

impl AtomicCircuitBreakerMetrics {
    fn new() -> Self {
        Self {
            total_calls: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            rejected_count: AtomicU64::new(0),
            consecutive_failures: AtomicU64::new(0),
            half_open_successes: AtomicU64::new(0),
            half_open_admitted: AtomicU64::new(0),
            total_duration_nanos: AtomicU64::new(0),
        }
    }

    #[inline]
    fn record_success(&self, duration: Duration) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.success_count.fetch_add(1, Ordering::Relaxed);
        self.total_duration_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    #[inline]
    fn record_failure(&self, duration: Duration) -> u64 {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        self.total_duration_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[inline]
    fn reset_half_open(&self) {
        self.half_open_successes.store(0, Ordering::Relaxed);
        self.half_open_admitted.store(0, Ordering::Relaxed);
    }

    fn snapshot(&self, state: CircuitState) -> CircuitBreakerMetrics {
        let total_calls = self.total_calls.load(Ordering::Relaxed);
        let success_count = self.success_count.load(Ordering::Relaxed);
        let failure_count = self.failure_count.load(Ordering::Relaxed);
        let total_duration_nanos = self.total_duration_nanos.load(Ordering::Relaxed);

        let (failure_rate, success_rate, average_duration) = if total_calls > 0 {
            (
                failure_count as f64 / total_calls as f64,
                success_count as f64 / total_calls as f64,
                Duration::from_nanos(total_duration_nanos / total_calls),
            )
        } else {
            (0.0, 0.0, Duration::ZERO)
        };

        CircuitBreakerMetrics {
            total_calls,
            success_count,
            failure_count,
            rejected_count: self.rejected_count.load(Ordering::Relaxed),
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
            half_open_calls: self.half_open_successes.load(Ordering::Relaxed),
            total_duration: Duration::from_nanos(total_duration_nanos),
            current_state: state,
            failure_rate,
            success_rate,
            average_duration,
        }
    }
}

/// Get current epoch nanos from SystemTime
#[inline]
fn epoch_nanos_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_nanos() as u64
}

fn epoch_nanos_to_datetime(nanos: u64) -> Option<DateTime<Utc>> {
    if nanos == 0 {
        return None;
    }
    DateTime::from_timestamp(
        (nanos / 1_000_000_000) as i64,
        (nanos % 1_000_000_000) as u32,
    )
}

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed = 0,
    /// Failure mode - all calls fail fast without executing
    Open = 1,
    /// Testing recovery - limited probes allowed through
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Open, // Default to safest state
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Errors that can occur during circuit breaker operation
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    /// Circuit is open, rejecting all calls
    #[error("Circuit breaker is open for {component}")]
    CircuitOpen { component: String },

    /// Operation failed and was recorded
    #[error("Operation failed: {0}")]
    OperationFailed(E),

    /// Circuit breaker configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl<E> CircuitBreakerError<E> {
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Rejected,
    Normal,
    Trial,
}

/// Holds a half-open slot; reopens the circuit if the call never finishes
struct TrialCallGuard<'a> {
    breaker: &'a CircuitBreaker,
    finished: bool,
}

impl Drop for TrialCallGuard<'_> {
    fn drop(&mut self) {
        if !self.finished && self.breaker.state() == CircuitState::HalfOpen {
            warn!(
                component = %self.breaker.name,
                "Half-open call cancelled before completing, reopening circuit"
            );
            self.breaker.transition_to_open(CircuitState::HalfOpen);
        }
    }
}

/// Observable breaker state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub consecutive_failures: u64,
    pub failure_threshold: u32,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    /// Time left before an open circuit admits a probe
    pub next_attempt_in: Option<Duration>,
}

/// Core circuit breaker implementation with atomic state management
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Component name for logging and metrics
    name: String,

    state: AtomicU8,

    config: CircuitBreakerConfig,

    metrics: AtomicCircuitBreakerMetrics,

    /// Epoch nanos when circuit was opened (0 = not open).
    opened_at_epoch_nanos: AtomicU64,

    /// Epoch nanos of the most recent failure (0 = none yet)
    last_failure_epoch_nanos: AtomicU64,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given name and configuration
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            timeout_ms = config.timeout.as_millis() as u64,
            success_threshold = config.success_threshold,
            "Circuit breaker initialized"
        );

        Self {
            name,
            state: AtomicU8::new(CircuitState::Closed as u8),
            config,
            metrics: AtomicCircuitBreakerMetrics::new(),
            opened_at_epoch_nanos: AtomicU64::new(0),
            last_failure_epoch_nanos: AtomicU64::new(0),
        }
    }

    /// Breaker with the given threshold and reset timeout, closing after one good probe
    pub fn with_threshold(name: impl Into<String>, failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self::new(name, CircuitBreakerConfig::new(failure_threshold, reset_timeout))
    }

    /// Get current circuit state
    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Execute an operation with circuit breaker protection
    pub async fn call<F, T, E, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let admission = self.admit_call();
        if admission == Admission::Rejected {
            self.metrics.rejected_count.fetch_add(1, Ordering::Relaxed);
            debug!(component = %self.name, state = %self.state(), "Call rejected by circuit breaker");
            return Err(CircuitBreakerError::CircuitOpen {
                component: self.name.clone(),
            });
        }

        let mut trial = (admission == Admission::Trial).then(|| TrialCallGuard {
            breaker: self,
            finished: false,
        });

        let start_time = std::time::Instant::now();
        let result = operation().await;
        let duration = start_time.elapsed();
        if let Some(guard) = trial.as_mut() {
            guard.finished = true;
        }

        match &result {
            Ok(_) => self.record_success(duration),
            Err(_) => self.record_failure(duration),
        }

        result.map_err(CircuitBreakerError::OperationFailed)
    }

    /// Decide whether a call runs, and whether it holds a half-open slot
    fn admit_call(&self) -> Admission {
        match self.state() {
            CircuitState::Closed => Admission::Normal,
            CircuitState::Open => {
                if self.remaining_open_time() > Duration::ZERO {
                    return Admission::Rejected;
                }

                // One caller wins the transition and takes the first half-open slot
                if self
                    .state
                    .compare_exchange(
                        CircuitState::Open as u8,
                        CircuitState::HalfOpen as u8,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    )
                    .is_ok()
                {
                    info!(
                        component = %self.name,
                        success_threshold = self.config.success_threshold,
                        "Circuit breaker half-open (testing recovery)"
                    );
                }
                self.admit_half_open_trial()
            }
            CircuitState::HalfOpen => self.admit_half_open_trial(),
        }
    }

    fn admit_half_open_trial(&self) -> Admission {
        match self.state() {
            CircuitState::Closed => Admission::Normal,
            CircuitState::Open => Admission::Rejected,
            CircuitState::HalfOpen => {
                let admitted = self.metrics.half_open_admitted.fetch_add(1, Ordering::AcqRel) + 1;
                if admitted <= self.config.success_threshold as u64 {
                    Admission::Trial
                } else {
                    Admission::Rejected
                }
            }
        }
    }

    fn remaining_open_time(&self) -> Duration {
        let opened_nanos = self.opened_at_epoch_nanos.load(Ordering::Acquire);
        if opened_nanos == 0 {
            return Duration::ZERO;
        }
        let elapsed = Duration::from_nanos(epoch_nanos_now().saturating_sub(opened_nanos));
        self.config.timeout.saturating_sub(elapsed)
    }

    fn record_success(&self, duration: Duration) {
        self.metrics.record_success(duration);

        debug!(
            component = %self.name,
            duration_ms = duration.as_millis() as u64,
            "Operation succeeded"
        );

        match self.state() {
            CircuitState::HalfOpen => {
                let successes = self.metrics.half_open_successes.fetch_add(1, Ordering::AcqRel) + 1;
                if successes >= self.config.success_threshold as u64 {
                    self.transition_to_closed();
                }
            }
            CircuitState::Closed => {
                self.metrics.consecutive_failures.store(0, Ordering::Relaxed);
            }
            CircuitState::Open => {
                warn!(component = %self.name, "Success recorded while circuit is open");
            }
        }
    }

    fn record_failure(&self, duration: Duration) {
        let failures = self.metrics.record_failure(duration);
        self.last_failure_epoch_nanos
            .store(epoch_nanos_now(), Ordering::Release);

        warn!(
            component = %self.name,
            duration_ms = duration.as_millis() as u64,
            consecutive_failures = failures,
            "Operation failed"
        );

        match self.state() {
            CircuitState::Closed => {
                if failures >= self.config.failure_threshold as u64 {
                    self.transition_to_open(CircuitState::Closed);
                }
            }
            CircuitState::HalfOpen => {
                // Any failure in half-open state reopens with a fresh timer
                self.transition_to_open(CircuitState::HalfOpen);
            }
            CircuitState::Open => {}
        }
    }

    fn transition_to_closed(&self) {
        self.metrics.consecutive_failures.store(0, Ordering::Relaxed);
        self.metrics.reset_half_open();
        self.opened_at_epoch_nanos.store(0, Ordering::Release);
        self.state.store(CircuitState::Closed as u8, Ordering::Release);

        info!(
            component = %self.name,
            total_calls = self.metrics.total_calls.load(Ordering::Relaxed),
            "Circuit breaker closed (recovered)"
        );
    }

    fn transition_to_open(&self, from: CircuitState) {
        self.metrics.reset_half_open();
        self.opened_at_epoch_nanos
            .store(epoch_nanos_now(), Ordering::Release);

        if self
            .state
            .compare_exchange(
                from as u8,
                CircuitState::Open as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            error!(
                component = %self.name,
                consecutive_failures = self.metrics.consecutive_failures.load(Ordering::Relaxed),
                failure_threshold = self.config.failure_threshold,
                timeout_ms = self.config.timeout.as_millis() as u64,
                "Circuit breaker opened (failing fast)"
            );
        }
    }

    /// Force circuit to open state (for emergency situations)
    pub fn force_open(&self) {
        warn!(component = %self.name, "Circuit breaker forced open");
        self.metrics.reset_half_open();
        self.opened_at_epoch_nanos
            .store(epoch_nanos_now(), Ordering::Release);
        self.state.store(CircuitState::Open as u8, Ordering::Release);
    }

    /// Force circuit to closed state (for emergency recovery)
    pub fn force_closed(&self) {
        warn!(component = %self.name, "Circuit breaker forced closed");
        self.transition_to_closed();
    }

    /// Get current metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        self.metrics.snapshot(self.state())
    }

    /// Current state, failure count and time until the next probe
    pub fn snapshot(&self) -> CircuitBreakerSnapshot {
        let state = self.state();
        CircuitBreakerSnapshot {
            name: self.name.clone(),
            state,
            consecutive_failures: self.metrics.consecutive_failures.load(Ordering::Relaxed),
            failure_threshold: self.config.failure_threshold,
            last_failure_at: epoch_nanos_to_datetime(
                self.last_failure_epoch_nanos.load(Ordering::Acquire),
            ),
            opened_at: epoch_nanos_to_datetime(self.opened_at_epoch_nanos.load(Ordering::Acquire)),
            next_attempt_in: (state == CircuitState::Open).then(|| self.remaining_open_time()),
        }
    }

    /// Get component name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if circuit is healthy (closed state with low failure rate)
    pub fn is_healthy(&self) -> bool {
        if self.state() != CircuitState::Closed {
            return false;
        }

        let total_calls = self.metrics.total_calls.load(Ordering::Relaxed);
        if total_calls < 10 {
            // Too few calls to determine health
            return true;
        }

        let failure_count = self.metrics.failure_count.load(Ordering::Relaxed);
        (failure_count as f64 / total_calls as f64) < 0.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use tokio::time::sleep;

    fn breaker(failure_threshold: u32, timeout_ms: u64) -> CircuitBreaker {
        CircuitBreaker::with_threshold("test", failure_threshold, Duration::from_millis(timeout_ms))
    }

    #[tokio::test]
    async fn test_circuit_breaker_normal_operation() {
        let circuit = breaker(3, 100);
        assert_eq!(circuit.state(), CircuitState::Closed);

        let result = circuit.call(|| async { Ok::<_, String>("success") }).await;
        assert!(result.is_ok());

        let metrics = circuit.metrics();
        assert_eq!(metrics.total_calls, 1);
        assert_eq!(metrics.success_count, 1);
        assert_eq!(metrics.failure_count, 0);
    }

    #[tokio::test]
    async fn test_success_resets_consecutive_failures() {
        let circuit = breaker(3, 100);
        let _ = circuit.call(|| async { Err::<(), _>("error") }).await;
        let _ = circuit.call(|| async { Err::<(), _>("error") }).await;
        let _ = circuit.call(|| async { Ok::<_, &str>(()) }).await;
        let _ = circuit.call(|| async { Err::<(), _>("error") }).await;

        assert_eq!(circuit.state(), CircuitState::Closed);
        assert_eq!(circuit.snapshot().consecutive_failures, 1);
    }

    #[tokio::test]
    async fn test_open_circuit_fails_fast_without_invoking() {
        let circuit = breaker(2, 10_000);
        let invocations = AtomicUsize::new(0);

        for _ in 0..2 {
            let _ = circuit
                .call(|| async {
                    invocations.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("error")
                })
                .await;
        }
        assert_eq!(circuit.state(), CircuitState::Open);

        let result = circuit
            .call(|| async {
                invocations.fetch_add(1, Ordering::SeqCst);
                Ok::<_, &str>(())
            })
            .await;

        assert!(matches!(result, Err(CircuitBreakerError::CircuitOpen { .. })));
        assert_eq!(invocations.load(Ordering::SeqCst), 2);
        assert_eq!(circuit.metrics().rejected_count, 1);

        let snapshot = circuit.snapshot();
        assert_eq!(snapshot.failure_threshold, 2);
        assert!(snapshot.next_attempt_in.unwrap() > Duration::from_secs(9));
        assert!(snapshot.opened_at.is_some());
    }

    #[tokio::test]
    async fn test_circuit_breaker_recovery() {
        let circuit = breaker(1, 50);
        let _ = circuit.call(|| async { Err::<String, _>("error") }).await;
        assert_eq!(circuit.state(), CircuitState::Open);

        sleep(Duration::from_millis(60)).await;

        let result = circuit.call(|| async { Ok::<_, String>("success") }).await;
        assert!(result.is_ok());
        assert_eq!(circuit.state(), CircuitState::Closed);
        assert_eq!(circuit.snapshot().consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_half_open_failure_reopens_with_fresh_timer() {
        let circuit = breaker(1, 50);
        let _ = circuit.call(|| async { Err::<(), _>("error") }).await;
        let first_open = circuit.snapshot().opened_at.unwrap();

        sleep(Duration::from_millis(60)).await;

        let _ = circuit.call(|| async { Err::<(), _>("still down") }).await;
        assert_eq!(circuit.state(), CircuitState::Open);

        let snapshot = circuit.snapshot();
        assert!(snapshot.opened_at.unwrap() > first_open);
        assert!(snapshot.next_attempt_in.unwrap() > Duration::from_millis(20));

        let rejected = circuit.call(|| async { Ok::<_, &str>(()) }).await;
        assert!(rejected.unwrap_err().is_circuit_open());
    }

    #[tokio::test]
    async fn test_half_open_admits_single_probe() {
        let circuit = Arc::new(breaker(1, 20));
        let _ = circuit.call(|| async { Err::<(), _>("error") }).await;
        sleep(Duration::from_millis(30)).await;

        let probe_circuit = circuit.clone();
        let probe = tokio::spawn(async move {
            probe_circuit
                .call(|| async {
                    sleep(Duration::from_millis(50)).await;
                    Ok::<_, &str>(())
                })
                .await
        });

        sleep(Duration::from_millis(10)).await;
        assert_eq!(circuit.state(), CircuitState::HalfOpen);
        let concurrent = circuit.call(|| async { Ok::<_, &str>(()) }).await;
        assert!(concurrent.unwrap_err().is_circuit_open());

        assert!(probe.await.unwrap().is_ok());
        assert_eq!(circuit.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_cancelled_half_open_call_reopens_and_recovers() {
        let circuit = breaker(1, 20);
        let _ = circuit.call(|| async { Err::<(), _>("error") }).await;
        sleep(Duration::from_millis(30)).await;

        let cancelled = tokio::time::timeout(
            Duration::from_millis(5),
            circuit.call(|| async {
                sleep(Duration::from_secs(5)).await;
                Ok::<_, &str>(())
            }),
        )
        .await;
        assert!(cancelled.is_err());
        assert_eq!(circuit.state(), CircuitState::Open);
        assert!(circuit.snapshot().next_attempt_in.is_some());

        sleep(Duration::from_millis(30)).await;
        let recovered = circuit.call(|| async { Ok::<_, &str>(()) }).await;
        assert!(recovered.is_ok());
        assert_eq!(circuit.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_force_operations() {
        let circuit = breaker(1, 1000);

        circuit.force_open();
        assert_eq!(circuit.state(), CircuitState::Open);
        assert!(!circuit.is_healthy());

        circuit.force_closed();
        assert_eq!(circuit.state(), CircuitState::Closed);
        assert!(circuit.is_healthy());
    }
}
