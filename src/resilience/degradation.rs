//! # Graceful Degradation
//!
//! Registry of named fallbacks plus per-service availability tracking.
//!
//! A service that keeps failing is marked unavailable and calls go straight
//! to its fallback. Once `health_check_interval` has passed since the last
//! check, the next call probes the primary again; success marks the service
//! available.
//!
//! Fallbacks receive a per-call input `I` so a single registered fallback can
//! serve every request (e.g. the position a question set is generated for).

use crate::config::DegradationConfig;
use dashmap::DashMap;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

type FallbackFn<I, T> = Arc<dyn Fn(I) -> BoxFuture<'static, anyhow::Result<T>> + Send + Sync>;

/// Errors from [`GracefulDegradationService::execute_with_fallback`]
#[derive(Debug, Error)]
pub enum DegradationError<E> {
    /// The primary failed and the failure threshold has not been reached
    #[error("{0}")]
    Primary(E),

    /// The fallback was needed but none is registered
    #[error("Service '{service}' has no registered fallback")]
    NotRegistered { service: String },

    /// Both the primary and the fallback failed
    #[error("Both primary service and fallback failed for '{service}': {error}")]
    FallbackFailed { service: String, error: anyhow::Error },
}

/// Thresholds for one `execute_with_fallback` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegradationOptions {
    pub fallback_after_failures: u32,
    pub health_check_interval: Duration,
}

impl Default for DegradationOptions {
    fn default() -> Self {
        Self {
            fallback_after_failures: 3,
            health_check_interval: Duration::from_secs(30),
        }
    }
}

impl From<&DegradationConfig> for DegradationOptions {
    fn from(config: &DegradationConfig) -> Self {
        Self {
            fallback_after_failures: config.fallback_after_failures.max(1),
            health_check_interval: config.health_check_interval(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ServiceStatus {
    available: bool,
    failure_count: u32,
    last_check: Option<Instant>,
}

impl Default for ServiceStatus {
    fn default() -> Self {
        Self {
            available: true,
            failure_count: 0,
            last_check: None,
        }
    }
}

/// Status report for one tracked service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatusReport {
    pub name: String,
    pub available: bool,
    pub failure_count: u32,
    pub has_fallback: bool,
    pub last_check_ago: Option<Duration>,
}

pub struct GracefulDegradationService<I, T> {
    fallbacks: DashMap<String, FallbackFn<I, T>>,
    statuses: DashMap<String, ServiceStatus>,
}

impl<I, T> std::fmt::Debug for GracefulDegradationService<I, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GracefulDegradationService")
            .field("fallbacks", &self.fallbacks.len())
            .field("tracked_services", &self.statuses.len())
            .finish()
    }
}

impl<I, T> Default for GracefulDegradationService<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, T> GracefulDegradationService<I, T> {
    pub fn new() -> Self {
        Self {
            fallbacks: DashMap::new(),
            statuses: DashMap::new(),
        }
    }

    /// Store `fallback` for `name` and reset the service to available
    pub fn register_fallback<F, Fut>(&self, name: impl Into<String>, fallback: F)
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let name = name.into();
        let boxed: FallbackFn<I, T> = Arc::new(move |input| Box::pin(fallback(input)));
        self.fallbacks.insert(name.clone(), boxed);
        self.statuses.insert(name.clone(), ServiceStatus::default());
        info!(service = %name, "Registered fallback");
    }

    pub fn has_fallback(&self, name: &str) -> bool {
        self.fallbacks.contains_key(name)
    }

    pub fn is_available(&self, name: &str) -> bool {
        self.statuses.get(name).map_or(true, |status| status.available)
    }

    /// Run `primary`, switching to the registered fallback once the service
    /// has failed `fallback_after_failures` times in a row.
    pub async fn execute_with_fallback<F, Fut, E>(
        &self,
        name: &str,
        fallback_input: I,
        primary: F,
        options: &DegradationOptions,
    ) -> Result<T, DegradationError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let status = *self
            .statuses
            .entry(name.to_string())
            .or_default()
            .value();

        let within_interval = status
            .last_check
            .is_some_and(|checked| checked.elapsed() < options.health_check_interval);

        if !status.available && within_interval {
            return self.run_fallback(name, fallback_input).await;
        }

        let probing = !status.available;
        match primary().await {
            Ok(value) => {
                self.statuses.insert(
                    name.to_string(),
                    ServiceStatus {
                        available: true,
                        failure_count: 0,
                        last_check: Some(Instant::now()),
                    },
                );
                if probing {
                    info!(service = %name, "✅ Service recovered, primary restored");
                }
                Ok(value)
            }
            Err(error) => {
                let failures = {
                    let mut entry = self.statuses.entry(name.to_string()).or_default();
                    entry.failure_count = entry.failure_count.saturating_add(1);
                    entry.last_check = Some(Instant::now());
                    if entry.failure_count >= options.fallback_after_failures {
                        entry.available = false;
                    }
                    entry.failure_count
                };

                if failures < options.fallback_after_failures {
                    warn!(
                        service = %name,
                        failures = failures,
                        threshold = options.fallback_after_failures,
                        error = %error,
                        "Primary failed, below fallback threshold"
                    );
                    return Err(DegradationError::Primary(error));
                }

                warn!(
                    service = %name,
                    failures = failures,
                    error = %error,
                    probing = probing,
                    "⚠️ Service marked unavailable, using fallback"
                );
                crate::logging::log_resilience_event(
                    name,
                    "fallback_activated",
                    Some(failures),
                    Some(&error.to_string()),
                );
                self.run_fallback(name, fallback_input).await
            }
        }
    }

    async fn run_fallback<E>(&self, name: &str, input: I) -> Result<T, DegradationError<E>> {
        let fallback = match self.fallbacks.get(name) {
            Some(fallback) => Arc::clone(fallback.value()),
            None => {
                warn!(service = %name, "Fallback needed but none registered");
                return Err(DegradationError::NotRegistered {
                    service: name.to_string(),
                });
            }
        };

        fallback(input)
            .await
            .map_err(|error| DegradationError::FallbackFailed {
                service: name.to_string(),
                error,
            })
    }

    /// Status of every tracked service, sorted by name
    pub fn services_status(&self) -> Vec<ServiceStatusReport> {
        let mut reports: Vec<ServiceStatusReport> = self
            .statuses
            .iter()
            .map(|entry| ServiceStatusReport {
                name: entry.key().clone(),
                available: entry.available,
                failure_count: entry.failure_count,
                has_fallback: self.fallbacks.contains_key(entry.key()),
                last_check_ago: entry.last_check.map(|checked| checked.elapsed()),
            })
            .collect();
        reports.sort_by(|a, b| a.name.cmp(&b.name));
        reports
    }

    /// Mark a service available again and clear its failure count
    pub fn reset(&self, name: &str) {
        self.statuses
            .insert(name.to_string(), ServiceStatus::default());
    }
}
