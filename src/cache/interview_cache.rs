//! # Interview Cache
//!
//! Typed helpers over a shared [`TtlCache<serde_json::Value>`] for the reads the
//! interview service repeats most: session snapshots, a user's interview
//! history and generated question sets.
//!
//! Writes are best-effort. A value that fails to serialize is returned to the
//! caller uncached, and a cached value that no longer deserializes is dropped
//! and fetched again.

use super::errors::{CacheError, CacheResult};
use super::ttl_cache::{CacheStats, TtlCache};
use crate::config::CacheConfig;
use crate::constants::cache::{
    QUESTIONS_PREFIX, QUESTIONS_TTL, SESSION_PREFIX, SESSION_TTL, USER_INTERVIEWS_PREFIX,
    USER_INTERVIEWS_TTL,
};
use crate::error::{InterviewError, InterviewResult};
use crate::models::{InterviewSummary, Question, Session};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// TTLs applied by [`InterviewCache`]
#[derive(Debug, Clone, Copy)]
pub struct InterviewCacheTtls {
    pub session: Duration,
    pub user_interviews: Duration,
    pub questions: Duration,
}

impl Default for InterviewCacheTtls {
    fn default() -> Self {
        Self {
            session: SESSION_TTL,
            user_interviews: USER_INTERVIEWS_TTL,
            questions: QUESTIONS_TTL,
        }
    }
}

impl From<&CacheConfig> for InterviewCacheTtls {
    fn from(config: &CacheConfig) -> Self {
        Self {
            session: config.session_ttl(),
            user_interviews: config.user_interviews_ttl(),
            questions: config.questions_ttl(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InterviewCache {
    cache: Arc<TtlCache<Value>>,
    ttls: InterviewCacheTtls,
}

impl InterviewCache {
    pub fn new(cache: Arc<TtlCache<Value>>) -> Self {
        Self::with_ttls(cache, InterviewCacheTtls::default())
    }

    pub fn with_ttls(cache: Arc<TtlCache<Value>>, ttls: InterviewCacheTtls) -> Self {
        Self { cache, ttls }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        let cache = Arc::new(TtlCache::new(config.default_ttl(), config.max_entries));
        Self::with_ttls(cache, InterviewCacheTtls::from(config))
    }

    pub fn session_key(session_id: Uuid, user_id: &str) -> String {
        TtlCache::<Value>::generate_key(SESSION_PREFIX, [session_id.to_string(), user_id.to_string()])
    }

    pub fn user_interviews_key(user_id: &str, limit: usize) -> String {
        TtlCache::<Value>::generate_key(USER_INTERVIEWS_PREFIX, [limit.to_string(), user_id.to_string()])
    }

    pub fn questions_key(position: &str, difficulty: &str) -> String {
        let position = position.trim().to_lowercase().replace(char::is_whitespace, "_");
        TtlCache::<Value>::generate_key(QUESTIONS_PREFIX, [position, difficulty.to_lowercase()])
    }

    /// Read a value and convert it to `T`
    pub fn get_typed<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.cache.get(key) {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| CacheError::deserialization(key, e)),
            None => Ok(None),
        }
    }

    /// Convert `value` to JSON and store it
    pub fn set_typed<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> CacheResult<()> {
        let json = serde_json::to_value(value).map_err(|e| CacheError::serialization(key, e))?;
        self.cache.set(key, json, Some(ttl));
        Ok(())
    }

    async fn get_or_fetch<T, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> InterviewResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = InterviewResult<T>>,
    {
        match self.get_typed::<T>(key) {
            Ok(Some(value)) => {
                debug!(key = key, "Cache HIT");
                return Ok(value);
            }
            Ok(None) => debug!(key = key, "Cache MISS"),
            Err(e) => {
                warn!(key = key, error = %e, "Dropping unreadable cache entry");
                self.cache.delete(key);
            }
        }

        let value = fetch().await?;
        if let Err(e) = self.set_typed(key, &value, ttl) {
            warn!(key = key, error = %e, "Failed to cache value");
        }
        Ok(value)
    }

    /// Session snapshot for its owner (2 minute TTL by default)
    pub async fn session_data<F, Fut>(
        &self,
        session_id: Uuid,
        user_id: &str,
        fetch: F,
    ) -> InterviewResult<Session>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = InterviewResult<Session>>,
    {
        let key = Self::session_key(session_id, user_id);
        self.get_or_fetch(&key, self.ttls.session, fetch).await
    }

    /// Interview history listing (5 minute TTL by default)
    pub async fn user_interviews<F, Fut>(
        &self,
        user_id: &str,
        limit: usize,
        fetch: F,
    ) -> InterviewResult<Vec<InterviewSummary>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = InterviewResult<Vec<InterviewSummary>>>,
    {
        let key = Self::user_interviews_key(user_id, limit);
        self.get_or_fetch(&key, self.ttls.user_interviews, fetch).await
    }

    /// Question set generated for a position and difficulty (30 minute TTL by default)
    pub async fn generated_questions<F, Fut>(
        &self,
        position: &str,
        difficulty: &str,
        fetch: F,
    ) -> InterviewResult<Vec<Question>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = InterviewResult<Vec<Question>>>,
    {
        let key = Self::questions_key(position, difficulty);
        // Concurrent starts for the same position share one generation call
        let value = self
            .cache
            .get_or_set_coalesced(
                &key,
                || async {
                    let questions = fetch().await?;
                    serde_json::to_value(&questions)
                        .map_err(|e| InterviewError::from(CacheError::serialization(&key, e)))
                },
                Some(self.ttls.questions),
            )
            .await?;

        serde_json::from_value(value).map_err(|e| {
            warn!(key = %key, error = %e, "Dropping unreadable question set");
            self.cache.delete(&key);
            InterviewError::from(CacheError::deserialization(&key, e))
        })
    }

    /// Drop every cached entry owned by `user_id`: keys shaped
    /// `user_interviews:{limit}:{user_id}` or `session:{id}:{user_id}`
    pub fn invalidate_user(&self, user_id: &str) -> usize {
        self.cache.invalidate_where(|key| owned_by(key, user_id))
    }

    pub fn invalidate_session(&self, session_id: Uuid) -> usize {
        self.cache.invalidate_pattern(&format!("{SESSION_PREFIX}:{session_id}:*"))
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn inner(&self) -> &Arc<TtlCache<Value>> {
        &self.cache
    }
}

/// True when `key` is a per-user key whose last of exactly three segments is `user_id`
fn owned_by(key: &str, user_id: &str) -> bool {
    let mut segments = key.split(':');
    matches!(
        (segments.next(), segments.next(), segments.next(), segments.next()),
        (Some(USER_INTERVIEWS_PREFIX | SESSION_PREFIX), Some(_), Some(owner), None)
            if owner == user_id
    )
}
