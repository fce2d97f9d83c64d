//! # In-Process TTL Cache
//!
//! Key/value store with per-entry expiry, hit/miss statistics, bounded size and
//! wildcard invalidation. Entries live in a [`DashMap`] so reads and writes
//! from concurrent tasks never contend on a single lock.
//!
//! **Important**: this cache is NOT distributed. Each process keeps its own
//! entries and statistics.

use super::keyed_lock::{KeyedLock, LockMap};
use super::pattern::wildcard_matches;
use crate::constants::cache::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL, MAX_TTL};
use crate::logging::log_cache_operation;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    hits: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// Cumulative cache statistics, reset only by [`TtlCache::clear`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// hits / (hits + misses), 0.0 before the first lookup
    pub hit_rate: f64,
    pub size: usize,
    pub max_size: usize,
}

/// Process-local TTL cache
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    in_flight: LockMap<String>,
    default_ttl: Duration,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new(default_ttl: Duration, max_entries: usize) -> Self {
        debug!(
            default_ttl_ms = default_ttl.as_millis() as u64,
            max_entries = max_entries,
            "TTL cache created"
        );

        Self {
            entries: DashMap::new(),
            in_flight: DashMap::new(),
            default_ttl,
            max_entries: max_entries.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Build a key of the form `prefix:part1:part2`
    pub fn generate_key<I>(prefix: &str, parts: I) -> String
    where
        I: IntoIterator,
        I::Item: Display,
    {
        let mut key = prefix.to_string();
        for part in parts {
            key.push(':');
            key.push_str(&part.to_string());
        }
        key
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store `value` under `key`, replacing any existing entry.
    ///
    /// At capacity, the entry with the fewest hits is evicted first (ties go
    /// to the one expiring soonest).
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();
        let ttl = ttl.unwrap_or(self.default_ttl);
        if ttl > MAX_TTL {
            debug!(key = %key, ttl_secs = ttl.as_secs(), "Clamping TTL to the maximum");
        }
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl.min(MAX_TTL))
            .unwrap_or(now);

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.evict_one();
        }

        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at,
                hits: 0,
            },
        );
    }

    /// Return the cached value, or `None` when absent or expired
    pub fn get(&self, key: &str) -> Option<V> {
        self.lookup(key, true)
    }

    fn lookup(&self, key: &str, record: bool) -> Option<V> {
        let now = Instant::now();

        let expired = match self.entries.get_mut(key) {
            Some(mut entry) if !entry.is_expired(now) => {
                entry.hits += 1;
                if record {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                }
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        }
        if record {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        None
    }

    /// Remove `key`, returning whether it was present
    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Return the cached value or populate it from `fetch`.
    ///
    /// Only `Ok` results are cached; an `Err` propagates untouched. Two
    /// concurrent misses for the same key may both run `fetch`; use
    /// [`get_or_set_coalesced`](Self::get_or_set_coalesced) when that matters.
    pub async fn get_or_set<F, Fut, E>(
        &self,
        key: &str,
        fetch: F,
        ttl: Option<Duration>,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let value = fetch().await?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }

    /// Like [`get_or_set`](Self::get_or_set), but concurrent misses for the same
    /// key wait on a per-key lock so `fetch` runs once.
    pub async fn get_or_set_coalesced<F, Fut, E>(
        &self,
        key: &str,
        fetch: F,
        ttl: Option<Duration>,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let slot = KeyedLock::register(&self.in_flight, key.to_string());
        let _guard = slot.lock().await;

        // Another caller may have filled the entry while we waited
        if let Some(value) = self.lookup(key, false) {
            return Ok(value);
        }

        let result = fetch().await;
        if let Ok(value) = &result {
            self.set(key, value.clone(), ttl);
        }
        result
    }

    /// Keys with a coalesced fetch running or waiting
    pub fn pending_fetches(&self) -> usize {
        self.in_flight.len()
    }

    /// Delete every key matching a `*` wildcard pattern; returns the count removed
    pub fn invalidate_pattern(&self, pattern: &str) -> usize {
        let removed = self.remove_keys_where(|key| wildcard_matches(pattern, key));
        log_cache_operation("invalidate_pattern", Some(pattern), "ok", Some(removed));
        removed
    }

    /// Delete every key accepted by `predicate`; returns the count removed
    pub fn invalidate_where(&self, predicate: impl Fn(&str) -> bool) -> usize {
        let removed = self.remove_keys_where(predicate);
        log_cache_operation("invalidate_where", None, "ok", Some(removed));
        removed
    }

    fn remove_keys_where(&self, predicate: impl Fn(&str) -> bool) -> usize {
        let matching: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| predicate(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();

        matching
            .iter()
            .filter(|key| self.entries.remove(key.as_str()).is_some())
            .count()
    }

    /// Eagerly drop expired entries; returns the count removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();

        expired
            .iter()
            .filter(|key| {
                self.entries
                    .remove_if(key.as_str(), |_, entry| entry.is_expired(now))
                    .is_some()
            })
            .count()
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;

        CacheStats {
            hits,
            misses,
            evictions: self.evictions.load(Ordering::Relaxed),
            hit_rate: if lookups > 0 {
                hits as f64 / lookups as f64
            } else {
                0.0
            },
            size: self.entries.len(),
            max_size: self.max_entries,
        }
    }

    /// Empty the store and reset every counter
    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        log_cache_operation("clear", None, "ok", None);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_one(&self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|entry| (entry.hits, entry.expires_at))
            .map(|entry| entry.key().clone());

        if let Some(key) = victim {
            if self.entries.remove(&key).is_some() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                log_cache_operation("evict", Some(&key), "evicted", None);
            }
        }
    }
}
