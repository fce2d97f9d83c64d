//! Per-key async locks kept in a [`DashMap`].
//!
//! A [`KeyedLock`] registers interest in a key's lock and removes the map
//! entry when the last holder goes away, including a holder whose future was
//! dropped while waiting on or holding the lock.

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

pub(crate) type LockMap<K> = DashMap<K, Arc<Mutex<()>>>;

pub(crate) struct KeyedLock<'a, K: Eq + Hash> {
    // Fields drop in order: the handle is released before the entry is checked
    lock: Arc<Mutex<()>>,
    _cleanup: EntryCleanup<'a, K>,
}

struct EntryCleanup<'a, K: Eq + Hash> {
    locks: &'a LockMap<K>,
    key: K,
}

impl<K: Eq + Hash> Drop for EntryCleanup<'_, K> {
    fn drop(&mut self) {
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl<'a, K: Eq + Hash + Clone> KeyedLock<'a, K> {
    pub(crate) fn register(locks: &'a LockMap<K>, key: K) -> Self {
        let lock = Arc::clone(locks.entry(key.clone()).or_default().value());
        Self {
            lock,
            _cleanup: EntryCleanup { locks, key },
        }
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }
}
