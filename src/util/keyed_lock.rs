//! Mutual exclusion keyed by string, usable across independent runtimes.
//!
//! Slots are created on first use and removed once neither an owner nor a
//! waiter references them, so the map only holds keys that are in contention.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A set of async mutexes addressed by key.
#[derive(Default)]
pub struct KeyedLock {
    slots: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLock {
    /// Create an empty lock set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `key` is free and take it.
    pub async fn acquire(&self, key: &str) -> KeyedGuard<'_> {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(key.to_owned()).or_default())
        };
        let guard = Arc::clone(&slot).lock_owned().await;
        KeyedGuard {
            owner: self,
            key: key.to_owned(),
            slot,
            guard: Some(guard),
        }
    }

    /// Number of keys currently held or waited on.
    #[must_use]
    pub fn active_keys(&self) -> usize {
        self.slots.lock().len()
    }
}

/// Holds a key until dropped.
pub struct KeyedGuard<'a> {
    owner: &'a KeyedLock,
    key: String,
    slot: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedGuard<'_> {
    /// The key held by this guard.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut slots = self.owner.slots.lock();
        // The map and this guard are the only references left: no waiters.
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(&self.key);
        }
    }
}
