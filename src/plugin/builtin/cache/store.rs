//! Shared option cache
//!
//! Process-wide map from cache key to the last fetched option list. Entries
//! carry an expiry timer; rescheduling a key aborts its previous timer, and a
//! timer only removes the entry it was scheduled for.

use crate::core::runtime::spawn_detached;
use crate::core::sync::lock_recover;
use crate::source::option::SelectOption;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

static GLOBAL_CACHE: OnceLock<SharedCache> = OnceLock::new();

struct CacheEntry {
    data: Vec<SelectOption>,
    timer: Option<JoinHandle<()>>,
    generation: u64,
}

impl CacheEntry {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

#[derive(Default)]
struct CacheInner {
    entries: Mutex<HashMap<String, CacheEntry>>,
    next_generation: AtomicU64,
}

/// Handle to an option cache; clones share the same entries
#[derive(Clone, Default)]
pub struct SharedCache {
    inner: Arc<CacheInner>,
}

impl std::fmt::Debug for SharedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCache")
            .field("entries", &self.len())
            .finish()
    }
}

impl SharedCache {
    /// A fresh, isolated cache
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache shared by every engine
    pub fn global() -> Self {
        GLOBAL_CACHE.get_or_init(SharedCache::new).clone()
    }

    pub fn get(&self, key: &str) -> Option<Vec<SelectOption>> {
        lock_recover(&self.inner.entries, "SharedCache")
            .get(key)
            .map(|entry| entry.data.clone())
    }

    /// Store `data` under `key`, replacing any previous entry and its timer
    pub fn insert(&self, key: &str, data: Vec<SelectOption>) {
        let generation = self.next_generation();
        let mut entries = lock_recover(&self.inner.entries, "SharedCache");
        if let Some(mut previous) = entries.insert(
            key.to_string(),
            CacheEntry {
                data,
                timer: None,
                generation,
            },
        ) {
            previous.cancel_timer();
        }
    }

    /// (Re)arm the expiry timer for `key`
    ///
    /// Returns `false` if there is no entry, or no runtime to run the timer.
    pub fn schedule_removal(&self, key: &str, delay: Duration) -> bool {
        let generation = self.next_generation();
        let mut entries = lock_recover(&self.inner.entries, "SharedCache");
        let Some(entry) = entries.get_mut(key) else {
            return false;
        };
        entry.cancel_timer();
        entry.generation = generation;

        let weak: Weak<CacheInner> = Arc::downgrade(&self.inner);
        let owned_key = key.to_string();
        entry.timer = spawn_detached("SharedCache", async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut entries = lock_recover(&inner.entries, "SharedCache");
            if entries
                .get(&owned_key)
                .is_some_and(|entry| entry.generation == generation)
            {
                entries.remove(&owned_key);
                log::debug!("SharedCache: expired '{}'", owned_key);
            }
        });
        entry.timer.is_some()
    }

    pub fn remove(&self, key: &str) -> bool {
        let removed = lock_recover(&self.inner.entries, "SharedCache").remove(key);
        match removed {
            Some(mut entry) => {
                entry.cancel_timer();
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        lock_recover(&self.inner.entries, "SharedCache").contains_key(key)
    }

    pub fn len(&self) -> usize {
        lock_recover(&self.inner.entries, "SharedCache").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn next_generation(&self) -> u64 {
        self.inner.next_generation.fetch_add(1, Ordering::Relaxed) + 1
    }
}
