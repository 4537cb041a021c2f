//! State Store
//!
//! Holds one [`EngineState`] per control instance. Writes are merge patches;
//! every applied patch synchronously notifies subscribers with a snapshot,
//! outside the state lock so listeners may read or write the store again.

use crate::core::sync::{lock_recover, read_recover, write_recover};
use crate::state::types::{EngineState, StatePatch};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// State change listener
pub type StateListener = Arc<dyn Fn(&EngineState) + Send + Sync>;

struct StoreInner {
    state: RwLock<EngineState>,
    listeners: Mutex<BTreeMap<u64, StateListener>>,
    next_listener_id: AtomicU64,
    closed: AtomicBool,
}

/// Shared handle to one engine's state
#[derive(Clone)]
pub struct StateStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("state", &*read_recover(&self.inner.state, "StateStore"))
            .field("listeners", &self.listener_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        Self::with_state(EngineState::default())
    }

    pub fn with_state(state: EngineState) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(state),
                listeners: Mutex::new(BTreeMap::new()),
                next_listener_id: AtomicU64::new(1),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Snapshot of the current state
    pub fn get(&self) -> EngineState {
        read_recover(&self.inner.state, "StateStore").clone()
    }

    /// Read a projection of the state without cloning all of it
    pub fn read<R>(&self, f: impl FnOnce(&EngineState) -> R) -> R {
        f(&read_recover(&self.inner.state, "StateStore"))
    }

    /// Merge `patch` and notify subscribers if anything changed
    ///
    /// Returns whether the state changed. Closed stores ignore writes.
    pub fn set_state(&self, patch: StatePatch) -> bool {
        if self.is_closed() {
            log::debug!("StateStore: ignoring patch on closed store: {:?}", patch);
            return false;
        }

        let snapshot = {
            let mut state = write_recover(&self.inner.state, "StateStore");
            if !patch.apply(&mut state) {
                return false;
            }
            state.clone()
        };

        self.notify(&snapshot);
        true
    }

    /// Merge a patch computed from the current state
    ///
    /// The closure runs under the write lock, so read-modify-write sequences
    /// (such as appending to the option list) cannot interleave.
    pub fn update(&self, f: impl FnOnce(&EngineState) -> Option<StatePatch>) -> bool {
        if self.is_closed() {
            return false;
        }

        let snapshot = {
            let mut state = write_recover(&self.inner.state, "StateStore");
            let Some(patch) = f(&state) else {
                return false;
            };
            if !patch.apply(&mut state) {
                return false;
            }
            state.clone()
        };

        self.notify(&snapshot);
        true
    }

    /// Register a listener; dropping the returned handle does not unsubscribe
    pub fn subscribe(&self, listener: StateListener) -> Subscription {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        if !self.is_closed() {
            lock_recover(&self.inner.listeners, "StateStore").insert(id, listener);
        }
        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    pub fn listener_count(&self) -> usize {
        lock_recover(&self.inner.listeners, "StateStore").len()
    }

    /// Stop accepting writes and drop every listener
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        lock_recover(&self.inner.listeners, "StateStore").clear();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    fn notify(&self, snapshot: &EngineState) {
        let listeners: Vec<StateListener> = lock_recover(&self.inner.listeners, "StateStore")
            .values()
            .cloned()
            .collect();
        for listener in listeners {
            listener(snapshot);
        }
    }
}

/// Handle returned by [`StateStore::subscribe`]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    store: std::sync::Weak<StoreInner>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(inner) = self.store.upgrade() {
            lock_recover(&inner.listeners, "StateStore").remove(&self.id);
        }
    }
}
