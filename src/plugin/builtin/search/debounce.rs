//! Cancellable debounce around [`SearchRunner`]
//!
//! At most one call is pending at a time. A new call replaces the pending one.
//! Cancelling only affects a call that has not started: once the timer fires,
//! the task detaches itself from the pending slot and runs to completion, and
//! the gate decides whether its result is applied.

use crate::core::runtime::spawn_detached;
use crate::core::sync::lock_recover;
use crate::plugin::builtin::search::request::SearchRequest;
use crate::plugin::builtin::search::runner::SearchRunner;
use crate::plugin::events::EngineAction;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

struct PendingCall {
    id: u64,
    handle: JoinHandle<()>,
}

/// Debounced search function
pub struct DebouncedSearch {
    runner: SearchRunner,
    wait: Duration,
    pending: Mutex<Option<PendingCall>>,
    next_call_id: AtomicU64,
}

impl std::fmt::Debug for DebouncedSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebouncedSearch")
            .field("wait", &self.wait)
            .field("generation", &self.runner.generation)
            .field("pending", &self.is_pending())
            .finish()
    }
}

impl DebouncedSearch {
    pub(crate) fn new(runner: SearchRunner, wait: Duration) -> Self {
        Self {
            runner,
            wait,
            pending: Mutex::new(None),
            next_call_id: AtomicU64::new(0),
        }
    }

    pub fn generation(&self) -> u64 {
        self.runner.generation
    }

    /// Schedule `request` after the debounce wait, replacing any pending call
    pub fn call(self: &Arc<Self>, request: SearchRequest) {
        self.schedule(request, self.wait);
    }

    /// Schedule `request` with no wait
    ///
    /// Still replaces a pending call, so synchronous bursts coalesce.
    pub fn fire(self: &Arc<Self>, request: SearchRequest) {
        self.schedule(request, Duration::ZERO);
    }

    /// Cancel anything pending and run `request` in place
    pub async fn flush(&self, request: SearchRequest) {
        self.cancel();
        self.runner.execute(request).await;
    }

    /// Drop the pending call, if it has not started
    pub fn cancel(&self) -> bool {
        match lock_recover(&self.pending, "DebouncedSearch").take() {
            Some(pending) => {
                pending.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        lock_recover(&self.pending, "DebouncedSearch").is_some()
    }

    fn schedule(self: &Arc<Self>, request: SearchRequest, wait: Duration) {
        let id = self.next_call_id.fetch_add(1, Ordering::Relaxed) + 1;
        let mut pending = lock_recover(&self.pending, "DebouncedSearch");
        if let Some(previous) = pending.take() {
            previous.handle.abort();
        }

        let this = Arc::clone(self);
        let task = async move {
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
            {
                let mut pending = lock_recover(&this.pending, "DebouncedSearch");
                if pending.as_ref().map(|call| call.id) != Some(id) {
                    return;
                }
                pending.take();
            }
            this.runner.execute(request).await;
        };

        self.runner.context.emit(
            EngineAction::SearchScheduled,
            json!({ "call": id, "wait_ms": wait.as_millis() as u64 }),
        );
        if let Some(handle) = spawn_detached("DebouncedSearch", task) {
            *pending = Some(PendingCall { id, handle });
        }
    }
}
