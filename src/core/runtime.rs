//! Runtime helpers
//!
//! Debounce timers, cache expiry and deferred loading resets are all detached
//! tokio tasks. Host callbacks may arrive outside a runtime, so spawning goes
//! through [`spawn_detached`] which degrades to a logged no-op.

use std::future::Future;
use tokio::task::JoinHandle;

/// Spawn a detached task on the current tokio runtime
///
/// Returns `None` (and logs) when called outside a runtime context.
pub fn spawn_detached<F>(what: &str, future: F) -> Option<JoinHandle<()>>
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Some(handle.spawn(future)),
        Err(_) => {
            log::warn!("{}: no tokio runtime available, task not scheduled", what);
            None
        }
    }
}
