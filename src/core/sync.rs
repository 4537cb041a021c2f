//! Synchronisation utilities for robust lock handling
//!
//! Engine state, plugin registries and the shared option cache are all guarded
//! by std locks. These helpers turn a poisoned lock into an application error
//! (or recover the guard) instead of panicking in library code.

use std::sync::{LockResult, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Handle poisoned mutex cases with consistent error handling
///
/// # Examples
/// ```
/// use std::sync::Mutex;
/// use selectengine::core::sync::handle_mutex_poison;
///
/// let mutex = Mutex::new(42);
/// let guard = handle_mutex_poison(mutex.lock(), |msg| msg).unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn handle_mutex_poison<T, E>(
    result: LockResult<T>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<T, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (mutex poisoned). This indicates a panic occurred while holding a lock. PoisonError: {:?}",
            poison_err
        ))
    })
}

/// Lock a mutex, recovering the guard if a previous holder panicked
///
/// Used on paths that must return a safe default rather than an error (state
/// reads, post-destroy calls). The poisoning is logged once per occurrence.
pub fn lock_recover<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        log::warn!("{}: recovering from poisoned mutex", what);
        poisoned.into_inner()
    })
}

/// Read-lock an RwLock, recovering the guard if a writer panicked
pub fn read_recover<'a, T>(lock: &'a RwLock<T>, what: &str) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|poisoned| {
        log::warn!("{}: recovering from poisoned RwLock (read)", what);
        poisoned.into_inner()
    })
}

/// Write-lock an RwLock, recovering the guard if a holder panicked
pub fn write_recover<'a, T>(lock: &'a RwLock<T>, what: &str) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poisoned| {
        log::warn!("{}: recovering from poisoned RwLock (write)", what);
        poisoned.into_inner()
    })
}
