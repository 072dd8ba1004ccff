// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Process-wide update lock
//!
//! The flash banks and the boot selector are singleton hardware, so at
//! most one update transaction may exist process-wide at any instant.
//! [`UpdateLock`] is the flag that enforces this: a compare-exchange on
//! an atomic boolean linearizes concurrent `begin` attempts, and the
//! RAII [`LockGuard`] releases the flag exactly once on every terminal
//! path, including early error returns.
//!
//! The lock only protects the flag itself. Long-running work (flash
//! writes, hashing) runs outside any critical section; safety comes from
//! the guard being owned by the single transaction that won the flag.
//!
//! A process-global instance is available via [`UpdateLock::global`];
//! tests inject their own instance per updater for isolation.

use core::sync::atomic::{AtomicBool, Ordering};

static GLOBAL_UPDATE_LOCK: UpdateLock = UpdateLock::new();

/// Process-wide "an update is running" flag
pub struct UpdateLock {
    running: AtomicBool,
}

impl UpdateLock {
    /// Create a new, unheld lock
    #[must_use]
    pub const fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
        }
    }

    /// Get the process-global lock instance
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL_UPDATE_LOCK
    }

    /// Try to acquire the lock
    ///
    /// Exactly one of any set of concurrent callers succeeds; the others
    /// get `None`. The returned guard releases the lock on drop.
    #[must_use]
    pub fn try_lock(&self) -> Option<LockGuard<'_>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(LockGuard { lock: self })
        } else {
            None
        }
    }

    /// Advisory snapshot of the lock state
    ///
    /// May be stale by the time the caller acts on it; only
    /// [`UpdateLock::try_lock`] decides who runs.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

impl Default for UpdateLock {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII token proving ownership of an [`UpdateLock`]
///
/// Dropping the guard releases the lock.
#[must_use]
pub struct LockGuard<'a> {
    lock: &'a UpdateLock,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.lock.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_release() {
        let lock = UpdateLock::new();
        assert!(!lock.is_running());

        let guard = lock.try_lock().unwrap();
        assert!(lock.is_running());

        drop(guard);
        assert!(!lock.is_running());
    }

    #[test]
    fn test_second_acquire_fails_while_held() {
        let lock = UpdateLock::new();
        let _guard = lock.try_lock().unwrap();
        assert!(lock.try_lock().is_none());
    }

    #[test]
    fn test_reacquire_after_release() {
        let lock = UpdateLock::new();
        drop(lock.try_lock().unwrap());
        assert!(lock.try_lock().is_some());
    }
}
