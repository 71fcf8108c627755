// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-run mutual exclusion.
//!
//! At most one automation run executes at a time; a second trigger is
//! rejected immediately with `RunActive`, never queued. The lock is
//! in-process: the engine owns the only SQLite writer, so a second
//! process cannot run against the same database anyway.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use dunner_core::error::DunnerError;

/// Guard held for the duration of one run.
pub struct RunGuard {
    _guard: OwnedMutexGuard<()>,
}

/// Cloneable handle to the single-run lock.
#[derive(Clone, Default)]
pub struct RunLock {
    inner: Arc<Mutex<()>>,
}

impl RunLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock, or fail fast with `RunActive`.
    pub fn try_acquire(&self) -> Result<RunGuard, DunnerError> {
        match self.inner.clone().try_lock_owned() {
            Ok(guard) => Ok(RunGuard { _guard: guard }),
            Err(_) => Err(DunnerError::RunActive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_guard_held() {
        let lock = RunLock::new();
        let guard = lock.try_acquire().unwrap();
        assert!(matches!(lock.try_acquire(), Err(DunnerError::RunActive)));

        drop(guard);
        assert!(lock.try_acquire().is_ok());
    }

    #[test]
    fn clones_share_the_same_lock() {
        let lock = RunLock::new();
        let other = lock.clone();
        let _guard = lock.try_acquire().unwrap();
        assert!(matches!(other.try_acquire(), Err(DunnerError::RunActive)));
    }
}
