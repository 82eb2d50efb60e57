//! Row lock manager: one exclusive lock per key, created on first use.
//!
//! Each key maps to a single-permit semaphore. Holding the permit means
//! holding the row. Raw acquisitions also set a per-key `held` flag, and
//! `release` hands the permit back only if it wins the flag. Entries are never removed, so a key that was locked once
//! keeps its lock object for the life of the manager (even after the record
//! behind it is deleted). This keeps "delete" and "first lock of the same key"
//! from racing into two distinct lock objects.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

use super::LockError;

/// Registry of per-key exclusive locks with bounded-wait acquisition.
///
/// Two ways to use it:
/// - `lock` / `lock_within` return a `RowLockGuard`; dropping it releases.
/// - `acquire` / `release` are the raw pair. `release` must only follow a
///   successful `acquire` by the same caller; ownership is not tracked.
///
/// `release` never frees a lock held through a guard, and concurrent
/// releases of one raw acquisition give back a single permit. Don't lock a
/// key you already hold (no reentrancy).
pub struct RowLockManager<K> {
    locks: DashMap<K, Arc<Slot>>,
    wait_limit: Duration,
}

struct Slot {
    permits: Arc<Semaphore>,
    /// Set while the permit is out through `acquire`.
    held: AtomicBool,
}

/// Proof that the caller holds the row lock for `key`.
#[must_use = "the row lock is released as soon as the guard is dropped"]
pub struct RowLockGuard<K> {
    key: K,
    _permit: OwnedSemaphorePermit,
}

impl<K> RowLockGuard<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Explicit unlock (same as dropping the guard).
    pub fn release(self) {}
}

impl<K> RowLockManager<K>
where
    K: Eq + Hash + Clone + Debug,
{
    /// `wait_limit` is the default bound used by `lock` / `acquire`.
    pub fn new(wait_limit: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            wait_limit,
        }
    }

    pub fn wait_limit(&self) -> Duration {
        self.wait_limit
    }

    /// Lock `key`, waiting at most the configured wait limit.
    pub async fn lock(&self, key: K) -> Result<RowLockGuard<K>, LockError> {
        self.lock_within(key, self.wait_limit).await
    }

    /// Lock `key`, waiting at most `wait`. A zero wait tries once.
    pub async fn lock_within(&self, key: K, wait: Duration) -> Result<RowLockGuard<K>, LockError> {
        let slot = self.slot(&key);
        let permit = self.take_permit(&slot, &key, wait).await?;
        debug!(key = ?key, "row lock acquired");
        Ok(RowLockGuard {
            key,
            _permit: permit,
        })
    }

    /// Raw acquire; pair with `release`.
    pub async fn acquire(&self, key: &K) -> Result<(), LockError> {
        self.acquire_within(key, self.wait_limit).await
    }

    pub async fn acquire_within(&self, key: &K, wait: Duration) -> Result<(), LockError> {
        let slot = self.slot(key);
        let permit = self.take_permit(&slot, key, wait).await?;
        // the permit comes back through `release`
        permit.forget();
        slot.held.store(true, Ordering::Release);
        debug!(key = ?key, "row lock acquired");
        Ok(())
    }

    /// Release a lock taken with `acquire`.
    ///
    /// Unknown keys and keys that are not held are ignored.
    pub fn release(&self, key: &K) {
        let Some(slot) = self.locks.get(key).map(|slot| Arc::clone(slot.value())) else {
            debug!(key = ?key, "release of unknown key ignored");
            return;
        };
        if slot
            .held
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            slot.permits.add_permits(1);
            debug!(key = ?key, "row lock released");
        }
    }

    /// Whether someone currently holds `key`.
    pub fn is_locked(&self, key: &K) -> bool {
        self.locks
            .get(key)
            .is_some_and(|slot| slot.permits.available_permits() == 0)
    }

    /// Number of keys that ever had a lock created.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Get-or-insert the lock object for `key`.
    ///
    /// The insert goes through the map entry API, so concurrent first users
    /// of a key all end up with the same semaphore.
    fn slot(&self, key: &K) -> Arc<Slot> {
        if let Some(slot) = self.locks.get(key) {
            return Arc::clone(slot.value());
        }
        let slot = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| {
                Arc::new(Slot {
                    permits: Arc::new(Semaphore::new(1)),
                    held: AtomicBool::new(false),
                })
            });
        Arc::clone(slot.value())
    }

    async fn take_permit(
        &self,
        slot: &Slot,
        key: &K,
        wait: Duration,
    ) -> Result<OwnedSemaphorePermit, LockError> {
        let permits = Arc::clone(&slot.permits);
        let permit = if wait.is_zero() {
            permits.try_acquire_owned().ok()
        } else {
            match tokio::time::timeout(wait, permits.acquire_owned()).await {
                Ok(Ok(permit)) => Some(permit),
                // slots are never closed, so the inner error can't happen
                Ok(Err(_)) | Err(_) => None,
            }
        };

        permit.ok_or_else(|| {
            warn!(key = ?key, waited_ms = wait.as_millis() as u64, "row lock wait limit exceeded");
            LockError::timeout(key, wait)
        })
    }
}
