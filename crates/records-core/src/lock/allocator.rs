//! Identifier allocator guarded by the creation lock.
//!
//! The next id comes from a counter that only ever moves forward, one step per
//! issued id. It is never derived from how many records are alive, so deleting
//! a record can't make a later create reuse an id.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tracing::warn;

use super::LockError;
use crate::domain::RecordId;

/// Creation lock + monotonic counter.
pub struct IdAllocator {
    /// Last issued id (0 = none yet). The mutex is the creation lock.
    last: Mutex<u64>,
    /// Mirror of `last` readable without taking the creation lock.
    issued: AtomicU64,
    wait_limit: Duration,
}

/// Held creation lock. Ids can only be drawn while holding it.
pub struct Allocation<'a> {
    last: MutexGuard<'a, u64>,
    issued: &'a AtomicU64,
}

impl IdAllocator {
    pub fn new(wait_limit: Duration) -> Self {
        Self {
            last: Mutex::new(0),
            issued: AtomicU64::new(0),
            wait_limit,
        }
    }

    /// Take the creation lock, waiting at most the configured wait limit.
    pub async fn lock(&self) -> Result<Allocation<'_>, LockError> {
        self.lock_within(self.wait_limit).await
    }

    pub async fn lock_within(&self, wait: Duration) -> Result<Allocation<'_>, LockError> {
        let guard = if wait.is_zero() {
            self.last.try_lock().ok()
        } else {
            tokio::time::timeout(wait, self.last.lock()).await.ok()
        };

        match guard {
            Some(last) => Ok(Allocation {
                last,
                issued: &self.issued,
            }),
            None => {
                warn!(waited_ms = wait.as_millis() as u64, "creation lock wait limit exceeded");
                Err(LockError::timeout(&"creation", wait))
            }
        }
    }

    /// Highest id handed out so far.
    pub fn last_issued(&self) -> Option<RecordId> {
        match self.issued.load(Ordering::Acquire) {
            0 => None,
            n => Some(RecordId::new(n)),
        }
    }
}

impl Allocation<'_> {
    /// Draw the next id.
    pub fn next_id(&mut self) -> RecordId {
        *self.last += 1;
        self.issued.store(*self.last, Ordering::Release);
        RecordId::new(*self.last)
    }
}
