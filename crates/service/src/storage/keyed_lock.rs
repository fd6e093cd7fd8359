use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::errors::ServiceError;

type Slots = DashMap<String, Arc<Mutex<()>>>;

/// Mutual exclusion scoped to a string key.
///
/// Sections on the same key run one at a time in arrival order; sections on
/// different keys never wait on each other. There is no global lock and no
/// re-entrancy: a section must not acquire its own key again.
///
/// A slot exists in the registry only while some task holds or waits for its
/// key, so the registry does not grow with the number of entities ever seen.
#[derive(Clone, Default)]
pub struct KeyedLock {
    slots: Arc<Slots>,
}

/// Live section for one key. Dropping it releases the key, which makes
/// release unconditional: normal return, `?`, panic or a dropped future.
pub struct KeyedLockGuard {
    // Field order matters: the mutex guard is released before the slot
    // reference is given back.
    _guard: OwnedMutexGuard<()>,
    _slot: SlotRef,
}

/// Counted reference to a registry slot; the last one out removes the slot.
struct SlotRef {
    key: String,
    slots: Arc<Slots>,
    mutex: Option<Arc<Mutex<()>>>,
}

impl Drop for SlotRef {
    fn drop(&mut self) {
        drop(self.mutex.take());
        // Checked under the shard lock, so a concurrent `acquire` either
        // already holds a clone (count > 1) or will insert a fresh slot.
        self.slots.remove_if(&self.key, |_, slot| Arc::strong_count(slot) == 1);
    }
}

impl KeyedLock {
    pub fn new() -> Self { Self::default() }

    /// Wait for exclusive access to `key`.
    pub async fn acquire(&self, key: &str) -> KeyedLockGuard {
        let mutex = self
            .slots
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        let slot = SlotRef { key: key.to_string(), slots: Arc::clone(&self.slots), mutex: Some(Arc::clone(&mutex)) };
        let guard = mutex.lock_owned().await;
        debug!(%key, "lock_acquired");
        KeyedLockGuard { _guard: guard, _slot: slot }
    }

    /// Like [`acquire`](Self::acquire) but gives up after `timeout`.
    pub async fn acquire_timeout(&self, key: &str, timeout: Duration) -> Result<KeyedLockGuard, ServiceError> {
        match tokio::time::timeout(timeout, self.acquire(key)).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                warn!(%key, timeout_ms = timeout.as_millis() as u64, "lock_wait_timed_out");
                Err(ServiceError::LockTimeout(key.to_string()))
            }
        }
    }

    /// Run `op` while holding `key`.
    pub async fn with_lock<F, Fut, T>(&self, key: &str, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = self.acquire(key).await;
        op().await
    }

    /// Run `op` while holding `key`, waiting at most `timeout` for it when one
    /// is given. `None` waits indefinitely, same as [`with_lock`](Self::with_lock).
    pub async fn with_lock_timeout<F, Fut, T>(&self, key: &str, timeout: Option<Duration>, op: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = match timeout {
            Some(timeout) => self.acquire_timeout(key, timeout).await?,
            None => self.acquire(key).await,
        };
        Ok(op().await)
    }

    /// Number of keys currently held or waited on.
    pub fn active_keys(&self) -> usize { self.slots.len() }
}
