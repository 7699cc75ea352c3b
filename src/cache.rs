//! Keyed query cache with a staleness window.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

type Slot<V> = Arc<tokio::sync::Mutex<Option<Snapshot<V>>>>;

struct Snapshot<V> {
    value: Arc<V>,
    fetched_at: Instant,
}

/// Shared, read-only snapshots keyed by a logical query key.
///
/// A snapshot younger than the staleness window is served as-is. Otherwise
/// the next consumer runs the fetch; consumers arriving for the same key
/// while that fetch is in flight wait for it instead of starting their own.
/// Snapshots are swapped in whole, so readers never see a partial value.
///
/// Keys are dropped on [`invalidate`](Self::invalidate), and keys left stale
/// and idle are swept whenever a new key is added, so a cache keyed per
/// visitor does not grow without bound.
pub struct QueryCache<V> {
    slots: Mutex<HashMap<String, Slot<V>>>,
}

impl<V> Default for QueryCache<V> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<V> QueryCache<V> {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the snapshot for `key` if it is younger than `stale_time`,
    /// otherwise runs `fetch` and stores its result as the new snapshot.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, stale_time: Duration, fetch: F) -> Arc<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let slot = self.slot(key, stale_time);
        let mut snapshot = slot.lock().await;

        if let Some(current) = snapshot.as_ref() {
            if current.fetched_at.elapsed() < stale_time {
                return Arc::clone(&current.value);
            }
        }

        let value = Arc::new(fetch().await);
        *snapshot = Some(Snapshot {
            value: Arc::clone(&value),
            fetched_at: Instant::now(),
        });
        value
    }

    /// The latest snapshot for `key`, fresh or not. `None` if there is none
    /// or a fetch is currently writing it.
    pub fn peek(&self, key: &str) -> Option<Arc<V>> {
        let slot = self.existing_slot(key)?;
        let snapshot = slot.try_lock().ok()?;
        snapshot.as_ref().map(|s| Arc::clone(&s.value))
    }

    /// Drops the snapshot for `key`; the next consumer fetches again. Waits
    /// for an in-flight fetch of that key to land first.
    pub async fn invalidate(&self, key: &str) {
        let Some(slot) = self.existing_slot(key) else {
            return;
        };
        slot.lock().await.take();

        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // The map and `slot` are the only holders: no consumer is waiting on it.
        let idle = slots
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, &slot) && Arc::strong_count(&slot) == 2);
        if idle {
            slots.remove(key);
        }
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &str, stale_time: Duration) -> Slot<V> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get(key) {
            return Arc::clone(slot);
        }

        slots.retain(|_, slot| !is_idle(slot, stale_time));
        Arc::clone(slots.entry(key.to_string()).or_default())
    }

    fn existing_slot(&self, key: &str) -> Option<Slot<V>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(key).cloned()
    }
}

/// Held only by the map, with nothing fresh to serve.
fn is_idle<V>(slot: &Slot<V>, stale_time: Duration) -> bool {
    if Arc::strong_count(slot) > 1 {
        return false;
    }
    match slot.try_lock() {
        Ok(snapshot) => snapshot
            .as_ref()
            .map_or(true, |s| s.fetched_at.elapsed() >= stale_time),
        Err(_) => false,
    }
}
