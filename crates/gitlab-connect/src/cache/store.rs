//! Synchronized connection map with per-key in-flight guards

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::Mutex as AsyncMutex;

use super::key::CacheKey;
use crate::connection::ConnectionHandle;

/// Guard serializing resolution of one key
pub(crate) type Slot = Arc<AsyncMutex<()>>;

/// Thread-safe map from [`CacheKey`] to a shared [`ConnectionHandle`]
///
/// # Locking
///
/// The entry map sits behind a `parking_lot::RwLock` that is only held for
/// the duration of a lookup or an insert, never across an `.await`.
/// Resolution of a missing key is serialized through a per-key async slot
/// so that concurrent misses for the same key validate once, while misses
/// for different keys proceed in parallel.
#[derive(Default)]
pub struct ConnectionCache {
    entries: RwLock<HashMap<CacheKey, Arc<ConnectionHandle>>>,
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl std::fmt::Debug for ConnectionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionCache")
            .field("entry_count", &self.entries.read().len())
            .field("in_flight", &self.slots.lock().len())
            .finish()
    }
}

impl ConnectionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Arc<ConnectionHandle>> {
        self.entries.read().get(key).cloned()
    }

    /// Store `handle` under `key`, returning the handle it replaced
    pub fn insert(
        &self,
        key: CacheKey,
        handle: Arc<ConnectionHandle>,
    ) -> Option<Arc<ConnectionHandle>> {
        self.entries.write().insert(key, handle)
    }

    pub fn remove(&self, key: &CacheKey) -> Option<Arc<ConnectionHandle>> {
        self.entries.write().remove(key)
    }

    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Keys currently cached, in no particular order
    #[must_use]
    pub fn keys(&self) -> Vec<CacheKey> {
        self.entries.read().keys().cloned().collect()
    }

    /// Get or create the in-flight slot for `key`
    pub(crate) fn slot(&self, key: &CacheKey) -> Slot {
        Arc::clone(self.slots.lock().entry(key.clone()).or_default())
    }

    /// Drop the slot for `key` once no other caller holds it
    pub(crate) fn release_slot(&self, key: &CacheKey, slot: Slot) {
        let mut slots = self.slots.lock();
        // One reference in the map, one in `slot`
        if Arc::strong_count(&slot) <= 2 {
            slots.remove(key);
        }
    }

    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> usize {
        self.slots.lock().len()
    }
}
