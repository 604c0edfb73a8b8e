use crate::entry::CacheEntry;
use crate::metrics::Metrics;
use crate::shared::CacheShared;
use crate::MetricsSnapshot;

use std::sync::Arc;
use std::time::Duration;

/// A thread-safe key-value cache whose entries expire after a time-to-live.
///
/// Expiry is lazy: a stale entry stays in memory until it is read, until
/// [`purge_expired`](Self::purge_expired) runs, or until the cache is cleared.
/// There is no capacity bound and no other eviction policy.
///
/// `TtlCache` is a handle; cloning it is cheap and every clone sees the same
/// entries.
#[derive(Debug)]
pub struct TtlCache<V> {
  pub(crate) shared: Arc<CacheShared<V>>,
}

impl<V> Clone for TtlCache<V> {
  fn clone(&self) -> Self {
    Self {
      shared: self.shared.clone(),
    }
  }
}

impl<V> TtlCache<V> {
  /// Inserts a value under `key` using the cache's default TTL.
  ///
  /// Any existing entry for the key is replaced and its clock restarts.
  pub fn insert(&self, key: impl Into<String>, value: V) {
    self.insert_with_ttl(key, value, self.shared.default_ttl);
  }

  /// Inserts a value under `key` that expires once `ttl` has elapsed.
  pub fn insert_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
    self.insert_arc(key.into(), Arc::new(value), ttl);
  }

  /// Stores an already shared value, so callers holding the `Arc` see the
  /// same allocation the cache hands out.
  pub(crate) fn insert_arc(&self, key: String, value: Arc<V>, ttl: Duration) {
    let entry = CacheEntry::new(value, self.shared.now(), ttl);
    let replaced = self.shared.store.lock().insert(key, entry).is_some();

    Metrics::record(&self.shared.metrics.inserts, 1);
    if replaced {
      Metrics::record(&self.shared.metrics.overwrites, 1);
    }
  }

  /// Retrieves a value from the cache.
  ///
  /// Returns `None` if the key is absent. If the entry has expired it is
  /// removed before returning `None`.
  pub fn get(&self, key: &str) -> Option<Arc<V>> {
    let now = self.shared.now();
    let expired = {
      let mut guard = self.shared.store.lock();
      let lookup = guard.get(key).map(|entry| (entry.is_expired(now), entry.value()));
      match lookup {
        None => None,
        Some((false, value)) => {
          drop(guard);
          Metrics::record(&self.shared.metrics.hits, 1);
          tracing::trace!(cache = self.shared.label(), key, "hit");
          return Some(value);
        }
        Some((true, _)) => guard.remove(key),
      }
    };

    Metrics::record(&self.shared.metrics.misses, 1);
    let Some(expired) = expired else {
      tracing::trace!(cache = self.shared.label(), key, "miss");
      return None;
    };

    // Dropped outside the lock in case `V` has an expensive destructor.
    drop(expired);
    Metrics::record(&self.shared.metrics.evicted_by_ttl, 1);
    tracing::debug!(cache = self.shared.label(), key, "evicted expired entry on read");
    None
  }

  /// Removes all entries from the cache.
  pub fn clear(&self) {
    let drained = std::mem::take(&mut *self.shared.store.lock());
    Metrics::record(&self.shared.metrics.clears, 1);
    tracing::debug!(cache = self.shared.label(), removed = drained.len(), "cleared");
  }

  /// Removes every entry whose TTL has elapsed and returns how many were removed.
  ///
  /// Reads already evict lazily; this is for callers that want to reclaim
  /// memory held by keys that are never read again.
  pub fn purge_expired(&self) -> usize {
    let now = self.shared.now();
    let removed = {
      let mut guard = self.shared.store.lock();
      let before = guard.len();
      guard.retain(|_, entry| !entry.is_expired(now));
      before - guard.len()
    };

    if removed > 0 {
      Metrics::record(&self.shared.metrics.evicted_by_ttl, removed as u64);
      tracing::debug!(cache = self.shared.label(), removed, "purged expired entries");
    }
    removed
  }

  /// The number of entries physically held.
  ///
  /// Entries that have expired but have not been read or purged are still
  /// counted.
  pub fn len(&self) -> usize {
    self.shared.store.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// The TTL applied by [`insert`](Self::insert).
  pub fn default_ttl(&self) -> Duration {
    self.shared.default_ttl
  }

  pub fn name(&self) -> Option<&str> {
    self.shared.name.as_deref()
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.shared.metrics.snapshot()
  }
}
