use std::sync::Arc;
use std::time::Duration;

/// A value in the cache together with the timestamps needed to expire it.
#[derive(Debug)]
pub(crate) struct CacheEntry<V> {
  /// The user's value, wrapped in an Arc for shared ownership.
  value: Arc<V>,
  /// Clock reading at the moment the entry was written.
  stored_at: Duration,
  ttl: Duration,
}

impl<V> CacheEntry<V> {
  pub(crate) fn new(value: Arc<V>, stored_at: Duration, ttl: Duration) -> Self {
    Self {
      value,
      stored_at,
      ttl,
    }
  }

  /// Returns a clone of the `Arc` containing the value.
  #[inline]
  pub(crate) fn value(&self) -> Arc<V> {
    self.value.clone()
  }

  /// An entry is stale once `ttl` or more has elapsed since it was stored.
  ///
  /// A clock reading earlier than `stored_at` counts as zero elapsed time.
  #[inline]
  pub(crate) fn is_expired(&self, now: Duration) -> bool {
    now.saturating_sub(self.stored_at) >= self.ttl
  }
}
