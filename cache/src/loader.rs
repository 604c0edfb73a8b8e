use crate::handles::TtlCache;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

impl<V> TtlCache<V> {
  /// Returns the fresh value for `key`, or awaits `producer` and caches what
  /// it returns.
  ///
  /// Failures are returned to the caller and never cached, so the next call
  /// for the same key runs its producer again. Concurrent misses for one key
  /// each run their own producer; there is no request coalescing.
  pub async fn get_or_fetch<F, Fut, E>(
    &self,
    key: impl Into<String>,
    ttl: Duration,
    producer: F,
  ) -> Result<Arc<V>, E>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>>,
  {
    let key = key.into();
    if let Some(value) = self.get(&key) {
      return Ok(value);
    }

    tracing::debug!(cache = self.shared.label(), key = %key, "fetching on miss");
    let value = Arc::new(producer().await?);
    self.insert_arc(key, value.clone(), ttl);
    Ok(value)
  }

  /// [`get_or_fetch`](Self::get_or_fetch) with the cache's default TTL.
  pub async fn get_or_fetch_default<F, Fut, E>(
    &self,
    key: impl Into<String>,
    producer: F,
  ) -> Result<Arc<V>, E>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>>,
  {
    self.get_or_fetch(key, self.shared.default_ttl, producer).await
  }
}
