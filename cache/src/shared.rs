use crate::entry::CacheEntry;
use crate::metrics::Metrics;
use crate::time::Clock;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ahash::HashMap;
use parking_lot::Mutex;

/// Name used in log events for caches built without one.
pub(crate) const UNNAMED: &str = "unnamed";

/// The state behind every `TtlCache` handle.
///
/// The map sits behind a single mutex rather than a reader-writer lock:
/// expired entries are removed on read, so every lookup may write.
pub(crate) struct CacheShared<V> {
  pub(crate) store: Mutex<HashMap<String, CacheEntry<V>>>,
  pub(crate) metrics: Metrics,
  pub(crate) default_ttl: Duration,
  pub(crate) clock: Arc<dyn Clock>,
  pub(crate) name: Option<String>,
}

impl<V> CacheShared<V> {
  pub(crate) fn new(default_ttl: Duration, clock: Arc<dyn Clock>, name: Option<String>) -> Self {
    Self {
      store: Mutex::new(HashMap::default()),
      metrics: Metrics::new(),
      default_ttl,
      clock,
      name,
    }
  }

  #[inline]
  pub(crate) fn label(&self) -> &str {
    self.name.as_deref().unwrap_or(UNNAMED)
  }

  #[inline]
  pub(crate) fn now(&self) -> Duration {
    self.clock.now()
  }
}

impl<V> fmt::Debug for CacheShared<V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheShared")
      .field("name", &self.label())
      .field("entries", &self.store.lock().len())
      .field("default_ttl", &self.default_ttl)
      .field("clock", &self.clock)
      .finish()
  }
}
