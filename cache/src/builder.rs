use crate::error::BuildError;
use crate::handles::TtlCache;
use crate::shared::CacheShared;
use crate::time::{Clock, SystemClock};

use core::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// The TTL applied when neither the builder nor the insert names one.
pub const DEFAULT_TTL: Duration = Duration::from_millis(300_000);

/// A builder for creating `TtlCache` instances.
pub struct CacheBuilder<V> {
  pub(crate) default_ttl: Duration,
  pub(crate) name: Option<String>,
  clock: Option<Arc<dyn Clock>>,
  _value_marker: PhantomData<fn() -> V>,
}

impl<V> fmt::Debug for CacheBuilder<V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheBuilder")
      .field("default_ttl", &self.default_ttl)
      .field("name", &self.name)
      .field("has_custom_clock", &self.clock.is_some())
      .finish()
  }
}

impl<V> CacheBuilder<V> {
  /// Creates a builder with a five minute default TTL and the system clock.
  pub fn new() -> Self {
    Self {
      default_ttl: DEFAULT_TTL,
      name: None,
      clock: None,
      _value_marker: PhantomData,
    }
  }

  /// Sets the TTL used by `insert` when no explicit TTL is given.
  pub fn default_ttl(mut self, ttl: Duration) -> Self {
    self.default_ttl = ttl;
    self
  }

  /// Names the cache. The name shows up in log events.
  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// Replaces the system clock, typically with a
  /// [`ManualClock`](crate::time::ManualClock) in tests.
  pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = Some(clock);
    self
  }

  /// Builds the cache.
  pub fn build(self) -> Result<TtlCache<V>, BuildError> {
    self.validate()?;

    let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
    let shared = CacheShared::new(self.default_ttl, clock, self.name);
    tracing::debug!(
      cache = shared.label(),
      default_ttl = ?shared.default_ttl,
      "built ttl cache"
    );

    Ok(TtlCache {
      shared: Arc::new(shared),
    })
  }

  pub(crate) fn validate(&self) -> Result<(), BuildError> {
    if self.default_ttl.is_zero() {
      return Err(BuildError::ZeroTtl);
    }
    Ok(())
  }
}

impl<V> Default for CacheBuilder<V> {
  fn default() -> Self {
    Self::new()
  }
}

impl<V> TtlCache<V> {
  /// Shorthand for `CacheBuilder::new()`.
  pub fn builder() -> CacheBuilder<V> {
    CacheBuilder::new()
  }
}

impl<V> Default for TtlCache<V> {
  /// A cache with the five minute default TTL and the system clock.
  fn default() -> Self {
    TtlCache {
      shared: Arc::new(CacheShared::new(DEFAULT_TTL, Arc::new(SystemClock), None)),
    }
  }
}
