#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use fibre_ttl::{CacheBuilder, ManualClock, TtlCache};

pub const FIVE_SECONDS: Duration = Duration::from_millis(5000);

/// Installs a test subscriber once per test binary. Set `RUST_LOG=fibre_ttl=debug`
/// to see cache events.
pub fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

/// A cache whose time only moves when the returned clock is advanced.
pub fn build_manual_cache<V>(default_ttl: Duration) -> (TtlCache<V>, Arc<ManualClock>) {
  init_tracing();
  let clock = Arc::new(ManualClock::new());
  let cache = CacheBuilder::new()
    .name("test")
    .default_ttl(default_ttl)
    .clock(clock.clone())
    .build()
    .unwrap();
  (cache, clock)
}
