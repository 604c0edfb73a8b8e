//! A small, thread-safe time-to-live cache and a cached-fetch coordinator.
//!
//! # Features
//! - **Lazy Expiry**: entries carry their own TTL and are evicted when a read
//!   finds them stale. No background sweeper, no capacity bound.
//! - **Non-Clone Support**: values are stored in an `Arc<V>`, avoiding `V: Clone` bounds.
//! - **Cached Fetch**: [`CachedFetch`] runs an async producer only on a miss and
//!   exposes `data`/`loading`/`error`, ignoring results from superseded attempts.
//! - **Deterministic Time**: an injectable [`Clock`], with [`ManualClock`] for tests.
//! - **Observability**: hit/miss and eviction counters, plus `tracing` events.
//! - **Configuration**: optional `serde` feature for YAML-driven setup.
//!
//! ```
//! use fibre_ttl::{derive_key, TtlCache};
//! use std::time::Duration;
//!
//! let cache: TtlCache<u32> = TtlCache::builder()
//!   .default_ttl(Duration::from_secs(60))
//!   .build()
//!   .unwrap();
//!
//! let key = derive_key("weather", ["delhi"]);
//! cache.insert(key.clone(), 28);
//! assert_eq!(cache.get(&key).as_deref(), Some(&28));
//! ```

// Public modules that form the API
pub mod builder;
pub mod error;
pub mod fetch;
pub mod key;
pub mod listener;
pub mod metrics;
pub mod runtime;
pub mod time;

// Internal, crate-only modules
mod entry;
mod handles;
mod loader;
mod shared;

#[cfg(feature = "serde")]
pub mod config;

// Re-export the primary user-facing types for convenience
pub use builder::{CacheBuilder, DEFAULT_TTL};
pub use error::{BuildError, WatchError};
pub use fetch::{CachedFetch, FetchPhase, FetchState, PendingFetch};
pub use handles::TtlCache;
pub use key::derive_key;
pub use listener::FetchListener;
pub use metrics::MetricsSnapshot;
pub use runtime::TaskSpawner;
pub use time::{Clock, ManualClock, SystemClock};

#[cfg(feature = "tokio")]
pub use runtime::TokioSpawner;

#[cfg(feature = "serde")]
pub use config::CacheConfig;
#[cfg(feature = "serde")]
pub use error::ConfigError;
