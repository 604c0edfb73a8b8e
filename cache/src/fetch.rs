//! Binds a cache key to an async producer and exposes the outcome as state.
//!
//! A [`CachedFetch`] watches one key at a time. Pointing it at a key checks the
//! shared [`TtlCache`] first; only a miss runs the producer. Each restart bumps
//! a generation counter, and a producer that resolves after its generation has
//! been superseded is ignored entirely: its value is neither published nor
//! cached.

use crate::error::WatchError;
use crate::handles::TtlCache;
use crate::listener::FetchListener;
use crate::runtime::{BoxTask, TaskSpawner};

use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::FutureExt;
use parking_lot::{Mutex, ReentrantMutex, RwLock};

/// Where a coordinator is in its fetch cycle.
///
/// The cache lookup that precedes every restart happens synchronously under
/// the coordinator's lock, so it never shows up as a phase of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
  /// No key has been requested yet.
  Idle,
  /// The producer is running for the current key.
  Fetching,
  /// `data` holds the value for the current key.
  Ready,
  /// The producer failed for the current key. `data` still holds whatever was
  /// shown before. `error` is `None` if the producer panicked.
  Errored,
}

/// The observable `{data, loading, error}` triple.
#[derive(Debug)]
pub struct FetchState<V, E> {
  data: Option<Arc<V>>,
  error: Option<Arc<E>>,
  phase: FetchPhase,
}

impl<V, E> Clone for FetchState<V, E> {
  fn clone(&self) -> Self {
    Self {
      data: self.data.clone(),
      error: self.error.clone(),
      phase: self.phase,
    }
  }
}

impl<V, E> FetchState<V, E> {
  fn idle() -> Self {
    Self {
      data: None,
      error: None,
      phase: FetchPhase::Idle,
    }
  }

  /// The last successfully resolved value, if any.
  pub fn data(&self) -> Option<&Arc<V>> {
    self.data.as_ref()
  }

  /// The failure from the latest attempt, if it failed.
  pub fn error(&self) -> Option<&Arc<E>> {
    self.error.as_ref()
  }

  pub fn is_loading(&self) -> bool {
    self.phase == FetchPhase::Fetching
  }

  pub fn phase(&self) -> FetchPhase {
    self.phase
  }
}

struct Slot<V, E> {
  state: FetchState<V, E>,
  generation: u64,
  watched: Option<(String, Duration)>,
}

struct FetchShared<V, E> {
  cache: TtlCache<V>,
  slot: Mutex<Slot<V, E>>,
  listeners: RwLock<Vec<Arc<dyn FetchListener<V, E>>>>,
  // Held from a slot change until its state has been published, so listeners
  // see states in generation order. Reentrant because listeners may restart.
  publishing: ReentrantMutex<()>,
}

impl<V, E> FetchShared<V, E> {
  /// Hands `state` to every listener. Must be called with `publishing` held.
  ///
  /// Stops early once a listener has restarted the coordinator; the newer
  /// state has already reached every listener by then.
  fn publish(&self, state: &FetchState<V, E>, generation: u64) {
    let listeners = self.listeners.read().clone();
    for listener in listeners {
      if self.slot.lock().generation != generation {
        return;
      }
      listener.on_change(state);
    }
  }

  /// Applies a producer outcome if `generation` is still current.
  fn settle(&self, generation: u64, key: String, ttl: Duration, outcome: Result<V, E>) {
    let _order = self.publishing.lock();
    let published = {
      let mut slot = self.slot.lock();
      if slot.generation != generation {
        tracing::debug!(
          cache = self.cache.shared.label(),
          key = %key,
          generation,
          current = slot.generation,
          "discarding result of superseded fetch"
        );
        return;
      }

      match outcome {
        Ok(value) => {
          let value = Arc::new(value);
          self.cache.insert_arc(key, value.clone(), ttl);
          slot.state.data = Some(value);
          slot.state.phase = FetchPhase::Ready;
          tracing::debug!(cache = self.cache.shared.label(), generation, "fetch settled");
        }
        Err(err) => {
          slot.state.error = Some(Arc::new(err));
          slot.state.phase = FetchPhase::Errored;
          tracing::debug!(cache = self.cache.shared.label(), key = %key, generation, "fetch failed");
        }
      }
      slot.state.clone()
    };
    self.publish(&published, generation);
  }

  /// Moves to `Errored` after the producer for `generation` panicked.
  ///
  /// The watched pair is forgotten too, so watching the same key again
  /// restarts instead of being treated as unchanged.
  fn abandon(&self, generation: u64, key: &str) {
    let _order = self.publishing.lock();
    let published = {
      let mut slot = self.slot.lock();
      if slot.generation != generation {
        return;
      }
      tracing::error!(cache = self.cache.shared.label(), key, generation, "producer panicked");
      slot.watched = None;
      slot.state.phase = FetchPhase::Errored;
      slot.state.clone()
    };
    self.publish(&published, generation);
  }
}

/// The future that runs a producer and settles its outcome.
///
/// Returned by [`CachedFetch::start`] on a cache miss. Await it, or hand
/// [`into_task`](Self::into_task) to a runtime. Dropping it without polling
/// leaves the coordinator in `Fetching` until the next restart.
///
/// If the producer panics, the coordinator moves to `Errored` and the panic
/// is resumed, so it reaches whoever polls this future.
#[must_use = "a pending fetch does nothing unless awaited or spawned"]
pub struct PendingFetch {
  task: BoxTask,
  generation: u64,
}

impl PendingFetch {
  /// The generation this fetch was started under.
  pub fn generation(&self) -> u64 {
    self.generation
  }

  pub fn into_task(self) -> BoxTask {
    self.task
  }
}

impl fmt::Debug for PendingFetch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PendingFetch")
      .field("generation", &self.generation)
      .finish_non_exhaustive()
  }
}

impl Future for PendingFetch {
  type Output = ();

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
    self.task.as_mut().poll(cx)
  }
}

enum Restart {
  Unchanged,
  Hit,
  Miss(PendingFetch),
}

/// Reuses a producer's result across calls within a TTL window and exposes
/// loading, data and error to a caller that does not manage the cache itself.
///
/// Separate coordinators sharing a cache do not coordinate with each other:
/// if several miss the same key at once, each runs its own producer.
pub struct CachedFetch<V, E> {
  shared: Arc<FetchShared<V, E>>,
  spawner: Option<Arc<dyn TaskSpawner>>,
}

impl<V, E> fmt::Debug for CachedFetch<V, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let slot = self.shared.slot.lock();
    f.debug_struct("CachedFetch")
      .field("watched", &slot.watched)
      .field("generation", &slot.generation)
      .field("phase", &slot.state.phase)
      .field("has_spawner", &self.spawner.is_some())
      .finish()
  }
}

impl<V, E> CachedFetch<V, E>
where
  V: Send + Sync + 'static,
  E: Send + Sync + 'static,
{
  /// Creates a coordinator over `cache`.
  ///
  /// With the `tokio` feature, the current Tokio runtime (if any) becomes the
  /// spawner used by [`watch`](Self::watch).
  pub fn new(cache: TtlCache<V>) -> Self {
    #[cfg(feature = "tokio")]
    let spawner = crate::runtime::TokioSpawner::try_current()
      .map(|spawner| Arc::new(spawner) as Arc<dyn TaskSpawner>);
    #[cfg(not(feature = "tokio"))]
    let spawner = None;

    Self::build(cache, spawner)
  }

  /// Creates a coordinator that spawns background fetches through `spawner`.
  pub fn with_spawner(cache: TtlCache<V>, spawner: Arc<dyn TaskSpawner>) -> Self {
    Self::build(cache, Some(spawner))
  }

  fn build(cache: TtlCache<V>, spawner: Option<Arc<dyn TaskSpawner>>) -> Self {
    Self {
      shared: Arc::new(FetchShared {
        cache,
        slot: Mutex::new(Slot {
          state: FetchState::idle(),
          generation: 0,
          watched: None,
        }),
        listeners: RwLock::new(Vec::new()),
        publishing: ReentrantMutex::new(()),
      }),
      spawner,
    }
  }

  /// Registers a listener for every published state.
  pub fn add_listener<L>(&self, listener: L)
  where
    L: FetchListener<V, E> + 'static,
  {
    self.shared.listeners.write().push(Arc::new(listener));
  }

  /// Points the coordinator at `key`, fetching in the background on a miss.
  ///
  /// Does nothing and returns `Ok(false)` when `key` and `ttl` equal the pair
  /// already being watched; the producer itself is never compared. Otherwise
  /// restarts and returns `Ok(true)`.
  pub fn watch<F, Fut>(
    &self,
    key: impl Into<String>,
    ttl: Duration,
    producer: F,
  ) -> Result<bool, WatchError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
  {
    let spawner = self.spawner.as_ref().ok_or(WatchError::SpawnerRequired)?;

    match self.restart(key.into(), ttl, producer, true) {
      Restart::Unchanged => Ok(false),
      Restart::Hit => Ok(true),
      Restart::Miss(pending) => {
        spawner.spawn(pending.into_task());
        Ok(true)
      }
    }
  }

  /// [`watch`](Self::watch) with the cache's default TTL.
  pub fn watch_default<F, Fut>(&self, key: impl Into<String>, producer: F) -> Result<bool, WatchError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
  {
    self.watch(key, self.shared.cache.default_ttl(), producer)
  }

  /// Restarts for `key` unconditionally.
  ///
  /// A cache hit is applied before this returns and yields `None`. A miss
  /// moves to `Fetching` and yields the future that runs `producer`; the
  /// caller is responsible for driving it.
  pub fn start<F, Fut>(&self, key: impl Into<String>, ttl: Duration, producer: F) -> Option<PendingFetch>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
  {
    match self.restart(key.into(), ttl, producer, false) {
      Restart::Miss(pending) => Some(pending),
      Restart::Unchanged | Restart::Hit => None,
    }
  }

  /// Restarts for `key` and waits for the outcome.
  ///
  /// Returns the state as it is once this attempt settles. If another restart
  /// superseded it in the meantime, that is the newer attempt's state.
  pub async fn load<F, Fut>(&self, key: impl Into<String>, ttl: Duration, producer: F) -> FetchState<V, E>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
  {
    if let Some(pending) = self.start(key, ttl, producer) {
      pending.await;
    }
    self.state()
  }

  /// [`load`](Self::load) with the cache's default TTL.
  pub async fn load_default<F, Fut>(&self, key: impl Into<String>, producer: F) -> FetchState<V, E>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
  {
    self.load(key, self.shared.cache.default_ttl(), producer).await
  }

  fn restart<F, Fut>(&self, key: String, ttl: Duration, producer: F, only_if_changed: bool) -> Restart
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
  {
    let order = self.shared.publishing.lock();
    let (published, current, generation) = {
      let mut slot = self.shared.slot.lock();
      if only_if_changed {
        if let Some((watched_key, watched_ttl)) = &slot.watched {
          if *watched_key == key && *watched_ttl == ttl {
            return Restart::Unchanged;
          }
        }
      }

      slot.generation += 1;
      slot.watched = Some((key.clone(), ttl));
      slot.state.error = None;
      match self.shared.cache.get(&key) {
        Some(value) => {
          slot.state.data = Some(value);
          slot.state.phase = FetchPhase::Ready;
          (slot.state.clone(), slot.generation, None)
        }
        None => {
          slot.state.phase = FetchPhase::Fetching;
          (slot.state.clone(), slot.generation, Some(slot.generation))
        }
      }
    };
    self.shared.publish(&published, current);
    drop(order);

    let Some(generation) = generation else {
      return Restart::Hit;
    };

    tracing::debug!(
      cache = self.shared.cache.shared.label(),
      key = %key,
      generation,
      "starting fetch"
    );
    let fetch = producer();
    let shared = self.shared.clone();
    let task = async move {
      match AssertUnwindSafe(fetch).catch_unwind().await {
        Ok(outcome) => shared.settle(generation, key, ttl, outcome),
        Err(payload) => {
          shared.abandon(generation, &key);
          panic::resume_unwind(payload);
        }
      }
    }
    .boxed();
    Restart::Miss(PendingFetch { task, generation })
  }

  /// A snapshot of the current state.
  pub fn state(&self) -> FetchState<V, E> {
    self.shared.slot.lock().state.clone()
  }

  /// The number of restarts so far. Only the fetch started under the latest
  /// generation may change the state.
  pub fn generation(&self) -> u64 {
    self.shared.slot.lock().generation
  }

  /// The key and TTL most recently requested.
  pub fn watched(&self) -> Option<(String, Duration)> {
    self.shared.slot.lock().watched.clone()
  }

  pub fn cache(&self) -> &TtlCache<V> {
    &self.shared.cache
  }
}
