mod common;

use common::{build_manual_cache, FIVE_SECONDS};
use fibre_ttl::runtime::BoxTask;
use fibre_ttl::{CachedFetch, FetchPhase, FetchState, TaskSpawner, TokioSpawner, WatchError, DEFAULT_TTL};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc, Mutex,
};
use std::time::Duration;
use tokio::sync::mpsc;

/// Holds spawned tasks until the test decides to run them.
#[derive(Default)]
struct QueueSpawner {
  tasks: Mutex<Vec<BoxTask>>,
}

impl QueueSpawner {
  fn run_all(&self) -> usize {
    let tasks = std::mem::take(&mut *self.tasks.lock().unwrap());
    let count = tasks.len();
    for task in tasks {
      futures_executor::block_on(task);
    }
    count
  }
}

impl TaskSpawner for QueueSpawner {
  fn spawn(&self, task: BoxTask) {
    self.tasks.lock().unwrap().push(task);
  }
}

fn producer(
  calls: &Arc<AtomicUsize>,
  value: &'static str,
) -> impl FnOnce() -> std::future::Ready<Result<String, String>> {
  let calls = calls.clone();
  move || {
    calls.fetch_add(1, Ordering::SeqCst);
    std::future::ready(Ok(value.to_string()))
  }
}

fn queued() -> (CachedFetch<String, String>, Arc<QueueSpawner>, fibre_ttl::TtlCache<String>) {
  let (cache, _clock) = build_manual_cache::<String>(DEFAULT_TTL);
  let spawner = Arc::new(QueueSpawner::default());
  let fetch = CachedFetch::with_spawner(cache.clone(), spawner.clone());
  (fetch, spawner, cache)
}

#[test]
fn test_watch_fetches_in_background() {
  let (fetch, spawner, cache) = queued();
  let calls = Arc::new(AtomicUsize::new(0));

  assert_eq!(fetch.watch("weather:delhi", FIVE_SECONDS, producer(&calls, "28C")), Ok(true));
  assert!(fetch.state().is_loading());
  assert_eq!(calls.load(Ordering::SeqCst), 1, "Producer is invoked exactly once on a miss");

  assert_eq!(spawner.run_all(), 1);
  let state = fetch.state();
  assert_eq!(state.phase(), FetchPhase::Ready);
  assert_eq!(state.data().map(|v| v.as_str()), Some("28C"));
  assert!(cache.get("weather:delhi").is_some());
}

#[test]
fn test_watch_same_key_and_ttl_is_a_no_op() {
  let (fetch, spawner, _cache) = queued();
  let calls = Arc::new(AtomicUsize::new(0));

  assert_eq!(fetch.watch("k", FIVE_SECONDS, producer(&calls, "a")), Ok(true));
  // A different producer alone does not restart the coordinator.
  assert_eq!(fetch.watch("k", FIVE_SECONDS, producer(&calls, "b")), Ok(false));
  assert_eq!(fetch.generation(), 1);
  assert_eq!(spawner.run_all(), 1);
  assert_eq!(calls.load(Ordering::SeqCst), 1);

  // Settling does not reset the watched pair either.
  assert_eq!(fetch.watch("k", FIVE_SECONDS, producer(&calls, "c")), Ok(false));
  assert_eq!(fetch.state().data().map(|v| v.as_str()), Some("a"));
}

#[test]
fn test_watch_ttl_change_rechecks_cache() {
  let (fetch, spawner, _cache) = queued();
  let calls = Arc::new(AtomicUsize::new(0));

  fetch.watch("k", FIVE_SECONDS, producer(&calls, "a")).unwrap();
  spawner.run_all();

  assert_eq!(fetch.watch("k", Duration::from_secs(60), producer(&calls, "b")), Ok(true));
  assert_eq!(fetch.generation(), 2);
  assert_eq!(spawner.run_all(), 0, "The value is still cached, nothing to spawn");
  assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_watch_key_change_discards_stale_result() {
  let (fetch, spawner, cache) = queued();
  let calls = Arc::new(AtomicUsize::new(0));

  fetch.watch("weather:delhi", FIVE_SECONDS, producer(&calls, "28C")).unwrap();
  fetch.watch("weather:mumbai", FIVE_SECONDS, producer(&calls, "31C")).unwrap();

  // Both tasks run, oldest first; only the latest generation lands.
  assert_eq!(spawner.run_all(), 2);
  assert_eq!(fetch.state().data().map(|v| v.as_str()), Some("31C"));
  assert!(cache.get("weather:delhi").is_none());
  assert_eq!(cache.len(), 1);
}

#[test]
fn test_watch_restarts_same_key_after_producer_panic() {
  let (fetch, spawner, _cache) = queued();
  let calls = Arc::new(AtomicUsize::new(0));

  fetch
    .watch("k", FIVE_SECONDS, || async {
      if true {
        panic!("producer panicked");
      }
      Ok(String::new())
    })
    .unwrap();
  assert!(panic::catch_unwind(AssertUnwindSafe(|| spawner.run_all())).is_err());
  assert_eq!(fetch.state().phase(), FetchPhase::Errored);

  assert_eq!(fetch.watch("k", FIVE_SECONDS, producer(&calls, "v")), Ok(true));
  assert_eq!(spawner.run_all(), 1);
  assert_eq!(fetch.state().phase(), FetchPhase::Ready);
  assert_eq!(fetch.state().data().map(|v| v.as_str()), Some("v"));
}

#[test]
fn test_watch_default_uses_cache_ttl() {
  let (fetch, spawner, cache) = queued();
  let calls = Arc::new(AtomicUsize::new(0));

  assert_eq!(fetch.watch_default("k", producer(&calls, "v")), Ok(true));
  assert_eq!(fetch.watched(), Some(("k".to_string(), cache.default_ttl())));
  assert_eq!(fetch.watch("k", DEFAULT_TTL, producer(&calls, "v")), Ok(false));
  assert_eq!(spawner.run_all(), 1);
  assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_watch_without_spawner_outside_runtime() {
  let (cache, _clock) = build_manual_cache::<String>(DEFAULT_TTL);
  let fetch = CachedFetch::<String, String>::new(cache);

  let calls = Arc::new(AtomicUsize::new(0));
  assert_eq!(
    fetch.watch("k", FIVE_SECONDS, producer(&calls, "v")),
    Err(WatchError::SpawnerRequired)
  );
  assert_eq!(fetch.state().phase(), FetchPhase::Idle);
  assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_watch_with_tokio_spawner() {
  let (cache, _clock) = build_manual_cache::<String>(DEFAULT_TTL);
  let fetch = CachedFetch::<String, String>::with_spawner(cache, Arc::new(TokioSpawner::new()));

  let (tx, mut rx) = mpsc::unbounded_channel();
  fetch.add_listener(move |state: &FetchState<String, String>| {
    let _ = tx.send(state.phase());
  });

  fetch
    .watch("weather:delhi", FIVE_SECONDS, || async {
      tokio::time::sleep(Duration::from_millis(20)).await;
      Ok("28C".to_string())
    })
    .unwrap();

  assert_eq!(rx.recv().await, Some(FetchPhase::Fetching));
  assert_eq!(rx.recv().await, Some(FetchPhase::Ready));
  assert_eq!(fetch.state().data().map(|v| v.as_str()), Some("28C"));
}

#[tokio::test]
async fn test_new_picks_up_current_runtime() {
  let (cache, _clock) = build_manual_cache::<String>(DEFAULT_TTL);
  cache.insert("k", "cached".to_string());
  let fetch = CachedFetch::<String, String>::new(cache);

  assert_eq!(fetch.watch("k", FIVE_SECONDS, || std::future::pending()), Ok(true));
  assert_eq!(fetch.state().phase(), FetchPhase::Ready);
}
