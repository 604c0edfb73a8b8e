use fibre_ttl::{derive_key, CachedFetch, FetchState, TtlCache};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tokio::time::{sleep, Duration};

// A simulated slow government-schemes endpoint.
async fn fetch_schemes(state: &'static str, calls: Arc<AtomicUsize>) -> Result<Vec<String>, String> {
  println!("--- API: fetching schemes for {}...", state);
  calls.fetch_add(1, Ordering::SeqCst);
  sleep(Duration::from_millis(300)).await;
  if state == "atlantis" {
    return Err(format!("no schemes published for {}", state));
  }
  Ok(vec![format!("PM-KISAN ({})", state), format!("Soil Health Card ({})", state)])
}

fn describe(state: &FetchState<Vec<String>, String>) -> String {
  format!(
    "phase={:?} loading={} data={:?} error={:?}",
    state.phase(),
    state.is_loading(),
    state.data().map(|d| d.len()),
    state.error().map(|e| e.as_str())
  )
}

#[tokio::main]
async fn main() {
  let cache: TtlCache<Vec<String>> = TtlCache::builder()
    .name("schemes")
    .build()
    .expect("Failed to build cache");
  let calls = Arc::new(AtomicUsize::new(0));
  let ttl = Duration::from_secs(60);

  let fetch = CachedFetch::new(cache.clone());
  fetch.add_listener(|state: &FetchState<Vec<String>, String>| println!("[listener] {}", describe(state)));

  for state in ["punjab", "punjab", "atlantis"] {
    let key = derive_key("schemes", [state]);
    let calls = calls.clone();
    let settled = fetch.load(key, ttl, move || fetch_schemes(state, calls)).await;
    println!("{} -> {}\n", state, describe(&settled));
  }

  println!("Producer calls: {}", calls.load(Ordering::SeqCst));
  println!("Cache metrics: {:#?}", cache.metrics());
}
