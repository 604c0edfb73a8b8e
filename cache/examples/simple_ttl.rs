use fibre_ttl::{derive_key, TtlCache};
use std::thread;
use std::time::Duration;

fn main() {
  // Entries written with `insert` live for two seconds.
  let cache: TtlCache<f32> = TtlCache::builder()
    .name("weather")
    .default_ttl(Duration::from_secs(2))
    .build()
    .expect("Failed to build cache");

  let key = derive_key("weather", ["delhi"]);
  println!("Inserting ('{}', 28.0) into the cache.", key);
  cache.insert(key.clone(), 28.0);

  match cache.get(&key) {
    Some(temp) => println!("Found temperature for {}: {}", key, temp),
    None => println!("Temperature for {} not found.", key),
  }

  println!("\nWaiting for 3 seconds for the entry to expire...");
  thread::sleep(Duration::from_secs(3));

  // Nothing removed the entry yet; the read below finds it stale and evicts it.
  println!("Entries held before the read: {}", cache.len());
  match cache.get(&key) {
    Some(temp) => println!("Found temperature for {}: {}", key, temp),
    None => println!("Temperature for {} not found (as expected after TTL).", key),
  }
  println!("Entries held after the read: {}", cache.len());

  println!("\nCache metrics: {:#?}", cache.metrics());
}
