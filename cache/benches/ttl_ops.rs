use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fibre_ttl::{derive_key, ManualClock, TtlCache};
use std::sync::Arc;
use std::time::Duration;

const TTL: Duration = Duration::from_secs(300);

fn prefilled(num_items: usize) -> (TtlCache<u64>, Vec<String>) {
  let cache = TtlCache::builder().default_ttl(TTL).build().unwrap();
  let keys: Vec<String> = (0..num_items)
    .map(|i| derive_key("bench", [i.to_string()]))
    .collect();
  for (i, key) in keys.iter().enumerate() {
    cache.insert(key.clone(), i as u64);
  }
  (cache, keys)
}

fn bench_get_hit(c: &mut Criterion) {
  let mut group = c.benchmark_group("get_hit");
  for num_items in [1_000usize, 100_000] {
    let (cache, keys) = prefilled(num_items);
    group.throughput(Throughput::Elements(keys.len() as u64));
    group.bench_with_input(BenchmarkId::from_parameter(num_items), &keys, |b, keys| {
      b.iter(|| {
        for key in keys {
          black_box(cache.get(key));
        }
      })
    });
  }
  group.finish();
}

fn bench_insert(c: &mut Criterion) {
  let mut group = c.benchmark_group("insert");
  for num_items in [1_000usize, 100_000] {
    let (cache, keys) = prefilled(num_items);
    group.throughput(Throughput::Elements(keys.len() as u64));
    group.bench_with_input(BenchmarkId::from_parameter(num_items), &keys, |b, keys| {
      b.iter(|| {
        for (i, key) in keys.iter().enumerate() {
          cache.insert(key.clone(), black_box(i as u64));
        }
      })
    });
  }
  group.finish();
}

fn bench_expired_read(c: &mut Criterion) {
  c.bench_function("get_expired_then_reinsert", |b| {
    let clock = Arc::new(ManualClock::new());
    let cache: TtlCache<u64> = TtlCache::builder().clock(clock.clone()).build().unwrap();
    b.iter(|| {
      cache.insert_with_ttl("weather:delhi", 28, Duration::from_millis(1));
      clock.advance(Duration::from_millis(1));
      black_box(cache.get("weather:delhi"));
    })
  });
}

criterion_group!(benches, bench_get_hit, bench_insert, bench_expired_read);
criterion_main!(benches);
