use once_cell::sync::Lazy;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

// The single, static reference point for wall-clock readings in the cache.
// It is initialized lazily on its first use.
static CACHE_EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// The current time as a `Duration` since the process-wide cache epoch.
#[inline]
pub(crate) fn now_duration() -> Duration {
  Instant::now().saturating_duration_since(*CACHE_EPOCH)
}

/// A source of monotonic time for expiry checks.
///
/// Readings are durations since an arbitrary, fixed epoch. Only differences
/// between readings of the same clock are meaningful.
pub trait Clock: Send + Sync + fmt::Debug {
  fn now(&self) -> Duration;
}

/// The default clock, backed by `std::time::Instant`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  #[inline]
  fn now(&self) -> Duration {
    now_duration()
  }
}

/// A clock that only moves when told to.
///
/// Intended for tests and simulations that need to cross a TTL boundary
/// without sleeping.
#[derive(Debug, Default)]
pub struct ManualClock {
  nanos: AtomicU64,
}

impl ManualClock {
  /// Creates a clock reading zero.
  pub fn new() -> Self {
    Self::default()
  }

  /// Moves the clock forward by `by`, saturating at `u64::MAX` nanoseconds.
  pub fn advance(&self, by: Duration) {
    let by = saturating_nanos(by);
    let _ = self
      .nanos
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |nanos| Some(nanos.saturating_add(by)));
  }

  /// Sets the clock to an absolute reading, saturating at `u64::MAX`
  /// nanoseconds.
  pub fn set(&self, to: Duration) {
    self.nanos.store(saturating_nanos(to), Ordering::SeqCst);
  }
}

fn saturating_nanos(duration: Duration) -> u64 {
  u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

impl Clock for ManualClock {
  fn now(&self) -> Duration {
    Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
  }
}
