use futures_util::future::BoxFuture;

/// A type-erased, sendable unit of background work.
pub type BoxTask = BoxFuture<'static, ()>;

/// A trait for spawning a future onto an asynchronous runtime.
///
/// The coordinator uses it to drive producer futures on behalf of callers
/// that cannot await. Any `Fn(BoxTask)` closure is a spawner, which makes it
/// easy to forward to a runtime this crate has no feature for.
pub trait TaskSpawner: Send + Sync + 'static {
  fn spawn(&self, task: BoxTask);
}

impl<F> TaskSpawner for F
where
  F: Fn(BoxTask) + Send + Sync + 'static,
{
  fn spawn(&self, task: BoxTask) {
    self(task)
  }
}

/// Spawns onto a Tokio runtime.
#[cfg(feature = "tokio")]
#[derive(Debug, Clone)]
pub struct TokioSpawner(tokio::runtime::Handle);

#[cfg(feature = "tokio")]
impl TokioSpawner {
  /// Creates a spawner that uses the current Tokio runtime context.
  /// Panics if called outside of a Tokio runtime.
  pub fn new() -> Self {
    Self(tokio::runtime::Handle::current())
  }

  /// Like [`new`](Self::new), but returns `None` outside of a runtime.
  pub fn try_current() -> Option<Self> {
    tokio::runtime::Handle::try_current().ok().map(Self)
  }

  pub fn from_handle(handle: tokio::runtime::Handle) -> Self {
    Self(handle)
  }
}

#[cfg(feature = "tokio")]
impl TaskSpawner for TokioSpawner {
  fn spawn(&self, task: BoxTask) {
    self.0.spawn(task);
  }
}
