use crate::fetch::FetchState;

/// Receives every state a [`CachedFetch`](crate::CachedFetch) publishes.
///
/// Calls happen on whichever thread caused the transition: the caller of
/// `watch`/`start` for cache hits and fetch starts, the task driving the
/// producer for settles. Calls from different threads never overlap and
/// arrive in the order the states were produced, so a slow listener holds up
/// other transitions. Implementations should return quickly. They may call
/// back into the coordinator.
pub trait FetchListener<V, E>: Send + Sync {
  fn on_change(&self, state: &FetchState<V, E>);
}

impl<V, E, F> FetchListener<V, E> for F
where
  F: Fn(&FetchState<V, E>) + Send + Sync,
{
  fn on_change(&self, state: &FetchState<V, E>) {
    self(state)
  }
}
