use std::fmt;

/// Errors that can occur when building a cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
  /// The default time-to-live was zero, which would make every entry
  /// inserted with it stale on arrival.
  ZeroTtl,
}

impl fmt::Display for BuildError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BuildError::ZeroTtl => write!(f, "default time-to-live cannot be zero"),
    }
  }
}

impl std::error::Error for BuildError {}

/// Errors returned by [`CachedFetch::watch`](crate::CachedFetch::watch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchError {
  /// `watch` fetches in the background, but the coordinator has no
  /// `TaskSpawner` and was not created inside a Tokio runtime.
  SpawnerRequired,
}

impl fmt::Display for WatchError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      WatchError::SpawnerRequired => write!(
        f,
        "background fetching requires a task spawner or a running tokio runtime"
      ),
    }
  }
}

impl std::error::Error for WatchError {}

/// Errors raised while loading a [`CacheConfig`](crate::config::CacheConfig).
#[cfg(feature = "serde")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Failed to read configuration file: {0}")]
  Read(#[from] std::io::Error),

  #[error("Failed to parse configuration: {0}")]
  Parse(String),

  #[error("Invalid configuration value for '{field}': {message}")]
  InvalidValue { field: String, message: String },
}

#[cfg(feature = "serde")]
impl From<serde_yaml::Error> for ConfigError {
  fn from(err: serde_yaml::Error) -> Self {
    ConfigError::Parse(err.to_string())
  }
}

#[cfg(feature = "serde")]
impl From<BuildError> for ConfigError {
  fn from(err: BuildError) -> Self {
    match err {
      BuildError::ZeroTtl => ConfigError::InvalidValue {
        field: "default_ttl".to_string(),
        message: err.to_string(),
      },
    }
  }
}
