//! File-driven cache configuration.
//!
//! ```yaml
//! name: weather
//! default_ttl: 5m
//! ```
//!
//! Durations accept any `humantime` string (`"300s"`, `"5m"`, `"1h 30m"`).

use crate::builder::{CacheBuilder, DEFAULT_TTL};
use crate::error::ConfigError;
use crate::handles::TtlCache;

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default = "default_ttl", deserialize_with = "humantime_duration")]
  pub default_ttl: Duration,
}

fn default_ttl() -> Duration {
  DEFAULT_TTL
}

fn humantime_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = String::deserialize(deserializer)?;
  humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      name: None,
      default_ttl: DEFAULT_TTL,
    }
  }
}

impl CacheConfig {
  /// Parses a YAML document.
  pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
    let config: CacheConfig = serde_yaml::from_str(source)?;
    config.validate()?;
    Ok(config)
  }

  /// Reads and parses a YAML file.
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let source = std::fs::read_to_string(path.as_ref())?;
    Self::from_yaml_str(&source)
  }

  fn validate(&self) -> Result<(), ConfigError> {
    if let Some(name) = &self.name {
      if name.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
          field: "name".to_string(),
          message: "must not be blank".to_string(),
        });
      }
    }
    self.to_builder::<()>().validate()?;
    Ok(())
  }

  /// A builder preloaded with this configuration.
  pub fn to_builder<V>(&self) -> CacheBuilder<V> {
    let mut builder = CacheBuilder::new().default_ttl(self.default_ttl);
    if let Some(name) = &self.name {
      builder = builder.name(name.clone());
    }
    builder
  }

  /// Builds a cache from this configuration using the system clock.
  pub fn build<V>(&self) -> Result<TtlCache<V>, ConfigError> {
    Ok(self.to_builder().build()?)
  }
}
