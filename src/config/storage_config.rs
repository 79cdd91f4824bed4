//! Storage configuration parsing from environment variables.

use super::{lookup_parse, lookup_str};
use anyhow::Result;
use std::time::Duration;

pub const DEFAULT_CACHE_KEY: &str = "coins_all";

/// Snapshot store and cache environment configuration
#[derive(Debug, Clone)]
pub struct StorageEnvConfig {
    pub database_url: String,
    /// Unset disables the snapshot cache.
    pub redis_url: Option<String>,
    pub cache_key: String,
    pub cache_ttl: Duration,
}

impl Default for StorageEnvConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/coins.db".to_string(),
            redis_url: None,
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            cache_ttl: Duration::from_secs(300),
        }
    }
}

impl StorageEnvConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            database_url: lookup_str(lookup, "DATABASE_URL").unwrap_or(defaults.database_url),
            redis_url: lookup_str(lookup, "REDIS_URL"),
            cache_key: lookup_str(lookup, "CACHE_KEY").unwrap_or(defaults.cache_key),
            cache_ttl: Duration::from_secs(lookup_parse(lookup, "CACHE_TTL_SECS", 300)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::lookup_from;

    #[test]
    fn test_storage_overrides() {
        let lookup = lookup_from(&[
            ("DATABASE_URL", "sqlite:///var/lib/coinsnap/coins.db"),
            ("REDIS_URL", "redis://cache:6379"),
            ("CACHE_TTL_SECS", "60"),
        ]);
        let config = StorageEnvConfig::from_lookup(&lookup).unwrap();
        assert_eq!(config.database_url, "sqlite:///var/lib/coinsnap/coins.db");
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
    }
}
