//! Configuration module for coinsnap.
//!
//! Configuration is loaded from environment variables (a `.env` file is read
//! by the binaries through `dotenvy`), organized by concern: Server,
//! Ingestion and Storage.

mod ingestion_config;
mod server_config;
mod storage_config;

pub use ingestion_config::IngestionEnvConfig;
pub use server_config::ServerEnvConfig;
pub use storage_config::StorageEnvConfig;

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerEnvConfig,
    pub ingestion: IngestionEnvConfig,
    pub storage: StorageEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            server: ServerEnvConfig::from_lookup(&lookup).context("Failed to load server config")?,
            ingestion: IngestionEnvConfig::from_lookup(&lookup)
                .context("Failed to load ingestion config")?,
            storage: StorageEnvConfig::from_lookup(&lookup)
                .context("Failed to load storage config")?,
        })
    }
}

/// Trimmed, non-empty value of `key`.
pub(crate) fn lookup_str<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parsed value of `key`, or `default` when unset. A set but unparsable
/// value is an error.
pub(crate) fn lookup_parse<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup_str(lookup, key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Failed to parse {key}={raw}")),
        None => Ok(default),
    }
}
