//! Ingestion configuration parsing from environment variables.
//!
//! Pagination bounds, throttling delays and the schedule interval.

use super::{lookup_parse, lookup_str};
use crate::infrastructure::coingecko::DEFAULT_BASE_URL;
use anyhow::{Context, Result, ensure};
use std::time::Duration;
use url::Url;

/// Ingestion environment configuration
#[derive(Debug, Clone)]
pub struct IngestionEnvConfig {
    // Upstream
    pub base_url: String,
    pub api_key: Option<String>,
    pub vs_currency: String,
    pub upstream_max_retries: u32,

    // Pagination
    pub page_size: u32,
    pub max_pages: u32,
    pub page_delay: Duration,
    pub failure_cooldown: Duration,

    // Schedule
    pub interval: Duration,
    pub run_on_startup: bool,
    pub shutdown_grace: Duration,
}

impl Default for IngestionEnvConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            vs_currency: "usd".to_string(),
            upstream_max_retries: 0,
            page_size: 100,
            max_pages: 90,
            page_delay: Duration::from_millis(1500),
            failure_cooldown: Duration::from_millis(5000),
            interval: Duration::from_secs(600),
            run_on_startup: true,
            shutdown_grace: Duration::from_secs(30),
        }
    }
}

impl IngestionEnvConfig {
    /// Ingestion settings alone, for tools that do not serve the API.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup_str(lookup, "COINGECKO_BASE_URL").unwrap_or(defaults.base_url);
        Url::parse(&base_url).with_context(|| format!("Invalid COINGECKO_BASE_URL: {base_url}"))?;

        let config = Self {
            base_url,
            api_key: lookup_str(lookup, "COINGECKO_API_KEY"),
            vs_currency: lookup_str(lookup, "VS_CURRENCY").unwrap_or(defaults.vs_currency),
            upstream_max_retries: lookup_parse(lookup, "UPSTREAM_MAX_RETRIES", 0)?,
            page_size: lookup_parse(lookup, "PAGE_SIZE", defaults.page_size)?,
            max_pages: lookup_parse(lookup, "MAX_PAGES", defaults.max_pages)?,
            page_delay: Duration::from_millis(lookup_parse(lookup, "PAGE_DELAY_MS", 1500)?),
            failure_cooldown: Duration::from_millis(lookup_parse(lookup, "FAILURE_COOLDOWN_MS", 5000)?),
            interval: Duration::from_secs(lookup_parse(lookup, "INGEST_INTERVAL_SECS", 600)?),
            run_on_startup: lookup_parse(lookup, "INGEST_ON_STARTUP", true)?,
            shutdown_grace: Duration::from_secs(lookup_parse(lookup, "SHUTDOWN_GRACE_SECS", 30)?),
        };

        ensure!(config.page_size > 0, "PAGE_SIZE must be positive");
        ensure!(config.max_pages > 0, "MAX_PAGES must be positive");
        ensure!(!config.interval.is_zero(), "INGEST_INTERVAL_SECS must be positive");

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::lookup_from;

    #[test]
    fn test_ingestion_defaults() {
        let config = IngestionEnvConfig::from_lookup(&lookup_from(&[])).unwrap();
        assert_eq!(config.base_url, "https://api.coingecko.com/api/v3");
        assert_eq!(config.page_delay, Duration::from_millis(1500));
        assert_eq!(config.failure_cooldown, Duration::from_secs(5));
        assert_eq!(config.interval, Duration::from_secs(600));
        assert!(config.run_on_startup);
        assert_eq!(config.shutdown_grace, Duration::from_secs(30));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let lookup = lookup_from(&[("INGEST_INTERVAL_SECS", "0")]);
        assert!(IngestionEnvConfig::from_lookup(&lookup).is_err());
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let lookup = lookup_from(&[("COINGECKO_BASE_URL", "coingecko")]);
        assert!(IngestionEnvConfig::from_lookup(&lookup).is_err());
    }

    #[test]
    fn test_startup_flag_parsed() {
        let lookup = lookup_from(&[("INGEST_ON_STARTUP", "false"), ("MAX_PAGES", "3")]);
        let config = IngestionEnvConfig::from_lookup(&lookup).unwrap();
        assert!(!config.run_on_startup);
        assert_eq!(config.max_pages, 3);
    }
}
