//! HTTP server configuration parsing from environment variables.

use super::{lookup_parse, lookup_str};
use anyhow::{Result, bail};
use std::net::SocketAddr;
use std::time::Duration;

/// Read API environment configuration
#[derive(Debug, Clone)]
pub struct ServerEnvConfig {
    pub bind_address: String,
    pub port: u16,
    pub api_key: String,

    // Rate limiting, per client IP
    pub rate_limit_window: Duration,
    pub rate_limit_max_requests: u32,
}

impl ServerEnvConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(api_key) = lookup_str(lookup, "API_KEY") else {
            bail!("API_KEY must be set");
        };

        Ok(Self {
            bind_address: lookup_str(lookup, "BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup_parse(lookup, "PORT", 5001)?,
            api_key,
            rate_limit_window: Duration::from_secs(lookup_parse(lookup, "RATE_LIMIT_WINDOW_SECS", 900)?),
            rate_limit_max_requests: lookup_parse(lookup, "RATE_LIMIT_MAX_REQUESTS", 100)?,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.bind_address, self.port);
        Ok(addr.parse()?)
    }
}
