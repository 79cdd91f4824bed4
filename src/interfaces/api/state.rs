use super::rate_limit::{IpRateLimiter, ip_rate_limiter};
use crate::config::ServerEnvConfig;
use crate::domain::repositories::SnapshotRepository;
use std::sync::Arc;

/// Shared state for all API handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SnapshotRepository>,
    pub api_key: Arc<str>,
    pub limiter: Arc<IpRateLimiter>,
}

impl AppState {
    pub fn new(store: Arc<dyn SnapshotRepository>, config: &ServerEnvConfig) -> Self {
        Self {
            store,
            api_key: Arc::from(config.api_key.as_str()),
            limiter: Arc::new(ip_rate_limiter(
                config.rate_limit_window,
                config.rate_limit_max_requests,
            )),
        }
    }
}
