use crate::domain::ports::SnapshotCache;
use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::debug;

/// Redis-backed snapshot cache.
///
/// Opens a multiplexed connection per call; writes happen once per ingestion
/// cycle so there is nothing worth keeping warm, and an unreachable server
/// never blocks startup.
pub struct RedisSnapshotCache {
    client: redis::Client,
}

impl RedisSnapshotCache {
    /// Parses the URL only; no connection is made here.
    pub fn open(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).context("Invalid Redis URL")?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to connect to Redis")
    }
}

#[async_trait]
impl SnapshotCache for RedisSnapshotCache {
    async fn set(&self, key: &str, payload: String, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        let bytes = payload.len();

        // EX 0 is rejected by Redis
        let _: () = conn
            .set_ex(key, payload, ttl.as_secs().max(1))
            .await
            .with_context(|| format!("Redis SET {key} failed"))?;

        debug!("Redis: cached {} bytes under {} (ttl {:?})", bytes, key, ttl);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .with_context(|| format!("Redis GET {key} failed"))?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_rejects_malformed_url() {
        assert!(RedisSnapshotCache::open("not-a-redis-url").is_err());
        assert!(RedisSnapshotCache::open("redis://127.0.0.1:6379").is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error_not_a_panic() {
        // Port 1 is never a Redis server
        let cache = RedisSnapshotCache::open("redis://127.0.0.1:1").unwrap();
        let result = cache
            .set("coins_all", "[]".to_string(), Duration::from_secs(300))
            .await;
        assert!(result.is_err());
    }
}
