use crate::domain::ports::SnapshotCache;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: String,
    expires_at: Instant,
}

/// Process-local expiring cache.
///
/// Uses `tokio::time::Instant`, so expiry follows the tokio clock (and can be
/// driven by a paused clock in tests).
#[derive(Debug, Clone, Default)]
pub struct InMemorySnapshotCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl InMemorySnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired entries.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }
}

#[async_trait]
impl SnapshotCache for InMemorySnapshotCache {
    async fn set(&self, key: &str, payload: String, ttl: Duration) -> Result<()> {
        let entry = CacheEntry {
            payload,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.payload.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = InMemorySnapshotCache::new();
        cache
            .set("coins_all", "[1]".to_string(), Duration::from_secs(300))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get("coins_all").await.unwrap().as_deref(), Some("[1]"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("coins_all").await.unwrap(), None);
        assert_eq!(cache.purge_expired().await, 1);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let cache = InMemorySnapshotCache::new();
        cache.set("k", "a".to_string(), Duration::from_secs(60)).await.unwrap();
        cache.set("k", "b".to_string(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("b"));
        assert_eq!(cache.get("missing").await.unwrap(), None);
    }
}
