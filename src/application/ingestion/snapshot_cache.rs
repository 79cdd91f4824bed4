//! Optional snapshot cache capability.
//!
//! The pipeline talks to the cache only through [`CacheBackend`], so an
//! unconfigured cache is a variant rather than a null check at call sites.

use crate::config::StorageEnvConfig;
use crate::domain::coin::CoinRecord;
use crate::domain::ports::SnapshotCache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const SNAPSHOT_CACHE_KEY: &str = "coins_all";
pub const SNAPSHOT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Clone, Default)]
pub enum CacheBackend {
    #[default]
    Disabled,
    Enabled {
        cache: Arc<dyn SnapshotCache>,
        key: String,
        ttl: Duration,
    },
}

impl CacheBackend {
    /// Enabled backend with the standard key and TTL.
    pub fn enabled(cache: Arc<dyn SnapshotCache>) -> Self {
        Self::Enabled {
            cache,
            key: SNAPSHOT_CACHE_KEY.to_string(),
            ttl: SNAPSHOT_CACHE_TTL,
        }
    }

    /// Enabled backend using the configured key and TTL.
    pub fn from_config(cache: Arc<dyn SnapshotCache>, config: &StorageEnvConfig) -> Self {
        Self::Enabled {
            cache,
            key: config.cache_key.clone(),
            ttl: config.cache_ttl,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled { .. })
    }

    /// Best-effort write of the full snapshot. Returns whether the cache
    /// accepted it; failures are logged and never propagated.
    pub async fn store_snapshot(&self, records: &[CoinRecord]) -> bool {
        let Self::Enabled { cache, key, ttl } = self else {
            return false;
        };

        let payload = match serde_json::to_string(records) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Snapshot cache: failed to serialize snapshot: {}", e);
                return false;
            }
        };

        match cache.set(key, payload, *ttl).await {
            Ok(()) => {
                debug!("Snapshot cache: {} records written to {}", records.len(), key);
                true
            }
            Err(e) => {
                warn!("Snapshot cache: write to {} failed: {:#}", key, e);
                false
            }
        }
    }

    /// Best-effort read of the cached snapshot. Absence, expiry and backend
    /// failures all yield `None`.
    pub async fn load_snapshot(&self) -> Option<Vec<CoinRecord>> {
        let Self::Enabled { cache, key, .. } = self else {
            return None;
        };

        match cache.get(key).await {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(records) => Some(records),
                Err(e) => {
                    warn!("Snapshot cache: corrupt entry under {}: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Snapshot cache: read of {} failed: {:#}", key, e);
                None
            }
        }
    }
}
