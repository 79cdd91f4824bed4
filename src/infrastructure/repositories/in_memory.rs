//! In-Memory Snapshot Repository
//!
//! Thread-safe implementation of `SnapshotRepository` that keeps the current
//! snapshot behind an `Arc<RwLock<Arc<Vec<_>>>>`.
//!
//! # Replace semantics
//!
//! `replace_all` sorts a fresh copy outside the lock and then swaps the
//! inner `Arc` under a write lock held only for the pointer swap. Readers
//! clone the `Arc` and slice their own copy, so a reader sees either the old
//! or the new snapshot in full.
//!
//! # Limitations
//!
//! - Data is lost on application restart
//! - No persistence across multiple instances

use crate::domain::coin::{CoinRecord, sort_by_market_cap_desc};
use crate::domain::repositories::{PageRequest, SnapshotPage, SnapshotRepository};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct InMemorySnapshotRepository {
    snapshot: Arc<RwLock<Arc<Vec<CoinRecord>>>>,
}

impl InMemorySnapshotRepository {
    pub fn new() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(Arc::new(Vec::new()))),
        }
    }

    /// Current snapshot, in stored order.
    pub async fn snapshot(&self) -> Arc<Vec<CoinRecord>> {
        self.snapshot.read().await.clone()
    }
}

impl Default for InMemorySnapshotRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotRepository for InMemorySnapshotRepository {
    async fn replace_all(&self, records: &[CoinRecord]) -> Result<u64> {
        let mut next = records.to_vec();
        sort_by_market_cap_desc(&mut next);
        let len = next.len() as u64;

        *self.snapshot.write().await = Arc::new(next);
        Ok(len)
    }

    async fn query(&self, request: PageRequest) -> Result<SnapshotPage> {
        let current = self.snapshot().await;

        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(request.limit).unwrap_or(usize::MAX);
        let data = current.iter().skip(offset).take(limit).cloned().collect();

        Ok(SnapshotPage::new(request, data))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.snapshot.read().await.len() as u64)
    }
}
