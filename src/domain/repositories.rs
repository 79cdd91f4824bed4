//! Repository abstractions for the coin snapshot.
//!
//! Implementations live in `infrastructure`: `SqliteSnapshotRepository` for
//! the durable store and `InMemorySnapshotRepository` for tests and
//! single-process deployments.

use crate::domain::coin::CoinRecord;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 100;

/// Pagination parameters for snapshot reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Missing or non-positive values fall back to page 1 / limit 100.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE),
            limit: limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of the current snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotPage {
    pub page: i64,
    pub limit: i64,
    pub count: usize,
    pub data: Vec<CoinRecord>,
}

impl SnapshotPage {
    pub fn new(request: PageRequest, data: Vec<CoinRecord>) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            count: data.len(),
            data,
        }
    }
}

/// Durable holder of the latest snapshot.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Replace the whole collection. Readers see either the previous or the
    /// new set, never a mix. Returns the number of stored records.
    async fn replace_all(&self, records: &[CoinRecord]) -> Result<u64>;

    /// Records ordered by descending market cap, sliced by `request`.
    async fn query(&self, request: PageRequest) -> Result<SnapshotPage>;

    /// Number of records in the current snapshot.
    async fn count(&self) -> Result<u64>;
}
