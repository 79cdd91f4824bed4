use crate::domain::coin::RawQuote;
use crate::domain::errors::PageError;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Outcome of a single page request that reached the upstream API.
#[derive(Debug, Clone, PartialEq)]
pub enum PageFetch {
    /// Successful response; an empty vector means "no more data".
    Quotes(Vec<RawQuote>),
    /// Non-success HTTP status.
    Rejected { status: u16 },
}

/// Upstream listing, one page at a time.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_page(&self, page: u32) -> Result<PageFetch, PageError>;
}

/// Expiring key/value store used to mirror the latest snapshot.
#[async_trait]
pub trait SnapshotCache: Send + Sync {
    async fn set(&self, key: &str, payload: String, ttl: Duration) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<String>>;
}
