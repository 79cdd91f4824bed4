use crate::domain::coin::{CoinRecord, RawQuote};
use crate::domain::errors::PageError;
use crate::domain::ports::{PageFetch, QuoteSource, SnapshotCache};
use crate::domain::repositories::{PageRequest, SnapshotPage, SnapshotRepository};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

/// Scripted response for one page of [`MockQuoteSource`].
#[derive(Debug, Clone)]
pub enum MockPage {
    Quotes(Vec<RawQuote>),
    Rejected(u16),
    TransportFailure,
    Undecodable,
}

/// Quote source that replays scripted pages. Pages without a script answer
/// with an empty listing.
#[derive(Clone, Default)]
pub struct MockQuoteSource {
    pages: Arc<HashMap<u32, MockPage>>,
    requested: Arc<Mutex<Vec<u32>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    latency: Option<Duration>,
}

impl MockQuoteSource {
    pub fn new(pages: impl IntoIterator<Item = (u32, MockPage)>) -> Self {
        Self {
            pages: Arc::new(pages.into_iter().collect()),
            ..Default::default()
        }
    }

    /// `page_count` full pages of `per_page` quotes, ranked by strictly
    /// descending market cap across all pages.
    pub fn ranked(page_count: u32, per_page: usize) -> Self {
        Self::new((1..=page_count).map(|page| (page, MockPage::Quotes(ranked_page(page, per_page)))))
    }

    /// Simulated network latency per request.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Page numbers requested so far, in request order.
    pub fn requested_pages(&self) -> Vec<u32> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Highest number of concurrent `fetch_page` calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// One page of generated quotes; rank 1 is the largest market cap.
pub fn ranked_page(page: u32, per_page: usize) -> Vec<RawQuote> {
    (0..per_page)
        .map(|i| {
            let rank = (page as usize - 1) * per_page + i + 1;
            RawQuote {
                name: Some(format!("Coin {rank}")),
                symbol: Some(format!("c{rank}")),
                current_price: Some(1.0),
                price_change_percentage_1h_in_currency: None,
                price_change_percentage_24h: Some(0.5),
                market_cap: Some(1_000_000_000.0 - rank as f64),
                total_volume: Some(1000.0),
                circulating_supply: Some(10.0),
            }
        })
        .collect()
}

#[async_trait]
impl QuoteSource for MockQuoteSource {
    async fn fetch_page(&self, page: u32) -> Result<PageFetch, PageError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(page);
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.pages.get(&page) {
            None => Ok(PageFetch::Quotes(Vec::new())),
            Some(MockPage::Quotes(quotes)) => Ok(PageFetch::Quotes(quotes.clone())),
            Some(MockPage::Rejected(status)) => Ok(PageFetch::Rejected { status: *status }),
            Some(MockPage::TransportFailure) => Err(PageError::Transport {
                page,
                reason: "connection reset by peer".to_string(),
            }),
            Some(MockPage::Undecodable) => Err(PageError::Undecodable {
                page,
                reason: "invalid type: map, expected a sequence".to_string(),
            }),
        }
    }
}

/// Snapshot repository whose backend is always locked.
#[derive(Default)]
pub struct FailingSnapshotRepository;

#[async_trait]
impl SnapshotRepository for FailingSnapshotRepository {
    async fn replace_all(&self, _records: &[CoinRecord]) -> Result<u64> {
        anyhow::bail!("database is locked")
    }

    async fn query(&self, _request: PageRequest) -> Result<SnapshotPage> {
        anyhow::bail!("database is locked")
    }

    async fn count(&self) -> Result<u64> {
        anyhow::bail!("database is locked")
    }
}

/// Cache whose backend is always unreachable.
#[derive(Default)]
pub struct UnreachableSnapshotCache {
    attempts: AtomicUsize,
}

impl UnreachableSnapshotCache {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotCache for UnreachableSnapshotCache {
    async fn set(&self, key: &str, _payload: String, _ttl: Duration) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        info!("UnreachableSnapshotCache: refusing write to {}", key);
        anyhow::bail!("Connection refused (os error 111)")
    }

    async fn get(&self, _key: &str) -> Result<Option<String>> {
        anyhow::bail!("Connection refused (os error 111)")
    }
}
