//! Paginated listing fetcher.
//!
//! Walks the upstream listing page by page, strictly in order:
//! - empty page or non-success status ends pagination
//! - a transport/decode failure skips the page after a cooldown
//! - every successful page is followed by a short throttle delay

use crate::config::IngestionEnvConfig;
use crate::domain::coin::CoinRecord;
use crate::domain::ports::{PageFetch, QuoteSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    pub max_pages: u32,
    pub page_delay: Duration,
    pub failure_cooldown: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_pages: 90,
            page_delay: Duration::from_millis(1500),
            failure_cooldown: Duration::from_secs(5),
        }
    }
}

impl From<&IngestionEnvConfig> for FetchSettings {
    fn from(config: &IngestionEnvConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            page_delay: config.page_delay,
            failure_cooldown: config.failure_cooldown,
        }
    }
}

/// Why pagination ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EmptyPage { page: u32 },
    Rejected { page: u32, status: u16 },
    PageLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub pages_fetched: u32,
    pub skipped_pages: Vec<u32>,
    pub stop_reason: StopReason,
    pub records: usize,
}

#[derive(Debug, Clone)]
pub struct FetchedSnapshot {
    pub records: Vec<CoinRecord>,
    pub report: FetchReport,
}

pub struct PaginatedFetcher {
    source: Arc<dyn QuoteSource>,
    settings: FetchSettings,
}

impl PaginatedFetcher {
    pub fn new(source: Arc<dyn QuoteSource>, settings: FetchSettings) -> Self {
        Self { source, settings }
    }

    pub fn settings(&self) -> FetchSettings {
        self.settings
    }

    /// Fetch the full ranked listing. Never fails; isolated page failures
    /// only make the result incomplete.
    pub async fn fetch_all(&self) -> FetchedSnapshot {
        let max_pages = self.settings.max_pages;
        let mut records = Vec::new();
        let mut pages_fetched = 0;
        let mut skipped_pages = Vec::new();
        let mut stop_reason = StopReason::PageLimit;

        for page in 1..=max_pages {
            let has_next = page < max_pages;

            match self.source.fetch_page(page).await {
                Ok(PageFetch::Rejected { status }) => {
                    info!("Page {}: upstream status {}, stopping pagination", page, status);
                    stop_reason = StopReason::Rejected { page, status };
                    break;
                }
                Ok(PageFetch::Quotes(quotes)) if quotes.is_empty() => {
                    info!("Page {}: no more data", page);
                    stop_reason = StopReason::EmptyPage { page };
                    break;
                }
                Ok(PageFetch::Quotes(quotes)) => {
                    let count = quotes.len();
                    records.extend(quotes.into_iter().map(CoinRecord::from_raw));
                    pages_fetched += 1;
                    info!("Page {}: {} coins", page, count);

                    if has_next {
                        tokio::time::sleep(self.settings.page_delay).await;
                    }
                }
                Err(e) => {
                    warn!("Page {} skipped: {}", page, e);
                    skipped_pages.push(page);

                    if has_next {
                        tokio::time::sleep(self.settings.failure_cooldown).await;
                    }
                }
            }
        }

        let report = FetchReport {
            pages_fetched,
            skipped_pages,
            stop_reason,
            records: records.len(),
        };
        FetchedSnapshot { records, report }
    }
}
