use super::fetcher::{FetchReport, PaginatedFetcher};
use super::snapshot_cache::CacheBackend;
use crate::domain::errors::IngestionError;
use crate::domain::repositories::SnapshotRepository;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Outcome of one successful ingestion cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub stored: u64,
    pub cached: bool,
    pub fetch: FetchReport,
}

/// One ingestion cycle: fetch → replace snapshot → mirror to cache.
pub struct IngestionPipeline {
    fetcher: PaginatedFetcher,
    store: Arc<dyn SnapshotRepository>,
    cache: CacheBackend,
}

impl IngestionPipeline {
    pub fn new(
        fetcher: PaginatedFetcher,
        store: Arc<dyn SnapshotRepository>,
        cache: CacheBackend,
    ) -> Self {
        Self {
            fetcher,
            store,
            cache,
        }
    }

    pub async fn run_cycle(&self) -> Result<CycleReport, IngestionError> {
        let started_at = Utc::now();
        let clock = Instant::now();

        let fetched = self.fetcher.fetch_all().await;
        info!(
            "Fetch complete: {} coins from {} pages ({} skipped, stop: {:?})",
            fetched.report.records,
            fetched.report.pages_fetched,
            fetched.report.skipped_pages.len(),
            fetched.report.stop_reason
        );

        // An empty listing would wipe the served data; keep the last snapshot.
        if fetched.records.is_empty() {
            return Err(IngestionError::EmptySnapshot);
        }

        let stored = self
            .store
            .replace_all(&fetched.records)
            .await
            .map_err(IngestionError::Store)?;

        let cached = self.cache.store_snapshot(&fetched.records).await;

        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            elapsed: clock.elapsed(),
            stored,
            cached,
            fetch: fetched.report,
        };
        info!(
            "{} coins saved in {:.1}s (cached: {})",
            report.stored,
            report.elapsed.as_secs_f64(),
            report.cached
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ingestion::fetcher::FetchSettings;
    use crate::domain::repositories::PageRequest;
    use crate::infrastructure::mock::{
        FailingSnapshotRepository, MockPage, MockQuoteSource, UnreachableSnapshotCache,
    };
    use crate::infrastructure::repositories::InMemorySnapshotRepository;

    fn pipeline(
        source: MockQuoteSource,
        store: Arc<dyn SnapshotRepository>,
        cache: CacheBackend,
    ) -> IngestionPipeline {
        let fetcher = PaginatedFetcher::new(Arc::new(source), FetchSettings::default());
        IngestionPipeline::new(fetcher, store, cache)
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_replaces_snapshot() {
        let store = Arc::new(InMemorySnapshotRepository::new());
        let report = pipeline(MockQuoteSource::ranked(2, 100), store.clone(), CacheBackend::Disabled)
            .run_cycle()
            .await
            .unwrap();

        assert_eq!(report.stored, 200);
        assert!(!report.cached);
        assert_eq!(store.count().await.unwrap(), 200);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_fetch_keeps_previous_snapshot() {
        let store = Arc::new(InMemorySnapshotRepository::new());
        pipeline(MockQuoteSource::ranked(1, 10), store.clone(), CacheBackend::Disabled)
            .run_cycle()
            .await
            .unwrap();

        let rate_limited = MockQuoteSource::new([(1, MockPage::Rejected(429))]);
        let result = pipeline(rate_limited, store.clone(), CacheBackend::Disabled)
            .run_cycle()
            .await;

        assert!(matches!(result, Err(IngestionError::EmptySnapshot)));
        let page = store.query(PageRequest::default()).await.unwrap();
        assert_eq!(page.count, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_failure_is_cycle_error() {
        let result = pipeline(
            MockQuoteSource::ranked(1, 5),
            Arc::new(FailingSnapshotRepository),
            CacheBackend::Disabled,
        )
        .run_cycle()
        .await;

        match result {
            Err(IngestionError::Store(e)) => assert!(e.to_string().contains("locked")),
            other => panic!("expected store error, got {:?}", other.map(|r| r.stored)),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_failure_does_not_fail_cycle() {
        let store = Arc::new(InMemorySnapshotRepository::new());
        let cache = Arc::new(UnreachableSnapshotCache::default());
        let report = pipeline(
            MockQuoteSource::ranked(1, 5),
            store.clone(),
            CacheBackend::enabled(cache.clone()),
        )
        .run_cycle()
        .await
        .unwrap();

        assert_eq!(report.stored, 5);
        assert!(!report.cached);
        assert_eq!(cache.attempts(), 1);
    }
}
