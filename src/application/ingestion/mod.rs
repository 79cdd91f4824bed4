pub mod fetcher;
pub mod pipeline;
pub mod snapshot_cache;

pub use fetcher::{FetchReport, FetchSettings, PaginatedFetcher, StopReason};
pub use pipeline::{CycleReport, IngestionPipeline};
pub use snapshot_cache::CacheBackend;
