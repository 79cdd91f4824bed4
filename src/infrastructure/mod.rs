pub mod cache;
pub mod coingecko;
pub mod core;
pub mod mock;
pub mod persistence;
pub mod repositories;

pub use cache::{InMemorySnapshotCache, RedisSnapshotCache};
pub use coingecko::CoinGeckoQuoteSource;
pub use persistence::{Database, SqliteSnapshotRepository};
pub use repositories::InMemorySnapshotRepository;
