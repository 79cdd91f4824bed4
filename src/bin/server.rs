//! Coinsnap Server - market data ingestion and read API
//!
//! Runs the ingestion scheduler in the background and serves the latest
//! snapshot over HTTP.
//!
//! # Usage
//! ```sh
//! API_KEY=secret cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `API_KEY` - Shared key required by `GET /coins` (required)
//! - `PORT` - Listen port (default: 5001)
//! - `DATABASE_URL` - SQLite snapshot store (default: sqlite://data/coins.db)
//! - `REDIS_URL` - Snapshot cache; unset disables caching
//! - `INGEST_INTERVAL_SECS` - Seconds between ingestion cycles (default: 600)
//! - `SHUTDOWN_GRACE_SECS` - Time an in-flight cycle gets to finish on shutdown (default: 30)

use anyhow::{Context, Result};
use coinsnap::application::ingestion::{CacheBackend, FetchSettings, IngestionPipeline, PaginatedFetcher};
use coinsnap::application::scheduler::Scheduler;
use coinsnap::config::Config;
use coinsnap::infrastructure::{CoinGeckoQuoteSource, Database, RedisSnapshotCache, SqliteSnapshotRepository};
use coinsnap::interfaces::api::{self, AppState};
use coinsnap::interfaces::signals::shutdown_signal;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("Coinsnap Server {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: Upstream={}, Pages<={}, Interval={:?}",
        config.ingestion.base_url, config.ingestion.max_pages, config.ingestion.interval
    );

    // Snapshot store
    let database = Database::new(&config.storage.database_url).await?;
    let store = Arc::new(SqliteSnapshotRepository::new(database.pool.clone()));
    info!("Snapshot store ready: {}", config.storage.database_url);

    // Optional snapshot cache
    let cache = match &config.storage.redis_url {
        Some(url) => {
            let redis = Arc::new(RedisSnapshotCache::open(url)?);
            info!("Snapshot cache enabled (key: {})", config.storage.cache_key);
            CacheBackend::from_config(redis, &config.storage)
        }
        None => {
            warn!("REDIS_URL not set, snapshot cache disabled");
            CacheBackend::Disabled
        }
    };

    // Ingestion
    let source = Arc::new(CoinGeckoQuoteSource::from_config(&config.ingestion));
    let fetcher = PaginatedFetcher::new(source, FetchSettings::from(&config.ingestion));
    let pipeline = Arc::new(IngestionPipeline::new(fetcher, store.clone(), cache));
    let scheduler = Scheduler::new(
        pipeline,
        config.ingestion.interval,
        config.ingestion.run_on_startup,
    )
    .with_shutdown_grace(config.ingestion.shutdown_grace);

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let scheduler_task = tokio::spawn(async move {
        scheduler
            .run(async move {
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
            })
            .await;
    });

    // Read API
    let addr = config.server.socket_addr()?;
    let app = api::router(AppState::new(store, &config.server));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let shutdown = shutdown_signal().context("Failed to install signal handlers")?;
    info!("Server running on {}. Press Ctrl+C to shutdown.", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let reason = shutdown.await;
            info!("Shutdown signal received ({:?})", reason);
        })
        .await
        .context("HTTP server error")?;

    info!("Waiting for ingestion to stop...");
    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler_task.await {
        warn!("Scheduler task ended abnormally: {}", e);
    }
    database.pool.close().await;

    Ok(())
}
