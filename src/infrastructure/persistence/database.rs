use anyhow::{Context, Result};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::info;

/// Shared database handle
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self> {
        // Ensure the directory exists if it's a file path
        if let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        // WAL lets readers keep the last committed snapshot while a replace
        // transaction is in flight.
        let options = SqliteConnectOptions::from_str(db_url)
            .with_context(|| format!("Invalid database URL: {db_url}"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        info!("Connected to database: {}", db_url);

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS coins (
                id INTEGER PRIMARY KEY,
                position INTEGER NOT NULL,
                name TEXT NOT NULL,
                symbol TEXT NOT NULL,
                price TEXT NOT NULL,
                change_1h TEXT NOT NULL,
                change_24h TEXT NOT NULL,
                market_cap TEXT,
                market_cap_value REAL,
                volume_24h TEXT,
                circulating_supply TEXT
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create coins table")?;

        // Ordering index for paginated reads
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_coins_market_cap
            ON coins (market_cap_value DESC, position ASC);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create coins market cap index")?;

        info!("Database schema initialized.");
        Ok(())
    }
}
