use crate::domain::coin::CoinRecord;
use crate::domain::repositories::{PageRequest, SnapshotPage, SnapshotRepository};
use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

// 10 bound columns per row keeps each statement under SQLite's 999 variable limit.
const INSERT_CHUNK_ROWS: usize = 90;

pub struct SqliteSnapshotRepository {
    pool: SqlitePool,
}

impl SqliteSnapshotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotRepository for SqliteSnapshotRepository {
    async fn replace_all(&self, records: &[CoinRecord]) -> Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin snapshot transaction")?;

        let removed = sqlx::query("DELETE FROM coins")
            .execute(&mut *tx)
            .await
            .context("Failed to clear previous snapshot")?
            .rows_affected();

        let mut inserted = 0u64;
        for (chunk_index, chunk) in records.chunks(INSERT_CHUNK_ROWS).enumerate() {
            let base_position = chunk_index * INSERT_CHUNK_ROWS;
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO coins (position, name, symbol, price, change_1h, change_24h, \
                 market_cap, market_cap_value, volume_24h, circulating_supply) ",
            );
            builder.push_values(chunk.iter().enumerate(), |mut row, (i, coin)| {
                row.push_bind((base_position + i) as i64)
                    .push_bind(coin.name.clone())
                    .push_bind(coin.symbol.clone())
                    .push_bind(coin.price.to_string())
                    .push_bind(coin.change_1h.to_string())
                    .push_bind(coin.change_24h.to_string())
                    .push_bind(coin.market_cap.map(|v| v.to_string()))
                    .push_bind(coin.market_cap.and_then(|v| v.to_f64()))
                    .push_bind(coin.volume_24h.map(|v| v.to_string()))
                    .push_bind(coin.circulating_supply.map(|v| v.to_string()));
            });

            inserted += builder
                .build()
                .execute(&mut *tx)
                .await
                .context("Failed to insert snapshot records")?
                .rows_affected();
        }

        tx.commit()
            .await
            .context("Failed to commit snapshot transaction")?;

        info!(
            "Snapshot replaced: {} records stored ({} removed)",
            inserted, removed
        );
        Ok(inserted)
    }

    async fn query(&self, request: PageRequest) -> Result<SnapshotPage> {
        let rows = sqlx::query(
            r#"
            SELECT name, symbol, price, change_1h, change_24h,
                   market_cap, volume_24h, circulating_supply
            FROM coins
            ORDER BY market_cap_value DESC, position ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(request.limit)
        .bind(request.offset())
        .fetch_all(&self.pool)
        .await
        .context("Failed to query snapshot")?;

        let data = rows
            .iter()
            .map(map_row_to_coin)
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Snapshot query page={} limit={} returned {}",
            request.page,
            request.limit,
            data.len()
        );
        Ok(SnapshotPage::new(request, data))
    }

    async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM coins")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get("count")?;
        Ok(count as u64)
    }
}

fn map_row_to_coin(row: &SqliteRow) -> Result<CoinRecord> {
    Ok(CoinRecord {
        name: row.try_get("name")?,
        symbol: row.try_get("symbol")?,
        price: parse_decimal(row.try_get("price")?)?,
        change_1h: parse_decimal(row.try_get("change_1h")?)?,
        change_24h: parse_decimal(row.try_get("change_24h")?)?,
        market_cap: parse_optional(row.try_get("market_cap")?)?,
        volume_24h: parse_optional(row.try_get("volume_24h")?)?,
        circulating_supply: parse_optional(row.try_get("circulating_supply")?)?,
    })
}

fn parse_decimal(raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).with_context(|| format!("Corrupt decimal column value: {raw}"))
}

fn parse_optional(raw: Option<&str>) -> Result<Option<Decimal>> {
    raw.map(parse_decimal).transpose()
}
