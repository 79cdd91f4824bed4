//! One-shot export of a single listing page to a JSON file.

use crate::domain::coin::CoinRecord;
use crate::domain::ports::{PageFetch, QuoteSource};
use anyhow::{Context, Result, bail};
use std::path::Path;
use tracing::info;

/// Fetch and normalize one page. Unlike the paginated fetcher, a rejected
/// status or undecodable body is an error here.
pub async fn fetch_single_page(source: &dyn QuoteSource, page: u32) -> Result<Vec<CoinRecord>> {
    match source.fetch_page(page).await? {
        PageFetch::Quotes(quotes) => Ok(quotes.into_iter().map(CoinRecord::from_raw).collect()),
        PageFetch::Rejected { status } => bail!("HTTP error! status: {}", status),
    }
}

/// Write page `page` as a pretty-printed JSON array to `path`. Returns the
/// number of records written.
pub async fn export_single_page(source: &dyn QuoteSource, page: u32, path: &Path) -> Result<usize> {
    let records = fetch_single_page(source, page).await?;
    let json = serde_json::to_string_pretty(&records).context("Failed to serialize records")?;

    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Exported {} coins to {}", records.len(), path.display());
    Ok(records.len())
}
