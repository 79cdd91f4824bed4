//! One-shot export of a single listing page to a JSON file.
//!
//! # Usage
//! ```sh
//! cargo run --bin export -- --output coins.json --page 1
//! ```

use anyhow::Result;
use clap::Parser;
use coinsnap::application::export::export_single_page;
use coinsnap::config::IngestionEnvConfig;
use coinsnap::infrastructure::CoinGeckoQuoteSource;
use std::path::PathBuf;
use tracing::{Level, error, info};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about = "Export one page of the market listing to JSON")]
struct Args {
    /// Output file
    #[arg(short, long, default_value = "coins.json")]
    output: PathBuf,

    /// Listing page to export (1-based)
    #[arg(short, long, default_value_t = 1)]
    page: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();
    let config = IngestionEnvConfig::from_env()?;
    let source = CoinGeckoQuoteSource::from_config(&config);

    info!("Exporting page {} to {}", args.page, args.output.display());
    match export_single_page(&source, args.page, &args.output).await {
        Ok(count) => info!("{} coins written", count),
        Err(e) => error!("Export failed: {:#}", e),
    }

    Ok(())
}
