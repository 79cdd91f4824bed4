pub mod market_data;

pub use market_data::{CoinGeckoQuoteSource, DEFAULT_BASE_URL};
