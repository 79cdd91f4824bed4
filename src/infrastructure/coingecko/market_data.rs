//! CoinGecko Market Data Source
//!
//! Pages through `/coins/markets` ordered by descending market cap. Each call
//! maps the HTTP exchange onto the [`PageFetch`] / [`PageError`] taxonomy and
//! leaves pagination policy to the fetcher.

use crate::config::IngestionEnvConfig;
use crate::domain::coin::RawQuote;
use crate::domain::errors::PageError;
use crate::domain::ports::{PageFetch, QuoteSource};
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

pub struct CoinGeckoQuoteSource {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: Option<String>,
    vs_currency: String,
    page_size: u32,
}

impl CoinGeckoQuoteSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: HttpClientFactory::create_client(0),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            vs_currency: "usd".to_string(),
            page_size: 100,
        }
    }

    pub fn from_config(config: &IngestionEnvConfig) -> Self {
        Self {
            client: HttpClientFactory::create_client(config.upstream_max_retries),
            ..Self::new(config.base_url.clone())
        }
        .with_api_key(config.api_key.clone())
        .with_vs_currency(config.vs_currency.clone())
        .with_page_size(config.page_size)
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_vs_currency(mut self, vs_currency: String) -> Self {
        self.vs_currency = vs_currency;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    fn page_params(&self, page: u32) -> [(&'static str, String); 6] {
        [
            ("vs_currency", self.vs_currency.clone()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", self.page_size.to_string()),
            ("page", page.to_string()),
            ("sparkline", "false".to_string()),
            ("price_change_percentage", "1h,24h".to_string()),
        ]
    }
}

#[async_trait]
impl QuoteSource for CoinGeckoQuoteSource {
    async fn fetch_page(&self, page: u32) -> Result<PageFetch, PageError> {
        let transport = |reason: String| PageError::Transport { page, reason };

        let url = build_url_with_query(
            &format!("{}/coins/markets", self.base_url),
            &self.page_params(page),
        )
        .map_err(|e| transport(format!("{e:#}")))?;

        let mut request = self.client.get(url).header(ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(|e| transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            debug!("CoinGecko page {} rejected with status {}", page, status);
            return Ok(PageFetch::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| transport(e.to_string()))?;

        let quotes = decode_listing(page, &body)?;

        debug!("CoinGecko page {} returned {} quotes", page, quotes.len());
        Ok(PageFetch::Quotes(quotes))
    }
}

/// Decode a listing body. Only a body that is not a JSON array fails; each
/// element is decoded on its own and non-object elements are dropped.
fn decode_listing(page: u32, body: &[u8]) -> Result<Vec<RawQuote>, PageError> {
    let items: Vec<Value> = serde_json::from_slice(body).map_err(|e| PageError::Undecodable {
        page,
        reason: e.to_string(),
    })?;

    let mut quotes = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            warn!("CoinGecko page {}: dropping non-object item #{}", page, index);
            continue;
        }
        match serde_json::from_value::<RawQuote>(item) {
            Ok(quote) => quotes.push(quote),
            Err(e) => warn!("CoinGecko page {}: dropping item #{}: {}", page, index, e),
        }
    }
    Ok(quotes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_follow_listing_contract() {
        let source = CoinGeckoQuoteSource::new("http://localhost/api/v3/");
        assert_eq!(source.base_url, "http://localhost/api/v3");

        let params = source.page_params(4);
        assert!(params.contains(&("page", "4".to_string())));
        assert!(params.contains(&("per_page", "100".to_string())));
        assert!(params.contains(&("order", "market_cap_desc".to_string())));
        assert!(params.contains(&("price_change_percentage", "1h,24h".to_string())));
    }

    #[test]
    fn test_bad_item_does_not_discard_page() {
        let body = br#"[
            {"name":"Bitcoin","symbol":"btc","current_price":64000.5,"market_cap":1.25e12},
            {"name":"Weird","symbol":"wrd","current_price":"n/a","market_cap":{"usd":1}},
            42,
            "not a coin"
        ]"#;

        let quotes = decode_listing(1, body).unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].current_price, Some(64000.5));
        assert_eq!(quotes[1].name.as_deref(), Some("Weird"));
        assert_eq!(quotes[1].current_price, None);
    }

    #[test]
    fn test_non_array_body_is_undecodable() {
        assert!(matches!(
            decode_listing(3, br#"{"error":"coin not found"}"#),
            Err(PageError::Undecodable { page: 3, .. })
        ));
        assert!(matches!(
            decode_listing(3, b"<html>gateway</html>"),
            Err(PageError::Undecodable { page: 3, .. })
        ));
    }
}
