use axum::Router;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use coinsnap::application::export::fetch_single_page;
use coinsnap::application::ingestion::{FetchSettings, PaginatedFetcher, StopReason};
use coinsnap::domain::errors::PageError;
use coinsnap::domain::ports::{PageFetch, QuoteSource};
use coinsnap::infrastructure::CoinGeckoQuoteSource;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Stand-in for the upstream listing:
/// page 1 → two coins, 2 → `[]`, 3 → 429, 4 → object body, 5 → garbage,
/// 6 → echoes the API key header, 7 → one good, one badly typed and one
/// non-object item.
async fn markets(Query(params): Query<HashMap<String, String>>, headers: HeaderMap) -> Response {
    if params.get("order").map(String::as_str) != Some("market_cap_desc")
        || params.get("price_change_percentage").map(String::as_str) != Some("1h,24h")
    {
        return StatusCode::BAD_REQUEST.into_response();
    }

    match params.get("page").map(String::as_str) {
        Some("1") => axum::Json(json!([
            {
                "id": "bitcoin",
                "name": "Bitcoin",
                "symbol": "btc",
                "current_price": 64000.5,
                "price_change_percentage_1h_in_currency": 0.12,
                "price_change_percentage_24h": -2.5,
                "market_cap": 1.25e12,
                "total_volume": 3.1e10,
                "circulating_supply": 19700000.0
            },
            {
                "id": "newcoin",
                "name": "Newcoin",
                "symbol": "new",
                "current_price": 0.5,
                "price_change_percentage_1h_in_currency": null,
                "market_cap": null
            }
        ]))
        .into_response(),
        Some("2") => axum::Json(json!([])).into_response(),
        Some("3") => (
            StatusCode::TOO_MANY_REQUESTS,
            axum::Json(json!({"status": {"error_code": 429}})),
        )
            .into_response(),
        Some("4") => axum::Json(json!({"error": "coin not found"})).into_response(),
        Some("5") => "<html>gateway</html>".into_response(),
        Some("6") => {
            let key = headers
                .get("x-cg-demo-api-key")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("none")
                .to_string();
            axum::Json(json!([{ "name": key, "symbol": "key" }])).into_response()
        }
        Some("7") => axum::Json(json!([
            {"name": "Bitcoin", "symbol": "btc", "current_price": 64000.5, "market_cap": 1.25e12},
            {"name": "Weird", "symbol": "wrd", "current_price": "n/a", "market_cap": "123"},
            "not a coin"
        ]))
        .into_response(),
        _ => axum::Json(json!([])).into_response(),
    }
}

async fn spawn_upstream() -> String {
    let app = Router::new().route("/api/v3/coins/markets", get(markets));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api/v3")
}

#[tokio::test]
async fn test_page_is_decoded_and_normalized() {
    let source = CoinGeckoQuoteSource::new(spawn_upstream().await);

    let records = fetch_single_page(&source, 1).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].symbol, "btc");
    assert_eq!(records[0].change_24h, Decimal::new(-25, 1));
    assert_eq!(records[1].change_1h, Decimal::ZERO);
    assert_eq!(records[1].market_cap, None);
}

#[tokio::test]
async fn test_status_and_body_classification() {
    let source = CoinGeckoQuoteSource::new(spawn_upstream().await);

    assert_eq!(source.fetch_page(2).await.unwrap(), PageFetch::Quotes(vec![]));
    assert_eq!(
        source.fetch_page(3).await.unwrap(),
        PageFetch::Rejected { status: 429 }
    );
    assert!(matches!(
        source.fetch_page(4).await,
        Err(PageError::Undecodable { page: 4, .. })
    ));
    assert!(matches!(
        source.fetch_page(5).await,
        Err(PageError::Undecodable { page: 5, .. })
    ));
}

#[tokio::test]
async fn test_api_key_header_is_sent_when_configured() {
    let base_url = spawn_upstream().await;

    let anonymous = CoinGeckoQuoteSource::new(base_url.clone());
    assert_eq!(fetch_single_page(&anonymous, 6).await.unwrap()[0].name, "none");

    let keyed = CoinGeckoQuoteSource::new(base_url).with_api_key(Some("demo-key".to_string()));
    assert_eq!(fetch_single_page(&keyed, 6).await.unwrap()[0].name, "demo-key");
}

#[tokio::test]
async fn test_unreachable_upstream_is_transport_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = CoinGeckoQuoteSource::new(format!("http://{addr}"));
    assert!(matches!(
        source.fetch_page(1).await,
        Err(PageError::Transport { page: 1, .. })
    ));
}

#[tokio::test]
async fn test_fetcher_over_http_stops_on_empty_page() {
    let source = Arc::new(CoinGeckoQuoteSource::new(spawn_upstream().await));
    let settings = FetchSettings {
        max_pages: 90,
        page_delay: Duration::from_millis(1),
        failure_cooldown: Duration::from_millis(1),
    };

    let fetched = PaginatedFetcher::new(source, settings).fetch_all().await;
    assert_eq!(fetched.records.len(), 2);
    assert_eq!(fetched.report.stop_reason, StopReason::EmptyPage { page: 2 });
}

#[tokio::test]
async fn test_badly_typed_item_keeps_rest_of_page() {
    let source = CoinGeckoQuoteSource::new(spawn_upstream().await);

    let records = fetch_single_page(&source, 7).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].symbol, "btc");
    assert_eq!(records[0].price, Decimal::new(640005, 1));
    assert_eq!(records[1].symbol, "wrd");
    assert_eq!(records[1].price, Decimal::ZERO);
    assert_eq!(records[1].market_cap, Some(Decimal::from(123)));
}

#[tokio::test]
async fn test_fetcher_keeps_page_with_badly_typed_item() {
    let source = Arc::new(CoinGeckoQuoteSource::new(spawn_upstream().await));
    let settings = FetchSettings {
        max_pages: 1,
        page_delay: Duration::from_millis(1),
        failure_cooldown: Duration::from_millis(1),
    };

    // Only page 1 is requested, so point the walk at page 7's content.
    let fetched = PaginatedFetcher::new(Arc::new(SinglePage(source, 7)), settings)
        .fetch_all()
        .await;
    assert!(fetched.report.skipped_pages.is_empty());
    assert_eq!(fetched.records.len(), 2);
    assert_eq!(fetched.records[0].name, "Bitcoin");
}

/// Serves page `.1` of the inner source as page 1.
struct SinglePage(Arc<CoinGeckoQuoteSource>, u32);

#[async_trait::async_trait]
impl QuoteSource for SinglePage {
    async fn fetch_page(&self, page: u32) -> Result<PageFetch, PageError> {
        if page == 1 {
            self.0.fetch_page(self.1).await
        } else {
            Ok(PageFetch::Quotes(vec![]))
        }
    }
}
