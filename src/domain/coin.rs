//! Coin listing domain types.
//!
//! `RawQuote` mirrors one entry of the upstream `/coins/markets` listing with
//! every field optional. `CoinRecord` is the canonical, normalized form that
//! gets persisted and served.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// One upstream listing entry, as delivered.
///
/// Unknown fields are ignored and a wrongly typed field reads as absent, so
/// any JSON object decodes. Numbers stay `f64` here and are converted to
/// decimals by [`CoinRecord::from_raw`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawQuote {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub current_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price_change_percentage_1h_in_currency: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub market_cap: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub circulating_supply: Option<f64>,
}

// Any JSON value; only numbers and strings carry information.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseValue {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

// Numeric strings ("123.4") are accepted, anything else non-numeric is absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LooseValue::deserialize(deserializer)? {
        LooseValue::Number(n) => Some(n),
        LooseValue::Text(s) => s.trim().parse().ok(),
        LooseValue::Other(_) => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LooseValue::deserialize(deserializer)? {
        LooseValue::Text(s) => Some(s),
        LooseValue::Number(n) => Some(n.to_string()),
        LooseValue::Other(_) => None,
    })
}

/// Canonical coin record stored in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinRecord {
    pub name: String,
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub change_1h: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub change_24h: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub market_cap: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub volume_24h: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub circulating_supply: Option<Decimal>,
}

impl CoinRecord {
    /// Normalize one upstream entry. Never fails.
    ///
    /// Price and both percentage changes fall back to zero when absent; the
    /// remaining numeric fields stay absent.
    pub fn from_raw(raw: RawQuote) -> Self {
        Self {
            name: raw.name.unwrap_or_default(),
            symbol: raw.symbol.unwrap_or_default(),
            price: to_decimal(raw.current_price).unwrap_or_default(),
            change_1h: to_decimal(raw.price_change_percentage_1h_in_currency).unwrap_or_default(),
            change_24h: to_decimal(raw.price_change_percentage_24h).unwrap_or_default(),
            market_cap: to_decimal(raw.market_cap),
            volume_24h: to_decimal(raw.total_volume),
            circulating_supply: to_decimal(raw.circulating_supply),
        }
    }
}

impl From<RawQuote> for CoinRecord {
    fn from(raw: RawQuote) -> Self {
        Self::from_raw(raw)
    }
}

// Values outside the decimal range (or NaN) are treated as missing.
fn to_decimal(value: Option<f64>) -> Option<Decimal> {
    value.and_then(Decimal::from_f64)
}

/// Sort records by descending market cap. Missing market caps sink to the
/// end; ties keep their delivered order.
pub fn sort_by_market_cap_desc(records: &mut [CoinRecord]) {
    records.sort_by(|a, b| match (a.market_cap, b.market_cap) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
