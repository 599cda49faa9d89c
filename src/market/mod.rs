//! Market data access
//!
//! Components and the watchlist read prices through [`MarketDataSource`].
//! Implementations swallow failures: an empty list or `None` means either
//! "nothing found" or "the fetch failed", and callers render one degraded
//! state for both.

mod cache;
mod coingecko;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub use cache::TtlCache;
pub use coingecko::CoinGeckoClient;

/// Lookback used when a caller gives none
pub const DEFAULT_HISTORY_DAYS: &str = "7";

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

/// One row of the batch quote endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub current_price: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub market_cap: f64,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total_volume: f64,
    #[serde(default)]
    pub high_24h: Option<f64>,
    #[serde(default)]
    pub low_24h: Option<f64>,
    #[serde(default)]
    pub price_change_24h: Option<f64>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub price_change_percentage_24h: f64,
    #[serde(default)]
    pub market_cap_change_24h: Option<f64>,
    #[serde(default)]
    pub market_cap_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub circulating_supply: Option<f64>,
    #[serde(default)]
    pub total_supply: Option<f64>,
    #[serde(default)]
    pub max_supply: Option<f64>,
    #[serde(default)]
    pub ath: Option<f64>,
    #[serde(default)]
    pub atl: Option<f64>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl MarketQuote {
    /// Minimal quote, mostly useful for fixtures
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
            image: None,
            current_price: 0.0,
            market_cap: 0.0,
            market_cap_rank: None,
            total_volume: 0.0,
            high_24h: None,
            low_24h: None,
            price_change_24h: None,
            price_change_percentage_24h: 0.0,
            market_cap_change_24h: None,
            market_cap_change_percentage_24h: None,
            circulating_supply: None,
            total_supply: None,
            max_supply: None,
            ath: None,
            atl: None,
            last_updated: None,
        }
    }
}

// CoinGecko sends `null` for numbers it has no value for.
fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

/// `[timestamp_ms, value]` samples from the history endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    #[serde(default)]
    pub prices: Vec<(f64, f64)>,
    #[serde(default)]
    pub market_caps: Vec<(f64, f64)>,
    #[serde(default)]
    pub total_volumes: Vec<(f64, f64)>,
}

/// A search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub thumb: Option<String>,
}

#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Batch quotes for the given asset ids
    async fn quotes(&self, ids: &[String]) -> Vec<MarketQuote>;

    /// Price series for one asset over `days`
    async fn price_history(&self, id: &str, days: &str) -> Option<PriceHistory>;

    /// Assets matching free text, most relevant first
    async fn search(&self, query: &str) -> Vec<SearchHit>;
}

/// Trimmed ids with blanks dropped, order preserved
pub fn normalize_ids(ids: &[String]) -> Vec<String> {
    ids.iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn quotes_key(ids: &[String]) -> String {
    format!("market-{}", ids.join(","))
}

pub fn history_key(id: &str, days: &str) -> String {
    format!("history-{}-{}", id, days)
}

pub fn search_key(query: &str) -> String {
    format!("search-{}", query)
}
