//! CoinGecko market data client

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::dashboard::MarketConfig;

use super::{
    history_key, normalize_ids, quotes_key, search_key, MarketDataSource, MarketError,
    MarketQuote, PriceHistory, SearchHit, TtlCache,
};

/// Queries shorter than this never reach the network
const MIN_SEARCH_LEN: usize = 2;

/// Ids are interpolated into the request path, so anything that could add
/// or climb a segment is refused
fn is_valid_asset_id(id: &str) -> bool {
    !id.contains("..")
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// CoinGecko v3 client with a per-instance response cache
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    vs_currency: String,
    search_limit: usize,
    cache: TtlCache,
}

impl CoinGeckoClient {
    pub fn new(config: &MarketConfig) -> Self {
        let client = Client::builder()
            .user_agent(concat!("tambo-folio/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        let cache = TtlCache::new(config.cache_ttl());
        tracing::debug!(
            "CoinGecko client for {} (cache window {:?})",
            config.base_url,
            cache.ttl()
        );

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            vs_currency: config.vs_currency.clone(),
            search_limit: config.search_limit,
            cache,
        }
    }

    /// Client against `base_url` with default settings and the given freshness window
    #[cfg(test)]
    pub fn with_base_url(base_url: impl Into<String>, cache_ttl: std::time::Duration) -> Self {
        let config = MarketConfig {
            base_url: base_url.into(),
            cache_ttl_secs: cache_ttl.as_secs(),
            ..MarketConfig::default()
        };
        let mut client = Self::new(&config);
        // sub-second windows only matter in tests
        client.cache = TtlCache::new(cache_ttl);
        client
    }

    #[cfg(test)]
    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    async fn fetch_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, MarketError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(query)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketError::Status { status, body });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Serve `key` from the cache or fetch, shape and store it.
    ///
    /// Only values that decode into `T` are cached.
    async fn cached_fetch<T, F>(
        &self,
        key: &str,
        path: &str,
        query: &[(&str, String)],
        shape: F,
    ) -> Result<T, MarketError>
    where
        T: DeserializeOwned,
        F: FnOnce(Value) -> Value,
    {
        if let Some(data) = self.cache.get(key) {
            tracing::debug!(key, "market cache hit");
            return Ok(serde_json::from_value(data)?);
        }

        let data = shape(self.fetch_json(path, query).await?);
        let typed = serde_json::from_value(data.clone())?;
        self.cache.insert(key, data);
        Ok(typed)
    }
}

#[async_trait]
impl MarketDataSource for CoinGeckoClient {
    async fn quotes(&self, ids: &[String]) -> Vec<MarketQuote> {
        let ids = normalize_ids(ids);
        if ids.is_empty() {
            return Vec::new();
        }

        let query = [
            ("vs_currency", self.vs_currency.clone()),
            ("ids", ids.join(",")),
            ("order", "market_cap_desc".to_string()),
            ("per_page", "100".to_string()),
            ("page", "1".to_string()),
            ("sparkline", "false".to_string()),
        ];

        self.cached_fetch(&quotes_key(&ids), "/coins/markets", &query, |v| v)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("CoinGecko quotes for {:?} failed: {}", ids, e);
                Vec::new()
            })
    }

    async fn price_history(&self, id: &str, days: &str) -> Option<PriceHistory> {
        let id = id.trim();
        let days = days.trim();
        if id.is_empty() || days.is_empty() {
            return None;
        }
        if !is_valid_asset_id(id) {
            tracing::warn!("refusing CoinGecko history for malformed id {:?}", id);
            return None;
        }

        let query = [
            ("vs_currency", self.vs_currency.clone()),
            ("days", days.to_string()),
        ];
        let path = format!("/coins/{}/market_chart", id);

        match self
            .cached_fetch(&history_key(id, days), &path, &query, |v| v)
            .await
        {
            Ok(history) => Some(history),
            Err(e) => {
                tracing::warn!("CoinGecko history for {} ({}d) failed: {}", id, days, e);
                None
            }
        }
    }

    async fn search(&self, query: &str) -> Vec<SearchHit> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_LEN {
            return Vec::new();
        }

        let limit = self.search_limit;
        let params = [("query", query.to_string())];

        self.cached_fetch(&search_key(query), "/search", &params, |v| {
            let coins = v
                .get("coins")
                .and_then(Value::as_array)
                .map(|coins| coins.iter().take(limit).cloned().collect())
                .unwrap_or_default();
            Value::Array(coins)
        })
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("CoinGecko search for {:?} failed: {}", query, e);
            Vec::new()
        })
    }
}
