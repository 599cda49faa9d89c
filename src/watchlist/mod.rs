//! Persisted watchlist of asset ids
//!
//! The id list lives in the key-value store under a fixed key. Mutations are
//! serialized, overwrite the stored list in full and answer with freshly
//! fetched quotes for the new list.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::dashboard::WatchlistConfig;
use crate::market::{MarketDataSource, MarketQuote};
use crate::storage::{KvStore, StorageError};

#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error("Enter a token to add")]
    EmptyQuery,

    #[error("Token not found")]
    NotFound,

    #[error("Token already in watchlist")]
    AlreadyPresent,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl IntoResponse for WatchlistError {
    fn into_response(self) -> Response {
        let status = match self {
            WatchlistError::EmptyQuery => StatusCode::BAD_REQUEST,
            WatchlistError::NotFound => StatusCode::NOT_FOUND,
            WatchlistError::AlreadyPresent => StatusCode::CONFLICT,
            WatchlistError::Storage(_) | WatchlistError::Encoding(_) => {
                tracing::error!("watchlist failure: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Tracked ids plus whatever quotes could be fetched for them
#[derive(Debug, Clone, Serialize)]
pub struct WatchlistSnapshot {
    pub tokens: Vec<String>,
    pub quotes: Vec<MarketQuote>,
}

pub struct Watchlist {
    store: Arc<KvStore>,
    market: Arc<dyn MarketDataSource>,
    storage_key: String,
    tokens: Mutex<Vec<String>>,
}

impl Watchlist {
    /// Read the persisted list, seeding and persisting the defaults when
    /// nothing usable is stored yet
    pub async fn load(
        store: Arc<KvStore>,
        market: Arc<dyn MarketDataSource>,
        config: &WatchlistConfig,
    ) -> Result<Self, WatchlistError> {
        let stored = match store.get(&config.storage_key).await? {
            Some(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(tokens) => Some(tokens),
                Err(e) => {
                    tracing::warn!(
                        "ignoring unreadable watchlist under {:?}: {}",
                        config.storage_key,
                        e
                    );
                    None
                }
            },
            None => None,
        };

        let tokens = match stored {
            Some(tokens) => tokens,
            None => {
                let defaults = config.default_tokens.clone();
                store
                    .set(&config.storage_key, &serde_json::to_string(&defaults)?)
                    .await?;
                tracing::info!("seeded watchlist with {} default token(s)", defaults.len());
                defaults
            }
        };

        Ok(Self {
            store,
            market,
            storage_key: config.storage_key.clone(),
            tokens: Mutex::new(tokens),
        })
    }

    pub async fn tokens(&self) -> Vec<String> {
        self.tokens.lock().await.clone()
    }

    /// Current ids with quotes
    pub async fn snapshot(&self) -> WatchlistSnapshot {
        let tokens = self.tokens().await;
        self.with_quotes(tokens).await
    }

    /// Resolve `query` to an asset id via search and append it.
    ///
    /// The most relevant hit wins. Nothing is persisted when the query is
    /// empty, matches nothing, or resolves to an id already tracked.
    pub async fn add(&self, query: &str) -> Result<WatchlistSnapshot, WatchlistError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WatchlistError::EmptyQuery);
        }

        // Searched before locking so a slow upstream never stalls readers
        let best = self
            .market
            .search(query)
            .await
            .into_iter()
            .next()
            .ok_or(WatchlistError::NotFound)?;

        let mut tokens = self.tokens.lock().await;
        if tokens.contains(&best.id) {
            return Err(WatchlistError::AlreadyPresent);
        }

        let mut updated = tokens.clone();
        updated.push(best.id.clone());
        self.persist(&updated).await?;
        *tokens = updated.clone();
        drop(tokens);

        tracing::info!("added {} to watchlist (query {:?})", best.id, query);
        Ok(self.with_quotes(updated).await)
    }

    /// Drop `id`; unknown ids leave the list as it is
    pub async fn remove(&self, id: &str) -> Result<WatchlistSnapshot, WatchlistError> {
        let mut tokens = self.tokens.lock().await;

        let updated: Vec<String> = tokens.iter().filter(|t| *t != id).cloned().collect();
        self.persist(&updated).await?;
        *tokens = updated.clone();
        drop(tokens);

        Ok(self.with_quotes(updated).await)
    }

    async fn persist(&self, tokens: &[String]) -> Result<(), WatchlistError> {
        let encoded = serde_json::to_string(tokens)?;
        self.store.set(&self.storage_key, &encoded).await?;
        Ok(())
    }

    async fn with_quotes(&self, tokens: Vec<String>) -> WatchlistSnapshot {
        let quotes = if tokens.is_empty() {
            Vec::new()
        } else {
            self.market.quotes(&tokens).await
        };
        WatchlistSnapshot { tokens, quotes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{PriceHistory, SearchHit};
    use crate::test_support::{quote, StaticMarket};
    use async_trait::async_trait;
    use std::time::Duration;

    const KEY: &str = "tambo-watchlist";

    fn market() -> StaticMarket {
        StaticMarket::new()
            .with_quote(quote("bitcoin", "btc", 98420.0, -3.5))
            .with_quote(quote("ethereum", "eth", 3842.0, 1.8))
            .with_quote(quote("cardano", "ada", 0.45, 2.0))
            .with_search("ada", &["cardano", "cardano-bridged"])
            .with_search("Bitcoin", &["bitcoin", "wrapped-bitcoin"])
    }

    fn config() -> WatchlistConfig {
        WatchlistConfig::default()
    }

    async fn stored(store: &KvStore) -> Vec<String> {
        serde_json::from_str(&store.get(KEY).await.unwrap().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_seeds_defaults_when_absent() {
        let store = Arc::new(KvStore::new_in_memory().await.unwrap());
        let watchlist = Watchlist::load(store.clone(), Arc::new(market()), &config())
            .await
            .unwrap();

        assert_eq!(watchlist.tokens().await, vec!["bitcoin", "ethereum", "solana"]);
        assert_eq!(stored(&store).await, vec!["bitcoin", "ethereum", "solana"]);
    }

    #[tokio::test]
    async fn test_loads_persisted_list() {
        let store = Arc::new(KvStore::new_in_memory().await.unwrap());
        store.set(KEY, r#"["ethereum"]"#).await.unwrap();

        let watchlist = Watchlist::load(store, Arc::new(market()), &config())
            .await
            .unwrap();
        let snapshot = watchlist.snapshot().await;

        assert_eq!(snapshot.tokens, vec!["ethereum"]);
        assert_eq!(snapshot.quotes.len(), 1);
        assert_eq!(snapshot.quotes[0].symbol, "eth");
    }

    #[tokio::test]
    async fn test_unreadable_value_is_reseeded() {
        let store = Arc::new(KvStore::new_in_memory().await.unwrap());
        store.set(KEY, "not json").await.unwrap();

        let watchlist = Watchlist::load(store.clone(), Arc::new(market()), &config())
            .await
            .unwrap();
        assert_eq!(watchlist.tokens().await.len(), 3);
        assert_eq!(stored(&store).await.len(), 3);
    }

    #[tokio::test]
    async fn test_add_uses_first_search_hit_and_refreshes() {
        let store = Arc::new(KvStore::new_in_memory().await.unwrap());
        let market = Arc::new(market());
        let watchlist = Watchlist::load(store.clone(), market.clone(), &config())
            .await
            .unwrap();

        let snapshot = watchlist.add(" ada ").await.unwrap();

        assert_eq!(snapshot.tokens, vec!["bitcoin", "ethereum", "solana", "cardano"]);
        assert_eq!(stored(&store).await, snapshot.tokens);
        assert!(snapshot.quotes.iter().any(|q| q.id == "cardano"));
        assert_eq!(market.quote_call_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_is_rejected_without_mutation() {
        let store = Arc::new(KvStore::new_in_memory().await.unwrap());
        let watchlist = Watchlist::load(store.clone(), Arc::new(market()), &config())
            .await
            .unwrap();

        let err = watchlist.add("Bitcoin").await.unwrap_err();
        assert!(matches!(err, WatchlistError::AlreadyPresent));
        assert_eq!(err.to_string(), "Token already in watchlist");
        assert_eq!(stored(&store).await, vec!["bitcoin", "ethereum", "solana"]);
    }

    #[tokio::test]
    async fn test_unknown_token_is_rejected_without_mutation() {
        let store = Arc::new(KvStore::new_in_memory().await.unwrap());
        let watchlist = Watchlist::load(store.clone(), Arc::new(market()), &config())
            .await
            .unwrap();

        let err = watchlist.add("no-such-coin").await.unwrap_err();
        assert!(matches!(err, WatchlistError::NotFound));
        assert_eq!(err.to_string(), "Token not found");
        assert_eq!(stored(&store).await, vec!["bitcoin", "ethereum", "solana"]);

        assert!(matches!(
            watchlist.add("   ").await.unwrap_err(),
            WatchlistError::EmptyQuery
        ));
    }

    #[tokio::test]
    async fn test_remove_overwrites_store() {
        let store = Arc::new(KvStore::new_in_memory().await.unwrap());
        let watchlist = Watchlist::load(store.clone(), Arc::new(market()), &config())
            .await
            .unwrap();

        let snapshot = watchlist.remove("ethereum").await.unwrap();
        assert_eq!(snapshot.tokens, vec!["bitcoin", "solana"]);
        assert_eq!(stored(&store).await, vec!["bitcoin", "solana"]);

        let unchanged = watchlist.remove("dogecoin").await.unwrap();
        assert_eq!(unchanged.tokens, vec!["bitcoin", "solana"]);
    }

    #[tokio::test]
    async fn test_emptied_list_stays_empty_after_reload() {
        let store = Arc::new(KvStore::new_in_memory().await.unwrap());
        store.set(KEY, r#"["bitcoin"]"#).await.unwrap();
        let market = Arc::new(market());

        let watchlist = Watchlist::load(store.clone(), market.clone(), &config())
            .await
            .unwrap();
        let snapshot = watchlist.remove("bitcoin").await.unwrap();
        assert!(snapshot.tokens.is_empty());
        assert!(snapshot.quotes.is_empty());

        let reloaded = Watchlist::load(store, market, &config()).await.unwrap();
        assert!(reloaded.tokens().await.is_empty());
    }

    /// Market whose search never answers
    struct StalledSearch;

    #[async_trait]
    impl MarketDataSource for StalledSearch {
        async fn quotes(&self, _ids: &[String]) -> Vec<MarketQuote> {
            Vec::new()
        }

        async fn price_history(&self, _id: &str, _days: &str) -> Option<PriceHistory> {
            None
        }

        async fn search(&self, _query: &str) -> Vec<SearchHit> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_pending_add_does_not_block_snapshot() {
        let store = Arc::new(KvStore::new_in_memory().await.unwrap());
        let watchlist = Arc::new(
            Watchlist::load(store, Arc::new(StalledSearch), &config())
                .await
                .unwrap(),
        );

        let adding = tokio::spawn({
            let watchlist = watchlist.clone();
            async move { watchlist.add("bitcoin").await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let snapshot = tokio::time::timeout(Duration::from_secs(1), watchlist.snapshot())
            .await
            .expect("snapshot waited on the pending add");
        assert_eq!(snapshot.tokens, vec!["bitcoin", "ethereum", "solana"]);

        let removed = tokio::time::timeout(Duration::from_secs(1), watchlist.remove("solana"))
            .await
            .expect("remove waited on the pending add")
            .unwrap();
        assert_eq!(removed.tokens, vec!["bitcoin", "ethereum"]);

        assert!(!adding.is_finished());
        adding.abort();
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(
            WatchlistError::AlreadyPresent.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            WatchlistError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WatchlistError::EmptyQuery.into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
