//! Shared fixtures for unit tests: in-process upstream servers and a canned
//! market data source.

use async_trait::async_trait;
use axum::Router;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::market::{MarketDataSource, MarketQuote, PriceHistory, SearchHit};

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Counts requests reaching a stub
#[derive(Debug, Clone, Default)]
pub struct HitCounter(Arc<AtomicUsize>);

impl HitCounter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// In-memory market data with per-operation call counts
#[derive(Default)]
pub struct StaticMarket {
    quotes: HashMap<String, MarketQuote>,
    histories: HashMap<String, PriceHistory>,
    search: HashMap<String, Vec<SearchHit>>,
    pub quote_calls: Mutex<Vec<Vec<String>>>,
}

impl StaticMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(mut self, quote: MarketQuote) -> Self {
        self.quotes.insert(quote.id.clone(), quote);
        self
    }

    pub fn with_history(mut self, id: &str, prices: Vec<(f64, f64)>) -> Self {
        self.histories.insert(
            id.to_string(),
            PriceHistory {
                prices,
                ..PriceHistory::default()
            },
        );
        self
    }

    pub fn with_search(mut self, query: &str, ids: &[&str]) -> Self {
        let hits = ids
            .iter()
            .map(|id| SearchHit {
                id: id.to_string(),
                name: id.to_string(),
                symbol: id.chars().take(3).collect(),
                thumb: None,
            })
            .collect();
        self.search.insert(query.to_string(), hits);
        self
    }

    pub fn quote_call_count(&self) -> usize {
        self.quote_calls.lock().unwrap().len()
    }
}

/// Quote with the fields the views read
pub fn quote(id: &str, symbol: &str, price: f64, change_24h: f64) -> MarketQuote {
    let mut quote = MarketQuote::new(id, symbol, capitalize(id));
    quote.current_price = price;
    quote.price_change_percentage_24h = change_24h;
    quote
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl MarketDataSource for StaticMarket {
    async fn quotes(&self, ids: &[String]) -> Vec<MarketQuote> {
        self.quote_calls.lock().unwrap().push(ids.to_vec());
        ids.iter()
            .filter_map(|id| self.quotes.get(id).cloned())
            .collect()
    }

    async fn price_history(&self, id: &str, _days: &str) -> Option<PriceHistory> {
        self.histories.get(id).cloned()
    }

    async fn search(&self, query: &str) -> Vec<SearchHit> {
        self.search.get(query).cloned().unwrap_or_default()
    }
}
