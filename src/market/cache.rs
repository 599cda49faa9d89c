//! Freshness-window cache for market data responses

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A stored upstream response
#[derive(Debug, Clone)]
struct CachedResponse {
    data: Value,
    fetched_at: Instant,
}

impl CachedResponse {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

/// Response cache keyed by normalized request parameters.
///
/// Stale entries are never removed, only overwritten by the next insert for
/// the same key.
#[derive(Debug)]
pub struct TtlCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedResponse>>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, if any
    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &str, now: Instant) -> Option<Value> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| entry.data.clone())
    }

    pub fn insert(&self, key: impl Into<String>, data: Value) {
        self.insert_at(key, data, Instant::now());
    }

    pub fn insert_at(&self, key: impl Into<String>, data: Value, fetched_at: Instant) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.into(), CachedResponse { data, fetched_at });
    }

    /// Number of stored entries, stale ones included
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fresh_entry_is_returned() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let start = Instant::now();
        cache.insert_at("market-bitcoin", json!([{"id": "bitcoin"}]), start);

        let hit = cache.get_at("market-bitcoin", start + Duration::from_secs(59));
        assert_eq!(hit, Some(json!([{"id": "bitcoin"}])));
    }

    #[test]
    fn test_stale_entry_is_absent_but_kept() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let start = Instant::now();
        cache.insert_at("history-bitcoin-7", json!({"prices": []}), start);

        assert!(cache
            .get_at("history-bitcoin-7", start + Duration::from_secs(60))
            .is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_overwrites() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let start = Instant::now();
        cache.insert_at("search-btc", json!(["old"]), start);
        cache.insert_at("search-btc", json!(["new"]), start + Duration::from_secs(61));

        let hit = cache.get_at("search-btc", start + Duration::from_secs(62));
        assert_eq!(hit, Some(json!(["new"])));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_ttl_never_hits() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.insert("k", json!(1));
        assert!(cache.get("k").is_none());
    }
}
