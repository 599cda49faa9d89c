//! Dashboard configuration loaded from TOML files
//!
//! Every section is optional; a missing file or section falls back to the
//! values the dashboard ships with.
//!
//! ```toml
//! [market]
//! base_url = "https://api.coingecko.com/api/v3"
//! cache_ttl_secs = 60
//! search_limit = 5
//!
//! [watchlist]
//! storage_key = "tambo-watchlist"
//! default_tokens = ["bitcoin", "ethereum", "solana"]
//!
//! [[chat.suggestions]]
//! title = "Risk check"
//! detailed_suggestion = "Analyze the risk profile of my current holdings"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Root dashboard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Market data client settings
    #[serde(default)]
    pub market: MarketConfig,

    /// Watchlist persistence settings
    #[serde(default)]
    pub watchlist: WatchlistConfig,

    /// Chat shell settings
    #[serde(default)]
    pub chat: ChatConfig,
}

impl DashboardConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.market.base_url.trim().is_empty() {
            return Err(ConfigError::Validation("market.base_url is empty".into()));
        }
        if self.watchlist.storage_key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "watchlist.storage_key is empty".into(),
            ));
        }
        Ok(())
    }
}

/// Market data client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// CoinGecko API root
    #[serde(default = "default_market_url")]
    pub base_url: String,

    /// Quote currency for prices
    #[serde(default = "default_vs_currency")]
    pub vs_currency: String,

    /// Freshness window for cached responses
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Number of search hits kept per query
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

fn default_market_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

fn default_vs_currency() -> String {
    "usd".to_string()
}

fn default_cache_ttl() -> u64 {
    60
}

fn default_search_limit() -> usize {
    5
}

impl MarketConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            base_url: default_market_url(),
            vs_currency: default_vs_currency(),
            cache_ttl_secs: default_cache_ttl(),
            search_limit: default_search_limit(),
        }
    }
}

/// Watchlist configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistConfig {
    /// Key under which the id list is persisted
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Seeded when nothing has been persisted yet
    #[serde(default = "default_tokens")]
    pub default_tokens: Vec<String>,
}

fn default_storage_key() -> String {
    "tambo-watchlist".to_string()
}

fn default_tokens() -> Vec<String> {
    vec![
        "bitcoin".to_string(),
        "ethereum".to_string(),
        "solana".to_string(),
    ]
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            default_tokens: default_tokens(),
        }
    }
}

/// Chat shell configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Starter suggestions shown on an empty thread
    #[serde(default = "default_suggestions")]
    pub suggestions: Vec<Suggestion>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            suggestions: default_suggestions(),
        }
    }
}

/// A starter prompt offered to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub detailed_suggestion: String,
}

impl Suggestion {
    fn new(id: &str, title: &str, detailed: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            title: title.to_string(),
            detailed_suggestion: detailed.to_string(),
        }
    }
}

fn default_suggestions() -> Vec<Suggestion> {
    vec![
        Suggestion::new(
            "suggestion-1",
            "Portfolio overview",
            "Show me my portfolio performance and allocation breakdown",
        ),
        Suggestion::new(
            "suggestion-2",
            "Market analysis",
            "What are the top movers in the crypto market today?",
        ),
        Suggestion::new(
            "suggestion-3",
            "Risk check",
            "Analyze the risk profile of my current holdings",
        ),
    ]
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
