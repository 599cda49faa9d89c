//! Application configuration
//!
//! Process-level settings come from the environment (`.env` is loaded in
//! `main`); dashboard tuning lives in an optional TOML file.

pub mod dashboard;

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use dashboard::DashboardConfig;

const DEFAULT_TAMBO_URL: &str = "https://api.tambo.ai";

/// How the browser reaches the AI service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// Through this service's `/api/tambo` passthrough
    Proxy,
    /// Straight to the public URL with the public key
    Direct,
}

impl ConnectionMode {
    fn from_env_value(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "direct" => ConnectionMode::Direct,
            _ => ConnectionMode::Proxy,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,

    /// Upstream AI service root used by the proxy
    pub tambo_url: String,

    /// Server-side credential. Never serialized back to clients.
    #[serde(skip_serializing)]
    pub tambo_api_key: Option<String>,

    /// Browser-facing pairing for the direct connection mode
    pub public_tambo_url: Option<String>,
    #[serde(skip_serializing)]
    pub public_tambo_api_key: Option<String>,

    pub connection_mode: ConnectionMode,

    pub data_dir: PathBuf,

    pub dashboard: DashboardConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut dashboard = match env::var("FOLIO_CONFIG") {
            Ok(path) => DashboardConfig::from_file(&PathBuf::from(path))?,
            Err(_) => DashboardConfig::default(),
        };

        if let Ok(url) = env::var("COINGECKO_URL") {
            dashboard.market.base_url = url;
        }

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            tambo_url: env::var("TAMBO_URL").unwrap_or_else(|_| DEFAULT_TAMBO_URL.into()),
            tambo_api_key: non_empty_var("TAMBO_API_KEY"),
            public_tambo_url: non_empty_var("PUBLIC_TAMBO_URL"),
            public_tambo_api_key: non_empty_var("PUBLIC_TAMBO_API_KEY"),
            connection_mode: env::var("TAMBO_CONNECTION_MODE")
                .map(|v| ConnectionMode::from_env_value(&v))
                .unwrap_or(ConnectionMode::Proxy),
            data_dir: env::var("FOLIO_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            dashboard,
        })
    }

    /// Whether the proxy has a credential to inject
    pub fn tambo_configured(&self) -> bool {
        self.tambo_api_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            tambo_url: DEFAULT_TAMBO_URL.into(),
            tambo_api_key: None,
            public_tambo_url: None,
            public_tambo_api_key: None,
            connection_mode: ConnectionMode::Proxy,
            data_dir: PathBuf::from("./data"),
            dashboard: DashboardConfig::default(),
        }
    }
}

// An empty variable counts as unset, same as a missing one.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
