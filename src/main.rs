//! Tambo Folio - backend for a generative crypto portfolio dashboard
//!
//! Serves the same-origin proxy to the Tambo AI service, cached CoinGecko
//! market data, the generative component registry the AI renders through,
//! a persisted watchlist and a few chat shell helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod components;
mod config;
mod conversation;
mod market;
mod proxy;
mod routes;
mod storage;
mod watchlist;

#[cfg(test)]
mod test_support;

use components::ComponentRegistry;
use config::Config;
use market::{CoinGeckoClient, MarketDataSource};
use proxy::TamboProxy;
use storage::KvStore;
use watchlist::Watchlist;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub proxy: Arc<TamboProxy>,
    pub market: Arc<dyn MarketDataSource>,
    pub watchlist: Arc<Watchlist>,
    pub components: Arc<ComponentRegistry>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tambo_folio=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    config.dashboard.validate()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    if !config.tambo_configured() {
        tracing::warn!("TAMBO_API_KEY is not set; proxied requests will fail");
    }

    let db_path = config.data_dir.join("folio.db");
    let store = Arc::new(
        KvStore::new(&db_path)
            .await
            .with_context(|| format!("failed to open store at {}", db_path.display()))?,
    );

    let market: Arc<dyn MarketDataSource> =
        Arc::new(CoinGeckoClient::new(&config.dashboard.market));

    let watchlist = Arc::new(
        Watchlist::load(store, market.clone(), &config.dashboard.watchlist)
            .await
            .context("failed to load watchlist")?,
    );

    let components = Arc::new(ComponentRegistry::new(market.clone(), watchlist.clone()));
    tracing::info!(
        "registered {} generative component(s)",
        components.definitions().len()
    );

    let state = AppState {
        proxy: Arc::new(TamboProxy::from_config(&config)),
        config: Arc::new(config),
        market,
        watchlist,
        components,
    };

    let app = Router::new()
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state);

    tracing::info!("Tambo Folio running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
