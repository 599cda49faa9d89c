//! Generative component registry
//!
//! The AI engine picks a component by name and hands over loosely typed
//! props. The registry publishes each component's props schema, validates
//! incoming props into [`ComponentProps`], and renders a serializable view
//! model the browser draws. Renderers fetch their own market data and fall
//! back to [`RenderedComponent::Unavailable`] instead of failing.

mod format;
mod insight;
mod market;
mod portfolio;
mod props;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::market::MarketDataSource;
use crate::watchlist::Watchlist;

pub use format::format_usd;
pub use insight::{AllocationView, RiskGaugeView};
pub use market::{MarketCardView, PriceChartView};
pub use portfolio::{PortfolioView, WatchlistView, WhatIfView};
pub use props::ComponentProps;

/// Title used by fallback panels when a component has nothing better
pub const UNAVAILABLE_TITLE: &str = "Data Unavailable";

#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("Unknown component: {0}")]
    UnknownComponent(String),
}

impl IntoResponse for ComponentError {
    fn into_response(self) -> Response {
        let status = match self {
            ComponentError::UnknownComponent(_) => StatusCode::NOT_FOUND,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// The fixed set of components the engine may select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    PriceChart,
    MarketSnapshotCard,
    PortfolioTable,
    Watchlist,
    WhatIfSimulator,
    RiskGauge,
    AllocationBreakdown,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 7] = [
        ComponentKind::PriceChart,
        ComponentKind::MarketSnapshotCard,
        ComponentKind::PortfolioTable,
        ComponentKind::Watchlist,
        ComponentKind::WhatIfSimulator,
        ComponentKind::RiskGauge,
        ComponentKind::AllocationBreakdown,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::PriceChart => "PriceChart",
            ComponentKind::MarketSnapshotCard => "MarketSnapshotCard",
            ComponentKind::PortfolioTable => "PortfolioTable",
            ComponentKind::Watchlist => "Watchlist",
            ComponentKind::WhatIfSimulator => "WhatIfSimulator",
            ComponentKind::RiskGauge => "RiskGauge",
            ComponentKind::AllocationBreakdown => "AllocationBreakdown",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    fn description(self) -> &'static str {
        match self {
            ComponentKind::PriceChart => {
                "Displays a price history chart for one or more cryptocurrencies. Use when the user asks about price trends, history or comparisons over time."
            }
            ComponentKind::MarketSnapshotCard => {
                "Shows current price, 24h change, market cap and volume for a single cryptocurrency."
            }
            ComponentKind::PortfolioTable => {
                "Editable table of holdings with live prices, value and profit/loss. Use when the user describes or asks about their portfolio."
            }
            ComponentKind::Watchlist => {
                "The user's persisted list of tracked tokens with live prices."
            }
            ComponentKind::WhatIfSimulator => {
                "Projects the value of a hypothetical investment in a token and estimates its risk."
            }
            ComponentKind::RiskGauge => {
                "Visual gauge for a risk score between 0 and 100."
            }
            ComponentKind::AllocationBreakdown => {
                "Breakdown of a portfolio by asset with the share of each holding."
            }
        }
    }

    fn props_schema(self) -> Value {
        match self {
            ComponentKind::PriceChart => json!({
                "type": "object",
                "properties": {
                    "tokens": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "List of token IDs (e.g., ['bitcoin', 'ethereum'])"
                    },
                    "timeframe": { "type": "string", "description": "Timeframe in days (default: '7')" },
                    "title": { "type": "string", "description": "Chart title" }
                },
                "required": ["tokens"]
            }),
            ComponentKind::MarketSnapshotCard => json!({
                "type": "object",
                "properties": {
                    "symbol": { "type": "string", "description": "The coin ID (e.g., 'bitcoin')" }
                },
                "required": ["symbol"]
            }),
            ComponentKind::PortfolioTable => json!({
                "type": "object",
                "properties": {
                    "initialPortfolio": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "asset": { "type": "string", "description": "Coin ID" },
                                "quantity": { "type": "number" },
                                "avgBuy": { "type": "number", "description": "Average buy price in USD" }
                            },
                            "required": ["asset", "quantity", "avgBuy"]
                        }
                    }
                },
                "required": []
            }),
            ComponentKind::Watchlist => json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
            ComponentKind::WhatIfSimulator => json!({
                "type": "object",
                "properties": {
                    "token": { "type": "string", "description": "Token ID to simulate (e.g. 'ethereum')" },
                    "amount": { "type": "number", "description": "Investment in USD (default: 1000)" },
                    "months": { "type": "number", "description": "Holding period in months, 1 to 60 (default: 12)" }
                },
                "required": ["token"]
            }),
            ComponentKind::RiskGauge => json!({
                "type": "object",
                "properties": {
                    "score": { "type": "number", "minimum": 0, "maximum": 100 },
                    "label": { "type": "string" }
                },
                "required": ["score"]
            }),
            ComponentKind::AllocationBreakdown => json!({
                "type": "object",
                "properties": {
                    "data": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "asset": { "type": "string" },
                                "value": { "type": "number" }
                            },
                            "required": ["asset", "value"]
                        }
                    },
                    "title": { "type": "string" }
                },
                "required": ["data"]
            }),
        }
    }
}

/// What the engine is told about a component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the props
    pub props_schema: Value,
}

impl ComponentDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            props_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    pub fn with_props_schema(mut self, schema: Value) -> Self {
        self.props_schema = schema;
        self
    }
}

impl From<ComponentKind> for ComponentDefinition {
    fn from(kind: ComponentKind) -> Self {
        ComponentDefinition::new(kind.name(), kind.description())
            .with_props_schema(kind.props_schema())
    }
}

/// A rendered view model, tagged by `view`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum RenderedComponent {
    PriceChart(PriceChartView),
    MarketCard(MarketCardView),
    PortfolioTable(PortfolioView),
    Watchlist(WatchlistView),
    WhatIfSimulator(WhatIfView),
    RiskGauge(RiskGaugeView),
    AllocationBreakdown(AllocationView),
    Unavailable { title: String, message: String },
}

impl RenderedComponent {
    pub fn unavailable(title: impl Into<String>, message: impl Into<String>) -> Self {
        RenderedComponent::Unavailable {
            title: title.into(),
            message: message.into(),
        }
    }
}

pub struct ComponentRegistry {
    market: Arc<dyn MarketDataSource>,
    watchlist: Arc<Watchlist>,
    definitions: Vec<ComponentDefinition>,
}

impl ComponentRegistry {
    pub fn new(market: Arc<dyn MarketDataSource>, watchlist: Arc<Watchlist>) -> Self {
        let definitions = ComponentKind::ALL
            .into_iter()
            .map(ComponentDefinition::from)
            .collect();

        Self {
            market,
            watchlist,
            definitions,
        }
    }

    pub fn definitions(&self) -> &[ComponentDefinition] {
        &self.definitions
    }

    /// Validate `props` for the named component and render it.
    ///
    /// Only an unknown name is an error; bad props and failed fetches come
    /// back as an `Unavailable` panel.
    pub async fn render(
        &self,
        name: &str,
        props: &Value,
    ) -> Result<RenderedComponent, ComponentError> {
        let kind = ComponentKind::from_name(name)
            .ok_or_else(|| ComponentError::UnknownComponent(name.to_string()))?;

        let props = match ComponentProps::parse(kind, props) {
            Ok(props) => props,
            Err(e) => {
                tracing::debug!("rejected props for {}: {}", name, e);
                return Ok(RenderedComponent::unavailable(
                    UNAVAILABLE_TITLE,
                    format!("{} could not be shown: {}", kind.name(), e),
                ));
            }
        };

        tracing::debug!("rendering {}", kind.name());

        Ok(match props {
            ComponentProps::PriceChart(props) => {
                market::render_price_chart(self.market.clone(), props).await
            }
            ComponentProps::MarketSnapshotCard(props) => {
                market::render_market_card(self.market.as_ref(), props).await
            }
            ComponentProps::PortfolioTable(props) => {
                portfolio::render_portfolio(self.market.as_ref(), props).await
            }
            ComponentProps::Watchlist => {
                portfolio::render_watchlist(self.watchlist.snapshot().await)
            }
            ComponentProps::WhatIfSimulator(props) => {
                portfolio::render_what_if(self.market.as_ref(), props).await
            }
            ComponentProps::RiskGauge(props) => insight::render_risk_gauge(props),
            ComponentProps::AllocationBreakdown(props) => insight::render_allocation(props),
        })
    }
}
