//! Holdings views: portfolio table, watchlist and the what-if simulator

use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use super::format::{format_number, format_percent_signed, format_usd};
use super::insight::RiskLevel;
use super::market::ChangeIndicator;
use super::props::{PortfolioTableProps, WhatIfProps};
use super::{RenderedComponent, UNAVAILABLE_TITLE};
use crate::market::{MarketDataSource, MarketQuote};
use crate::watchlist::WatchlistSnapshot;

/// Growth assumed when the market moves neither way strongly
const BASE_ANNUAL_GROWTH: f64 = 0.25;
const BULLISH_ADJUSTMENT: f64 = 0.2;
const BEARISH_ADJUSTMENT: f64 = -0.1;
/// Rank assumed for assets without one
const UNRANKED: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioRow {
    pub id: String,
    pub asset: String,
    pub quantity: f64,
    pub avg_buy: f64,
    /// `None` until a quote is known
    pub current_price: Option<f64>,
    pub value: f64,
    pub cost: f64,
    pub pnl: f64,
    pub pnl_display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioView {
    pub rows: Vec<PortfolioRow>,
    pub total_value: f64,
    pub total_cost: f64,
    pub total_pnl: f64,
    pub pnl_percent: f64,
    pub total_value_display: String,
    pub pnl_percent_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistRow {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub image: Option<String>,
    pub price_display: String,
    pub change: ChangeIndicator,
    /// Signed, two decimals
    pub change_display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistView {
    pub tokens: Vec<String>,
    pub rows: Vec<WatchlistRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhatIfView {
    pub token: String,
    pub name: String,
    pub image: Option<String>,
    pub amount: f64,
    pub months: f64,
    pub projected_value: f64,
    pub profit: f64,
    pub roi: f64,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub projected_display: String,
    pub roi_display: String,
}

pub(super) async fn render_portfolio(
    market: &dyn MarketDataSource,
    props: PortfolioTableProps,
) -> RenderedComponent {
    let mut ids: Vec<String> = Vec::new();
    for entry in &props.initial_portfolio {
        if !ids.contains(&entry.asset) {
            ids.push(entry.asset.clone());
        }
    }

    let prices: HashMap<String, f64> = if ids.is_empty() {
        HashMap::new()
    } else {
        market
            .quotes(&ids)
            .await
            .into_iter()
            .filter(|q| q.current_price > 0.0)
            .map(|q| (q.id, q.current_price))
            .collect()
    };

    let rows: Vec<PortfolioRow> = props
        .initial_portfolio
        .into_iter()
        .map(|entry| {
            let current_price = prices.get(&entry.asset).copied();
            let value = entry.quantity * current_price.unwrap_or(0.0);
            let cost = entry.quantity * entry.avg_buy;
            let pnl = value - cost;
            PortfolioRow {
                id: Uuid::new_v4().to_string(),
                pnl_display: signed_amount(pnl),
                asset: entry.asset,
                quantity: entry.quantity,
                avg_buy: entry.avg_buy,
                current_price,
                value,
                cost,
                pnl,
            }
        })
        .collect();

    let total_value: f64 = rows.iter().map(|r| r.value).sum();
    let total_cost: f64 = rows.iter().map(|r| r.cost).sum();
    let total_pnl = total_value - total_cost;
    let pnl_percent = if total_cost > 0.0 {
        total_pnl / total_cost * 100.0
    } else {
        0.0
    };

    RenderedComponent::PortfolioTable(PortfolioView {
        notice: rows
            .is_empty()
            .then(|| "No assets in portfolio. Add one to start tracking.".to_string()),
        rows,
        total_value,
        total_cost,
        total_pnl,
        pnl_percent,
        total_value_display: format_usd(total_value, 2),
        pnl_percent_display: format!(
            "{} ({})",
            format_percent_signed(pnl_percent),
            format_usd(total_pnl, 2)
        ),
    })
}

fn signed_amount(value: f64) -> String {
    let number = format_number(value, 2);
    if value >= 0.0 {
        format!("+{}", number)
    } else {
        number
    }
}

pub(super) fn render_watchlist(snapshot: WatchlistSnapshot) -> RenderedComponent {
    let rows = snapshot.quotes.into_iter().map(watchlist_row).collect();

    RenderedComponent::Watchlist(WatchlistView {
        notice: snapshot
            .tokens
            .is_empty()
            .then(|| "Your watchlist is empty.".to_string()),
        tokens: snapshot.tokens,
        rows,
    })
}

fn watchlist_row(quote: MarketQuote) -> WatchlistRow {
    let change = quote.price_change_percentage_24h;
    WatchlistRow {
        symbol: quote.symbol.to_uppercase(),
        price_display: format_usd(quote.current_price, 3),
        change: ChangeIndicator::from_change(change),
        change_display: format_percent_signed(change),
        id: quote.id,
        name: quote.name,
        image: quote.image,
    }
}

pub(super) async fn render_what_if(
    market: &dyn MarketDataSource,
    props: WhatIfProps,
) -> RenderedComponent {
    let quote = market
        .quotes(std::slice::from_ref(&props.token))
        .await
        .into_iter()
        .next();

    let Some(quote) = quote else {
        return RenderedComponent::unavailable(
            UNAVAILABLE_TITLE,
            format!("Could not load data for {}", props.token),
        );
    };

    let projection = project(&quote, props.amount, props.months);

    RenderedComponent::WhatIfSimulator(WhatIfView {
        token: quote.id,
        name: quote.name,
        image: quote.image,
        amount: props.amount,
        months: props.months,
        projected_value: projection.projected_value,
        profit: projection.profit,
        roi: projection.roi,
        risk_score: projection.risk_score,
        risk_level: RiskLevel::for_simulation(projection.risk_score),
        projected_display: format_usd(projection.projected_value, 2),
        roi_display: format_percent_signed(projection.roi),
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Projection {
    projected_value: f64,
    profit: f64,
    roi: f64,
    risk_score: f64,
}

fn project(quote: &MarketQuote, amount: f64, months: f64) -> Projection {
    let change = quote.price_change_percentage_24h;
    let volatility = change.abs() * 2.0;
    let annual_growth = BASE_ANNUAL_GROWTH
        + if change > 0.0 {
            BULLISH_ADJUSTMENT
        } else {
            BEARISH_ADJUSTMENT
        };
    let projected_value = amount * (1.0 + annual_growth * (months / 12.0));

    let rank = quote.market_cap_rank.map(f64::from).unwrap_or(UNRANKED);
    let mcap_score = (100.0 - rank).clamp(0.0, 100.0);
    let risk_score = (100.0 - mcap_score * 0.7 + volatility * 2.0).clamp(5.0, 95.0);

    let profit = projected_value - amount;
    Projection {
        projected_value,
        profit,
        roi: profit / amount * 100.0,
        risk_score,
    }
}
