//! Market views: price chart and snapshot card

use chrono::DateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;

use super::format::{format_billions, format_millions, format_percent_abs, format_usd};
use super::props::{MarketCardProps, PriceChartProps};
use super::{RenderedComponent, UNAVAILABLE_TITLE};
use crate::market::{MarketDataSource, PriceHistory};

const HOUR_MS: i64 = 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Positive,
    Negative,
}

/// Direction and magnitude of a 24h move
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeIndicator {
    pub trend: Trend,
    pub value: f64,
    /// Absolute value, two decimals
    pub display: String,
}

impl ChangeIndicator {
    pub fn from_change(change: f64) -> Self {
        Self {
            trend: if change >= 0.0 {
                Trend::Positive
            } else {
                Trend::Negative
            },
            value: change,
            display: format_percent_abs(change),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Start of the hour, epoch millis
    pub timestamp: i64,
    pub label: String,
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceChartView {
    pub title: String,
    pub subtitle: String,
    pub timeframe: String,
    pub tokens: Vec<String>,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketCardView {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub image: Option<String>,
    pub price: f64,
    pub price_display: String,
    pub change: ChangeIndicator,
    pub market_cap_display: String,
    pub volume_display: String,
}

pub(super) async fn render_price_chart(
    market: Arc<dyn MarketDataSource>,
    props: PriceChartProps,
) -> RenderedComponent {
    // aborted together with the render if the request goes away
    let mut fetches = JoinSet::new();
    for (index, token) in props.tokens.iter().cloned().enumerate() {
        let market = market.clone();
        let days = props.timeframe.clone();
        fetches.spawn(async move { (index, market.price_history(&token, &days).await) });
    }

    let mut histories: Vec<Option<PriceHistory>> = vec![None; props.tokens.len()];
    while let Some(joined) = fetches.join_next().await {
        match joined {
            Ok((index, history)) => histories[index] = history,
            Err(e) => tracing::warn!("price history fetch did not complete: {}", e),
        }
    }

    if histories.iter().all(Option::is_none) {
        return RenderedComponent::unavailable(
            UNAVAILABLE_TITLE,
            "Failed to fetch data for all tokens",
        );
    }

    let points = merge_histories(&props.tokens, &histories, &props.timeframe);
    if points.is_empty() {
        return RenderedComponent::unavailable(
            UNAVAILABLE_TITLE,
            "Could not fetch price history for these tokens.",
        );
    }

    RenderedComponent::PriceChart(PriceChartView {
        subtitle: format!("{}D HISTORY", props.timeframe),
        title: props.title,
        timeframe: props.timeframe,
        tokens: props.tokens,
        points,
    })
}

/// Align every sample down to its hour and merge the tokens per hour, oldest
/// first. A later sample in the same hour replaces an earlier one.
fn merge_histories(
    tokens: &[String],
    histories: &[Option<PriceHistory>],
    timeframe: &str,
) -> Vec<ChartPoint> {
    let mut merged: BTreeMap<i64, BTreeMap<String, f64>> = BTreeMap::new();

    for (token, history) in tokens.iter().zip(histories) {
        let Some(history) = history else { continue };
        for &(timestamp, price) in &history.prices {
            let aligned = (timestamp as i64).div_euclid(HOUR_MS) * HOUR_MS;
            merged
                .entry(aligned)
                .or_default()
                .insert(token.clone(), price);
        }
    }

    let hourly = timeframe == "1";
    merged
        .into_iter()
        .filter_map(|(timestamp, values)| {
            let at = DateTime::from_timestamp_millis(timestamp)?;
            let label = if hourly {
                at.format("%b %-d, %H:00").to_string()
            } else {
                at.format("%b %-d").to_string()
            };
            Some(ChartPoint {
                timestamp,
                label,
                values,
            })
        })
        .collect()
}

pub(super) async fn render_market_card(
    market: &dyn MarketDataSource,
    props: MarketCardProps,
) -> RenderedComponent {
    let quote = market
        .quotes(std::slice::from_ref(&props.symbol))
        .await
        .into_iter()
        .next();

    let Some(quote) = quote else {
        return RenderedComponent::unavailable(
            UNAVAILABLE_TITLE,
            format!("Could not load data for {}", props.symbol),
        );
    };

    RenderedComponent::MarketCard(MarketCardView {
        symbol: quote.symbol.to_uppercase(),
        price_display: format_usd(quote.current_price, 3),
        change: ChangeIndicator::from_change(quote.price_change_percentage_24h),
        market_cap_display: format_billions(quote.market_cap),
        volume_display: format_millions(quote.total_volume),
        price: quote.current_price,
        id: quote.id,
        name: quote.name,
        image: quote.image,
    })
}
