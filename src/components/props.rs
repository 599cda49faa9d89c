//! Typed component props and the coercion step that produces them
//!
//! The AI engine sends loosely typed JSON. [`ComponentProps::parse`] is the
//! one place where that input is checked and normalized; renderers only ever
//! see the typed variants.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::ComponentKind;

/// Lookback used when the engine gives none
pub const DEFAULT_TIMEFRAME: &str = "7";
pub const DEFAULT_CHART_TITLE: &str = "Market Performance";
pub const DEFAULT_GAUGE_LABEL: &str = "Risk Analysis";
pub const DEFAULT_ALLOCATION_TITLE: &str = "Allocation Breakdown";
pub const DEFAULT_INVESTMENT: f64 = 1000.0;
pub const DEFAULT_MONTHS: f64 = 12.0;
pub const MAX_MONTHS: f64 = 60.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropsError {
    /// A required input is absent or empty
    #[error("missing required input '{0}'")]
    Missing(String),
    /// An input is present but cannot be coerced
    #[error("input '{field}' should be {expected}")]
    Invalid { field: String, expected: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "component", content = "props")]
pub enum ComponentProps {
    PriceChart(PriceChartProps),
    MarketSnapshotCard(MarketCardProps),
    PortfolioTable(PortfolioTableProps),
    Watchlist,
    WhatIfSimulator(WhatIfProps),
    RiskGauge(RiskGaugeProps),
    AllocationBreakdown(AllocationProps),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceChartProps {
    pub tokens: Vec<String>,
    pub timeframe: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketCardProps {
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioTableProps {
    pub initial_portfolio: Vec<PortfolioEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioEntry {
    pub asset: String,
    pub quantity: f64,
    pub avg_buy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhatIfProps {
    pub token: String,
    pub amount: f64,
    pub months: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskGaugeProps {
    /// Always within 0..=100
    pub score: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationProps {
    pub data: Vec<AllocationEntry>,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationEntry {
    pub asset: String,
    pub value: f64,
}

impl ComponentProps {
    /// Validate and coerce engine-supplied props for `kind`.
    ///
    /// `null` props are treated as an empty object.
    pub fn parse(kind: ComponentKind, props: &Value) -> Result<Self, PropsError> {
        let empty = Map::new();
        let obj = match props {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(invalid("props", "an object")),
        };

        Ok(match kind {
            ComponentKind::PriceChart => {
                let tokens = string_list(obj, "tokens")?
                    .map(|tokens| tokens.into_iter().map(asset_id).collect::<Vec<_>>())
                    .filter(|tokens| !tokens.is_empty())
                    .ok_or_else(|| PropsError::Missing("tokens".into()))?;

                ComponentProps::PriceChart(PriceChartProps {
                    tokens,
                    timeframe: string_field(obj, "timeframe")?
                        .unwrap_or_else(|| DEFAULT_TIMEFRAME.to_string()),
                    title: string_field(obj, "title")?
                        .unwrap_or_else(|| DEFAULT_CHART_TITLE.to_string()),
                })
            }
            ComponentKind::MarketSnapshotCard => {
                ComponentProps::MarketSnapshotCard(MarketCardProps {
                    symbol: asset_id(required_string(obj, "symbol")?),
                })
            }
            ComponentKind::PortfolioTable => {
                let mut entries = Vec::new();
                for (index, item) in object_list(obj, "initialPortfolio")?
                    .unwrap_or_default()
                    .into_iter()
                    .enumerate()
                {
                    let prefix = format!("initialPortfolio[{}]", index);
                    let item = item
                        .as_object()
                        .ok_or_else(|| invalid(&prefix, "an object"))?;
                    entries.push(PortfolioEntry {
                        asset: asset_id(required_string_at(item, &prefix, "asset")?),
                        quantity: required_number_at(item, &prefix, "quantity")?,
                        avg_buy: required_number_at(item, &prefix, "avgBuy")?,
                    });
                }
                ComponentProps::PortfolioTable(PortfolioTableProps {
                    initial_portfolio: entries,
                })
            }
            ComponentKind::Watchlist => ComponentProps::Watchlist,
            ComponentKind::WhatIfSimulator => {
                let amount = number_field(obj, "amount")?.unwrap_or(DEFAULT_INVESTMENT);
                if amount <= 0.0 {
                    return Err(invalid("amount", "a positive number"));
                }
                let months = number_field(obj, "months")?
                    .unwrap_or(DEFAULT_MONTHS)
                    .clamp(1.0, MAX_MONTHS);

                ComponentProps::WhatIfSimulator(WhatIfProps {
                    token: asset_id(required_string(obj, "token")?),
                    amount,
                    months,
                })
            }
            ComponentKind::RiskGauge => ComponentProps::RiskGauge(RiskGaugeProps {
                score: number_field(obj, "score")?
                    .ok_or_else(|| PropsError::Missing("score".into()))?
                    .clamp(0.0, 100.0),
                label: string_field(obj, "label")?
                    .unwrap_or_else(|| DEFAULT_GAUGE_LABEL.to_string()),
            }),
            ComponentKind::AllocationBreakdown => {
                let items = object_list(obj, "data")?
                    .ok_or_else(|| PropsError::Missing("data".into()))?;

                let mut data = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    let prefix = format!("data[{}]", index);
                    let item = item
                        .as_object()
                        .ok_or_else(|| invalid(&prefix, "an object"))?;
                    data.push(AllocationEntry {
                        asset: required_string_at(item, &prefix, "asset")?,
                        value: required_number_at(item, &prefix, "value")?,
                    });
                }

                ComponentProps::AllocationBreakdown(AllocationProps {
                    data,
                    title: string_field(obj, "title")?
                        .unwrap_or_else(|| DEFAULT_ALLOCATION_TITLE.to_string()),
                })
            }
        })
    }
}

fn invalid(field: &str, expected: &'static str) -> PropsError {
    PropsError::Invalid {
        field: field.to_string(),
        expected,
    }
}

// Asset ids are lower-case slugs upstream.
fn asset_id(raw: String) -> String {
    raw.trim().to_lowercase()
}

fn string_field(obj: &Map<String, Value>, name: &str) -> Result<Option<String>, PropsError> {
    match obj.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| s.to_string()))
        }
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(invalid(name, "a string")),
    }
}

fn required_string(obj: &Map<String, Value>, name: &str) -> Result<String, PropsError> {
    string_field(obj, name)?.ok_or_else(|| PropsError::Missing(name.to_string()))
}

fn required_string_at(
    obj: &Map<String, Value>,
    prefix: &str,
    name: &str,
) -> Result<String, PropsError> {
    string_field(obj, name)
        .map_err(|_| invalid(&format!("{}.{}", prefix, name), "a string"))?
        .ok_or_else(|| PropsError::Missing(format!("{}.{}", prefix, name)))
}

fn number_field(obj: &Map<String, Value>, name: &str) -> Result<Option<f64>, PropsError> {
    let number = match obj.get(name) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | '%'))
                .collect();
            cleaned.parse::<f64>().ok()
        }
        Some(_) => None,
    };

    number
        .filter(|n| n.is_finite())
        .map(Some)
        .ok_or_else(|| invalid(name, "a number"))
}

fn required_number_at(
    obj: &Map<String, Value>,
    prefix: &str,
    name: &str,
) -> Result<f64, PropsError> {
    number_field(obj, name)
        .map_err(|_| invalid(&format!("{}.{}", prefix, name), "a number"))?
        .ok_or_else(|| PropsError::Missing(format!("{}.{}", prefix, name)))
}

/// A list of strings; a lone string is split on commas
fn string_list(obj: &Map<String, Value>, name: &str) -> Result<Option<Vec<String>>, PropsError> {
    match obj.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.trim().to_string()),
                _ => Err(invalid(name, "a list of strings")),
            })
            .filter(|item| !matches!(item, Ok(s) if s.is_empty()))
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(invalid(name, "a list of strings")),
    }
}

fn object_list(obj: &Map<String, Value>, name: &str) -> Result<Option<Vec<Value>>, PropsError> {
    match obj.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items.clone())),
        Some(_) => Err(invalid(name, "a list")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_price_chart_defaults_and_coercion() {
        let props = ComponentProps::parse(
            ComponentKind::PriceChart,
            &json!({ "tokens": "Bitcoin, ethereum", "timeframe": 30 }),
        )
        .unwrap();

        assert_eq!(
            props,
            ComponentProps::PriceChart(PriceChartProps {
                tokens: vec!["bitcoin".into(), "ethereum".into()],
                timeframe: "30".into(),
                title: DEFAULT_CHART_TITLE.into(),
            })
        );
    }

    #[test]
    fn test_price_chart_requires_tokens() {
        for props in [json!({}), json!({ "tokens": [] }), json!({ "tokens": ["  "] })] {
            assert_eq!(
                ComponentProps::parse(ComponentKind::PriceChart, &props).unwrap_err(),
                PropsError::Missing("tokens".into())
            );
        }

        let err =
            ComponentProps::parse(ComponentKind::PriceChart, &json!({ "tokens": [1, 2] }))
                .unwrap_err();
        assert!(matches!(err, PropsError::Invalid { .. }));
    }

    #[test]
    fn test_portfolio_entries() {
        let props = ComponentProps::parse(
            ComponentKind::PortfolioTable,
            &json!({ "initialPortfolio": [
                { "asset": "bitcoin", "quantity": 0.5, "avgBuy": "42,000" },
                { "asset": "Solana", "quantity": "10", "avgBuy": 95 }
            ]}),
        )
        .unwrap();

        let ComponentProps::PortfolioTable(table) = props else {
            panic!("expected a portfolio table");
        };
        assert_eq!(table.initial_portfolio.len(), 2);
        assert_eq!(table.initial_portfolio[0].avg_buy, 42000.0);
        assert_eq!(table.initial_portfolio[1].asset, "solana");
        assert_eq!(table.initial_portfolio[1].quantity, 10.0);

        let err = ComponentProps::parse(
            ComponentKind::PortfolioTable,
            &json!({ "initialPortfolio": [{ "asset": "bitcoin", "avgBuy": 1 }] }),
        )
        .unwrap_err();
        assert_eq!(err, PropsError::Missing("initialPortfolio[0].quantity".into()));

        let empty = ComponentProps::parse(ComponentKind::PortfolioTable, &Value::Null).unwrap();
        assert_eq!(
            empty,
            ComponentProps::PortfolioTable(PortfolioTableProps {
                initial_portfolio: vec![]
            })
        );
    }

    #[test]
    fn test_risk_gauge_is_clamped() {
        let props =
            ComponentProps::parse(ComponentKind::RiskGauge, &json!({ "score": 140 })).unwrap();
        assert_eq!(
            props,
            ComponentProps::RiskGauge(RiskGaugeProps {
                score: 100.0,
                label: DEFAULT_GAUGE_LABEL.into(),
            })
        );

        let err = ComponentProps::parse(ComponentKind::RiskGauge, &json!({ "score": "high" }))
            .unwrap_err();
        assert_eq!(err.to_string(), "input 'score' should be a number");
    }

    #[test]
    fn test_what_if_defaults() {
        let props =
            ComponentProps::parse(ComponentKind::WhatIfSimulator, &json!({ "token": "ethereum", "months": 120 }))
                .unwrap();
        assert_eq!(
            props,
            ComponentProps::WhatIfSimulator(WhatIfProps {
                token: "ethereum".into(),
                amount: DEFAULT_INVESTMENT,
                months: MAX_MONTHS,
            })
        );

        let err = ComponentProps::parse(
            ComponentKind::WhatIfSimulator,
            &json!({ "token": "ethereum", "amount": 0 }),
        )
        .unwrap_err();
        assert!(matches!(err, PropsError::Invalid { .. }));
    }

    #[test]
    fn test_allocation_requires_data() {
        let err =
            ComponentProps::parse(ComponentKind::AllocationBreakdown, &json!({})).unwrap_err();
        assert_eq!(err, PropsError::Missing("data".into()));
        assert_eq!(err.to_string(), "missing required input 'data'");

        let props = ComponentProps::parse(
            ComponentKind::AllocationBreakdown,
            &json!({ "data": [], "title": "Mine" }),
        )
        .unwrap();
        assert!(matches!(
            props,
            ComponentProps::AllocationBreakdown(AllocationProps { ref title, .. }) if title == "Mine"
        ));
    }

    #[test]
    fn test_non_object_props_rejected() {
        let err = ComponentProps::parse(ComponentKind::Watchlist, &json!([1, 2])).unwrap_err();
        assert!(matches!(err, PropsError::Invalid { .. }));
        assert_eq!(
            ComponentProps::parse(ComponentKind::Watchlist, &json!({ "ignored": true })).unwrap(),
            ComponentProps::Watchlist
        );
    }
}
