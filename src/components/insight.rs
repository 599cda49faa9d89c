//! Insight views: risk gauge and allocation breakdown

use serde::Serialize;

use super::format::format_usd;
use super::props::{AllocationProps, RiskGaugeProps};
use super::{RenderedComponent, UNAVAILABLE_TITLE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Gauge bands: Low up to 35, Medium up to 70
    pub fn for_gauge(score: f64) -> Self {
        if score <= 35.0 {
            RiskLevel::Low
        } else if score <= 70.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    /// Simulator bands: Low below 30, High from 70
    pub fn for_simulation(score: f64) -> Self {
        if score < 30.0 {
            RiskLevel::Low
        } else if score < 70.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskGaugeView {
    pub label: String,
    pub score: f64,
    pub level: RiskLevel,
    /// Degrees from vertical, -90 (left) to 90 (right)
    pub needle_angle: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationSlice {
    pub asset: String,
    pub value: f64,
    pub percent: f64,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationView {
    pub title: String,
    pub total: f64,
    pub total_display: String,
    pub slices: Vec<AllocationSlice>,
}

pub(super) fn render_risk_gauge(props: RiskGaugeProps) -> RenderedComponent {
    let score = props.score.clamp(0.0, 100.0);
    RenderedComponent::RiskGauge(RiskGaugeView {
        label: props.label,
        score,
        level: RiskLevel::for_gauge(score),
        needle_angle: score / 100.0 * 180.0 - 90.0,
    })
}

pub(super) fn render_allocation(props: AllocationProps) -> RenderedComponent {
    if props.data.is_empty() {
        return RenderedComponent::unavailable(UNAVAILABLE_TITLE, "No allocation data provided.");
    }

    let total: f64 = props.data.iter().map(|entry| entry.value).sum();
    let slices = props
        .data
        .into_iter()
        .map(|entry| {
            let percent = if total > 0.0 {
                entry.value / total * 100.0
            } else {
                0.0
            };
            AllocationSlice {
                display: format!("{} ({:.1}%)", format_usd(entry.value, 3), percent),
                asset: entry.asset,
                value: entry.value,
                percent,
            }
        })
        .collect();

    RenderedComponent::AllocationBreakdown(AllocationView {
        title: props.title,
        total,
        total_display: format_usd(total, 3),
        slices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::props::AllocationEntry;

    fn gauge(score: f64) -> RiskGaugeView {
        match render_risk_gauge(RiskGaugeProps {
            score,
            label: "Risk Analysis".into(),
        }) {
            RenderedComponent::RiskGauge(view) => view,
            other => panic!("expected a gauge, got {:?}", other),
        }
    }

    #[test]
    fn test_gauge_bands_and_needle() {
        assert_eq!(gauge(0.0).needle_angle, -90.0);
        assert_eq!(gauge(50.0).needle_angle, 0.0);
        assert_eq!(gauge(100.0).needle_angle, 90.0);

        assert_eq!(gauge(35.0).level, RiskLevel::Low);
        assert_eq!(gauge(35.5).level, RiskLevel::Medium);
        assert_eq!(gauge(70.0).level, RiskLevel::Medium);
        assert_eq!(gauge(70.1).level, RiskLevel::High);
    }

    #[test]
    fn test_simulation_bands() {
        assert_eq!(RiskLevel::for_simulation(29.9), RiskLevel::Low);
        assert_eq!(RiskLevel::for_simulation(30.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::for_simulation(70.0), RiskLevel::High);
    }

    #[test]
    fn test_allocation_percentages() {
        let rendered = render_allocation(AllocationProps {
            title: "Allocation Breakdown".into(),
            data: vec![
                AllocationEntry {
                    asset: "BTC".into(),
                    value: 7500.0,
                },
                AllocationEntry {
                    asset: "ETH".into(),
                    value: 2500.0,
                },
            ],
        });
        let RenderedComponent::AllocationBreakdown(view) = rendered else {
            panic!("expected a breakdown");
        };

        assert_eq!(view.total, 10000.0);
        assert_eq!(view.total_display, "$10,000");
        assert_eq!(view.slices[0].percent, 75.0);
        assert_eq!(view.slices[1].display, "$2,500 (25.0%)");
    }

    #[test]
    fn test_allocation_fallback() {
        let rendered = render_allocation(AllocationProps {
            title: "Allocation Breakdown".into(),
            data: vec![],
        });
        assert_eq!(
            rendered,
            RenderedComponent::unavailable(UNAVAILABLE_TITLE, "No allocation data provided.")
        );
    }
}
