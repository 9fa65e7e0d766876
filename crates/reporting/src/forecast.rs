//! Simple moving-average forecasting and period-over-period trends.

use serde::{Deserialize, Serialize};

/// Trailing simple moving average. Series shorter than the window (or a zero
/// window) are returned unchanged.
pub fn moving_average(data: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || data.len() < window {
        return data.to_vec();
    }
    data.windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

/// Project `horizon` future points. Each point is the mean of the previous
/// `window` values, forecasts included once they exist.
pub fn forecast(data: &[f64], window: usize, horizon: usize) -> Vec<f64> {
    if data.is_empty() || horizon == 0 {
        return Vec::new();
    }
    let window = window.clamp(1, data.len());

    let mut series = data.to_vec();
    let mut projected = Vec::with_capacity(horizon);
    for _ in 0..horizon {
        let tail = &series[series.len() - window..];
        let next = tail.iter().sum::<f64>() / window as f64;
        projected.push(next);
        series.push(next);
    }
    projected
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub direction: TrendDirection,
    pub percentage: f64,
    pub significance: Significance,
}

pub fn trend(current: f64, previous: f64) -> Trend {
    if previous == 0.0 {
        return Trend {
            direction: if current > 0.0 {
                TrendDirection::Increasing
            } else {
                TrendDirection::Stable
            },
            percentage: 0.0,
            significance: Significance::Low,
        };
    }

    let percentage = (current - previous) / previous * 100.0;
    let direction = if percentage > 5.0 {
        TrendDirection::Increasing
    } else if percentage < -5.0 {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };
    let significance = match percentage.abs() {
        p if p > 20.0 => Significance::High,
        p if p > 10.0 => Significance::Medium,
        _ => Significance::Low,
    };

    Trend {
        direction,
        percentage,
        significance,
    }
}
