//! Multi-touch revenue attribution — splits a conversion's value across the
//! campaigns that touched the customer before it.

use growth_core::config::AttributionConfig;
use growth_core::error::GrowthError;
use growth_core::types::{Journey, Touchpoint};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::metrics;

/// Share of the total given to each endpoint under position-based attribution.
const POSITION_ENDPOINT_SHARE: f64 = 0.4;
/// Share split evenly across the middle touchpoints.
const POSITION_MIDDLE_SHARE: f64 = 0.2;
/// Half-life used when none (or an unusable one) is configured.
const DEFAULT_HALF_LIFE_DAYS: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionModel {
    LastClick,
    FirstClick,
    Linear,
    TimeDecay,
    PositionBased,
}

impl AttributionModel {
    pub const ALL: [AttributionModel; 5] = [
        AttributionModel::LastClick,
        AttributionModel::FirstClick,
        AttributionModel::Linear,
        AttributionModel::TimeDecay,
        AttributionModel::PositionBased,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributionModel::LastClick => "last_click",
            AttributionModel::FirstClick => "first_click",
            AttributionModel::Linear => "linear",
            AttributionModel::TimeDecay => "time_decay",
            AttributionModel::PositionBased => "position_based",
        }
    }

    /// Lenient parser for untyped callers (query strings, config values).
    /// Anything unrecognised is treated as last click.
    pub fn from_query(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            warn!(model = raw, "Unknown attribution model, falling back to last_click");
            AttributionModel::LastClick
        })
    }
}

impl FromStr for AttributionModel {
    type Err = GrowthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                other => other.to_ascii_lowercase(),
            })
            .collect();

        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| GrowthError::UnknownModel(s.to_string()))
    }
}

impl std::fmt::Display for AttributionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credit assigned to one campaign for one conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditAllocation {
    pub campaign_id: String,
    pub credit: f64,
    pub credit_percentage: f64,
}

/// Per-campaign totals across many journeys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignAttribution {
    pub campaign_id: String,
    pub model: AttributionModel,
    pub attributed_revenue: f64,
    /// Sum of fractional conversion shares.
    pub attributed_conversions: f64,
    pub touchpoints: u64,
    pub spend: f64,
    /// `attributed_revenue / spend` (0.0 when spend is zero).
    pub roas: f64,
}

/// Stateless credit allocator. Safe to share across threads.
#[derive(Debug, Clone)]
pub struct AttributionEngine {
    half_life_days: f64,
}

impl Default for AttributionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_HALF_LIFE_DAYS)
    }
}

impl AttributionEngine {
    /// A half-life that is zero, negative or not finite would turn the decay
    /// weights into NaN or invert them, so it is replaced by the default.
    pub fn new(half_life_days: f64) -> Self {
        if half_life_days.is_finite() && half_life_days > 0.0 {
            return Self { half_life_days };
        }
        warn!(
            half_life_days,
            fallback = DEFAULT_HALF_LIFE_DAYS,
            "Invalid time-decay half-life, using default"
        );
        Self {
            half_life_days: DEFAULT_HALF_LIFE_DAYS,
        }
    }

    pub fn from_config(config: &AttributionConfig) -> Self {
        Self::new(config.half_life_days)
    }

    pub fn half_life_days(&self) -> f64 {
        self.half_life_days
    }

    /// Split `conversion_value` across the campaigns in `touchpoints`.
    ///
    /// Touchpoints are taken in the order given. Campaigns appearing more
    /// than once get the sum of their shares. Empty input yields an empty map.
    pub fn allocate(
        &self,
        touchpoints: &[Touchpoint],
        conversion_value: f64,
        model: AttributionModel,
    ) -> HashMap<String, CreditAllocation> {
        let shares = self.shares(touchpoints, model);

        let mut allocations: HashMap<String, CreditAllocation> = HashMap::new();
        for (touchpoint, share) in touchpoints.iter().zip(shares) {
            if share == 0.0 {
                continue;
            }
            let entry = allocations
                .entry(touchpoint.campaign_id.clone())
                .or_insert_with(|| CreditAllocation {
                    campaign_id: touchpoint.campaign_id.clone(),
                    credit: 0.0,
                    credit_percentage: 0.0,
                });
            entry.credit += share * conversion_value;
            entry.credit_percentage += share * 100.0;
        }
        allocations
    }

    /// Fraction of the conversion owed to each touchpoint, index-aligned with
    /// the input. Fractions sum to 1 for non-empty input.
    fn shares(&self, touchpoints: &[Touchpoint], model: AttributionModel) -> Vec<f64> {
        let count = touchpoints.len();
        if count == 0 {
            return Vec::new();
        }

        match model {
            AttributionModel::LastClick => (0..count)
                .map(|i| if i == count - 1 { 1.0 } else { 0.0 })
                .collect(),
            AttributionModel::FirstClick => (0..count)
                .map(|i| if i == 0 { 1.0 } else { 0.0 })
                .collect(),
            AttributionModel::Linear => vec![1.0 / count as f64; count],
            AttributionModel::TimeDecay => self.time_decay_shares(count),
            AttributionModel::PositionBased => position_based_shares(count),
        }
    }

    // Decay is by rank distance from the conversion, not by timestamp.
    fn time_decay_shares(&self, count: usize) -> Vec<f64> {
        let weights: Vec<f64> = (0..count)
            .map(|i| 0.5_f64.powf((count - i - 1) as f64 / self.half_life_days))
            .collect();
        let total: f64 = weights.iter().sum();
        weights.into_iter().map(|w| w / total).collect()
    }

    /// Run `allocate` over every journey and roll the results up per campaign.
    pub fn aggregate_by_campaign(
        &self,
        journeys: &[Journey],
        model: AttributionModel,
    ) -> Vec<CampaignAttribution> {
        let mut by_campaign: HashMap<String, CampaignAttribution> = HashMap::new();

        for journey in journeys {
            if journey.touchpoints.is_empty() {
                debug!(journey_id = %journey.journey_id, "Skipping journey without touchpoints");
                continue;
            }

            for touchpoint in &journey.touchpoints {
                let entry = by_campaign
                    .entry(touchpoint.campaign_id.clone())
                    .or_insert_with(|| empty_attribution(&touchpoint.campaign_id, model));
                entry.touchpoints += 1;
                entry.spend += touchpoint.ad_spend;
            }

            for (campaign_id, allocation) in
                self.allocate(&journey.touchpoints, journey.conversion_value, model)
            {
                let entry = by_campaign
                    .entry(campaign_id)
                    .or_insert_with(|| empty_attribution(&allocation.campaign_id, model));
                entry.attributed_revenue += allocation.credit;
                entry.attributed_conversions += allocation.credit_percentage / 100.0;
            }
        }

        let mut results: Vec<CampaignAttribution> = by_campaign
            .into_values()
            .map(|mut a| {
                a.roas = metrics::roas(a.attributed_revenue, a.spend);
                a
            })
            .collect();

        results.sort_by(|a, b| {
            b.roas
                .total_cmp(&a.roas)
                .then_with(|| a.campaign_id.cmp(&b.campaign_id))
        });

        debug!(
            journeys = journeys.len(),
            campaigns = results.len(),
            model = %model,
            "Aggregated attribution"
        );
        results
    }
}

/// 40% to each endpoint, 20% across the middle. Two touchpoints have no
/// middle, so they split evenly to keep the total whole.
fn position_based_shares(count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![1.0],
        2 => vec![0.5, 0.5],
        _ => {
            let middle = POSITION_MIDDLE_SHARE / (count - 2) as f64;
            (0..count)
                .map(|i| {
                    if i == 0 || i == count - 1 {
                        POSITION_ENDPOINT_SHARE
                    } else {
                        middle
                    }
                })
                .collect()
        }
    }
}

fn empty_attribution(campaign_id: &str, model: AttributionModel) -> CampaignAttribution {
    CampaignAttribution {
        campaign_id: campaign_id.to_string(),
        model,
        attributed_revenue: 0.0,
        attributed_conversions: 0.0,
        touchpoints: 0,
        spend: 0.0,
        roas: 0.0,
    }
}
