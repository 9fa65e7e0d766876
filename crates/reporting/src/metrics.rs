//! Ad performance ratios and campaign roll-ups.
//!
//! Every ratio is guarded: a zero or negative denominator yields 0.0 rather
//! than NaN or infinity.

use chrono::{DateTime, NaiveDate, Utc};
use growth_core::error::{GrowthError, GrowthResult};
use growth_core::types::{AdPlatform, CampaignMetrics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn guarded(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Return on ad spend: `revenue / spend`.
pub fn roas(revenue: f64, spend: f64) -> f64 {
    guarded(revenue, spend)
}

/// `(revenue - cost) / cost * 100`.
pub fn roi_percent(revenue: f64, cost: f64) -> f64 {
    guarded(revenue - cost, cost) * 100.0
}

/// Cost per click.
pub fn cpc(spend: f64, clicks: u64) -> f64 {
    guarded(spend, clicks as f64)
}

/// Cost per thousand impressions.
pub fn cpm(spend: f64, impressions: u64) -> f64 {
    guarded(spend, impressions as f64) * 1000.0
}

/// Cost per acquisition.
pub fn cpa(spend: f64, conversions: u64) -> f64 {
    guarded(spend, conversions as f64)
}

/// Click-through rate as a percentage.
pub fn ctr(clicks: u64, impressions: u64) -> f64 {
    guarded(clicks as f64, impressions as f64) * 100.0
}

/// Conversions per click as a percentage.
pub fn conversion_rate(conversions: u64, clicks: u64) -> f64 {
    guarded(conversions as f64, clicks as f64) * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub roas: f64,
    pub roi_percent: f64,
    pub cpc: f64,
    pub cpm: f64,
    pub cpa: f64,
    /// Percentage.
    pub ctr: f64,
    /// Percentage.
    pub conversion_rate: f64,
}

impl PerformanceMetrics {
    pub fn compute(
        spend: f64,
        revenue: f64,
        impressions: u64,
        clicks: u64,
        conversions: u64,
    ) -> Self {
        Self {
            roas: roas(revenue, spend),
            roi_percent: roi_percent(revenue, spend),
            cpc: cpc(spend, clicks),
            cpm: cpm(spend, impressions),
            cpa: cpa(spend, conversions),
            ctr: ctr(clicks, impressions),
            conversion_rate: conversion_rate(conversions, clicks),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignPerformance {
    #[serde(flatten)]
    pub campaign: CampaignMetrics,
    #[serde(flatten)]
    pub performance: PerformanceMetrics,
    pub calculated_at: DateTime<Utc>,
}

pub fn campaign_performance(campaign: &CampaignMetrics) -> CampaignPerformance {
    CampaignPerformance {
        performance: PerformanceMetrics::compute(
            campaign.ad_spend,
            campaign.revenue,
            campaign.impressions,
            campaign.clicks,
            campaign.conversions,
        ),
        campaign: campaign.clone(),
        calculated_at: Utc::now(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformPerformance {
    pub campaigns: usize,
    pub ad_spend: f64,
    pub revenue: f64,
    #[serde(flatten)]
    pub performance: PerformanceMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedPerformance {
    pub total_campaigns: usize,
    pub total_ad_spend: f64,
    pub total_revenue: f64,
    pub total_impressions: u64,
    pub total_clicks: u64,
    pub total_conversions: u64,
    /// Ratios over the summed totals, not averages of per-campaign ratios.
    pub blended: PerformanceMetrics,
    pub by_platform: BTreeMap<AdPlatform, PlatformPerformance>,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub calculated_at: DateTime<Utc>,
}

#[derive(Default)]
struct Totals {
    campaigns: usize,
    spend: f64,
    revenue: f64,
    impressions: u64,
    clicks: u64,
    conversions: u64,
}

impl Totals {
    fn add(&mut self, c: &CampaignMetrics) {
        self.campaigns += 1;
        self.spend += c.ad_spend;
        self.revenue += c.revenue;
        self.impressions += c.impressions;
        self.clicks += c.clicks;
        self.conversions += c.conversions;
    }

    fn metrics(&self) -> PerformanceMetrics {
        PerformanceMetrics::compute(
            self.spend,
            self.revenue,
            self.impressions,
            self.clicks,
            self.conversions,
        )
    }
}

/// Roll up many campaigns into blended totals with a per-platform breakdown.
pub fn aggregate_performance(campaigns: &[CampaignMetrics]) -> GrowthResult<AggregatedPerformance> {
    let (first, rest) = campaigns
        .split_first()
        .ok_or_else(|| GrowthError::EmptyInput("cannot aggregate an empty campaign list".into()))?;

    let mut totals = Totals::default();
    let mut platforms: BTreeMap<AdPlatform, Totals> = BTreeMap::new();
    let mut date_start = first.date_start.min(first.date_end);
    let mut date_end = first.date_start.max(first.date_end);

    for campaign in std::iter::once(first).chain(rest) {
        totals.add(campaign);
        platforms.entry(campaign.platform).or_default().add(campaign);
        date_start = date_start.min(campaign.date_start).min(campaign.date_end);
        date_end = date_end.max(campaign.date_start).max(campaign.date_end);
    }

    let by_platform = platforms
        .into_iter()
        .map(|(platform, t)| {
            (
                platform,
                PlatformPerformance {
                    campaigns: t.campaigns,
                    ad_spend: t.spend,
                    revenue: t.revenue,
                    performance: t.metrics(),
                },
            )
        })
        .collect();

    Ok(AggregatedPerformance {
        total_campaigns: totals.campaigns,
        total_ad_spend: totals.spend,
        total_revenue: totals.revenue,
        total_impressions: totals.impressions,
        total_clicks: totals.clicks,
        total_conversions: totals.conversions,
        blended: totals.metrics(),
        by_platform,
        date_start,
        date_end,
        calculated_at: Utc::now(),
    })
}
