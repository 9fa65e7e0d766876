//! Budget tracking and spend pacing for ad campaigns.

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use growth_core::config::PacingConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A campaign's budget window and what has been consumed so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub campaign_id: String,
    pub total_budget: f64,
    pub daily_budget: f64,
    pub spent_total: f64,
    pub spent_today: f64,
    pub remaining: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Calendar day `spent_today` refers to.
    pub spend_day: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

/// Whether a campaign is spending at the expected rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingStatus {
    OnTrack,
    Underspending,
    Overspending,
    Exhausted,
    NotStarted,
}

/// One spend event against a campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendRecord {
    pub campaign_id: String,
    pub amount: f64,
    pub platform: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetAlert {
    pub id: Uuid,
    pub campaign_id: String,
    pub alert_type: BudgetAlertType,
    pub threshold_percent: f64,
    pub current_percent: f64,
    pub message: String,
    pub triggered_at: DateTime<Utc>,
    pub acknowledged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetAlertType {
    /// Total spend crossed the nearing-limit threshold.
    NearingLimit,
    /// Spend for the current day exceeds the daily budget.
    OverDailyBudget,
    /// Total spend reached the total budget.
    BudgetExhausted,
}

/// Pure pacing rule: compare the fraction of budget spent with the fraction
/// of the flight elapsed at `now`.
pub fn pacing_status(
    alloc: &BudgetAllocation,
    now: DateTime<Utc>,
    config: &PacingConfig,
) -> PacingStatus {
    if now < alloc.start_date {
        return PacingStatus::NotStarted;
    }
    if alloc.spent_total >= alloc.total_budget {
        return PacingStatus::Exhausted;
    }

    let flight_secs = (alloc.end_date - alloc.start_date).num_seconds().max(1) as f64;
    let elapsed_secs = (now - alloc.start_date).num_seconds().max(0) as f64;
    let elapsed_fraction = (elapsed_secs / flight_secs).min(1.0);

    let spend_fraction = if alloc.total_budget > 0.0 {
        alloc.spent_total / alloc.total_budget
    } else {
        0.0
    };

    if spend_fraction > elapsed_fraction * config.overspend_tolerance {
        PacingStatus::Overspending
    } else if spend_fraction < elapsed_fraction * config.underspend_tolerance {
        PacingStatus::Underspending
    } else {
        PacingStatus::OnTrack
    }
}

// ---------------------------------------------------------------------------
// BudgetTracker
// ---------------------------------------------------------------------------

/// Concurrent budget tracker keyed by campaign id.
pub struct BudgetTracker {
    config: PacingConfig,
    allocations: DashMap<String, BudgetAllocation>,
    spend_records: DashMap<String, Vec<SpendRecord>>,
    alerts: DashMap<String, Vec<BudgetAlert>>,
}

impl BudgetTracker {
    pub fn new(config: PacingConfig) -> Self {
        Self {
            config,
            allocations: DashMap::new(),
            spend_records: DashMap::new(),
            alerts: DashMap::new(),
        }
    }

    /// Create or replace the budget for a campaign. Prior spend and alerts
    /// are discarded.
    pub fn set_budget(
        &self,
        campaign_id: &str,
        total: f64,
        daily: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) {
        let allocation = BudgetAllocation {
            campaign_id: campaign_id.to_string(),
            total_budget: total,
            daily_budget: daily,
            spent_total: 0.0,
            spent_today: 0.0,
            remaining: total,
            start_date: start,
            end_date: end,
            spend_day: None,
            updated_at: Utc::now(),
        };
        self.allocations.insert(campaign_id.to_string(), allocation);
        self.spend_records.remove(campaign_id);
        self.alerts.remove(campaign_id);
        info!(campaign_id, total, daily, "Budget set");
    }

    /// Record spend at the current time.
    pub fn record_spend(&self, campaign_id: &str, amount: f64, platform: &str) {
        self.record_spend_at(campaign_id, amount, platform, Utc::now());
    }

    /// Record spend at an explicit time and raise any threshold alerts.
    /// Spend for a campaign without a budget is kept but triggers nothing.
    pub fn record_spend_at(
        &self,
        campaign_id: &str,
        amount: f64,
        platform: &str,
        at: DateTime<Utc>,
    ) {
        self.spend_records
            .entry(campaign_id.to_string())
            .or_default()
            .push(SpendRecord {
                campaign_id: campaign_id.to_string(),
                amount,
                platform: platform.to_string(),
                timestamp: at,
            });

        let Some(mut alloc) = self.allocations.get_mut(campaign_id) else {
            debug!(campaign_id, "Spend recorded for campaign without budget");
            return;
        };

        // Late events from an earlier day count toward the total only.
        let day = at.date_naive();
        let current_day = match alloc.spend_day {
            Some(current) if day < current => false,
            Some(current) if day == current => true,
            _ => {
                alloc.spend_day = Some(day);
                alloc.spent_today = 0.0;
                true
            }
        };
        alloc.spent_total += amount;
        if current_day {
            alloc.spent_today += amount;
        }
        alloc.remaining = alloc.total_budget - alloc.spent_total;
        alloc.updated_at = at;

        let spend_pct = if alloc.total_budget > 0.0 {
            alloc.spent_total / alloc.total_budget * 100.0
        } else {
            0.0
        };

        let mut raised = Vec::new();
        if alloc.spent_total >= alloc.total_budget {
            raised.push((
                BudgetAlertType::BudgetExhausted,
                100.0,
                spend_pct,
                format!("Campaign {campaign_id} budget exhausted ({spend_pct:.1}% spent)"),
            ));
        } else if spend_pct >= self.config.nearing_limit_percent {
            raised.push((
                BudgetAlertType::NearingLimit,
                self.config.nearing_limit_percent,
                spend_pct,
                format!("Campaign {campaign_id} nearing budget limit ({spend_pct:.1}% spent)"),
            ));
        }

        if current_day && alloc.spent_today > alloc.daily_budget {
            let daily_pct = if alloc.daily_budget > 0.0 {
                alloc.spent_today / alloc.daily_budget * 100.0
            } else {
                0.0
            };
            raised.push((
                BudgetAlertType::OverDailyBudget,
                100.0,
                daily_pct,
                format!("Campaign {campaign_id} exceeded daily budget ({daily_pct:.1}% of daily)"),
            ));
        }
        drop(alloc);

        for (alert_type, threshold, current, message) in raised {
            self.push_alert(campaign_id, alert_type, threshold, current, message, at);
        }
    }

    pub fn allocation(&self, campaign_id: &str) -> Option<BudgetAllocation> {
        self.allocations.get(campaign_id).map(|r| r.clone())
    }

    pub fn campaign_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.allocations.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn pacing_at(&self, campaign_id: &str, now: DateTime<Utc>) -> Option<PacingStatus> {
        let alloc = self.allocations.get(campaign_id)?;
        Some(pacing_status(&alloc, now, &self.config))
    }

    pub fn pacing(&self, campaign_id: &str) -> Option<PacingStatus> {
        self.pacing_at(campaign_id, Utc::now())
    }

    pub fn alerts(&self, campaign_id: &str) -> Vec<BudgetAlert> {
        self.alerts
            .get(campaign_id)
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Mark an alert as seen. Returns `true` if found.
    pub fn acknowledge_alert(&self, alert_id: &Uuid) -> bool {
        for mut entry in self.alerts.iter_mut() {
            if let Some(alert) = entry.value_mut().iter_mut().find(|a| a.id == *alert_id) {
                alert.acknowledged = true;
                return true;
            }
        }
        false
    }

    /// Spend per platform, ordered by platform name.
    pub fn platform_breakdown(&self, campaign_id: &str) -> Vec<(String, f64)> {
        let Some(records) = self.spend_records.get(campaign_id) else {
            return Vec::new();
        };

        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        for rec in records.iter() {
            *totals.entry(rec.platform.clone()).or_insert(0.0) += rec.amount;
        }
        totals.into_iter().collect()
    }

    fn push_alert(
        &self,
        campaign_id: &str,
        alert_type: BudgetAlertType,
        threshold_percent: f64,
        current_percent: f64,
        message: String,
        at: DateTime<Utc>,
    ) {
        info!(campaign_id, ?alert_type, current_percent, "Budget alert raised");
        self.alerts
            .entry(campaign_id.to_string())
            .or_default()
            .push(BudgetAlert {
                id: Uuid::new_v4(),
                campaign_id: campaign_id.to_string(),
                alert_type,
                threshold_percent,
                current_percent,
                message,
                triggered_at: at,
                acknowledged: false,
            });
    }
}

impl Default for BudgetTracker {
    fn default() -> Self {
        Self::new(PacingConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 10, 12, 0, 0).unwrap()
    }

    /// 10-day flight with `elapsed` days gone at `now()`.
    fn tracker_with_flight(elapsed: i64) -> BudgetTracker {
        let tracker = BudgetTracker::default();
        let start = now() - Duration::days(elapsed);
        let end = start + Duration::days(10);
        tracker.set_budget("camp-1", 10_000.0, 1_000.0, start, end);
        tracker
    }

    #[test]
    fn test_record_spend_updates_totals() {
        let tracker = tracker_with_flight(5);
        tracker.record_spend_at("camp-1", 150.0, "meta", now());
        tracker.record_spend_at("camp-1", 50.0, "google", now());

        let alloc = tracker.allocation("camp-1").unwrap();
        assert!((alloc.spent_total - 200.0).abs() < f64::EPSILON);
        assert!((alloc.remaining - 9_800.0).abs() < f64::EPSILON);
        assert!(tracker.alerts("camp-1").is_empty());
    }

    #[test]
    fn test_daily_spend_resets_on_new_day() {
        let tracker = tracker_with_flight(5);
        tracker.record_spend_at("camp-1", 800.0, "meta", now() - Duration::days(1));
        tracker.record_spend_at("camp-1", 300.0, "meta", now());

        let alloc = tracker.allocation("camp-1").unwrap();
        assert!((alloc.spent_today - 300.0).abs() < f64::EPSILON);
        assert!(!tracker
            .alerts("camp-1")
            .iter()
            .any(|a| a.alert_type == BudgetAlertType::OverDailyBudget));
    }

    #[test]
    fn test_late_spend_keeps_current_day() {
        let tracker = tracker_with_flight(5);
        tracker.record_spend_at("camp-1", 300.0, "meta", now());
        tracker.record_spend_at("camp-1", 900.0, "meta", now() - Duration::days(1));

        let alloc = tracker.allocation("camp-1").unwrap();
        assert_eq!(alloc.spend_day, Some(now().date_naive()));
        assert!((alloc.spent_today - 300.0).abs() < f64::EPSILON);
        assert!((alloc.spent_total - 1_200.0).abs() < f64::EPSILON);
        assert!(tracker.alerts("camp-1").is_empty());
    }

    #[test]
    fn test_set_budget_clears_previous_alerts() {
        let tracker = tracker_with_flight(5);
        tracker.record_spend_at("camp-1", 8_500.0, "meta", now());
        assert!(!tracker.alerts("camp-1").is_empty());

        let start = now() - Duration::days(1);
        tracker.set_budget("camp-1", 20_000.0, 2_000.0, start, start + Duration::days(10));
        assert!(tracker.alerts("camp-1").is_empty());
        assert!(tracker.platform_breakdown("camp-1").is_empty());
        assert_eq!(tracker.allocation("camp-1").unwrap().spent_total, 0.0);
    }

    #[test]
    fn test_alert_nearing_limit() {
        let tracker = tracker_with_flight(5);
        tracker.record_spend_at("camp-1", 8_000.0, "meta", now());
        assert!(tracker
            .alerts("camp-1")
            .iter()
            .any(|a| a.alert_type == BudgetAlertType::NearingLimit));
    }

    #[test]
    fn test_alert_budget_exhausted() {
        let tracker = tracker_with_flight(5);
        tracker.record_spend_at("camp-1", 10_000.0, "meta", now());
        let alerts = tracker.alerts("camp-1");
        assert!(alerts
            .iter()
            .any(|a| a.alert_type == BudgetAlertType::BudgetExhausted));
        assert!(!alerts
            .iter()
            .any(|a| a.alert_type == BudgetAlertType::NearingLimit));
        assert_eq!(tracker.pacing_at("camp-1", now()), Some(PacingStatus::Exhausted));
    }

    #[test]
    fn test_alert_over_daily_budget() {
        let tracker = tracker_with_flight(5);
        tracker.record_spend_at("camp-1", 1_200.0, "google", now());
        assert!(tracker
            .alerts("camp-1")
            .iter()
            .any(|a| a.alert_type == BudgetAlertType::OverDailyBudget));
    }

    #[test]
    fn test_acknowledge_alert() {
        let tracker = tracker_with_flight(5);
        tracker.record_spend_at("camp-1", 8_000.0, "meta", now());
        let alert_id = tracker.alerts("camp-1")[0].id;

        assert!(tracker.acknowledge_alert(&alert_id));
        assert!(tracker
            .alerts("camp-1")
            .iter()
            .any(|a| a.id == alert_id && a.acknowledged));
        assert!(!tracker.acknowledge_alert(&Uuid::new_v4()));
    }

    #[test]
    fn test_pacing_on_track() {
        let tracker = tracker_with_flight(5);
        tracker.record_spend_at("camp-1", 5_000.0, "meta", now());
        assert_eq!(tracker.pacing_at("camp-1", now()), Some(PacingStatus::OnTrack));
    }

    #[test]
    fn test_pacing_overspending() {
        let tracker = tracker_with_flight(2);
        tracker.record_spend_at("camp-1", 5_000.0, "meta", now());
        assert_eq!(tracker.pacing_at("camp-1", now()), Some(PacingStatus::Overspending));
    }

    #[test]
    fn test_pacing_underspending() {
        let tracker = tracker_with_flight(8);
        tracker.record_spend_at("camp-1", 1_000.0, "meta", now());
        assert_eq!(tracker.pacing_at("camp-1", now()), Some(PacingStatus::Underspending));
    }

    #[test]
    fn test_pacing_not_started_and_unknown() {
        let tracker = tracker_with_flight(-3);
        assert_eq!(tracker.pacing_at("camp-1", now()), Some(PacingStatus::NotStarted));
        assert_eq!(tracker.pacing_at("missing", now()), None);
    }

    #[test]
    fn test_tolerances_come_from_config() {
        let strict = PacingConfig {
            overspend_tolerance: 1.0,
            underspend_tolerance: 1.0,
            nearing_limit_percent: 80.0,
        };
        let tracker = BudgetTracker::new(strict);
        let start = now() - Duration::days(5);
        tracker.set_budget("camp-1", 10_000.0, 1_000.0, start, start + Duration::days(10));
        tracker.record_spend_at("camp-1", 5_200.0, "meta", now());
        assert_eq!(tracker.pacing_at("camp-1", now()), Some(PacingStatus::Overspending));
    }

    #[test]
    fn test_platform_breakdown() {
        let tracker = tracker_with_flight(5);
        tracker.record_spend_at("camp-1", 100.0, "meta", now());
        tracker.record_spend_at("camp-1", 200.0, "tiktok", now());
        tracker.record_spend_at("camp-1", 50.0, "meta", now());
        tracker.record_spend_at("camp-1", 300.0, "google", now());

        let breakdown = tracker.platform_breakdown("camp-1");
        assert_eq!(breakdown.len(), 3);
        assert_eq!(breakdown[0].0, "google");
        assert!((breakdown[0].1 - 300.0).abs() < f64::EPSILON);
        assert_eq!(breakdown[1].0, "meta");
        assert!((breakdown[1].1 - 150.0).abs() < f64::EPSILON);
        assert_eq!(breakdown[2].0, "tiktok");
        assert!(tracker.platform_breakdown("missing").is_empty());
    }

    #[test]
    fn test_spend_without_budget_raises_nothing() {
        let tracker = BudgetTracker::default();
        tracker.record_spend_at("orphan", 500.0, "meta", now());
        assert!(tracker.alerts("orphan").is_empty());
        assert_eq!(tracker.platform_breakdown("orphan").len(), 1);
        assert!(tracker.campaign_ids().is_empty());
    }
}
