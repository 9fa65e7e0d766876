//! Budget optimization — turns campaign performance into pause / scale-up /
//! scale-down recommendations. Nothing here executes an action; every
//! recommendation is flagged for human approval.

use growth_core::config::OptimizationConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metrics::CampaignPerformance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    PauseCampaign,
    IncreaseBudget,
    DecreaseBudget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationAction {
    pub kind: ActionKind,
    pub campaign_id: String,
    pub campaign_name: String,
    pub reason: String,
    pub severity: Severity,
    pub current_spend: f64,
    /// New budget for budget changes; `None` for pauses.
    pub proposed_budget: Option<f64>,
    pub roas: f64,
    /// CTR percentage.
    pub ctr: f64,
    pub requires_approval: bool,
}

/// Produces recommendations from a fixed set of thresholds.
#[derive(Debug, Clone)]
pub struct BudgetOptimizer {
    thresholds: OptimizationConfig,
}

impl Default for BudgetOptimizer {
    fn default() -> Self {
        Self::new(OptimizationConfig::default())
    }
}

impl BudgetOptimizer {
    pub fn new(thresholds: OptimizationConfig) -> Self {
        Self { thresholds }
    }

    fn has_enough_spend(&self, c: &CampaignPerformance) -> bool {
        c.campaign.ad_spend >= self.thresholds.min_spend_for_action
    }

    pub fn pause_candidates(&self, campaigns: &[CampaignPerformance]) -> Vec<OptimizationAction> {
        let t = &self.thresholds;
        campaigns
            .iter()
            .filter(|c| self.has_enough_spend(c))
            .filter_map(|c| {
                let ctr = c.performance.ctr;
                let roas = c.performance.roas;
                let low_ctr = ctr < t.pause_low_ctr;
                let low_roas = roas < t.pause_low_roas;

                let (reason, severity) = match (low_ctr, low_roas) {
                    (true, true) => (
                        format!("Low CTR ({ctr:.2}%) and poor ROAS ({roas:.2}x)"),
                        Severity::High,
                    ),
                    (true, false) => (
                        format!("Low CTR ({ctr:.2}%) - below {}% threshold", t.pause_low_ctr),
                        Severity::Medium,
                    ),
                    (false, true) => (
                        format!("Poor ROAS ({roas:.2}x) - below {}x threshold", t.pause_low_roas),
                        Severity::High,
                    ),
                    (false, false) => return None,
                };

                Some(action(c, ActionKind::PauseCampaign, reason, severity, None))
            })
            .collect()
    }

    pub fn budget_increase_candidates(
        &self,
        campaigns: &[CampaignPerformance],
    ) -> Vec<OptimizationAction> {
        let t = &self.thresholds;
        campaigns
            .iter()
            .filter(|c| self.has_enough_spend(c) && c.performance.roas >= t.increase_budget_roas)
            .map(|c| {
                let proposed = c.campaign.ad_spend * (1.0 + t.increase_step);
                let reason = format!(
                    "High ROAS ({:.2}x) - scale up winning campaign",
                    c.performance.roas
                );
                action(c, ActionKind::IncreaseBudget, reason, Severity::Low, Some(proposed))
            })
            .collect()
    }

    pub fn budget_decrease_candidates(
        &self,
        campaigns: &[CampaignPerformance],
    ) -> Vec<OptimizationAction> {
        let t = &self.thresholds;
        campaigns
            .iter()
            .filter(|c| {
                let roas = c.performance.roas;
                self.has_enough_spend(c)
                    && roas < t.decrease_budget_roas
                    && roas >= t.pause_low_roas
            })
            .map(|c| {
                let proposed = c.campaign.ad_spend * (1.0 - t.decrease_step);
                let reason = format!(
                    "Below-target ROAS ({:.2}x) - reduce spend to cut losses",
                    c.performance.roas
                );
                action(c, ActionKind::DecreaseBudget, reason, Severity::Medium, Some(proposed))
            })
            .collect()
    }

    /// All recommendations, most severe first.
    pub fn recommend(&self, campaigns: &[CampaignPerformance]) -> Vec<OptimizationAction> {
        let mut actions = self.pause_candidates(campaigns);
        actions.extend(self.budget_increase_candidates(campaigns));
        actions.extend(self.budget_decrease_candidates(campaigns));
        actions.sort_by_key(|a| a.severity);

        debug!(
            campaigns = campaigns.len(),
            actions = actions.len(),
            "Generated optimization recommendations"
        );
        actions
    }
}

fn action(
    c: &CampaignPerformance,
    kind: ActionKind,
    reason: String,
    severity: Severity,
    proposed_budget: Option<f64>,
) -> OptimizationAction {
    OptimizationAction {
        kind,
        campaign_id: c.campaign.campaign_id.clone(),
        campaign_name: c.campaign.campaign_name.clone(),
        reason,
        severity,
        current_spend: c.campaign.ad_spend,
        proposed_budget,
        roas: c.performance.roas,
        ctr: c.performance.ctr,
        requires_approval: true,
    }
}
