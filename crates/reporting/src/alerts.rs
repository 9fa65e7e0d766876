//! Campaign performance alerts: flags campaigns whose ROAS, conversions,
//! click-through rate or acquisition cost miss their targets.

use chrono::{DateTime, Utc};
use growth_core::config::AlertConfig;
use growth_core::types::{AdPlatform, CampaignMetrics};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LowRoas,
    NoConversions,
    HighCpa,
    LowCtr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    Pause,
    Optimize,
    Monitor,
    ScaleDown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceAlert {
    pub campaign_id: String,
    pub campaign_name: String,
    pub platform: AdPlatform,
    pub alert_type: AlertType,
    pub current_value: f64,
    pub threshold_value: f64,
    pub severity: AlertSeverity,
    pub message: String,
    pub action: RecommendedAction,
    pub triggered_at: DateTime<Utc>,
}

/// Ratios are `None` when their denominator is zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckedMetrics {
    pub roas: Option<f64>,
    pub cpa: Option<f64>,
    /// Fraction, not percentage.
    pub ctr: Option<f64>,
    pub conversions: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceCheck {
    pub campaign_id: String,
    pub campaign_name: String,
    pub metrics: CheckedMetrics,
    pub is_underperforming: bool,
    pub alerts: Vec<PerformanceAlert>,
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| numerator / denominator)
}

pub fn check_campaign(campaign: &CampaignMetrics, thresholds: &AlertConfig) -> PerformanceCheck {
    let now = Utc::now();
    let name = &campaign.campaign_name;
    let spend = campaign.ad_spend;

    let roas = ratio(campaign.revenue, spend);
    let cpa = ratio(spend, campaign.conversions as f64);
    let ctr = ratio(campaign.clicks as f64, campaign.impressions as f64);

    let alert = |alert_type, current_value, threshold_value, severity, action, message| {
        PerformanceAlert {
            campaign_id: campaign.campaign_id.clone(),
            campaign_name: campaign.campaign_name.clone(),
            platform: campaign.platform,
            alert_type,
            current_value,
            threshold_value,
            severity,
            message,
            action,
            triggered_at: now,
        }
    };

    let mut alerts = Vec::new();

    if let Some(roas) = roas.filter(|r| *r < thresholds.min_roas) {
        let (severity, action, tail) = if roas < 1.0 {
            (
                AlertSeverity::Critical,
                RecommendedAction::Pause,
                "Campaign is unprofitable (ROAS < 1.0).",
            )
        } else {
            (
                AlertSeverity::Warning,
                RecommendedAction::Optimize,
                "Campaign profitability is at risk.",
            )
        };
        alerts.push(alert(
            AlertType::LowRoas,
            roas,
            thresholds.min_roas,
            severity,
            action,
            format!(
                "Campaign \"{name}\" has ROAS of {roas:.2}x, below target of {:.2}x. {tail}",
                thresholds.min_roas
            ),
        ));
    }

    if campaign.conversions < thresholds.min_conversions
        && spend > thresholds.no_conversion_spend_floor
    {
        alerts.push(alert(
            AlertType::NoConversions,
            campaign.conversions as f64,
            thresholds.min_conversions as f64,
            AlertSeverity::Warning,
            RecommendedAction::Monitor,
            format!(
                "Campaign \"{name}\" has {} conversion(s) with spend of {spend:.2}. \
                 Conversion tracking may be broken or targeting is ineffective.",
                campaign.conversions
            ),
        ));
    }

    if let Some(ctr) = ctr.filter(|c| {
        *c < thresholds.min_ctr && campaign.impressions > thresholds.low_ctr_min_impressions
    }) {
        alerts.push(alert(
            AlertType::LowCtr,
            ctr,
            thresholds.min_ctr,
            AlertSeverity::Warning,
            RecommendedAction::Optimize,
            format!(
                "Campaign \"{name}\" has CTR of {:.2}%, below target of {:.2}%.",
                ctr * 100.0,
                thresholds.min_ctr * 100.0
            ),
        ));
    }

    if let (Some(max_cpa), Some(cpa)) = (thresholds.max_cpa, cpa) {
        if cpa > max_cpa {
            alerts.push(alert(
                AlertType::HighCpa,
                cpa,
                max_cpa,
                AlertSeverity::Warning,
                RecommendedAction::ScaleDown,
                format!(
                    "Campaign \"{name}\" has CPA of {cpa:.2}, above target of {max_cpa:.2}."
                ),
            ));
        }
    }

    PerformanceCheck {
        campaign_id: campaign.campaign_id.clone(),
        campaign_name: campaign.campaign_name.clone(),
        metrics: CheckedMetrics {
            roas,
            cpa,
            ctr,
            conversions: campaign.conversions,
        },
        is_underperforming: !alerts.is_empty(),
        alerts,
    }
}

/// Check every campaign and keep only the underperformers.
pub fn check_campaigns(
    campaigns: &[CampaignMetrics],
    thresholds: &AlertConfig,
) -> Vec<PerformanceCheck> {
    campaigns
        .iter()
        .map(|c| check_campaign(c, thresholds))
        .filter(|check| check.is_underperforming)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use growth_core::types::CampaignStatus;

    fn campaign(
        spend: f64,
        revenue: f64,
        impressions: u64,
        clicks: u64,
        conversions: u64,
    ) -> CampaignMetrics {
        CampaignMetrics {
            campaign_id: "camp_123".to_string(),
            campaign_name: "Spring Sale".to_string(),
            platform: AdPlatform::Meta,
            status: CampaignStatus::Active,
            ad_spend: spend,
            revenue,
            impressions,
            clicks,
            conversions,
            date_start: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            date_end: NaiveDate::from_ymd_opt(2025, 4, 30).unwrap(),
        }
    }

    fn types(check: &PerformanceCheck) -> Vec<AlertType> {
        check.alerts.iter().map(|a| a.alert_type).collect()
    }

    #[test]
    fn test_low_roas_warning() {
        let check = check_campaign(
            &campaign(1000.0, 1200.0, 10_000, 200, 5),
            &AlertConfig::default(),
        );
        assert!(check.is_underperforming);
        assert_eq!(types(&check), vec![AlertType::LowRoas]);
        assert_eq!(check.alerts[0].severity, AlertSeverity::Warning);
        assert_eq!(check.alerts[0].action, RecommendedAction::Optimize);
    }

    #[test]
    fn test_unprofitable_is_critical() {
        let check = check_campaign(
            &campaign(1000.0, 500.0, 10_000, 200, 5),
            &AlertConfig::default(),
        );
        assert_eq!(check.alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(check.alerts[0].action, RecommendedAction::Pause);
        assert!(check.alerts[0].message.contains("unprofitable"));
    }

    #[test]
    fn test_no_conversions_needs_spend_floor() {
        let cfg = AlertConfig::default();
        let cheap = check_campaign(&campaign(20.0, 100.0, 10_000, 200, 0), &cfg);
        assert!(!types(&cheap).contains(&AlertType::NoConversions));

        let costly = check_campaign(&campaign(80.0, 400.0, 10_000, 200, 0), &cfg);
        assert_eq!(types(&costly), vec![AlertType::NoConversions]);
        assert!(costly.metrics.cpa.is_none());
    }

    #[test]
    fn test_low_ctr_needs_impressions() {
        let cfg = AlertConfig::default();
        let few = check_campaign(&campaign(100.0, 400.0, 900, 1, 3), &cfg);
        assert!(!few.is_underperforming);

        let many = check_campaign(&campaign(100.0, 400.0, 50_000, 100, 3), &cfg);
        assert_eq!(types(&many), vec![AlertType::LowCtr]);
        assert!((many.alerts[0].current_value - 0.002).abs() < 1e-12);
    }

    #[test]
    fn test_high_cpa_only_with_threshold() {
        let c = campaign(100.0, 400.0, 10_000, 200, 2);
        assert!(!check_campaign(&c, &AlertConfig::default()).is_underperforming);

        let cfg = AlertConfig {
            max_cpa: Some(25.0),
            ..AlertConfig::default()
        };
        let check = check_campaign(&c, &cfg);
        assert_eq!(types(&check), vec![AlertType::HighCpa]);
        assert_eq!(check.alerts[0].action, RecommendedAction::ScaleDown);
    }

    #[test]
    fn test_zero_spend_has_no_roas() {
        let check = check_campaign(&campaign(0.0, 0.0, 10_000, 200, 1), &AlertConfig::default());
        assert!(check.metrics.roas.is_none());
        assert!(!check.is_underperforming);
    }

    #[test]
    fn test_check_campaigns_filters_healthy() {
        let campaigns = vec![
            campaign(100.0, 400.0, 10_000, 200, 3),
            campaign(100.0, 50.0, 10_000, 200, 3),
        ];
        let checks = check_campaigns(&campaigns, &AlertConfig::default());
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].metrics.roas, Some(0.5));
    }
}
