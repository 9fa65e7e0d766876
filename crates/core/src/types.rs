use crate::error::{GrowthError, GrowthResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One recorded ad interaction on a customer's path to conversion.
///
/// `position` is informational; engines derive first/last/middle from the
/// order of the slice they are handed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Touchpoint {
    pub campaign_id: String,
    pub platform: String,
    pub timestamp: DateTime<Utc>,
    pub position: u32,
    /// Spend charged for this interaction, in currency units.
    #[serde(default)]
    pub ad_spend: f64,
}

impl Touchpoint {
    pub fn new(
        campaign_id: impl Into<String>,
        platform: impl Into<String>,
        timestamp: DateTime<Utc>,
        position: u32,
    ) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            platform: platform.into(),
            timestamp,
            position,
            ad_spend: 0.0,
        }
    }

    pub fn with_spend(mut self, ad_spend: f64) -> Self {
        self.ad_spend = ad_spend;
        self
    }
}

/// A converted customer path: chronological touchpoints and the value of the
/// conversion they led to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journey {
    #[serde(default)]
    pub journey_id: String,
    pub conversion_value: f64,
    pub touchpoints: Vec<Touchpoint>,
}

impl Journey {
    /// Reject touchpoints without a campaign. Only input boundaries call
    /// this; the attribution engine accepts whatever it is given.
    pub fn validate(&self) -> GrowthResult<()> {
        if let Some(idx) = self
            .touchpoints
            .iter()
            .position(|t| t.campaign_id.trim().is_empty())
        {
            return Err(GrowthError::Validation(format!(
                "journey '{}' touchpoint {} has an empty campaign_id",
                self.journey_id, idx
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdPlatform {
    Meta,
    Google,
    Tiktok,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Active,
    Paused,
    Completed,
    Draft,
}

/// Raw campaign totals as reported by an ad platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignMetrics {
    pub campaign_id: String,
    pub campaign_name: String,
    pub platform: AdPlatform,
    pub status: CampaignStatus,
    pub ad_spend: f64,
    pub revenue: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
}
