//! JSON input files for the command-line subcommands.

use anyhow::Context;
use chrono::{DateTime, Utc};
use growth_core::types::{CampaignMetrics, Journey};
use growth_reporting::budget::SpendRecord;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct BudgetInput {
    pub campaign_id: String,
    pub total_budget: f64,
    pub daily_budget: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct PacingInput {
    /// Point in time to evaluate pacing at; defaults to now.
    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
    pub budgets: Vec<BudgetInput>,
    #[serde(default)]
    pub spend: Vec<SpendRecord>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    debug!(path = %path.display(), bytes = raw.len(), "Loaded input file");
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

pub fn load_journeys(path: &Path) -> anyhow::Result<Vec<Journey>> {
    let journeys: Vec<Journey> = read_json(path)?;
    for journey in &journeys {
        journey.validate()?;
    }
    Ok(journeys)
}

pub fn load_campaigns(path: &Path) -> anyhow::Result<Vec<CampaignMetrics>> {
    read_json(path)
}

pub fn load_pacing(path: &Path) -> anyhow::Result<PacingInput> {
    read_json(path)
}

pub fn load_series(path: &Path) -> anyhow::Result<Vec<f64>> {
    read_json(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir()
            .join(format!("growth-engine-{}-{name}", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_journeys_validates() {
        let path = write_temp(
            "bad-journeys.json",
            r#"[{ "conversion_value": 10.0, "touchpoints": [
                { "campaign_id": "", "platform": "meta",
                  "timestamp": "2025-10-01T00:00:00Z", "position": 1 }
            ]}]"#,
        );
        let err = load_journeys(&path).unwrap_err();
        assert!(err.to_string().contains("empty campaign_id"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_pacing_defaults() {
        let path = write_temp(
            "pacing.json",
            r#"{ "budgets": [{
                "campaign_id": "c1", "total_budget": 1000.0, "daily_budget": 100.0,
                "start_date": "2025-10-01T00:00:00Z", "end_date": "2025-10-31T00:00:00Z"
            }]}"#,
        );
        let input = load_pacing(&path).unwrap();
        assert!(input.as_of.is_none());
        assert!(input.spend.is_empty());
        assert_eq!(input.budgets[0].campaign_id, "c1");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_series(Path::new("/nonexistent/series.json")).unwrap_err();
        assert!(err.to_string().contains("series.json"));
    }
}
