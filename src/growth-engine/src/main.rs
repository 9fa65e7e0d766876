//! Growth Engine — ads analytics from the command line.
//!
//! Reads JSON input files, runs the reporting engines and writes JSON to
//! stdout. Logs go to stderr.

mod input;

use anyhow::Context;
use clap::{Parser, Subcommand};
use growth_core::config::AppConfig;
use growth_reporting::alerts;
use growth_reporting::attribution::{AttributionEngine, AttributionModel};
use growth_reporting::budget::BudgetTracker;
use growth_reporting::forecast;
use growth_reporting::metrics::{self, CampaignPerformance};
use growth_reporting::optimizer::BudgetOptimizer;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "growth-engine")]
#[command(about = "Attribution, pacing and performance analytics for ad campaigns")]
#[command(version)]
struct Cli {
    /// Optional TOML config file (environment variables still override)
    #[arg(long, global = true, env = "GROWTH_ENGINE_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Attribute conversion value across campaigns
    Attribute {
        /// JSON array of journeys
        #[arg(long)]
        input: PathBuf,
        /// Attribution model; unknown names fall back to last click
        #[arg(long)]
        model: Option<String>,
        /// Print each journey's allocation instead of campaign totals
        #[arg(long, default_value_t = false)]
        per_journey: bool,
    },
    /// Campaign ratios, blended totals, alerts and budget recommendations
    Performance {
        /// JSON array of campaign metrics
        #[arg(long)]
        input: PathBuf,
    },
    /// Budget pacing status per campaign
    Pacing {
        /// JSON object with `budgets` and `spend`
        #[arg(long)]
        input: PathBuf,
    },
    /// Moving-average forecast of a numeric series
    Forecast {
        /// JSON array of numbers
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        window: Option<usize>,
        #[arg(long)]
        horizon: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "growth_engine=info,growth_reporting=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    match cli.command {
        Command::Attribute {
            input,
            model,
            per_journey,
        } => attribute(&config, &input, model.as_deref(), per_journey),
        Command::Performance { input } => performance(&config, &input),
        Command::Pacing { input } => pacing(&config, &input),
        Command::Forecast {
            input,
            window,
            horizon,
        } => run_forecast(&config, &input, window, horizon),
    }
}

fn emit<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{out}");
    Ok(())
}

fn attribute(
    config: &AppConfig,
    input: &Path,
    model: Option<&str>,
    per_journey: bool,
) -> anyhow::Result<()> {
    let journeys = input::load_journeys(input)?;
    let model = AttributionModel::from_query(model.unwrap_or(&config.attribution.default_model));
    let engine = AttributionEngine::from_config(&config.attribution);

    info!(
        journeys = journeys.len(),
        model = %model,
        half_life_days = engine.half_life_days(),
        "Running attribution"
    );

    if per_journey {
        let allocations: Vec<_> = journeys
            .iter()
            .map(|j| {
                json!({
                    "journey_id": j.journey_id,
                    "conversion_value": j.conversion_value,
                    "allocations": engine.allocate(&j.touchpoints, j.conversion_value, model),
                })
            })
            .collect();
        return emit(&json!({ "model": model, "journeys": allocations }));
    }

    let campaigns = engine.aggregate_by_campaign(&journeys, model);
    emit(&json!({ "model": model, "campaigns": campaigns }))
}

fn performance(config: &AppConfig, input: &Path) -> anyhow::Result<()> {
    let campaigns = input::load_campaigns(input)?;
    info!(campaigns = campaigns.len(), "Computing campaign performance");

    let per_campaign: Vec<CampaignPerformance> =
        campaigns.iter().map(metrics::campaign_performance).collect();
    let aggregate = metrics::aggregate_performance(&campaigns)?;
    let flagged = alerts::check_campaigns(&campaigns, &config.alerts);
    let actions = BudgetOptimizer::new(config.optimization.clone()).recommend(&per_campaign);

    if !flagged.is_empty() {
        warn!(underperforming = flagged.len(), "Campaigns below target");
    }

    emit(&json!({
        "campaigns": per_campaign,
        "aggregate": aggregate,
        "alerts": flagged,
        "recommendations": actions,
    }))
}

fn pacing(config: &AppConfig, input: &Path) -> anyhow::Result<()> {
    let file = input::load_pacing(input)?;
    let tracker = BudgetTracker::new(config.pacing.clone());

    for budget in &file.budgets {
        tracker.set_budget(
            &budget.campaign_id,
            budget.total_budget,
            budget.daily_budget,
            budget.start_date,
            budget.end_date,
        );
    }
    let mut spend = file.spend;
    spend.sort_by_key(|s| s.timestamp);
    for record in &spend {
        tracker.record_spend_at(
            &record.campaign_id,
            record.amount,
            &record.platform,
            record.timestamp,
        );
    }

    let now = file.as_of.unwrap_or_else(chrono::Utc::now);
    let report: Vec<_> = tracker
        .campaign_ids()
        .into_iter()
        .map(|id| {
            json!({
                "campaign_id": id,
                "pacing": tracker.pacing_at(&id, now),
                "allocation": tracker.allocation(&id),
                "platforms": tracker.platform_breakdown(&id),
                "alerts": tracker.alerts(&id),
            })
        })
        .collect();

    emit(&json!({ "as_of": now, "campaigns": report }))
}

fn run_forecast(
    config: &AppConfig,
    input: &Path,
    window: Option<usize>,
    horizon: Option<usize>,
) -> anyhow::Result<()> {
    let series = input::load_series(input)?;
    let window = window.unwrap_or(config.forecast.window);
    let horizon = horizon.unwrap_or(config.forecast.horizon);

    let smoothed = forecast::moving_average(&series, window);
    let projected = forecast::forecast(&series, window, horizon);
    let trend = match series.as_slice() {
        [.., previous, current] => Some(forecast::trend(*current, *previous)),
        _ => None,
    };

    emit(&json!({
        "window": window,
        "horizon": horizon,
        "moving_average": smoothed,
        "forecast": projected,
        "trend": trend,
    }))
}
