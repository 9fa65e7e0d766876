use serde::Deserialize;
use tracing::debug;

/// Root application configuration. Loaded from environment variables
/// with the prefix `GROWTH_ENGINE__` and an optional TOML config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub attribution: AttributionConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub optimization: OptimizationConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttributionConfig {
    /// Free-form model name, parsed leniently at the boundary.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Rank distance over which time-decay weight halves.
    #[serde(default = "default_half_life_days")]
    pub half_life_days: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_overspend_tolerance")]
    pub overspend_tolerance: f64,
    #[serde(default = "default_underspend_tolerance")]
    pub underspend_tolerance: f64,
    #[serde(default = "default_nearing_limit_percent")]
    pub nearing_limit_percent: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizationConfig {
    /// CTR percentage below which a campaign is paused.
    #[serde(default = "default_pause_low_ctr")]
    pub pause_low_ctr: f64,
    #[serde(default = "default_pause_low_roas")]
    pub pause_low_roas: f64,
    #[serde(default = "default_increase_budget_roas")]
    pub increase_budget_roas: f64,
    #[serde(default = "default_decrease_budget_roas")]
    pub decrease_budget_roas: f64,
    #[serde(default = "default_min_spend_for_action")]
    pub min_spend_for_action: f64,
    #[serde(default = "default_increase_step")]
    pub increase_step: f64,
    #[serde(default = "default_decrease_step")]
    pub decrease_step: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    #[serde(default = "default_min_roas")]
    pub min_roas: f64,
    /// Click-through threshold as a fraction (0.01 = 1%).
    #[serde(default = "default_min_ctr")]
    pub min_ctr: f64,
    #[serde(default = "default_min_conversions")]
    pub min_conversions: u64,
    #[serde(default)]
    pub max_cpa: Option<f64>,
    #[serde(default = "default_no_conversion_spend_floor")]
    pub no_conversion_spend_floor: f64,
    #[serde(default = "default_low_ctr_min_impressions")]
    pub low_ctr_min_impressions: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    #[serde(default = "default_forecast_window")]
    pub window: usize,
    #[serde(default = "default_forecast_horizon")]
    pub horizon: usize,
}

// Default functions
fn default_model() -> String {
    "last_click".to_string()
}
fn default_half_life_days() -> f64 {
    7.0
}
fn default_overspend_tolerance() -> f64 {
    1.1
}
fn default_underspend_tolerance() -> f64 {
    0.8
}
fn default_nearing_limit_percent() -> f64 {
    80.0
}
fn default_pause_low_ctr() -> f64 {
    1.0
}
fn default_pause_low_roas() -> f64 {
    1.0
}
fn default_increase_budget_roas() -> f64 {
    3.0
}
fn default_decrease_budget_roas() -> f64 {
    1.5
}
fn default_min_spend_for_action() -> f64 {
    50.0
}
fn default_increase_step() -> f64 {
    0.2
}
fn default_decrease_step() -> f64 {
    0.3
}
fn default_min_roas() -> f64 {
    1.5
}
fn default_min_ctr() -> f64 {
    0.01
}
fn default_min_conversions() -> u64 {
    1
}
fn default_no_conversion_spend_floor() -> f64 {
    50.0
}
fn default_low_ctr_min_impressions() -> u64 {
    1000
}
fn default_forecast_window() -> usize {
    7
}
fn default_forecast_horizon() -> usize {
    7
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            half_life_days: default_half_life_days(),
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            overspend_tolerance: default_overspend_tolerance(),
            underspend_tolerance: default_underspend_tolerance(),
            nearing_limit_percent: default_nearing_limit_percent(),
        }
    }
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            pause_low_ctr: default_pause_low_ctr(),
            pause_low_roas: default_pause_low_roas(),
            increase_budget_roas: default_increase_budget_roas(),
            decrease_budget_roas: default_decrease_budget_roas(),
            min_spend_for_action: default_min_spend_for_action(),
            increase_step: default_increase_step(),
            decrease_step: default_decrease_step(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            min_roas: default_min_roas(),
            min_ctr: default_min_ctr(),
            min_conversions: default_min_conversions(),
            max_cpa: None,
            no_conversion_spend_floor: default_no_conversion_spend_floor(),
            low_ctr_min_impressions: default_low_ctr_min_impressions(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            window: default_forecast_window(),
            horizon: default_forecast_horizon(),
        }
    }
}

impl AttributionConfig {
    /// Time decay needs a positive, finite half-life.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.half_life_days.is_finite() && self.half_life_days > 0.0 {
            Ok(())
        } else {
            Err(config::ConfigError::Message(format!(
                "attribution.half_life_days must be a positive number, got {}",
                self.half_life_days
            )))
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables only.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from an optional TOML file, then environment
    /// variables. Environment values win.
    pub fn load_from(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            debug!(path, "Reading config file");
            builder = builder.add_source(
                config::File::with_name(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("GROWTH_ENGINE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let app: AppConfig = config.try_deserialize()?;
        app.attribution.validate()?;
        Ok(app)
    }
}
