//! Ads analytics for the growth engine — multi-touch attribution, performance
//! ratios, budget pacing, optimization recommendations, alerts and
//! moving-average forecasts.

pub mod alerts;
pub mod attribution;
pub mod budget;
pub mod forecast;
pub mod metrics;
pub mod optimizer;

pub use attribution::{AttributionEngine, AttributionModel, CreditAllocation};
pub use budget::BudgetTracker;
pub use optimizer::BudgetOptimizer;
