//! Shared domain records, configuration and error types for the growth engine.

pub mod config;
pub mod error;
pub mod types;

pub use crate::config::AppConfig;
pub use crate::error::{GrowthError, GrowthResult};
