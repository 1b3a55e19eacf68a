//! Configuration management for bulkenrich
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use bulkenrich::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Enriching with concurrency {}", config.runner.concurrency);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `BULKENRICH__<section>__<key>`
//!
//! Examples:
//! - `BULKENRICH__RUNNER__CONCURRENCY=5`
//! - `BULKENRICH__ENRICHMENT__ENDPOINT=https://enrich.internal/v1/enrich`
//! - `BULKENRICH__ENRICHMENT__REQUEST_TIMEOUT=90s`
//!
//! The API key is only read from `ENRICH_API_KEY`.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/bulkenrich.toml`.
//! This can be overridden using the `BULKENRICH_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{BoardSettings, Config, EnrichmentConfig, RunnerSettings};
pub use validation::ValidationError;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or
    /// validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Load configuration, reading the file at `path` instead of the default location
    pub fn load_with(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = sources::load(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path without `.env` or secrets
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
