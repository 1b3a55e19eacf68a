use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "BULKENRICH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/bulkenrich.toml";
const ENV_PREFIX: &str = "BULKENRICH";
const ENV_SEPARATOR: &str = "__";
const API_KEY_ENV_VAR: &str = "ENRICH_API_KEY";

/// Path of the configuration file: `BULKENRICH_CONFIG` or the default location
pub fn default_path() -> PathBuf {
    env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load(config_path: Option<PathBuf>) -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = config_path.unwrap_or_else(default_path);
    let mut config = load_from_sources(config_path)?;

    load_secrets(&mut config);

    Ok(config)
}

/// Secrets are never read from TOML files, only from the environment
fn load_secrets(config: &mut Config) {
    if let Ok(api_key) = env::var(API_KEY_ENV_VAR) {
        if !api_key.trim().is_empty() {
            config.enrichment.api_key = Some(api_key);
        }
    }
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // BULKENRICH__RUNNER__CONCURRENCY -> runner.concurrency
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::HumanDuration;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.runner.concurrency, 3);
        assert!(config.enrichment.cache);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[runner]
concurrency = 8

[enrichment]
endpoint = "https://enrich.example.test/v1/enrich"
connect_timeout = "2s"
request_timeout = 45
cache = false

[board]
apply_to_edited_fields = false
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.runner.concurrency, 8);
        assert_eq!(config.enrichment.endpoint, "https://enrich.example.test/v1/enrich");
        assert_eq!(config.enrichment.connect_timeout, HumanDuration::from_secs(2));
        assert_eq!(config.enrichment.request_timeout, HumanDuration::from_secs(45));
        assert!(!config.enrichment.cache);
        assert!(!config.board.apply_to_edited_fields);
    }

    // Environment overrides are not exercised here: env::set_var is unsafe
    // under edition 2024 and would race with parallel tests.

    #[test]
    fn test_partial_section_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[enrichment]\ncache = false\n").unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert!(!config.enrichment.cache);
        assert_eq!(config.enrichment.request_timeout, HumanDuration::from_secs(120));
        assert_eq!(config.runner.concurrency, 3);
    }
}
