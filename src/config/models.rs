use crate::humanize::HumanDuration;
use crate::runner::{DEFAULT_CONCURRENCY, RunnerConfig, RunnerError};
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub runner: RunnerSettings,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub board: BoardSettings,
}

/// Bulk runner settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunnerSettings {
    /// Maximum enrichment calls in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

impl RunnerSettings {
    pub fn to_runner_config(&self) -> Result<RunnerConfig, RunnerError> {
        RunnerConfig::new(self.concurrency)
    }
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

/// Enrichment endpoint settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnrichmentConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
    /// Upper bound for one enrichment call; the runner itself never times out
    #[serde(default = "default_request_timeout")]
    pub request_timeout: HumanDuration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Memoize successful results per website for the process lifetime
    #[serde(default = "default_cache")]
    pub cache: bool,
    /// Bearer token (loaded from environment, not from config file)
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
            cache: default_cache(),
            api_key: None,
        }
    }
}

fn default_endpoint() -> String {
    "http://127.0.0.1:54321/functions/v1/enrich".to_string()
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration::from_secs(10)
}

fn default_request_timeout() -> HumanDuration {
    // Web-search backed enrichment is slow
    HumanDuration::from_secs(120)
}

fn default_user_agent() -> String {
    concat!("bulkenrich/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_cache() -> bool {
    true
}

/// How enrichment results are folded into the board
///
/// Only callers that edit entries through the library see a difference;
/// the CLI never edits entries.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BoardSettings {
    /// Overwrite fields the user edited by hand
    #[serde(default = "default_apply_to_edited_fields")]
    pub apply_to_edited_fields: bool,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            apply_to_edited_fields: default_apply_to_edited_fields(),
        }
    }
}

fn default_apply_to_edited_fields() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.runner.concurrency, 3);
        assert_eq!(config.enrichment.request_timeout, HumanDuration::from_secs(120));
        assert!(config.enrichment.cache);
        assert!(config.enrichment.api_key.is_none());
        assert!(config.board.apply_to_edited_fields);
    }

    #[test]
    fn test_runner_settings_conversion() {
        let settings = RunnerSettings { concurrency: 8 };
        assert_eq!(settings.to_runner_config().unwrap().concurrency(), 8);

        let settings = RunnerSettings { concurrency: 0 };
        assert!(settings.to_runner_config().is_err());
    }

    #[test]
    fn test_api_key_never_serialized() {
        let mut config = Config::default();
        config.enrichment.api_key = Some("secret".to_string());

        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("request_timeout = \"2m\""));
    }
}
