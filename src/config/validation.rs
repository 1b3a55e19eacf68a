use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("runner.concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("Invalid enrichment endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Timeout must be positive: {field}")]
    ZeroTimeout { field: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_runner(config)?;
    validate_endpoint(config)?;
    validate_timeouts(config)?;
    Ok(())
}

fn validate_runner(config: &Config) -> Result<(), ValidationError> {
    if config.runner.concurrency == 0 {
        return Err(ValidationError::ZeroConcurrency);
    }
    Ok(())
}

/// Endpoint must be an absolute http(s) URL
fn validate_endpoint(config: &Config) -> Result<(), ValidationError> {
    let endpoint = &config.enrichment.endpoint;

    let url = reqwest::Url::parse(endpoint).map_err(|e| ValidationError::InvalidEndpoint {
        endpoint: endpoint.clone(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ValidationError::InvalidEndpoint {
            endpoint: endpoint.clone(),
            reason: format!("unsupported scheme '{}', expected http or https", scheme),
        }),
    }
}

fn validate_timeouts(config: &Config) -> Result<(), ValidationError> {
    let timeouts = [
        ("enrichment.connect_timeout", config.enrichment.connect_timeout),
        ("enrichment.request_timeout", config.enrichment.request_timeout),
    ];

    for (field, value) in timeouts {
        if value.is_zero() {
            return Err(ValidationError::ZeroTimeout {
                field: field.to_string(),
            });
        }
    }

    Ok(())
}
