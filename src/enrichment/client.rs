//! HTTP client for the website enrichment endpoint

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, warn};

use super::traits::{EnrichError, Enricher};
use super::types::{EnrichRequest, EnrichmentResult, ErrorBody};
use crate::config::EnrichmentConfig;

/// Message reported when a failed response has no readable JSON body
const UNKNOWN_ERROR: &str = "Unknown error";

pub type Result<T> = std::result::Result<T, EnrichError>;

/// Calls the enrichment endpoint once per website (no retries)
#[derive(Debug, Clone)]
pub struct EnrichmentClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl EnrichmentClient {
    /// Create a new client from configuration
    pub fn new(config: &EnrichmentConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| EnrichError::InvalidEndpoint(format!("{}: {}", config.endpoint, e)))?;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout.as_duration())
            .timeout(config.request_timeout.as_duration())
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| EnrichError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn send_request(&self, website: &str) -> Result<EnrichmentResult> {
        debug!(website, endpoint = %self.endpoint, "Requesting enrichment");

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .json(&EnrichRequest { website });

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                EnrichError::Timeout
            } else {
                EnrichError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                EnrichError::Timeout
            } else {
                EnrichError::Request(format!("Failed to read body: {}", e))
            }
        })?;

        if !status.is_success() {
            let error = failure_from_body(status, &body);
            warn!(website, status = status.as_u16(), error = %error, "Enrichment rejected");
            return Err(error);
        }

        let mut result: EnrichmentResult =
            serde_json::from_slice(&body).map_err(|e| EnrichError::Decode(e.to_string()))?;

        // The endpoint may normalise the URL; callers correlate on what they sent.
        result.website = website.to_string();

        debug!(website, name = %result.name, "Enrichment completed");

        Ok(result)
    }
}

/// Map a non-2xx response to an error message.
///
/// A JSON body with an `error` string wins; a JSON body without one falls back
/// to the status line; an unreadable body reports "Unknown error".
fn failure_from_body(status: StatusCode, body: &[u8]) -> EnrichError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: Some(message),
        }) if !message.is_empty() => EnrichError::Upstream(message),
        Ok(_) => EnrichError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        },
        Err(_) => EnrichError::Upstream(UNKNOWN_ERROR.to_string()),
    }
}

#[async_trait]
impl Enricher for EnrichmentClient {
    async fn enrich(&self, website: &str) -> Result<EnrichmentResult> {
        self.send_request(website).await
    }
}
