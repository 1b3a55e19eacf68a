use async_trait::async_trait;
use thiserror::Error;

use super::types::EnrichmentResult;

/// Enrichment errors
///
/// `Upstream` displays the endpoint's own message verbatim, so it reaches the
/// per-item failure report unchanged.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("{0}")]
    Upstream(String),
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },
    #[error("request failed: {0}")]
    Request(String),
    #[error("request timed out")]
    Timeout,
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// One enrichment call per website
///
/// This is the operation the bulk flow hands to the runner. Implementations
/// must bound their own duration; the runner never times an item out.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, website: &str) -> Result<EnrichmentResult, EnrichError>;
}
