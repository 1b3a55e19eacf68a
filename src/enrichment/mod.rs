//! Website enrichment
//!
//! The [`Enricher`] trait is the per-item operation driven by the bulk
//! runner. [`EnrichmentClient`] talks to the HTTP enrichment endpoint and
//! [`CachedEnricher`] memoizes successful lookups in memory.

mod cache;
mod client;
mod traits;
mod types;

pub use cache::CachedEnricher;
pub use client::EnrichmentClient;
pub use traits::{EnrichError, Enricher};
pub use types::{Competitor, EnrichmentResult, Evidence, PrimaryLocation};

use crate::config::EnrichmentConfig;
use std::sync::Arc;

/// Build the configured enricher, wrapped in the memoizing cache when enabled
pub fn from_config(config: &EnrichmentConfig) -> Result<Arc<dyn Enricher>, EnrichError> {
    let client = EnrichmentClient::new(config)?;

    if config.cache {
        Ok(Arc::new(CachedEnricher::new(client)))
    } else {
        Ok(Arc::new(client))
    }
}
