//! Memoizing enricher wrapper

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::traits::{EnrichError, Enricher};
use super::types::EnrichmentResult;

/// Caches successful results by website for the lifetime of the wrapper.
///
/// The cache is unbounded and never evicts. Failures are not cached, so a
/// retried website always reaches the inner enricher again.
pub struct CachedEnricher<E> {
    inner: E,
    entries: RwLock<HashMap<String, EnrichmentResult>>,
}

impl<E: Enricher> CachedEnricher<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

#[async_trait]
impl<E: Enricher> Enricher for CachedEnricher<E> {
    async fn enrich(&self, website: &str) -> Result<EnrichmentResult, EnrichError> {
        let cached = self.entries.read().await.get(website).cloned();
        if let Some(hit) = cached {
            debug!(website, "Cache hit");
            return Ok(hit);
        }

        let result = self.inner.enrich(website).await?;

        self.entries
            .write()
            .await
            .insert(website.to_string(), result.clone());

        Ok(result)
    }
}
