use std::{collections::HashMap, time::Duration};

use tokio::sync::RwLock;

use crate::{
    db::{Cache, CacheKey},
    models::{EnrichmentResult, ExternalId},
};

/// Storage for finished enrichment results, keyed by external id
///
/// Lookups never fail: a backend error is logged and reported as a miss.
#[async_trait::async_trait]
pub trait EnrichmentCache: Send + Sync {
    async fn get(&self, external_id: ExternalId) -> Option<EnrichmentResult>;

    async fn set(&self, result: EnrichmentResult);

    async fn clear(&self);
}

/// Unbounded process-local cache. Entries live until `clear`.
#[derive(Default)]
pub struct MemoryEnrichmentCache {
    entries: RwLock<HashMap<ExternalId, EnrichmentResult>>,
}

impl MemoryEnrichmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait::async_trait]
impl EnrichmentCache for MemoryEnrichmentCache {
    async fn get(&self, external_id: ExternalId) -> Option<EnrichmentResult> {
        self.entries.read().await.get(&external_id).cloned()
    }

    async fn set(&self, result: EnrichmentResult) {
        self.entries.write().await.insert(result.external_id, result);
    }

    async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

/// Process-local cache with a size cap and per-entry TTL
pub struct BoundedEnrichmentCache {
    entries: moka::future::Cache<ExternalId, EnrichmentResult>,
}

impl BoundedEnrichmentCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let entries = moka::future::Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();

        Self { entries }
    }
}

#[async_trait::async_trait]
impl EnrichmentCache for BoundedEnrichmentCache {
    async fn get(&self, external_id: ExternalId) -> Option<EnrichmentResult> {
        self.entries.get(&external_id).await
    }

    async fn set(&self, result: EnrichmentResult) {
        self.entries.insert(result.external_id, result).await;
    }

    async fn clear(&self) {
        self.entries.invalidate_all();
    }
}

/// Shared cache in Redis, so several processes reuse each other's work
#[derive(Clone)]
pub struct RedisEnrichmentCache {
    cache: Cache,
    ttl: u64,
}

impl RedisEnrichmentCache {
    pub fn new(cache: Cache, ttl: u64) -> Self {
        Self { cache, ttl }
    }
}

#[async_trait::async_trait]
impl EnrichmentCache for RedisEnrichmentCache {
    async fn get(&self, external_id: ExternalId) -> Option<EnrichmentResult> {
        match self
            .cache
            .get_from_cache(&CacheKey::Enrichment(external_id))
            .await
        {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, external_id = external_id, "Enrichment cache read failed");
                None
            }
        }
    }

    /// Waits for the write so a finished round is visible to the next caller
    async fn set(&self, result: EnrichmentResult) {
        let key = CacheKey::Enrichment(result.external_id);
        if let Err(e) = self.cache.set(&key, &result, self.ttl).await {
            tracing::warn!(error = %e, key = %key, "Enrichment cache write failed, queueing retry");
            self.cache.set_in_background(&key, &result, self.ttl);
        }
    }

    async fn clear(&self) {
        match self.cache.delete_matching(CacheKey::ENRICHMENT_PATTERN).await {
            Ok(removed) => tracing::info!(removed = removed, "Enrichment cache cleared"),
            Err(e) => tracing::error!(error = %e, "Failed to clear enrichment cache"),
        }
    }
}
