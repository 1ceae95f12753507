/// Enrichment manager
///
/// Decorates a catalog show with artwork, keywords and season facts pulled
/// from three metadata providers plus the catalog's season list. Results are
/// cached per external id; concurrent requests for the same id share one
/// provider round, and a semaphore caps how many rounds run at once.
use std::{
    collections::{hash_map::Entry, HashMap},
    sync::Arc,
};

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::{Mutex, Semaphore};

use crate::{
    error::AppResult,
    models::{CatalogShow, EnrichmentResult, ExternalId, MetadataQuery},
    services::providers::{CatalogProvider, MetadataProvider},
};

pub mod cache;
pub mod merge;

pub use cache::{BoundedEnrichmentCache, EnrichmentCache, MemoryEnrichmentCache, RedisEnrichmentCache};
pub use merge::BranchResults;

pub const DEFAULT_MAX_CONCURRENT: usize = 50;

type InFlight = Shared<BoxFuture<'static, EnrichmentResult>>;

/// The three metadata providers, in poster precedence order
pub struct MetadataProviders {
    pub primary: Arc<dyn MetadataProvider>,
    pub secondary: Arc<dyn MetadataProvider>,
    pub tertiary: Arc<dyn MetadataProvider>,
}

#[derive(Clone)]
pub struct EnrichmentManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    catalog: Arc<dyn CatalogProvider>,
    providers: MetadataProviders,
    cache: Arc<dyn EnrichmentCache>,
    in_flight: Mutex<HashMap<ExternalId, InFlight>>,
    permits: Semaphore,
}

impl EnrichmentManager {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        providers: MetadataProviders,
        cache: Arc<dyn EnrichmentCache>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                catalog,
                providers,
                cache,
                in_flight: Mutex::new(HashMap::new()),
                permits: Semaphore::new(max_concurrent.max(1)),
            }),
        }
    }

    /// Returns the merged enrichment for `show`. Never fails.
    ///
    /// A cache hit returns without touching the providers. Otherwise the
    /// caller joins the round already running for this external id, or
    /// starts one. The round runs on its own task, so it completes and fills
    /// the cache even if every caller stops waiting.
    pub async fn enrich(&self, show: &CatalogShow) -> EnrichmentResult {
        let external_id = show.external_id();

        if let Some(hit) = self.inner.cache.get(external_id).await {
            tracing::debug!(external_id = external_id, "Enrichment cache hit");
            return hit;
        }

        if let Some(round) = self.joinable_round(external_id).await {
            return round.await;
        }

        // A round may have finished between the first lookup and the in-flight check.
        // Rounds write the cache before leaving the in-flight map.
        if let Some(hit) = self.inner.cache.get(external_id).await {
            return hit;
        }

        let round = match self.inner.in_flight.lock().await.entry(external_id) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => entry.insert(self.start_round(show.clone())).clone(),
        };

        round.await
    }

    async fn joinable_round(&self, external_id: ExternalId) -> Option<InFlight> {
        let round = self.inner.in_flight.lock().await.get(&external_id).cloned();
        if round.is_some() {
            tracing::debug!(external_id = external_id, "Joining in-flight enrichment");
        }
        round
    }

    /// Cached result for `external_id`, without fetching
    pub async fn cached(&self, external_id: ExternalId) -> Option<EnrichmentResult> {
        self.inner.cache.get(external_id).await
    }

    /// Drops every cached result. In-flight rounds are unaffected.
    pub async fn clear_cache(&self) {
        self.inner.cache.clear().await;
        tracing::info!("Enrichment cache cleared");
    }

    fn start_round(&self, show: CatalogShow) -> InFlight {
        let external_id = show.external_id();
        let inner = self.inner.clone();

        let task = tokio::spawn({
            let inner = inner.clone();
            async move {
                let result = inner.fetch_and_merge(&show).await;
                inner.cache.set(result.clone()).await;
                inner.in_flight.lock().await.remove(&external_id);
                result
            }
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(error = %e, external_id = external_id, "Enrichment task failed");
                    inner.in_flight.lock().await.remove(&external_id);
                    EnrichmentResult::empty(external_id)
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl ManagerInner {
    /// Runs the four branches concurrently under one permit and merges them
    async fn fetch_and_merge(&self, show: &CatalogShow) -> EnrichmentResult {
        let external_id = show.external_id();

        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::error!(error = %e, external_id = external_id, "Enrichment permits closed");
                return EnrichmentResult::empty(external_id);
            }
        };

        let query = MetadataQuery::from(show);

        let (primary, secondary, tertiary, seasons) = tokio::join!(
            self.providers.primary.lookup(&query),
            self.providers.secondary.lookup(&query),
            self.providers.tertiary.lookup(&query),
            self.catalog.seasons(external_id),
        );

        let branches = BranchResults {
            primary: settle(external_id, "primary", primary).flatten(),
            secondary: settle(external_id, "secondary", secondary).flatten(),
            tertiary: settle(external_id, "tertiary", tertiary).flatten(),
            seasons: settle(external_id, "seasons", seasons),
        };

        let result = merge::merge(show, branches, Utc::now());

        tracing::info!(
            external_id = external_id,
            title = %show.title,
            enriched = result.is_enriched,
            keywords = result.keywords.len(),
            seasons = ?result.total_seasons,
            "Show enriched"
        );

        result
    }
}

/// A failed branch contributes nothing; the others still count
fn settle<T>(external_id: ExternalId, branch: &str, result: AppResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(
                error = %e,
                external_id = external_id,
                branch = branch,
                "Enrichment branch failed"
            );
            None
        }
    }
}
