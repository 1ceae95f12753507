/// Canonical id resolution
///
/// Turns any `ShowReference` into the canonical id of a persisted record,
/// creating the record on first sight. Creation for one external id is
/// serialized by a per-id lock; the store's unique external id is the final
/// guard across processes.
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError},
};

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    db::ShowStore,
    error::{AppError, AppResult},
    models::{pick_color_tag, CanonicalShowRecord, CatalogShow, ExternalId, ShowPayload, ShowReference},
    services::{enrichment::EnrichmentManager, providers::CatalogProvider},
};

#[derive(Clone)]
pub struct ShowResolver {
    store: Arc<dyn ShowStore>,
    catalog: Arc<dyn CatalogProvider>,
    enrichment: EnrichmentManager,
    locks: LockMap,
}

/// Only touched in short synchronous sections, so a claim can clean up in `Drop`
type LockMap = Arc<std::sync::Mutex<HashMap<ExternalId, Arc<Mutex<()>>>>>;

/// Interest in one external id's lock
///
/// Dropping the claim removes the map entry when no other claim remains,
/// including when the owning future is cancelled while waiting.
struct LockClaim {
    locks: LockMap,
    external_id: ExternalId,
    lock: Arc<Mutex<()>>,
}

impl Drop for LockClaim {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one in this claim
        let unclaimed = locks
            .get(&self.external_id)
            .is_some_and(|lock| Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) == 2);
        if unclaimed {
            locks.remove(&self.external_id);
        }
    }
}

impl ShowResolver {
    pub fn new(
        store: Arc<dyn ShowStore>,
        catalog: Arc<dyn CatalogProvider>,
        enrichment: EnrichmentManager,
    ) -> Self {
        Self {
            store,
            catalog,
            enrichment,
            locks: Arc::new(std::sync::Mutex::new(HashMap::new())),
        }
    }

    /// Resolves a reference to the canonical id of an existing record
    ///
    /// A canonical-shaped reference that exists returns without any provider
    /// call. Everything else goes through the external id.
    pub async fn resolve(&self, reference: &ShowReference) -> AppResult<Uuid> {
        if let Some(canonical_id) = reference.canonical_id() {
            if self.exists(canonical_id).await {
                return Ok(canonical_id);
            }
            tracing::debug!(canonical_id = %canonical_id, "Canonical id not found, trying external id");
        }

        let external_id = reference.external_id().ok_or_else(|| {
            AppError::Resolution(format!("No external id in reference {}", reference))
        })?;

        let claim = self.claim_lock(external_id);
        let _guard = claim.lock.lock().await;
        self.resolve_external(external_id, reference.full_record()).await
    }

    /// Resolves every reference, keeping input order. The first failure wins.
    pub async fn resolve_many(&self, references: &[ShowReference]) -> AppResult<Vec<Uuid>> {
        futures::future::try_join_all(references.iter().map(|r| self.resolve(r))).await
    }

    /// True if `raw` is a canonical id of a stored record
    pub async fn validate(&self, raw: &str) -> bool {
        match Uuid::parse_str(raw.trim()) {
            Ok(id) => self.exists(id).await,
            Err(_) => false,
        }
    }

    /// Persists a catalog show, keeping any color tag it already has
    ///
    /// When the store lacks the extended columns the save is retried once
    /// with the base columns only; a second failure propagates.
    pub async fn save(&self, show: &CatalogShow) -> AppResult<CanonicalShowRecord> {
        let external_id = show.external_id();
        let enrichment = self.enrichment.enrich(show).await;

        let color_tag = match self.store.color_tag_for(external_id).await {
            Ok(Some(tag)) => tag,
            Ok(None) => pick_color_tag(),
            Err(e) => {
                tracing::warn!(error = %e, external_id = external_id, "Color tag lookup failed, assigning a new one");
                pick_color_tag()
            }
        };

        let payload = ShowPayload::from_catalog(show, &enrichment, color_tag);

        let record = match self.store.upsert_show(&payload).await {
            Ok(record) => record,
            Err(e) if e.is_missing_column() => {
                tracing::warn!(
                    error = %e,
                    external_id = external_id,
                    "Store lacks extended columns, saving reduced payload"
                );
                self.store.upsert_show(&payload.reduced()).await?
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            canonical_id = %record.id,
            external_id = external_id,
            title = %record.title,
            "Show saved"
        );

        Ok(record)
    }

    async fn resolve_external(
        &self,
        external_id: ExternalId,
        attached: Option<&CatalogShow>,
    ) -> AppResult<Uuid> {
        match self.store.get_by_external_id(external_id).await {
            Ok(Some(record)) => return Ok(record.id),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, external_id = external_id, "Store lookup failed, treating as not found");
            }
        }

        let fetched;
        let show = match attached {
            Some(show) => show,
            None => {
                fetched = self.catalog.show_details(external_id).await.map_err(|e| {
                    AppError::Provider(format!("Show {} could not be fetched: {}", external_id, e))
                })?;
                &fetched
            }
        };

        Ok(self.save(show).await?.id)
    }

    /// Store errors count as "not found"
    async fn exists(&self, canonical_id: Uuid) -> bool {
        match self.store.get_by_id(canonical_id).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                tracing::warn!(error = %e, canonical_id = %canonical_id, "Canonical id lookup failed");
                false
            }
        }
    }

    fn claim_lock(&self, external_id: ExternalId) -> LockClaim {
        let lock = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(external_id)
            .or_default()
            .clone();

        LockClaim {
            locks: self.locks.clone(),
            external_id,
            lock,
        }
    }
}
