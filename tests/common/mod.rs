#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use showrank::db::ShowStore;
use showrank::error::{AppError, AppResult};
use showrank::models::{
    CatalogIds, CatalogSeason, CatalogShow, ExternalId, MetadataQuery, ProviderMetadata,
};
use showrank::services::enrichment::{MemoryEnrichmentCache, DEFAULT_MAX_CONCURRENT};
use showrank::services::providers::{CatalogProvider, MetadataProvider};
use showrank::services::{EnrichmentManager, MetadataProviders, ShowResolver};

pub fn show(id: ExternalId, title: &str, genres: &[&str], year: i32, rating: f64) -> CatalogShow {
    CatalogShow {
        title: title.to_string(),
        year: Some(year),
        rating: Some(rating),
        ids: CatalogIds {
            trakt: id,
            ..Default::default()
        },
        genres: genres.iter().map(|g| g.to_string()).collect(),
        ..Default::default()
    }
}

/// Catalog backed by a fixed set of shows, counting every call
#[derive(Default)]
pub struct FakeCatalog {
    pub shows: HashMap<ExternalId, CatalogShow>,
    pub related: Vec<CatalogShow>,
    pub details_calls: AtomicUsize,
    pub season_calls: AtomicUsize,
    /// Added to every call so concurrent callers overlap
    pub latency: Duration,
}

impl FakeCatalog {
    pub fn with_shows(shows: Vec<CatalogShow>) -> Self {
        Self {
            shows: shows.into_iter().map(|s| (s.external_id(), s)).collect(),
            latency: Duration::from_millis(10),
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl CatalogProvider for FakeCatalog {
    async fn related_shows(&self, _id: ExternalId, limit: usize) -> AppResult<Vec<CatalogShow>> {
        Ok(self.related.iter().take(limit).cloned().collect())
    }

    async fn popular_by_genre(&self, _genre: &str, _limit: usize) -> AppResult<Vec<CatalogShow>> {
        Ok(Vec::new())
    }

    async fn trending(&self, _limit: usize) -> AppResult<Vec<CatalogShow>> {
        Ok(Vec::new())
    }

    async fn show_details(&self, id: ExternalId) -> AppResult<CatalogShow> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        self.shows
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::ExternalApi(format!("Trakt API returned status 404 for {}", id)))
    }

    async fn seasons(&self, _id: ExternalId) -> AppResult<Vec<CatalogSeason>> {
        self.season_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        Ok(vec![
            CatalogSeason { number: 0, ..Default::default() },
            CatalogSeason { number: 1, ..Default::default() },
            CatalogSeason { number: 2, ..Default::default() },
        ])
    }
}

/// Metadata provider that always finds a poster, counting lookups
pub struct FakeMetadata {
    pub poster: &'static str,
    pub calls: AtomicUsize,
}

impl FakeMetadata {
    pub fn new(poster: &'static str) -> Self {
        Self {
            poster,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for FakeMetadata {
    async fn lookup(&self, _query: &MetadataQuery) -> AppResult<Option<ProviderMetadata>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(Some(ProviderMetadata {
            poster_url: Some(self.poster.to_string()),
            keywords: vec!["workplace".to_string()],
            ..Default::default()
        }))
    }
}

pub struct Harness {
    pub catalog: Arc<FakeCatalog>,
    pub primary: Arc<FakeMetadata>,
    pub secondary: Arc<FakeMetadata>,
    pub tertiary: Arc<FakeMetadata>,
    pub enrichment: EnrichmentManager,
}

impl Harness {
    pub fn new(catalog: FakeCatalog) -> Self {
        let catalog = Arc::new(catalog);
        let primary = Arc::new(FakeMetadata::new("https://image.tmdb.org/t/p/w500/a.jpg"));
        let secondary = Arc::new(FakeMetadata::new("https://m.media-amazon.com/b.jpg"));
        let tertiary = Arc::new(FakeMetadata::new("https://static.tvmaze.com/c.jpg"));

        let enrichment = EnrichmentManager::new(
            catalog.clone(),
            MetadataProviders {
                primary: primary.clone(),
                secondary: secondary.clone(),
                tertiary: tertiary.clone(),
            },
            Arc::new(MemoryEnrichmentCache::new()),
            DEFAULT_MAX_CONCURRENT,
        );

        Self {
            catalog,
            primary,
            secondary,
            tertiary,
            enrichment,
        }
    }

    pub fn resolver(&self, store: Arc<dyn ShowStore>) -> ShowResolver {
        ShowResolver::new(store, self.catalog.clone(), self.enrichment.clone())
    }
}
