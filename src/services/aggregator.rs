use std::{collections::HashSet, sync::Arc};

use crate::{
    models::{CatalogShow, ExternalId},
    services::providers::CatalogProvider,
};

pub const RELATED_LIMIT: usize = 100;
pub const GENRE_LIMIT: usize = 100;
/// Below this pool size the popular-by-genre source is consulted
pub const POOL_TARGET: usize = 60;

/// Gathers the candidate pool for a seed show
#[derive(Clone)]
pub struct CandidateAggregator {
    catalog: Arc<dyn CatalogProvider>,
}

impl CandidateAggregator {
    pub fn new(catalog: Arc<dyn CatalogProvider>) -> Self {
        Self { catalog }
    }

    /// Related shows, topped up with popular shows of the seed's primary genre
    ///
    /// A failing source is logged and skipped. The pool holds each external id
    /// once, in first-seen order, and never the seed itself.
    pub async fn build_pool(&self, seed: &CatalogShow) -> Vec<CatalogShow> {
        let seed_id = seed.external_id();
        let mut pool = Pool::new(seed_id);

        match self.catalog.related_shows(seed_id, RELATED_LIMIT).await {
            Ok(shows) => pool.extend(shows),
            Err(e) => {
                tracing::warn!(error = %e, external_id = seed_id, source = "related", "Candidate source failed");
            }
        }

        if pool.len() < POOL_TARGET {
            if let Some(genre) = seed.primary_genre() {
                match self.catalog.popular_by_genre(genre, GENRE_LIMIT).await {
                    Ok(shows) => pool.extend(shows),
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            external_id = seed_id,
                            genre = genre,
                            source = "popular_by_genre",
                            "Candidate source failed"
                        );
                    }
                }
            }
        }

        tracing::info!(external_id = seed_id, pool = pool.len(), "Candidate pool built");

        pool.shows
    }
}

struct Pool {
    seen: HashSet<ExternalId>,
    shows: Vec<CatalogShow>,
}

impl Pool {
    fn new(seed_id: ExternalId) -> Self {
        Self {
            seen: HashSet::from([seed_id]),
            shows: Vec::new(),
        }
    }

    fn extend(&mut self, shows: Vec<CatalogShow>) {
        for show in shows {
            if self.seen.insert(show.external_id()) {
                self.shows.push(show);
            }
        }
    }

    fn len(&self) -> usize {
        self.shows.len()
    }
}
