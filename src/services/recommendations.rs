use std::{collections::HashSet, sync::Arc};

use uuid::Uuid;

use crate::{
    db::ShowStore,
    error::{AppError, AppResult},
    models::{
        CanonicalShowRecord, Candidate, CatalogShow, ExternalId, RecommendationSource,
        RecommendedShow, ScoredShow,
    },
    services::{
        aggregator::CandidateAggregator, enrichment::EnrichmentManager,
        providers::CatalogProvider, scoring,
    },
};

pub const DEFAULT_FOR_YOU_LIMIT: usize = 12;

/// Builds "because you watched" and "for you" lists
///
/// Upstream failures degrade the lists instead of failing them. The one
/// exception is the seed of "because you watched": without fresh seed
/// metadata there is nothing to compare against.
#[derive(Clone)]
pub struct RecommendationService {
    catalog: Arc<dyn CatalogProvider>,
    store: Arc<dyn ShowStore>,
    aggregator: CandidateAggregator,
    enrichment: EnrichmentManager,
}

impl RecommendationService {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        store: Arc<dyn ShowStore>,
        enrichment: EnrichmentManager,
    ) -> Self {
        Self {
            aggregator: CandidateAggregator::new(catalog.clone()),
            catalog,
            store,
            enrichment,
        }
    }

    /// Ranked shows similar to `seed_id`, uncapped
    ///
    /// Pipeline: fresh seed details, candidate pool, strict filters with a
    /// relaxed top-up, enrichment of every survivor, score and rank.
    pub async fn because_you_watched(
        &self,
        seed_id: ExternalId,
        min_score: f64,
    ) -> AppResult<Vec<ScoredShow>> {
        let seed = self.catalog.show_details(seed_id).await.map_err(|e| {
            AppError::Provider(format!("Seed show {} could not be fetched: {}", seed_id, e))
        })?;

        let pool = self.aggregator.build_pool(&seed).await;
        let survivors = scoring::filter_pool(&seed, &pool);

        let (seed_enrichment, enrichments) = tokio::join!(
            self.enrichment.enrich(&seed),
            futures::future::join_all(survivors.iter().map(|show| self.enrichment.enrich(show))),
        );

        let candidates: Vec<Candidate> = survivors
            .into_iter()
            .zip(enrichments)
            .map(|(show, enrichment)| Candidate::new(show, Some(enrichment)))
            .collect();
        let considered = candidates.len();

        let seed = Candidate::new(seed, Some(seed_enrichment));
        let ranked = scoring::rank_candidates(&seed, candidates, min_score);

        tracing::info!(
            external_id = seed_id,
            title = %seed.show.title,
            pool = pool.len(),
            considered = considered,
            ranked = ranked.len(),
            "Because-you-watched list built"
        );

        Ok(ranked)
    }

    /// Up to `limit` shows for a viewer
    ///
    /// The viewer's own recently logged shows come first. Remaining slots go
    /// to catalog picks for the viewer's top genre (or trending shows when no
    /// genre is known), never repeating a logged show. If the catalog is down
    /// the best-rated stored shows fill in.
    pub async fn for_you(&self, user_id: Uuid, limit: usize) -> AppResult<Vec<RecommendedShow>> {
        let logged = match self.store.logged_shows(user_id).await {
            Ok(logged) => logged,
            Err(e) => {
                tracing::warn!(error = %e, user_id = %user_id, "Logged shows unavailable");
                Vec::new()
            }
        };

        let mut list: Vec<RecommendedShow> = logged
            .iter()
            .take(limit)
            .map(|record| RecommendedShow::from_record(record, RecommendationSource::Logged))
            .collect();

        let remaining = limit.saturating_sub(list.len());
        if remaining == 0 {
            return Ok(list);
        }

        let mut seen: HashSet<ExternalId> = logged.iter().map(|r| r.external_id).collect();
        let interests = genre_interests(&logged);

        let picks = match interests.first() {
            Some((genre, _)) => self.catalog.popular_by_genre(genre, remaining * 2).await,
            None => self.catalog.trending(remaining * 2).await,
        };

        match picks {
            Ok(mut shows) => {
                sort_by_rating(&mut shows, |s| s.rating);
                for show in shows {
                    if list.len() >= limit {
                        break;
                    }
                    if seen.insert(show.external_id()) {
                        list.push(self.provider_pick(&show).await);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, user_id = %user_id, "Catalog picks unavailable, using stored shows");
                self.fill_from_store(&mut list, &mut seen, limit).await;
            }
        }

        tracing::info!(
            user_id = %user_id,
            logged = logged.len(),
            top_genre = interests.first().map(|(g, _)| g.as_str()),
            returned = list.len(),
            "For-you list built"
        );

        Ok(list)
    }

    /// Catalog pick, with the poster if this show was enriched before
    async fn provider_pick(&self, show: &CatalogShow) -> RecommendedShow {
        let mut pick = RecommendedShow::from(show);
        if let Some(enrichment) = self.enrichment.cached(show.external_id()).await {
            pick.poster_url = enrichment.poster_url;
            pick.total_seasons = enrichment.total_seasons.map(|n| n as i32);
        }
        pick
    }

    async fn fill_from_store(
        &self,
        list: &mut Vec<RecommendedShow>,
        seen: &mut HashSet<ExternalId>,
        limit: usize,
    ) {
        // Over-fetch so logged shows can be skipped
        let fetch = limit + seen.len();

        match self.store.top_rated_shows(fetch).await {
            Ok(records) => {
                for record in records {
                    if list.len() >= limit {
                        break;
                    }
                    if seen.insert(record.external_id) {
                        list.push(RecommendedShow::from_record(
                            &record,
                            RecommendationSource::StoreFallback,
                        ));
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stored fallback unavailable");
            }
        }
    }
}

/// Genres across the logged shows, most frequent first
///
/// Ties keep the order in which the genres were first seen, so the genres of
/// the most recently logged show win.
pub fn genre_interests(logged: &[CanonicalShowRecord]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();

    for genre in logged.iter().flat_map(|r| r.genres.iter()) {
        let genre = genre.trim().to_lowercase();
        match counts.iter_mut().find(|(g, _)| *g == genre) {
            Some((_, count)) => *count += 1,
            None => counts.push((genre, 1)),
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Highest rating first; unrated last. Stable.
fn sort_by_rating<T>(items: &mut [T], rating: impl Fn(&T) -> Option<f64>) {
    items.sort_by(|a, b| {
        let a = rating(a).unwrap_or(f64::NEG_INFINITY);
        let b = rating(b).unwrap_or(f64::NEG_INFINITY);
        b.total_cmp(&a)
    });
}
