use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{show::round_rating, CanonicalShowRecord, CatalogShow, EnrichmentResult, ExternalId};

/// A show under consideration, with enrichment once it has been fetched
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub show: CatalogShow,
    pub enrichment: Option<EnrichmentResult>,
}

impl Candidate {
    pub fn new(show: CatalogShow, enrichment: Option<EnrichmentResult>) -> Self {
        Self { show, enrichment }
    }

    pub fn keywords(&self) -> &[String] {
        self.enrichment
            .as_ref()
            .map(|e| e.keywords.as_slice())
            .unwrap_or(&[])
    }
}

/// A candidate with its similarity score against the seed, in `[0, 100]`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoredShow {
    pub show: CatalogShow,
    pub enrichment: Option<EnrichmentResult>,
    pub score: f64,
}

/// Where a "for you" entry came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    /// The viewer logged this show recently
    Logged,
    /// Trending or genre pick from the catalog provider
    Provider,
    /// Top-rated stored show, used when the provider is down
    StoreFallback,
}

/// One entry of the "for you" list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendedShow {
    pub canonical_id: Option<Uuid>,
    pub external_id: ExternalId,
    pub title: String,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub rating: Option<f64>,
    pub genres: Vec<String>,
    pub total_seasons: Option<i32>,
    pub total_episodes: Option<i32>,
    pub source: RecommendationSource,
}

impl RecommendedShow {
    pub fn from_record(record: &CanonicalShowRecord, source: RecommendationSource) -> Self {
        Self {
            canonical_id: Some(record.id),
            external_id: record.external_id,
            title: record.title.clone(),
            description: record.description.clone(),
            poster_url: record.poster_url.clone(),
            rating: record.rating,
            genres: record.genres.clone(),
            total_seasons: record.total_seasons,
            total_episodes: record.total_episodes,
            source,
        }
    }
}

impl From<&CatalogShow> for RecommendedShow {
    fn from(show: &CatalogShow) -> Self {
        Self {
            canonical_id: None,
            external_id: show.external_id(),
            title: show.title.clone(),
            description: show.overview.clone(),
            poster_url: None,
            rating: show.rating.map(round_rating),
            genres: show.genres.clone(),
            total_seasons: None,
            total_episodes: show.aired_episodes.map(|n| n as i32),
            source: RecommendationSource::Provider,
        }
    }
}
