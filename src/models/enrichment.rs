use serde::{Deserialize, Serialize};

use super::{CatalogShow, ExternalId};

/// Ids of the same show in other catalogs
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CrossIds {
    pub imdb: Option<String>,
    pub tmdb: Option<u64>,
    pub tvmaze: Option<u64>,
}

/// Merged metadata for one external show
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichmentResult {
    pub external_id: ExternalId,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub cross_ids: CrossIds,
    pub keywords: Vec<String>,
    /// Seasons with a positive number; specials are excluded
    pub total_seasons: Option<u32>,
    /// Year of the last aired episode
    pub end_year: Option<i32>,
    /// True iff some provider supplied a poster
    pub is_enriched: bool,
}

impl EnrichmentResult {
    /// Result with nothing filled in, returned when every provider failed
    pub fn empty(external_id: ExternalId) -> Self {
        Self {
            external_id,
            poster_url: None,
            backdrop_url: None,
            cross_ids: CrossIds::default(),
            keywords: Vec::new(),
            total_seasons: None,
            end_year: None,
            is_enriched: false,
        }
    }
}

/// What a metadata provider gets to search with
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataQuery {
    pub title: String,
    pub year: Option<i32>,
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<u64>,
    pub tmdb_id: Option<u64>,
}

impl From<&CatalogShow> for MetadataQuery {
    fn from(show: &CatalogShow) -> Self {
        Self {
            title: show.title.clone(),
            year: show.year,
            imdb_id: show.ids.imdb.clone(),
            tvdb_id: show.ids.tvdb,
            tmdb_id: show.ids.tmdb,
        }
    }
}

/// The subset of metadata one provider returned
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderMetadata {
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<u64>,
    pub tvmaze_id: Option<u64>,
    pub keywords: Vec<String>,
}
