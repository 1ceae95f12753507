use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CatalogShow, EnrichmentResult, ExternalId};

/// Palette the color tag is drawn from. Assigned once per external id.
pub const COLOR_TAGS: [&str; 8] = [
    "#9334E9", "#FF5E00", "#8BFC76", "#3B82F6", "#EF4444", "#F59E0B", "#14B8A6", "#EC4899",
];

/// A persisted show. `id` is assigned once and never changes.
///
/// Fields marked `sqlx(default)` live in columns that older schemas may not
/// have; when a row comes back without them they read as `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct CanonicalShowRecord {
    pub id: Uuid,
    #[sqlx(try_from = "i64")]
    pub external_id: ExternalId,
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<i64>,
    pub tmdb_id: Option<i64>,
    #[sqlx(default)]
    pub tvmaze_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub rating: Option<f64>,
    pub genres: Vec<String>,
    pub network: Option<String>,
    pub country: Option<String>,
    pub language: Option<String>,
    pub poster_url: Option<String>,
    #[sqlx(default)]
    pub backdrop_url: Option<String>,
    #[sqlx(default)]
    pub total_seasons: Option<i32>,
    pub total_episodes: Option<i32>,
    #[sqlx(default)]
    pub color_tag: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Columns added after the original schema. Dropped on a degraded save.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedColumns {
    pub tvmaze_id: Option<i64>,
    pub backdrop_url: Option<String>,
    pub total_seasons: Option<i32>,
    pub color_tag: String,
}

/// Everything the store needs to upsert a show, keyed by `external_id`
#[derive(Debug, Clone, PartialEq)]
pub struct ShowPayload {
    pub external_id: ExternalId,
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<i64>,
    pub tmdb_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub rating: Option<f64>,
    pub genres: Vec<String>,
    pub network: Option<String>,
    pub country: Option<String>,
    pub language: Option<String>,
    pub poster_url: Option<String>,
    pub total_episodes: Option<i32>,
    pub extended: Option<ExtendedColumns>,
}

impl ShowPayload {
    /// Builds the payload from a catalog record and whatever enrichment found
    pub fn from_catalog(
        show: &CatalogShow,
        enrichment: &EnrichmentResult,
        color_tag: String,
    ) -> Self {
        Self {
            external_id: show.external_id(),
            imdb_id: show
                .ids
                .imdb
                .clone()
                .or_else(|| enrichment.cross_ids.imdb.clone()),
            tvdb_id: show.ids.tvdb.map(|id| id as i64),
            tmdb_id: show
                .ids
                .tmdb
                .or(enrichment.cross_ids.tmdb)
                .map(|id| id as i64),
            title: show.title.clone(),
            description: show.overview.clone(),
            year: show.year,
            rating: show.rating.map(round_rating),
            genres: show.genres.clone(),
            network: show.network.clone(),
            country: show.country.clone(),
            language: show.language.clone(),
            poster_url: enrichment.poster_url.clone(),
            total_episodes: show.aired_episodes.map(|n| n as i32),
            extended: Some(ExtendedColumns {
                tvmaze_id: enrichment.cross_ids.tvmaze.map(|id| id as i64),
                backdrop_url: enrichment.backdrop_url.clone(),
                total_seasons: enrichment.total_seasons.map(|n| n as i32),
                color_tag,
            }),
        }
    }

    /// Same payload without the extended columns
    pub fn reduced(&self) -> Self {
        Self {
            extended: None,
            ..self.clone()
        }
    }
}

/// Picks a color tag for a show seen for the first time
pub fn pick_color_tag() -> String {
    let index = Uuid::new_v4().as_bytes()[0] as usize % COLOR_TAGS.len();
    COLOR_TAGS[index].to_string()
}

/// Ratings are stored with one decimal place
pub fn round_rating(rating: f64) -> f64 {
    (rating * 10.0).round() / 10.0
}
