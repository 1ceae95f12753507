use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod enrichment;
pub mod recommendation;
pub mod reference;
pub mod show;

pub use enrichment::{CrossIds, EnrichmentResult, MetadataQuery, ProviderMetadata};
pub use recommendation::{Candidate, RecommendationSource, RecommendedShow, ScoredShow};
pub use reference::ShowReference;
pub use show::{pick_color_tag, CanonicalShowRecord, ExtendedColumns, ShowPayload};

/// Identifier minted by the primary catalog provider. Unique per show.
pub type ExternalId = u64;

// ============================================================================
// Primary Catalog (Trakt) API Types
// ============================================================================

/// Cross-reference ids the catalog attaches to each show
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogIds {
    pub trakt: ExternalId,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub tvdb: Option<u64>,
    #[serde(default)]
    pub imdb: Option<String>,
    #[serde(default)]
    pub tmdb: Option<u64>,
}

/// A show as returned by the primary catalog with `extended=full`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogShow {
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    pub ids: CatalogIds,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub aired_episodes: Option<u32>,
}

impl CatalogShow {
    pub fn external_id(&self) -> ExternalId {
        self.ids.trakt
    }

    /// First listed genre, which the catalog orders by relevance
    pub fn primary_genre(&self) -> Option<&str> {
        self.genres.first().map(String::as_str)
    }
}

/// Wrapper the catalog uses for trending lists
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogTrendingEntry {
    pub show: CatalogShow,
}

/// One season from `/shows/{id}/seasons?extended=full,episodes`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogSeason {
    pub number: u32,
    #[serde(default)]
    pub episode_count: Option<u32>,
    #[serde(default)]
    pub aired_episodes: Option<u32>,
    #[serde(default)]
    pub first_aired: Option<DateTime<Utc>>,
    #[serde(default)]
    pub episodes: Vec<CatalogEpisode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogEpisode {
    pub season: u32,
    pub number: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub first_aired: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_show_deserialization() {
        let json = r#"{
            "title": "Breaking Bad",
            "year": 2008,
            "ids": {
                "trakt": 1388,
                "slug": "breaking-bad",
                "tvdb": 81189,
                "imdb": "tt0903747",
                "tmdb": 1396
            },
            "rating": 9.01,
            "votes": 120000,
            "genres": ["drama", "crime", "thriller"],
            "network": "AMC",
            "country": "us",
            "language": "en",
            "aired_episodes": 62,
            "status": "ended"
        }"#;

        let show: CatalogShow = serde_json::from_str(json).unwrap();
        assert_eq!(show.external_id(), 1388);
        assert_eq!(show.ids.imdb.as_deref(), Some("tt0903747"));
        assert_eq!(show.primary_genre(), Some("drama"));
        assert_eq!(show.aired_episodes, Some(62));
        assert_eq!(show.overview, None);
    }

    #[test]
    fn test_catalog_show_tolerates_nulls() {
        let json = r#"{
            "title": "Obscure Pilot",
            "year": null,
            "ids": { "trakt": 7, "slug": null, "tvdb": null, "imdb": null, "tmdb": null }
        }"#;

        let show: CatalogShow = serde_json::from_str(json).unwrap();
        assert_eq!(show.year, None);
        assert!(show.genres.is_empty());
        assert_eq!(show.primary_genre(), None);
    }

    #[test]
    fn test_trending_entry_deserialization() {
        let json = r#"[{ "watchers": 312, "show": { "title": "Severance", "year": 2022, "ids": { "trakt": 154997 } } }]"#;

        let entries: Vec<CatalogTrendingEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].show.external_id(), 154997);
    }

    #[test]
    fn test_season_with_episodes_deserialization() {
        let json = r#"{
            "number": 1,
            "episode_count": 2,
            "aired_episodes": 2,
            "first_aired": "2008-01-21T02:00:00.000Z",
            "episodes": [
                { "season": 1, "number": 1, "title": "Pilot", "first_aired": "2008-01-21T02:00:00.000Z" },
                { "season": 1, "number": 2, "title": "Cat's in the Bag...", "first_aired": null }
            ]
        }"#;

        let season: CatalogSeason = serde_json::from_str(json).unwrap();
        assert_eq!(season.number, 1);
        assert_eq!(season.episodes.len(), 2);
        assert!(season.episodes[0].first_aired.is_some());
        assert!(season.episodes[1].first_aired.is_none());
    }
}
