use chrono::{DateTime, Datelike, Utc};

use crate::models::{CatalogSeason, CatalogShow, CrossIds, EnrichmentResult, ProviderMetadata};

/// What each fan-out branch produced; `None` if it failed or knew nothing
#[derive(Debug, Default, Clone)]
pub struct BranchResults {
    /// Provider A: poster, backdrop, keywords
    pub primary: Option<ProviderMetadata>,
    /// Provider B: secondary poster, IMDb id
    pub secondary: Option<ProviderMetadata>,
    /// Provider C: tertiary poster, TVMaze id
    pub tertiary: Option<ProviderMetadata>,
    pub seasons: Option<Vec<CatalogSeason>>,
}

/// Merges the branches by fixed precedence
///
/// poster = A, then B, then C. Backdrop and keywords come from A only.
/// IMDb id = catalog, then B. Season count and end year come from the
/// season list alone, so losing it never blanks the artwork.
pub fn merge(show: &CatalogShow, branches: BranchResults, now: DateTime<Utc>) -> EnrichmentResult {
    let BranchResults {
        primary,
        secondary,
        tertiary,
        seasons,
    } = branches;

    let poster_url = [&primary, &secondary, &tertiary]
        .into_iter()
        .find_map(|branch| branch.as_ref().and_then(|m| m.poster_url.clone()));

    let cross_ids = CrossIds {
        imdb: show
            .ids
            .imdb
            .clone()
            .or_else(|| secondary.as_ref().and_then(|m| m.imdb_id.clone())),
        tmdb: show
            .ids
            .tmdb
            .or_else(|| primary.as_ref().and_then(|m| m.tmdb_id)),
        tvmaze: tertiary.as_ref().and_then(|m| m.tvmaze_id),
    };

    let (backdrop_url, keywords) = match primary {
        Some(a) => (a.backdrop_url, a.keywords),
        None => (None, Vec::new()),
    };

    let (total_seasons, end_year) = match seasons.as_deref() {
        Some(seasons) => (
            Some(count_regular_seasons(seasons)),
            last_aired_year(seasons, now),
        ),
        None => (None, None),
    };

    EnrichmentResult {
        external_id: show.external_id(),
        is_enriched: poster_url.is_some(),
        poster_url,
        backdrop_url,
        cross_ids,
        keywords,
        total_seasons,
        end_year,
    }
}

/// Seasons with a positive number. Season 0 holds specials.
pub fn count_regular_seasons(seasons: &[CatalogSeason]) -> u32 {
    seasons.iter().filter(|s| s.number > 0).count() as u32
}

/// Year of the latest episode that has aired by `now`
///
/// Seasons without episode data fall back to the season's own premiere.
pub fn last_aired_year(seasons: &[CatalogSeason], now: DateTime<Utc>) -> Option<i32> {
    seasons
        .iter()
        .filter(|s| s.number > 0)
        .flat_map(|season| {
            let episode_dates = season.episodes.iter().filter_map(|e| e.first_aired);
            let fallback = season.episodes.is_empty().then_some(season.first_aired).flatten();
            episode_dates.chain(fallback)
        })
        .filter(|aired| *aired <= now)
        .max()
        .map(|aired| aired.year())
}
