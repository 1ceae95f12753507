/// External show data providers
///
/// The primary catalog mints the external ids every other part of the crate
/// keys on. Metadata providers only decorate a catalog show with artwork,
/// keywords and cross-reference ids, and any of them may fail or know nothing.
use crate::{
    error::{AppError, AppResult},
    models::{CatalogSeason, CatalogShow, ExternalId, MetadataQuery, ProviderMetadata},
};

pub mod omdb;
pub mod tmdb;
pub mod trakt;
pub mod tvmaze;

pub use omdb::OmdbProvider;
pub use tmdb::TmdbProvider;
pub use trakt::TraktProvider;
pub use tvmaze::TvMazeProvider;

/// Trait for the primary catalog provider
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Shows the catalog considers related to `id`
    async fn related_shows(&self, id: ExternalId, limit: usize) -> AppResult<Vec<CatalogShow>>;

    /// Popular shows tagged with `genre`
    async fn popular_by_genre(&self, genre: &str, limit: usize) -> AppResult<Vec<CatalogShow>>;

    /// Shows trending right now
    async fn trending(&self, limit: usize) -> AppResult<Vec<CatalogShow>>;

    /// Full record for one show, always fetched fresh
    async fn show_details(&self, id: ExternalId) -> AppResult<CatalogShow>;

    /// Season list including specials and per-episode air dates
    async fn seasons(&self, id: ExternalId) -> AppResult<Vec<CatalogSeason>>;
}

/// Trait for a secondary metadata provider
///
/// `Ok(None)` means the provider answered but does not know the show.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn lookup(&self, query: &MetadataQuery) -> AppResult<Option<ProviderMetadata>>;
}

/// Turns a non-success response into `AppError::ExternalApi`
pub(crate) async fn check_status(
    response: reqwest::Response,
    provider: &str,
) -> AppResult<reqwest::Response> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::ExternalApi(format!(
            "{} API returned status {}: {}",
            provider, status, body
        )));
    }

    Ok(response)
}
