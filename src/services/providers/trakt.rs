/// Trakt API provider, the primary catalog
///
/// Trakt ids are the external ids of this crate. List endpoints go through
/// the Redis cache; show details never do, so a seed is always current.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::AppResult,
    models::{CatalogSeason, CatalogShow, CatalogTrendingEntry, ExternalId},
    services::providers::{check_status, CatalogProvider},
};
use reqwest::Client as HttpClient;

const LIST_CACHE_TTL: u64 = 3600; // 1 hour
const SEASONS_CACHE_TTL: u64 = 86400; // 1 day
const API_VERSION: &str = "2";

#[derive(Clone)]
pub struct TraktProvider {
    http_client: HttpClient,
    client_id: String,
    api_url: String,
    cache: Cache,
}

impl TraktProvider {
    pub fn new(cache: Cache, client_id: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            client_id,
            api_url,
            cache,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .header("trakt-api-version", API_VERSION)
            .header("trakt-api-key", &self.client_id)
            .query(query)
            .send()
            .await?;

        let response = check_status(response, "Trakt").await?;
        Ok(response.json().await?)
    }
}

/// Trakt filters genres by slug ("science fiction" -> "science-fiction")
pub fn genre_slug(genre: &str) -> String {
    genre.trim().to_lowercase().replace(' ', "-")
}

#[async_trait::async_trait]
impl CatalogProvider for TraktProvider {
    async fn related_shows(&self, id: ExternalId, limit: usize) -> AppResult<Vec<CatalogShow>> {
        cached!(
            self.cache,
            CacheKey::Related(id, limit),
            LIST_CACHE_TTL,
            async move {
                let shows: Vec<CatalogShow> = self
                    .get_json(
                        &format!("/shows/{}/related", id),
                        &[("limit", limit.to_string()), ("extended", "full".to_string())],
                    )
                    .await?;

                tracing::info!(
                    external_id = id,
                    results = shows.len(),
                    provider = "trakt",
                    "Related shows fetched"
                );

                AppResult::Ok(shows)
            }
        )
    }

    async fn popular_by_genre(&self, genre: &str, limit: usize) -> AppResult<Vec<CatalogShow>> {
        let slug = genre_slug(genre);

        cached!(
            self.cache,
            CacheKey::PopularByGenre(slug.clone(), limit),
            LIST_CACHE_TTL,
            async {
                let shows: Vec<CatalogShow> = self
                    .get_json(
                        "/shows/popular",
                        &[
                            ("genres", slug.clone()),
                            ("limit", limit.to_string()),
                            ("extended", "full".to_string()),
                        ],
                    )
                    .await?;

                tracing::info!(
                    genre = %slug,
                    results = shows.len(),
                    provider = "trakt",
                    "Popular shows by genre fetched"
                );

                AppResult::Ok(shows)
            }
        )
    }

    async fn trending(&self, limit: usize) -> AppResult<Vec<CatalogShow>> {
        cached!(
            self.cache,
            CacheKey::Trending(limit),
            LIST_CACHE_TTL,
            async move {
                let entries: Vec<CatalogTrendingEntry> = self
                    .get_json(
                        "/shows/trending",
                        &[("limit", limit.to_string()), ("extended", "full".to_string())],
                    )
                    .await?;

                AppResult::Ok(entries.into_iter().map(|e| e.show).collect::<Vec<_>>())
            }
        )
    }

    async fn show_details(&self, id: ExternalId) -> AppResult<CatalogShow> {
        let show: CatalogShow = self
            .get_json(&format!("/shows/{}", id), &[("extended", "full".to_string())])
            .await?;

        tracing::debug!(external_id = id, title = %show.title, "Show details fetched");

        Ok(show)
    }

    async fn seasons(&self, id: ExternalId) -> AppResult<Vec<CatalogSeason>> {
        cached!(
            self.cache,
            CacheKey::Seasons(id),
            SEASONS_CACHE_TTL,
            async move {
                self.get_json::<Vec<CatalogSeason>>(
                    &format!("/shows/{}/seasons", id),
                    &[("extended", "full,episodes".to_string())],
                )
                .await
            }
        )
    }
}
