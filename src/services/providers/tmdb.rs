/// TMDB provider: the rich source for posters, backdrops and keywords
///
/// API Flow:
/// 1. If the catalog gave us a TMDB id, use it; otherwise `/search/tv` by title + year.
/// 2. `/tv/{id}?append_to_response=keywords,external_ids` for artwork, keywords and IMDb id.
use crate::{
    error::AppResult,
    models::{MetadataQuery, ProviderMetadata},
    services::providers::{check_status, MetadataProvider},
};
use reqwest::Client as HttpClient;
use serde::Deserialize;

const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
const POSTER_SIZE: &str = "w500";
const BACKDROP_SIZE: &str = "w1280";

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    results: Vec<TmdbSearchResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbSearchResult {
    id: u64,
}

/// `/tv/{id}` response with keywords and external ids appended
#[derive(Debug, Deserialize)]
pub struct TmdbShowDetails {
    pub id: u64,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub keywords: Option<TmdbKeywords>,
    #[serde(default)]
    pub external_ids: Option<TmdbExternalIds>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbKeywords {
    #[serde(default)]
    pub results: Vec<TmdbKeyword>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbKeyword {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TmdbExternalIds {
    #[serde(default)]
    pub imdb_id: Option<String>,
}

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbProvider {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
        }
    }

    /// Finds the TMDB id by title, narrowed by first-air year when known
    async fn search_id(&self, title: &str, year: Option<i32>) -> AppResult<Option<u64>> {
        let url = format!("{}/search/tv", self.api_url);

        let mut query = vec![
            ("api_key", self.api_key.clone()),
            ("query", title.to_string()),
        ];
        if let Some(year) = year {
            query.push(("first_air_date_year", year.to_string()));
        }

        let response = self.http_client.get(&url).query(&query).send().await?;
        let response = check_status(response, "TMDB").await?;
        let search: TmdbSearchResponse = response.json().await?;

        Ok(search.results.first().map(|r| r.id))
    }

    async fn details(&self, tmdb_id: u64) -> AppResult<TmdbShowDetails> {
        let url = format!("{}/tv/{}", self.api_url, tmdb_id);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("append_to_response", "keywords,external_ids"),
            ])
            .send()
            .await?;

        let response = check_status(response, "TMDB").await?;
        Ok(response.json().await?)
    }
}

fn image_url(size: &str, path: Option<&str>) -> Option<String> {
    path.filter(|p| !p.is_empty())
        .map(|p| format!("{}/{}{}", IMAGE_BASE_URL, size, p))
}

/// Converts a details response into the provider-neutral shape
pub fn metadata_from_details(details: TmdbShowDetails) -> ProviderMetadata {
    ProviderMetadata {
        poster_url: image_url(POSTER_SIZE, details.poster_path.as_deref()),
        backdrop_url: image_url(BACKDROP_SIZE, details.backdrop_path.as_deref()),
        imdb_id: details.external_ids.and_then(|e| e.imdb_id),
        tmdb_id: Some(details.id),
        tvmaze_id: None,
        keywords: details
            .keywords
            .map(|k| k.results.into_iter().map(|kw| kw.name).collect())
            .unwrap_or_default(),
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn lookup(&self, query: &MetadataQuery) -> AppResult<Option<ProviderMetadata>> {
        let tmdb_id = match query.tmdb_id {
            Some(id) => id,
            None => match self.search_id(&query.title, query.year).await? {
                Some(id) => id,
                None => {
                    tracing::debug!(title = %query.title, provider = "tmdb", "No search results");
                    return Ok(None);
                }
            },
        };

        let metadata = metadata_from_details(self.details(tmdb_id).await?);

        tracing::debug!(
            tmdb_id = tmdb_id,
            poster = metadata.poster_url.is_some(),
            keywords = metadata.keywords.len(),
            provider = "tmdb",
            "Metadata fetched"
        );

        Ok(Some(metadata))
    }
}
