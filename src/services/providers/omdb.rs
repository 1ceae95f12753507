/// OMDb provider: secondary poster source and IMDb id
use crate::{
    error::AppResult,
    models::{MetadataQuery, ProviderMetadata},
    services::providers::{check_status, MetadataProvider},
};
use reqwest::Client as HttpClient;
use serde::Deserialize;

/// OMDb answers 200 for misses too; `Response` says which it was
#[derive(Debug, Deserialize)]
pub struct OmdbResponse {
    #[serde(rename = "Response")]
    pub response: String,
    #[serde(rename = "Poster", default)]
    pub poster: Option<String>,
    #[serde(rename = "imdbID", default)]
    pub imdb_id: Option<String>,
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct OmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl OmdbProvider {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
        }
    }
}

/// `None` when OMDb reported a miss
pub fn metadata_from_response(response: OmdbResponse) -> Option<ProviderMetadata> {
    if response.response != "True" {
        return None;
    }

    Some(ProviderMetadata {
        poster_url: response
            .poster
            .filter(|p| p != "N/A" && !p.is_empty()),
        imdb_id: response.imdb_id,
        ..Default::default()
    })
}

#[async_trait::async_trait]
impl MetadataProvider for OmdbProvider {
    async fn lookup(&self, query: &MetadataQuery) -> AppResult<Option<ProviderMetadata>> {
        let url = format!("{}/", self.api_url);

        let mut params = vec![("apikey", self.api_key.clone())];
        match &query.imdb_id {
            Some(imdb_id) => params.push(("i", imdb_id.clone())),
            None => {
                params.push(("t", query.title.clone()));
                params.push(("type", "series".to_string()));
                if let Some(year) = query.year {
                    params.push(("y", year.to_string()));
                }
            }
        }

        let response = self.http_client.get(&url).query(&params).send().await?;
        let response = check_status(response, "OMDb").await?;
        let body: OmdbResponse = response.json().await?;

        if body.response != "True" {
            tracing::debug!(
                title = %query.title,
                error = ?body.error,
                provider = "omdb",
                "No match"
            );
        }

        Ok(metadata_from_response(body))
    }
}
