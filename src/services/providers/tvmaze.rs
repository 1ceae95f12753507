/// TVMaze provider: tertiary poster source and TVMaze id
///
/// Looks the show up by IMDb id, then TVDB id. Only when the catalog gave
/// neither does it fall back to a title search.
use crate::{
    error::AppResult,
    models::{MetadataQuery, ProviderMetadata},
    services::providers::{check_status, MetadataProvider},
};
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TvMazeShow {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub image: Option<TvMazeImage>,
    #[serde(default)]
    pub externals: Option<TvMazeExternals>,
}

#[derive(Debug, Deserialize)]
pub struct TvMazeImage {
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub original: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TvMazeExternals {
    #[serde(default)]
    pub imdb: Option<String>,
    #[serde(default)]
    pub thetvdb: Option<u64>,
}

#[derive(Clone)]
pub struct TvMazeProvider {
    http_client: HttpClient,
    api_url: String,
}

impl TvMazeProvider {
    pub fn new(api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
        }
    }

    /// GETs a single show, mapping 404 to `None`
    async fn fetch_show(&self, path: &str, query: &[(&str, String)]) -> AppResult<Option<TvMazeShow>> {
        let url = format!("{}{}", self.api_url, path);
        let response = self.http_client.get(&url).query(query).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = check_status(response, "TVMaze").await?;
        Ok(Some(response.json().await?))
    }

    async fn find_show(&self, query: &MetadataQuery) -> AppResult<Option<TvMazeShow>> {
        if query.imdb_id.is_none() && query.tvdb_id.is_none() {
            tracing::debug!(title = %query.title, provider = "tvmaze", "No cross id, searching by title");
            return self
                .fetch_show("/singlesearch/shows", &[("q", query.title.clone())])
                .await;
        }

        if let Some(imdb_id) = &query.imdb_id {
            if let Some(show) = self
                .fetch_show("/lookup/shows", &[("imdb", imdb_id.clone())])
                .await?
            {
                return Ok(Some(show));
            }
        }

        match query.tvdb_id {
            Some(tvdb_id) => {
                self.fetch_show("/lookup/shows", &[("thetvdb", tvdb_id.to_string())])
                    .await
            }
            None => Ok(None),
        }
    }
}

pub fn metadata_from_show(show: TvMazeShow) -> ProviderMetadata {
    let image = show.image.as_ref();

    ProviderMetadata {
        poster_url: image
            .and_then(|i| i.original.clone())
            .or_else(|| image.and_then(|i| i.medium.clone())),
        imdb_id: show.externals.and_then(|e| e.imdb),
        tvmaze_id: Some(show.id),
        ..Default::default()
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TvMazeProvider {
    async fn lookup(&self, query: &MetadataQuery) -> AppResult<Option<ProviderMetadata>> {
        let show = self.find_show(query).await?;

        if let Some(show) = &show {
            tracing::debug!(
                tvmaze_id = show.id,
                name = %show.name,
                poster = show.image.is_some(),
                provider = "tvmaze",
                "Show found"
            );
        }

        Ok(show.map(metadata_from_show))
    }
}
