use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::ShowStore,
    error::{AppError, AppResult},
    models::{CanonicalShowRecord, ExternalId, ShowPayload},
};

/// In-process `ShowStore` with the same uniqueness contract as Postgres
#[derive(Clone, Default)]
pub struct InMemoryShowStore {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    shows: HashMap<Uuid, CanonicalShowRecord>,
    by_external_id: HashMap<ExternalId, Uuid>,
    /// (user, show) pairs in the order they were logged
    logs: Vec<(Uuid, Uuid)>,
    upserts: usize,
    missing_extended_columns: bool,
}

impl InMemoryShowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose schema predates the extended columns
    pub fn without_extended_columns() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryInner {
                missing_extended_columns: true,
                ..Default::default()
            })),
        }
    }

    /// Number of upsert calls that reached the store, including failed ones
    pub async fn upsert_count(&self) -> usize {
        self.inner.read().await.upserts
    }

    pub async fn record_count(&self) -> usize {
        self.inner.read().await.shows.len()
    }

    /// Records that `user_id` logged an episode of `show_id`
    pub async fn log_show(&self, user_id: Uuid, show_id: Uuid) {
        self.inner.write().await.logs.push((user_id, show_id));
    }
}

#[async_trait::async_trait]
impl ShowStore for InMemoryShowStore {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<CanonicalShowRecord>> {
        Ok(self.inner.read().await.shows.get(&id).cloned())
    }

    async fn get_by_external_id(
        &self,
        external_id: ExternalId,
    ) -> AppResult<Option<CanonicalShowRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_external_id
            .get(&external_id)
            .and_then(|id| inner.shows.get(id))
            .cloned())
    }

    async fn color_tag_for(&self, external_id: ExternalId) -> AppResult<Option<String>> {
        let inner = self.inner.read().await;
        if inner.missing_extended_columns {
            return Err(AppError::MissingColumn("color_tag".to_string()));
        }
        Ok(inner
            .by_external_id
            .get(&external_id)
            .and_then(|id| inner.shows.get(id))
            .and_then(|show| show.color_tag.clone()))
    }

    async fn upsert_show(&self, payload: &ShowPayload) -> AppResult<CanonicalShowRecord> {
        let mut inner = self.inner.write().await;
        inner.upserts += 1;

        if inner.missing_extended_columns && payload.extended.is_some() {
            return Err(AppError::MissingColumn("backdrop_url".to_string()));
        }

        let existing = inner
            .by_external_id
            .get(&payload.external_id)
            .and_then(|id| inner.shows.get(id))
            .cloned();

        let extended = payload.extended.as_ref();
        let record = CanonicalShowRecord {
            id: existing.as_ref().map(|s| s.id).unwrap_or_else(Uuid::new_v4),
            external_id: payload.external_id,
            imdb_id: payload.imdb_id.clone(),
            tvdb_id: payload.tvdb_id,
            tmdb_id: payload.tmdb_id,
            tvmaze_id: extended
                .and_then(|e| e.tvmaze_id)
                .or_else(|| existing.as_ref().and_then(|s| s.tvmaze_id)),
            title: payload.title.clone(),
            description: payload.description.clone(),
            year: payload.year,
            rating: payload.rating,
            genres: payload.genres.clone(),
            network: payload.network.clone(),
            country: payload.country.clone(),
            language: payload.language.clone(),
            poster_url: payload
                .poster_url
                .clone()
                .or_else(|| existing.as_ref().and_then(|s| s.poster_url.clone())),
            backdrop_url: extended
                .and_then(|e| e.backdrop_url.clone())
                .or_else(|| existing.as_ref().and_then(|s| s.backdrop_url.clone())),
            total_seasons: extended
                .and_then(|e| e.total_seasons)
                .or_else(|| existing.as_ref().and_then(|s| s.total_seasons)),
            total_episodes: payload.total_episodes,
            color_tag: existing
                .as_ref()
                .and_then(|s| s.color_tag.clone())
                .or_else(|| extended.map(|e| e.color_tag.clone())),
            updated_at: Utc::now(),
        };

        inner.by_external_id.insert(record.external_id, record.id);
        inner.shows.insert(record.id, record.clone());

        Ok(record)
    }

    async fn logged_shows(&self, user_id: Uuid) -> AppResult<Vec<CanonicalShowRecord>> {
        let inner = self.inner.read().await;
        let mut seen = Vec::new();

        for (user, show_id) in inner.logs.iter().rev() {
            if *user == user_id && !seen.contains(show_id) {
                seen.push(*show_id);
            }
        }

        Ok(seen
            .iter()
            .filter_map(|id| inner.shows.get(id).cloned())
            .collect())
    }

    async fn top_rated_shows(&self, limit: usize) -> AppResult<Vec<CanonicalShowRecord>> {
        let inner = self.inner.read().await;
        let mut shows: Vec<CanonicalShowRecord> = inner
            .shows
            .values()
            .filter(|s| s.rating.is_some())
            .cloned()
            .collect();

        shows.sort_by(|a, b| {
            b.rating
                .partial_cmp(&a.rating)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        shows.truncate(limit);

        Ok(shows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtendedColumns;

    fn payload(external_id: ExternalId, title: &str, rating: Option<f64>) -> ShowPayload {
        ShowPayload {
            external_id,
            imdb_id: None,
            tvdb_id: None,
            tmdb_id: None,
            title: title.to_string(),
            description: None,
            year: Some(2020),
            rating,
            genres: vec!["drama".to_string()],
            network: None,
            country: None,
            language: None,
            poster_url: None,
            total_episodes: None,
            extended: Some(ExtendedColumns {
                tvmaze_id: Some(5),
                backdrop_url: Some("https://img/backdrop.jpg".to_string()),
                total_seasons: Some(2),
                color_tag: "#3B82F6".to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn test_upsert_same_external_id_keeps_one_row() {
        let store = InMemoryShowStore::new();

        let first = store.upsert_show(&payload(1, "Fargo", Some(8.9))).await.unwrap();
        let mut again = payload(1, "Fargo (2014)", Some(8.9));
        again.extended.as_mut().unwrap().color_tag = "#EF4444".to_string();
        let second = store.upsert_show(&again).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.title, "Fargo (2014)");
        assert_eq!(second.color_tag.as_deref(), Some("#3B82F6"));
        assert_eq!(store.record_count().await, 1);
        assert_eq!(store.upsert_count().await, 2);
    }

    #[tokio::test]
    async fn test_upsert_keeps_known_extended_values() {
        let store = InMemoryShowStore::new();
        let mut first = payload(3, "Atlanta", Some(8.5));
        first.poster_url = Some("https://img/poster.jpg".to_string());
        store.upsert_show(&first).await.unwrap();

        let mut sparse = payload(3, "Atlanta", Some(8.6));
        sparse.extended = Some(ExtendedColumns {
            tvmaze_id: None,
            backdrop_url: None,
            total_seasons: None,
            color_tag: "#EF4444".to_string(),
        });
        let second = store.upsert_show(&sparse).await.unwrap();

        assert_eq!(second.rating, Some(8.6));
        assert_eq!(second.tvmaze_id, Some(5));
        assert_eq!(second.backdrop_url.as_deref(), Some("https://img/backdrop.jpg"));
        assert_eq!(second.total_seasons, Some(2));
        assert_eq!(second.poster_url.as_deref(), Some("https://img/poster.jpg"));

        let reduced = store.upsert_show(&sparse.reduced()).await.unwrap();
        assert_eq!(reduced.backdrop_url.as_deref(), Some("https://img/backdrop.jpg"));
        assert_eq!(reduced.total_seasons, Some(2));
    }

    #[tokio::test]
    async fn test_missing_columns_reject_extended_payload() {
        let store = InMemoryShowStore::without_extended_columns();

        let err = store.upsert_show(&payload(2, "Dark", None)).await.unwrap_err();
        assert!(err.is_missing_column());

        let record = store
            .upsert_show(&payload(2, "Dark", None).reduced())
            .await
            .unwrap();
        assert_eq!(record.backdrop_url, None);
        assert_eq!(record.color_tag, None);
        assert_eq!(record.total_seasons, None);
    }

    #[tokio::test]
    async fn test_logged_shows_most_recent_first() {
        let store = InMemoryShowStore::new();
        let user = Uuid::new_v4();
        let a = store.upsert_show(&payload(10, "A", None)).await.unwrap();
        let b = store.upsert_show(&payload(11, "B", None)).await.unwrap();

        store.log_show(user, a.id).await;
        store.log_show(user, b.id).await;
        store.log_show(user, a.id).await;
        store.log_show(Uuid::new_v4(), b.id).await;

        let logged = store.logged_shows(user).await.unwrap();
        let titles: Vec<&str> = logged.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_top_rated_orders_and_limits() {
        let store = InMemoryShowStore::new();
        store.upsert_show(&payload(1, "Low", Some(6.0))).await.unwrap();
        store.upsert_show(&payload(2, "High", Some(9.1))).await.unwrap();
        store.upsert_show(&payload(3, "Unrated", None)).await.unwrap();
        store.upsert_show(&payload(4, "Mid", Some(7.5))).await.unwrap();

        let top = store.top_rated_shows(2).await.unwrap();
        let titles: Vec<&str> = top.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["High", "Mid"]);
    }
}
