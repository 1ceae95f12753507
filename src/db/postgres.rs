use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::{
    db::ShowStore,
    error::{AppError, AppResult},
    models::{CanonicalShowRecord, ExternalId, ShowPayload},
};

/// SQLSTATE for `undefined_column`
const UNDEFINED_COLUMN: &str = "42703";

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the migrations under `migrations/`
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Maps driver errors, singling out writes to a column the schema lacks
fn map_store_error(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.code().as_deref() == Some(UNDEFINED_COLUMN) {
            return AppError::MissingColumn(db_err.message().to_string());
        }
    }
    AppError::Database(e)
}

/// `ShowStore` backed by the `shows` table
///
/// Upserts go through `ON CONFLICT (external_id)`, so concurrent saves of the
/// same show converge on one row.
#[derive(Clone)]
pub struct PgShowStore {
    pool: PgPool,
}

impl PgShowStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn upsert_full(&self, payload: &ShowPayload) -> AppResult<CanonicalShowRecord> {
        let Some(extended) = payload.extended.as_ref() else {
            return self.upsert_base(payload).await;
        };

        sqlx::query_as::<_, CanonicalShowRecord>(
            r#"
            INSERT INTO shows (
                external_id, imdb_id, tvdb_id, tmdb_id, title, description, year, rating,
                genres, network, country, language, poster_url, total_episodes,
                tvmaze_id, backdrop_url, total_seasons, color_tag, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, NOW())
            ON CONFLICT (external_id) DO UPDATE SET
                imdb_id = EXCLUDED.imdb_id,
                tvdb_id = EXCLUDED.tvdb_id,
                tmdb_id = EXCLUDED.tmdb_id,
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                year = EXCLUDED.year,
                rating = EXCLUDED.rating,
                genres = EXCLUDED.genres,
                network = EXCLUDED.network,
                country = EXCLUDED.country,
                language = EXCLUDED.language,
                poster_url = COALESCE(EXCLUDED.poster_url, shows.poster_url),
                total_episodes = EXCLUDED.total_episodes,
                tvmaze_id = COALESCE(EXCLUDED.tvmaze_id, shows.tvmaze_id),
                backdrop_url = COALESCE(EXCLUDED.backdrop_url, shows.backdrop_url),
                total_seasons = COALESCE(EXCLUDED.total_seasons, shows.total_seasons),
                color_tag = COALESCE(shows.color_tag, EXCLUDED.color_tag),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(payload.external_id as i64)
        .bind(payload.imdb_id.clone())
        .bind(payload.tvdb_id)
        .bind(payload.tmdb_id)
        .bind(payload.title.clone())
        .bind(payload.description.clone())
        .bind(payload.year)
        .bind(payload.rating)
        .bind(payload.genres.clone())
        .bind(payload.network.clone())
        .bind(payload.country.clone())
        .bind(payload.language.clone())
        .bind(payload.poster_url.clone())
        .bind(payload.total_episodes)
        .bind(extended.tvmaze_id)
        .bind(extended.backdrop_url.clone())
        .bind(extended.total_seasons)
        .bind(extended.color_tag.clone())
        .fetch_one(&self.pool)
        .await
        .map_err(map_store_error)
    }

    /// Writes and returns only the columns every schema version has
    async fn upsert_base(&self, payload: &ShowPayload) -> AppResult<CanonicalShowRecord> {
        sqlx::query_as::<_, CanonicalShowRecord>(
            r#"
            INSERT INTO shows (
                external_id, imdb_id, tvdb_id, tmdb_id, title, description, year, rating,
                genres, network, country, language, poster_url, total_episodes, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, NOW())
            ON CONFLICT (external_id) DO UPDATE SET
                imdb_id = EXCLUDED.imdb_id,
                tvdb_id = EXCLUDED.tvdb_id,
                tmdb_id = EXCLUDED.tmdb_id,
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                year = EXCLUDED.year,
                rating = EXCLUDED.rating,
                genres = EXCLUDED.genres,
                network = EXCLUDED.network,
                country = EXCLUDED.country,
                language = EXCLUDED.language,
                poster_url = COALESCE(EXCLUDED.poster_url, shows.poster_url),
                total_episodes = EXCLUDED.total_episodes,
                updated_at = NOW()
            RETURNING id, external_id, imdb_id, tvdb_id, tmdb_id, title, description, year,
                      rating, genres, network, country, language, poster_url, total_episodes,
                      updated_at
            "#,
        )
        .bind(payload.external_id as i64)
        .bind(payload.imdb_id.clone())
        .bind(payload.tvdb_id)
        .bind(payload.tmdb_id)
        .bind(payload.title.clone())
        .bind(payload.description.clone())
        .bind(payload.year)
        .bind(payload.rating)
        .bind(payload.genres.clone())
        .bind(payload.network.clone())
        .bind(payload.country.clone())
        .bind(payload.language.clone())
        .bind(payload.poster_url.clone())
        .bind(payload.total_episodes)
        .fetch_one(&self.pool)
        .await
        .map_err(map_store_error)
    }
}

#[async_trait::async_trait]
impl ShowStore for PgShowStore {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<CanonicalShowRecord>> {
        let record = sqlx::query_as::<_, CanonicalShowRecord>("SELECT * FROM shows WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_store_error)?;

        Ok(record)
    }

    async fn get_by_external_id(
        &self,
        external_id: ExternalId,
    ) -> AppResult<Option<CanonicalShowRecord>> {
        let record = sqlx::query_as::<_, CanonicalShowRecord>(
            "SELECT * FROM shows WHERE external_id = $1",
        )
        .bind(external_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_store_error)?;

        Ok(record)
    }

    async fn color_tag_for(&self, external_id: ExternalId) -> AppResult<Option<String>> {
        let tag: Option<Option<String>> =
            sqlx::query_scalar("SELECT color_tag FROM shows WHERE external_id = $1")
                .bind(external_id as i64)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_store_error)?;

        Ok(tag.flatten())
    }

    async fn upsert_show(&self, payload: &ShowPayload) -> AppResult<CanonicalShowRecord> {
        let record = self.upsert_full(payload).await?;

        tracing::debug!(
            external_id = payload.external_id,
            show_id = %record.id,
            reduced = payload.extended.is_none(),
            "Show upserted"
        );

        Ok(record)
    }

    async fn logged_shows(&self, user_id: Uuid) -> AppResult<Vec<CanonicalShowRecord>> {
        let records = sqlx::query_as::<_, CanonicalShowRecord>(
            r#"
            SELECT s.*
            FROM shows s
            JOIN (
                SELECT show_id, MAX(created_at) AS last_logged_at
                FROM posts
                WHERE user_id = $1 AND show_id IS NOT NULL
                GROUP BY show_id
            ) p ON p.show_id = s.id
            ORDER BY p.last_logged_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_store_error)?;

        Ok(records)
    }

    async fn top_rated_shows(&self, limit: usize) -> AppResult<Vec<CanonicalShowRecord>> {
        let records = sqlx::query_as::<_, CanonicalShowRecord>(
            r#"
            SELECT * FROM shows
            WHERE rating IS NOT NULL
            ORDER BY rating DESC, updated_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_store_error)?;

        Ok(records)
    }
}
