use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{CanonicalShowRecord, ExternalId, ShowPayload},
};

/// Persistent show store
///
/// The store owns the uniqueness constraint on `external_id`: however many
/// callers upsert the same external id, exactly one row survives and its
/// canonical id never changes.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ShowStore: Send + Sync {
    /// Point lookup by canonical id
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<CanonicalShowRecord>>;

    /// Point lookup by external id
    async fn get_by_external_id(
        &self,
        external_id: ExternalId,
    ) -> AppResult<Option<CanonicalShowRecord>>;

    /// Color tag already assigned to this external id, if any
    async fn color_tag_for(&self, external_id: ExternalId) -> AppResult<Option<String>>;

    /// Inserts or updates the row for `payload.external_id`
    ///
    /// Fails with [`crate::error::AppError::MissingColumn`] when the schema
    /// lacks one of the extended columns. A payload without extended columns
    /// writes only the base columns and returns `None` for the rest.
    async fn upsert_show(&self, payload: &ShowPayload) -> AppResult<CanonicalShowRecord>;

    /// Shows the user has logged, most recently logged first
    async fn logged_shows(&self, user_id: Uuid) -> AppResult<Vec<CanonicalShowRecord>>;

    /// Stored shows ordered by rating, highest first
    async fn top_rated_shows(&self, limit: usize) -> AppResult<Vec<CanonicalShowRecord>>;
}
