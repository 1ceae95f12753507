/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// The reference carries no identity we can resolve. Caller bug, never retried.
    #[error("Cannot resolve show reference: {0}")]
    Resolution(String),

    /// A mandatory provider fetch failed while resolving a show.
    #[error("Provider error: {0}")]
    Provider(String),

    /// The store rejected a write because a column does not exist.
    #[error("Store column unavailable: {0}")]
    MissingColumn(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the store failed because its schema lacks a column we tried to write.
    pub fn is_missing_column(&self) -> bool {
        matches!(self, AppError::MissingColumn(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;
