pub mod memory;
pub mod postgres;
pub mod redis;
pub mod store;

pub use memory::InMemoryShowStore;
pub use postgres::{create_pool, run_migrations, PgShowStore};
pub use redis::create_redis_client;
pub use redis::Cache;
pub use redis::CacheKey;
pub use store::ShowStore;

#[cfg(test)]
pub use store::MockShowStore;
