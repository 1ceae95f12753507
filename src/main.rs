//! showrank CLI
//!
//! Operator entry point: resolve references, enrich shows and build
//! recommendation lists against the configured store and providers.

use std::{sync::Arc, time::Duration};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use showrank::{
    config::{Config, EnrichmentCacheKind},
    db::{create_pool, create_redis_client, run_migrations, Cache, PgShowStore, ShowStore},
    error::AppError,
    models::{ExternalId, ShowReference},
    services::{
        enrichment::{
            BoundedEnrichmentCache, EnrichmentCache, MemoryEnrichmentCache, RedisEnrichmentCache,
        },
        providers::{CatalogProvider, OmdbProvider, TmdbProvider, TraktProvider, TvMazeProvider},
        recommendations::DEFAULT_FOR_YOU_LIMIT,
        scoring::BECAUSE_YOU_WATCHED_MIN_SCORE,
        EnrichmentManager, MetadataProviders, RecommendationService, ShowResolver,
    },
};

#[derive(Parser)]
#[command(name = "showrank")]
#[command(about = "Resolve, enrich and recommend TV shows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a reference (canonical id, trakt-<id> token or external id) to its stored record
    Resolve {
        reference: String,
    },

    /// Fetch a show from the catalog and print its enrichment
    Enrich {
        external_id: ExternalId,
    },

    /// Rank shows similar to a seed show
    Similar {
        external_id: ExternalId,

        /// Drop candidates scoring below this
        #[arg(long, default_value_t = BECAUSE_YOU_WATCHED_MIN_SCORE)]
        min_score: f64,
    },

    /// Build the "for you" list of a viewer
    ForYou {
        user_id: Uuid,

        #[arg(short, long, default_value_t = DEFAULT_FOR_YOU_LIMIT)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("showrank=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    tracing::info!("Database ready");

    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_handle) = Cache::new(redis_client);

    let store: Arc<dyn ShowStore> = Arc::new(PgShowStore::new(pool));
    let catalog: Arc<dyn CatalogProvider> = Arc::new(TraktProvider::new(
        cache.clone(),
        config.trakt_client_id.clone(),
        config.trakt_api_url.clone(),
    ));

    let enrichment = EnrichmentManager::new(
        catalog.clone(),
        MetadataProviders {
            primary: Arc::new(TmdbProvider::new(
                config.tmdb_api_key.clone(),
                config.tmdb_api_url.clone(),
            )),
            secondary: Arc::new(OmdbProvider::new(
                config.omdb_api_key.clone(),
                config.omdb_api_url.clone(),
            )),
            tertiary: Arc::new(TvMazeProvider::new(config.tvmaze_api_url.clone())),
        },
        enrichment_cache(&config, &cache),
        config.enrichment_max_concurrent,
    );

    let outcome = run(cli.command, store, catalog, enrichment).await;

    cache_handle.shutdown().await;

    outcome
}

fn enrichment_cache(config: &Config, cache: &Cache) -> Arc<dyn EnrichmentCache> {
    tracing::info!(kind = ?config.enrichment_cache, "Enrichment cache selected");

    match config.enrichment_cache {
        EnrichmentCacheKind::Memory => Arc::new(MemoryEnrichmentCache::new()),
        EnrichmentCacheKind::Bounded => Arc::new(BoundedEnrichmentCache::new(
            config.enrichment_cache_capacity,
            Duration::from_secs(config.enrichment_cache_ttl_secs),
        )),
        EnrichmentCacheKind::Redis => Arc::new(RedisEnrichmentCache::new(
            cache.clone(),
            config.enrichment_cache_ttl_secs,
        )),
    }
}

async fn run(
    command: Commands,
    store: Arc<dyn ShowStore>,
    catalog: Arc<dyn CatalogProvider>,
    enrichment: EnrichmentManager,
) -> anyhow::Result<()> {
    match command {
        Commands::Resolve { reference } => {
            let resolver = ShowResolver::new(store.clone(), catalog, enrichment);
            let canonical_id = resolver.resolve(&ShowReference::parse(&reference)).await?;

            let record = store.get_by_id(canonical_id).await?.ok_or_else(|| {
                AppError::Internal(format!("Resolved id {} has no record", canonical_id))
            })?;
            print_json(&record)
        }
        Commands::Enrich { external_id } => {
            let show = catalog.show_details(external_id).await?;
            print_json(&enrichment.enrich(&show).await)
        }
        Commands::Similar {
            external_id,
            min_score,
        } => {
            let service = RecommendationService::new(catalog, store, enrichment);
            print_json(&service.because_you_watched(external_id, min_score).await?)
        }
        Commands::ForYou { user_id, limit } => {
            let service = RecommendationService::new(catalog, store, enrichment);
            print_json(&service.for_you(user_id, limit).await?)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
