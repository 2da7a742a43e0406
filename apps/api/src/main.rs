mod applications;
mod auth;
mod cache;
mod config;
mod db;
mod errors;
mod jobs;
mod llm_client;
mod models;
mod profiles;
mod query;
mod recommendations;
mod routes;
mod saved_jobs;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::{CacheBackend, CacheInvalidator, MemoryCache, RedisCache, ResponseCache};
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::recommendations::{LlmRecommender, Recommender, SkillOverlapRecommender};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{DocumentStore, MemoryStore, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Beacon API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the document store
    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            let pg_store = PgStore::new(pool);
            pg_store.ensure_schema().await?;
            Arc::new(pg_store)
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory document store");
            Arc::new(MemoryStore::new())
        }
    };

    // Initialize the cache backend
    let backend: Arc<dyn CacheBackend> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.clone())?;
            let redis_cache = RedisCache::connect(&client).await?;
            info!("Redis cache backend initialized");
            Arc::new(redis_cache)
        }
        None => {
            warn!("REDIS_URL not set, using the in-process cache backend");
            Arc::new(MemoryCache::new())
        }
    };
    let response_cache = ResponseCache::new(backend.clone());
    let invalidator = CacheInvalidator::new(backend);

    // Initialize the recommender
    let recommender: Arc<dyn Recommender> = match &config.anthropic_api_key {
        Some(key) => {
            info!("Recommender: Claude ({})", llm_client::MODEL);
            Arc::new(LlmRecommender(LlmClient::new(key.clone())))
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set, using the skill-overlap recommender");
            Arc::new(SkillOverlapRecommender)
        }
    };

    // Build app state
    let state = AppState {
        store,
        cache: response_cache,
        invalidator,
        recommender,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
