mod applicants;
mod config;
mod db;
mod errors;
mod jobs;
mod llm_client;
mod models;
mod rate_limit;
mod routes;
mod screening;
mod state;
mod storage;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::applicants::store::PgApplicantStore;
use crate::config::Config;
use crate::db::create_pool;
use crate::jobs::store::PgJobStore;
use crate::llm_client::LlmClient;
use crate::rate_limit::RedisRateLimiter;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::S3ObjectStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http=info",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting careers API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs pending migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis for the CV rate limiter
    let redis = redis::Client::open(config.redis_url.clone())?;
    let rate_limiter =
        RedisRateLimiter::new(redis, config.cv_rate_limit, config.cv_rate_window).await?;
    info!(
        "Redis connection established (CV limit: {} per {}s)",
        config.cv_rate_limit,
        config.cv_rate_window.as_secs()
    );

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!(
        "LLM client initialized (model: {}, timeout: {}s)",
        llm_client::MODEL,
        config.llm_timeout.as_secs()
    );

    // Build app state
    let state = AppState {
        storage: Arc::new(S3ObjectStore::new(s3, config.s3_bucket.clone())),
        model: Arc::new(llm),
        jobs: Arc::new(PgJobStore::new(db.clone())),
        applicants: Arc::new(PgApplicantStore::new(db)),
        rate_limiter: Arc::new(rate_limiter),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the careers site once its domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    // Peer addresses feed the rate limiter's client key
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "careers-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets path-style
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
