mod classifier;
mod config;
mod errors;
mod handoff;
mod llm_client;
mod models;
mod rate_limit;
mod routes;
mod screening;
mod state;
mod suggestions;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::classifier::ModelState;
use crate::config::Config;
use crate::handoff::{HandoffStore, InMemoryHandoffStore, RedisHandoffStore};
use crate::llm_client::LlmClient;
use crate::rate_limit::{InMemoryRateLimiter, RateLimiter, RedisRateLimiter};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first: the log level depends on it
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={level},tower_http={level}",
                env!("CARGO_CRATE_NAME"),
                level = &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume screener v{}", env!("CARGO_PKG_VERSION"));
    if config.debug {
        info!("Debug mode enabled (log level {})", config.rust_log);
    }

    // Missing artifacts degrade /health and fail /predict; startup continues
    let models = ModelState::load(&config.vectorizer_path, &config.classifier_path);
    if !models.is_ready() {
        warn!("Classifier pipeline unavailable; /predict will return errors");
    }

    let llm = LlmClient::new(
        config.genai_api_url.clone(),
        config.genai_api_key.clone(),
        Duration::from_secs(config.genai_timeout_secs),
    )
    .context("Failed to build GenAI HTTP client")?;
    if llm.has_credential() {
        info!("GenAI client initialized ({})", config.genai_api_url);
    } else {
        warn!("GENAI_API_KEY not set; suggestions will be replaced by an error message");
    }

    let (rate_limiter, handoff) = build_backends(&config).await?;

    let state = AppState {
        config: config.clone(),
        models,
        llm,
        rate_limiter,
        handoff,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Rate-limit ledger and result handoff: Redis when `REDIS_URL` is set,
/// process memory otherwise.
async fn build_backends(
    config: &Config,
) -> Result<(Arc<dyn RateLimiter>, Arc<dyn HandoffStore>)> {
    let window = Duration::from_secs(config.rate_limit_window_secs);
    let ttl = Duration::from_secs(config.result_ttl_secs);

    match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str()).context("Invalid REDIS_URL")?;
            let conn = client
                .get_multiplexed_async_connection()
                .await
                .context("Failed to connect to Redis")?;
            info!("Redis backends initialized");
            Ok((
                Arc::new(RedisRateLimiter::new(
                    conn.clone(),
                    config.rate_limit_max_requests,
                    window,
                )),
                Arc::new(RedisHandoffStore::new(conn, ttl)),
            ))
        }
        None => {
            info!("In-memory backends initialized (single instance only)");
            Ok((
                Arc::new(InMemoryRateLimiter::new(
                    config.rate_limit_max_requests,
                    window,
                )),
                Arc::new(InMemoryHandoffStore::new(ttl)),
            ))
        }
    }
}
